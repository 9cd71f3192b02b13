//! Request-time resolution of inclusion definitions against a rendered
//! payload.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use sideload_schema::{EntityType, Pk, Schema};
use smol_str::SmolStr;
use tracing::{debug, trace};

use super::definition::InclusionDefinition;
use super::extract::get_pks;
use super::inclusion::Inclusion;
use crate::error::{InclusionError, InclusionResult};
use crate::request::IncludeRequest;
use crate::traits::{Context, DataStore, Serializer};

/// Rounds needed to settle every chain of `definitions`.
///
/// Round `k` resolves every chained inclusion of depth `k`, so the deepest
/// chain bounds the loop; one spare round covers the empty case.
pub fn round_bound(definitions: &[InclusionDefinition]) -> usize {
    definitions
        .iter()
        .map(InclusionDefinition::depth)
        .max()
        .unwrap_or(0)
        + 1
}

fn is_relevant(definition: &InclusionDefinition, requested_roots: &HashSet<SmolStr>) -> bool {
    definition.roots().any(|root| requested_roots.contains(&root))
}

/// Build the inclusions requested for one rendered payload.
///
/// Definitions reading from the root payload are resolved right away.
/// Chained definitions are resolved in rounds from the rendered data of the
/// inclusions they hang off, until every inclusion is resolved. Chains whose
/// root was not requested resolve to nothing.
pub fn extract_inclusions<D, S>(
    ctx: &Context<'_, D, S>,
    schema: &Schema,
    request: &IncludeRequest,
    payload: &Value,
    definitions: &[InclusionDefinition],
) -> InclusionResult<Vec<Inclusion>>
where
    D: DataStore,
    S: Serializer<D::Object>,
{
    if request.is_empty() {
        return Ok(Vec::new());
    }

    let requested_roots = request.requested_roots(schema);

    // first sweep: everything that reads from the root payload
    let mut inclusions = Vec::new();
    for definition in definitions {
        let chained = definition.inclusion_path().is_some();
        if !chained && !is_relevant(definition, &requested_roots) {
            trace!(definition = ?definition, "Skipping unrequested inclusion");
            continue;
        }

        let mut inclusion = Inclusion::new(definition.clone());
        if !chained {
            let mut pks = Vec::new();
            for path in definition.data_paths() {
                if requested_roots.contains(path.first()) {
                    pks.extend(get_pks(Some(payload), path.as_str())?);
                }
            }
            inclusion.resolve(pks)?;
        }
        inclusions.push(inclusion);
    }

    let mut inclusions = Inclusion::merge(inclusions)?;

    let mut resolved: HashMap<EntityType, Vec<Value>> = HashMap::new();
    for inclusion in inclusions.iter().filter(|i| i.is_resolved()) {
        resolved.insert(inclusion.entity_type(), inclusion.data(ctx)?);
    }

    let bound = round_bound(definitions);
    let mut round = 0;
    loop {
        let pending = inclusions.iter().filter(|i| !i.is_resolved()).count();
        if pending == 0 {
            break;
        }
        round += 1;
        if round > bound {
            return Err(InclusionError::runaway_resolution(bound, pending));
        }
        debug!(round, pending, "Resolving chained inclusions");

        for inclusion in inclusions.iter_mut().filter(|i| !i.is_resolved()) {
            let Some(path) = inclusion.definition().inclusion_path().cloned() else {
                return Err(InclusionError::invariant(format!(
                    "unresolved inclusion of {} has no inclusion path",
                    inclusion.entity_type()
                )));
            };

            let Some(source) = resolved.get(&path.source) else {
                if !is_relevant(inclusion.definition(), &requested_roots) {
                    trace!(path = %path, "Pruning unrequested chained inclusion");
                    inclusion.resolve(std::iter::empty())?;
                }
                continue;
            };

            let mut pks: Vec<Pk> = Vec::new();
            for item in source {
                pks.extend(get_pks(Some(item), path.data_path.as_str())?);
            }
            inclusion.resolve(pks)?;

            let data = inclusion.data(ctx)?;
            resolved
                .entry(inclusion.entity_type())
                .or_default()
                .extend(data);
        }
    }

    Ok(inclusions)
}
