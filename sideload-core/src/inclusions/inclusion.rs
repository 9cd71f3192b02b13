//! Request-scoped inclusions: a definition plus the identifiers to include.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::Value;
use sideload_schema::{EntityType, Pk, PkSet};
use tracing::trace;

use super::definition::InclusionDefinition;
use crate::error::{InclusionError, InclusionResult};
use crate::path::InclusionPath;
use crate::traits::{Context, DataStore, Serializer};

/// Identifiers of one kind of related entity to include in a response.
///
/// Identifiers can be added until the inclusion is resolved; after that the
/// set is frozen.
#[derive(Debug, Clone)]
pub struct Inclusion {
    definition: InclusionDefinition,
    pks: PkSet,
    resolved: bool,
}

impl Inclusion {
    /// Create an unresolved inclusion.
    pub fn new(definition: InclusionDefinition) -> Self {
        Self {
            definition,
            pks: PkSet::new(),
            resolved: false,
        }
    }

    /// Get the definition.
    pub fn definition(&self) -> &InclusionDefinition {
        &self.definition
    }

    /// Identifiers collected so far.
    pub fn pks(&self) -> &PkSet {
        &self.pks
    }

    /// Check if the identifier set is final.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Entity type key of the included entities.
    pub fn entity_type(&self) -> EntityType {
        self.definition.entity_type()
    }

    /// Add identifiers.
    pub fn add_objects(&mut self, pks: impl IntoIterator<Item = Pk>) -> InclusionResult<()> {
        if self.resolved {
            return Err(InclusionError::invariant(format!(
                "cannot add identifiers to the resolved inclusion of {}",
                self.entity_type()
            ))
            .with_entity(self.entity_type().as_str()));
        }
        self.pks.extend(pks);
        Ok(())
    }

    /// Add the final identifiers and freeze the set.
    pub fn resolve(&mut self, pks: impl IntoIterator<Item = Pk>) -> InclusionResult<()> {
        self.add_objects(pks)?;
        self.resolved = true;
        Ok(())
    }

    /// Fetch the included entities in one call and render them.
    pub fn data<D, S>(&self, ctx: &Context<'_, D, S>) -> InclusionResult<Vec<Value>>
    where
        D: DataStore,
        S: Serializer<D::Object>,
    {
        ctx.fetch_rendered(
            &self.definition.data_source(),
            &self.pks,
            self.definition.output_schema(),
        )
    }

    /// Merge inclusions by entity type.
    ///
    /// Resolved inclusions of one entity type collapse into a single
    /// resolved inclusion holding the union of their identifiers. Unresolved
    /// ones are never mixed with resolved ones; they are grouped per
    /// inclusion path, keeping the union of their data paths.
    pub fn merge(inclusions: impl IntoIterator<Item = Inclusion>) -> InclusionResult<Vec<Inclusion>> {
        let mut per_entity: IndexMap<EntityType, Vec<Inclusion>> = IndexMap::new();
        for inclusion in inclusions {
            per_entity
                .entry(inclusion.entity_type())
                .or_default()
                .push(inclusion);
        }

        let mut merged = Vec::new();
        for (entity, group) in per_entity {
            let (resolved, unresolved): (Vec<_>, Vec<_>) =
                group.into_iter().partition(Inclusion::is_resolved);

            let mut resolved = resolved.into_iter();
            if let Some(first) = resolved.next() {
                let mut inclusion = first;
                for other in resolved {
                    inclusion.pks.extend(other.pks);
                }
                merged.push(inclusion);
            }

            let mut per_path: BTreeMap<Option<InclusionPath>, Inclusion> = BTreeMap::new();
            for inclusion in unresolved {
                if !inclusion.pks.is_empty() {
                    return Err(InclusionError::invariant(format!(
                        "unresolved inclusion of {} already carries identifiers",
                        entity
                    ))
                    .with_entity(entity.as_str()));
                }
                let key = inclusion.definition.inclusion_path().cloned();
                match per_path.get_mut(&key) {
                    Some(existing) => existing.definition.absorb_paths(&inclusion.definition),
                    None => {
                        trace!(entity = %entity, path = ?key.as_ref().map(ToString::to_string), "Grouping deferred inclusion");
                        per_path.insert(key, Inclusion::new(inclusion.definition));
                    }
                }
            }
            merged.extend(per_path.into_values());
        }

        Ok(merged)
    }
}
