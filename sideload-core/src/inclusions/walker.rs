//! Schema graph walk producing inclusion definitions.

use std::collections::HashSet;
use std::sync::Arc;

use sideload_schema::{Field, FieldKind, Schema, SchemaRegistry};
use smol_str::SmolStr;
use tracing::{debug, trace};

use super::definition::InclusionDefinition;
use crate::error::InclusionResult;
use crate::path::{DataPath, InclusionPrefix};

/// A `(target schema, referrer schema, field)` edge on the current walk path.
pub type Referrer = (SmolStr, SmolStr, SmolStr);

/// Edges taken on the current walk path.
///
/// Entries are removed again once a branch is done, so sibling branches each
/// get a fresh budget while a path that revisits an edge is cut off.
pub type Visited = HashSet<Referrer>;

pub(super) fn referrer(target: &Schema, schema: &Schema, field: &Field) -> Referrer {
    (
        SmolStr::new(target.name()),
        SmolStr::new(schema.name()),
        field.name.clone(),
    )
}

/// Collect the inclusion definitions reachable from `schema`, in field
/// declaration order.
///
/// `data_path` is the location of `schema` in the rendered payload and
/// `prefix` tells whether it renders the root payload or an included entity.
/// A reference field without a declared inclusion yields nothing. Reaching an
/// edge already on the current path truncates that branch.
pub fn determine_inclusion_definitions(
    registry: &SchemaRegistry,
    schema: &Schema,
    data_path: &DataPath,
    prefix: &InclusionPrefix,
    visited: &mut Visited,
) -> InclusionResult<Vec<InclusionDefinition>> {
    let mut definitions = Vec::new();
    walk(registry, schema, data_path, prefix, visited, 0, &mut definitions)?;
    Ok(definitions)
}

/// Collect the inclusion definitions of a root schema.
pub fn root_definitions(
    registry: &SchemaRegistry,
    schema: &Schema,
) -> InclusionResult<Vec<InclusionDefinition>> {
    determine_inclusion_definitions(
        registry,
        schema,
        &DataPath::root(),
        &InclusionPrefix::Root,
        &mut Visited::new(),
    )
}

fn walk(
    registry: &SchemaRegistry,
    schema: &Schema,
    data_path: &DataPath,
    prefix: &InclusionPrefix,
    visited: &mut Visited,
    depth: usize,
    out: &mut Vec<InclusionDefinition>,
) -> InclusionResult<()> {
    for field in schema.fields() {
        let path = data_path.child(field.name());

        match &field.kind {
            FieldKind::Scalar => {}
            FieldKind::Nested(nested) => {
                let target = registry.resolve(&nested.schema)?;
                let edge = referrer(&target, schema, field);
                if !visited.insert(edge.clone()) {
                    debug!(schema = %schema.name(), field = %field.name, "Nested schema cycle, truncating");
                    continue;
                }
                walk(
                    registry,
                    &target,
                    &path,
                    &prefix.child(field.name()),
                    visited,
                    depth,
                    out,
                )?;
                visited.remove(&edge);
            }
            FieldKind::SingleReference(_) | FieldKind::MultiReference(_) => {
                let Some(target) = schema.inclusion(field.name()) else {
                    continue;
                };
                let target = registry.resolve(target)?;
                let edge = referrer(&target, schema, field);
                if !visited.insert(edge.clone()) {
                    debug!(
                        schema = %schema.name(),
                        field = %field.name,
                        target = %target.name(),
                        "Inclusion cycle, truncating"
                    );
                    continue;
                }

                let Some(definition) = InclusionDefinition::new(
                    field.clone(),
                    Arc::clone(&target),
                    path.clone(),
                    prefix.child(field.name()).into_path(),
                ) else {
                    continue;
                };
                let entity = definition.entity_type();
                trace!(definition = ?definition, depth, "Found inclusion definition");
                out.push(definition.at_depth(depth));

                walk(
                    registry,
                    &target,
                    &path,
                    &InclusionPrefix::Entity(entity),
                    visited,
                    depth + 1,
                    out,
                )?;
                visited.remove(&edge);
            }
        }
    }
    Ok(())
}
