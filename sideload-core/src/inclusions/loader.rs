//! Eager request-path walker.
//!
//! Walks the in-memory object graph alongside the schema, reusing related
//! objects the data layer already holds instead of re-deriving identifiers
//! from rendered output.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use sideload_schema::{EntityType, Field, FieldKind, Pk, Schema};
use smol_str::SmolStr;
use tracing::{debug, trace};

use super::hoist::{EntityKeyFormat, InclusionMap, sort_entities};
use super::walker::{Visited, referrer};
use crate::error::{InclusionError, InclusionResult};
use crate::request::AllowedPaths;
use crate::traits::{Context, DataStore, Instance, NestedValue, Related, Serializer};

/// Collects the inclusions of one response by walking its objects.
///
/// A loader is meant for one render: it remembers every entity it emitted
/// and never emits one twice. Like the schema graph walker it never follows
/// a `(target, schema, field)` edge already on the current path, so a
/// self-referential schema yields one level of inclusions however long the
/// object chain is.
pub struct InclusionLoader<'a, D: DataStore, S> {
    ctx: Context<'a, D, S>,
    allowed: AllowedPaths,
    complete_path: bool,
    keys: EntityKeyFormat,
    seen: HashSet<(EntityType, Pk)>,
    visited: Visited,
    entries: Vec<(String, Value)>,
}

impl<'a, D, S> InclusionLoader<'a, D, S>
where
    D: DataStore,
    S: Serializer<D::Object>,
{
    /// Create a loader following the `allowed` field paths.
    pub fn new(ctx: Context<'a, D, S>, allowed: AllowedPaths) -> Self {
        Self {
            ctx,
            allowed,
            complete_path: false,
            keys: EntityKeyFormat::default(),
            seen: HashSet::new(),
            visited: Visited::new(),
            entries: Vec::new(),
        }
    }

    /// Match inclusions of included entities against the complete field
    /// path (`parent.tags`) instead of the parent's path (`tags`).
    pub fn nested_inclusions_use_complete_path(mut self, enabled: bool) -> Self {
        self.complete_path = enabled;
        self
    }

    /// Set how entity types are written as keys.
    pub fn entity_keys(mut self, keys: EntityKeyFormat) -> Self {
        self.keys = keys;
        self
    }

    /// Collect the inclusions of `root`, rendered with `schema`.
    pub fn inclusions_dict(
        mut self,
        schema: &Schema,
        root: &Instance<D::Object>,
    ) -> InclusionResult<InclusionMap> {
        if self.allowed.is_empty() {
            return Ok(InclusionMap::new());
        }

        for object in root.iter() {
            self.instance(&[], schema, object)?;
        }

        let mut grouped = InclusionMap::new();
        for (key, data) in self.entries {
            grouped.entry(key).or_default().push(data);
        }
        grouped
            .into_iter()
            .map(|(key, items)| {
                let items = sort_entities(items, &key)?;
                Ok((key, items))
            })
            .collect()
    }

    fn instance(&mut self, path: &[SmolStr], schema: &Schema, object: &D::Object) -> InclusionResult<()> {
        for field in schema.fields() {
            self.field(path, schema, field, object)?;
        }
        Ok(())
    }

    fn field(
        &mut self,
        path: &[SmolStr],
        schema: &Schema,
        field: &Field,
        object: &D::Object,
    ) -> InclusionResult<()> {
        let mut field_path = path.to_vec();
        field_path.push(field.name.clone());

        if let FieldKind::Nested(nested) = &field.kind {
            let target = self.ctx.registry.resolve(&nested.schema)?;
            let edge = referrer(&target, schema, field);
            if self.visited.contains(&edge) {
                debug!(schema = %schema.name(), field = %field.name, "Nested schema cycle, truncating");
                return Ok(());
            }
            let children = match self.ctx.store.nested(object, field, &target)? {
                NestedValue::Skip | NestedValue::Null => return Ok(()),
                NestedValue::One(child) => vec![child],
                NestedValue::Many(children) => children,
            };
            self.visited.insert(edge.clone());
            for child in &children {
                self.instance(&field_path, &target, child)?;
            }
            self.visited.remove(&edge);
            return Ok(());
        }

        let Some(target) = schema.inclusion(field.name()) else {
            return Ok(());
        };
        if !self.allowed.allows(&field_path) {
            return Ok(());
        }
        let Some(reference) = field.kind.reference() else {
            return Err(InclusionError::unsupported_field(schema.name(), field.name()));
        };

        let target = self.ctx.registry.resolve(target)?;
        let edge = referrer(&target, schema, field);
        if self.visited.contains(&edge) {
            debug!(
                schema = %schema.name(),
                field = %field.name,
                target = %target.name(),
                "Inclusion cycle, truncating"
            );
            return Ok(());
        }
        let source = reference
            .source
            .clone()
            .unwrap_or_else(|| target.default_source());

        let found = match self.ctx.store.related(object, field, &source)? {
            Related::Null => Vec::new(),
            Related::Key(pk) => {
                // identifier-only handle: only load what was not emitted yet
                if self.seen.contains(&(source.entity.clone(), pk.clone())) {
                    Vec::new()
                } else {
                    self.ctx.store.load(&source, &pk)?.into_iter().collect()
                }
            }
            Related::Object(related) => vec![related],
            Related::Many(related) => related,
        };

        let nested_path = if self.complete_path {
            field_path.as_slice()
        } else {
            path
        };
        self.visited.insert(edge.clone());
        for related in found {
            if !self.mark_seen(&source.entity, &related) {
                continue;
            }
            let key = self.keys.key(&self.ctx.store.entity_type(&related));
            trace!(key = %key, field = %field.name, "Including related entity");
            let data = self.ctx.serializer.render(&target, &related)?;
            self.entries.push((key, data));
            self.instance(nested_path, &target, &related)?;
        }
        self.visited.remove(&edge);
        Ok(())
    }

    fn mark_seen(&mut self, entity: &EntityType, object: &D::Object) -> bool {
        let entry = (entity.clone(), self.ctx.store.primary_key(object));
        if self.seen.contains(&entry) {
            debug!(entity = %entry.0, pk = %entry.1, "Skipping entity already included");
            return false;
        }
        self.seen.insert(entry)
    }
}

/// Convenience wrapper building a loader for one render.
pub fn load_inclusions<D, S>(
    ctx: Context<'_, D, S>,
    allowed: AllowedPaths,
    schema: &Arc<Schema>,
    root: &Instance<D::Object>,
) -> InclusionResult<InclusionMap>
where
    D: DataStore,
    S: Serializer<D::Object>,
{
    InclusionLoader::new(ctx, allowed).inclusions_dict(schema, root)
}
