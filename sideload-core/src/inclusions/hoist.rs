//! Hoisting resolved inclusions into the response mapping.

use indexmap::IndexMap;
use serde_json::Value;
use sideload_schema::{EntityType, Pk};

use super::inclusion::Inclusion;
use crate::error::{InclusionError, InclusionResult};
use crate::traits::{Context, DataStore, Serializer};

/// Included entities keyed by entity key, each list sorted canonically.
pub type InclusionMap = IndexMap<String, Vec<Value>>;

/// How entity types are written as keys of the inclusions mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityKeyFormat {
    prefix: Option<String>,
}

impl EntityKeyFormat {
    /// Plain entity type keys, e.g. `app.Tag`.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Keys with a prefix, e.g. `prefix:app.Tag`.
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Key for an entity type.
    pub fn key(&self, entity: &EntityType) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, entity),
            None => entity.to_string(),
        }
    }
}

/// Canonical sort key of a rendered entity: `id`, else `pk`, else `url`.
pub fn sort_key(item: &Value, entity: &str) -> InclusionResult<Pk> {
    let key = ["id", "pk", "url"]
        .iter()
        .find_map(|name| item.get(name))
        .ok_or_else(|| InclusionError::missing_sort_key(entity))?;
    Ok(Pk::from_json(key).unwrap_or_else(|| Pk::from(key.to_string())))
}

/// Sort rendered entities by their canonical sort key.
pub fn sort_entities(items: Vec<Value>, entity: &str) -> InclusionResult<Vec<Value>> {
    let mut keyed = items
        .into_iter()
        .map(|item| Ok((sort_key(&item, entity)?, item)))
        .collect::<InclusionResult<Vec<_>>>()?;
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

/// Merge resolved inclusions by entity type, fetch each entity type once and
/// return the sorted rendered entities.
///
/// Entity types without any entity to include are left out.
pub fn hoist<D, S>(
    ctx: &Context<'_, D, S>,
    inclusions: Vec<Inclusion>,
    keys: &EntityKeyFormat,
) -> InclusionResult<InclusionMap>
where
    D: DataStore,
    S: Serializer<D::Object>,
{
    let mut hoisted = InclusionMap::new();
    for inclusion in Inclusion::merge(inclusions)? {
        let entity = inclusion.entity_type();
        if !inclusion.is_resolved() {
            return Err(InclusionError::invariant(format!(
                "cannot hoist the unresolved inclusion of {}",
                entity
            )));
        }
        let data = inclusion.data(ctx)?;
        if data.is_empty() {
            continue;
        }
        hoisted.insert(keys.key(&entity), sort_entities(data, entity.as_str())?);
    }
    Ok(hoisted)
}
