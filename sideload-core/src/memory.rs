//! In-memory reference implementation of the collaborator traits.
//!
//! [`MemoryStore`] keeps [`Record`]s per entity type and implements
//! [`DataStore`]; [`RecordSerializer`] renders records through schemas. Both
//! back the test suite and serve as a template for real integrations.
//!
//! ```rust
//! use sideload_core::memory::{MemoryStore, Record, RecordSerializer};
//! use sideload_core::Serializer;
//! use sideload_schema::{Schema, SchemaRegistry};
//!
//! let store = MemoryStore::new();
//! store.insert(Record::new("app.Company", 1).value("name", "SKYNET"));
//!
//! let registry = SchemaRegistry::new();
//! let schema = Schema::builder("CompanySchema", "app.Company")
//!     .scalars(["id", "name"])
//!     .build()
//!     .unwrap();
//!
//! let company = store.get("app.Company", &1.into()).unwrap();
//! let rendered = RecordSerializer::new(&store, &registry).render(&schema, &company).unwrap();
//! assert_eq!(rendered, serde_json::json!({"id": 1, "name": "SKYNET"}));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use sideload_schema::{
    DataSource, EntityType, Field, FieldKind, Pk, PkSet, Schema, SchemaRegistry,
};
use smol_str::SmolStr;
use tracing::trace;

use crate::error::{InclusionError, InclusionResult};
use crate::traits::{DataStore, NestedValue, Related, Serializer};

// ============================================================================
// Records
// ============================================================================

/// Attribute value of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    /// Plain value.
    Value(Value),
    /// Key of one related record, `None` when the relation is empty.
    Ref(Option<Pk>),
    /// Keys of several related records.
    Refs(Vec<Pk>),
}

/// A stored entity: type, primary key and ordered attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity: EntityType,
    pk: Pk,
    attrs: IndexMap<SmolStr, Attr>,
}

impl Record {
    /// Create a record without attributes.
    pub fn new(entity: impl Into<EntityType>, pk: impl Into<Pk>) -> Self {
        Self {
            entity: entity.into(),
            pk: pk.into(),
            attrs: IndexMap::new(),
        }
    }

    /// Set a plain attribute.
    pub fn value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(SmolStr::new(name), Attr::Value(value.into()));
        self
    }

    /// Point a single-valued relation at another record.
    pub fn reference(mut self, name: &str, pk: impl Into<Pk>) -> Self {
        self.attrs.insert(SmolStr::new(name), Attr::Ref(Some(pk.into())));
        self
    }

    /// Set a single-valued relation to empty.
    pub fn null(mut self, name: &str) -> Self {
        self.attrs.insert(SmolStr::new(name), Attr::Ref(None));
        self
    }

    /// Point a multi-valued relation at other records.
    pub fn references<P: Into<Pk>>(mut self, name: &str, pks: impl IntoIterator<Item = P>) -> Self {
        let pks = pks.into_iter().map(Into::into).collect();
        self.attrs.insert(SmolStr::new(name), Attr::Refs(pks));
        self
    }

    /// Get the entity type.
    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    /// Get the primary key.
    pub fn pk(&self) -> &Pk {
        &self.pk
    }

    /// Get an attribute.
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.get(name)
    }
}

// ============================================================================
// Store
// ============================================================================

type ScopeFilter = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Thread-safe in-memory [`DataStore`].
///
/// Every [`fetch`](DataStore::fetch) is recorded so callers can check how
/// many round trips a render took.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<EntityType, BTreeMap<Pk, Arc<Record>>>>,
    scopes: RwLock<HashMap<DataSource, ScopeFilter>>,
    fetches: Mutex<Vec<(DataSource, PkSet)>>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let records = self.records.read();
        let counts: BTreeMap<&str, usize> = records
            .iter()
            .map(|(entity, rows)| (entity.as_str(), rows.len()))
            .collect();
        f.debug_struct("MemoryStore")
            .field("records", &counts)
            .field("fetches", &self.fetches.lock().len())
            .finish()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record with the same type and key.
    pub fn insert(&self, record: Record) -> Arc<Record> {
        let record = Arc::new(record);
        self.records
            .write()
            .entry(record.entity.clone())
            .or_default()
            .insert(record.pk.clone(), Arc::clone(&record));
        record
    }

    /// Define a named subset of an entity type's records.
    pub fn define_scope<F>(&self, entity: impl Into<EntityType>, scope: &str, filter: F)
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.scopes
            .write()
            .insert(DataSource::scoped(entity, scope), Arc::new(filter));
    }

    /// Look up a record without recording a fetch.
    pub fn get(&self, entity: &str, pk: &Pk) -> Option<Arc<Record>> {
        self.records.read().get(entity)?.get(pk).cloned()
    }

    /// All records of an entity type, ordered by primary key.
    pub fn all(&self, entity: &str) -> Vec<Arc<Record>> {
        self.records
            .read()
            .get(entity)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of records of an entity type.
    pub fn count(&self, entity: &str) -> usize {
        self.records.read().get(entity).map_or(0, BTreeMap::len)
    }

    /// Fetches performed so far.
    pub fn fetch_log(&self) -> Vec<(DataSource, PkSet)> {
        self.fetches.lock().clone()
    }

    /// Number of fetches performed so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().len()
    }

    /// Forget recorded fetches.
    pub fn clear_fetch_log(&self) {
        self.fetches.lock().clear();
    }

    fn scope_filter(&self, source: &DataSource) -> InclusionResult<Option<ScopeFilter>> {
        if source.is_default() {
            return Ok(None);
        }
        self.scopes
            .read()
            .get(source)
            .cloned()
            .map(Some)
            .ok_or_else(|| InclusionError::store(format!("unknown data source `{}`", source)))
    }

    fn select(&self, source: &DataSource, pks: &[Pk]) -> InclusionResult<Vec<Arc<Record>>> {
        let filter = self.scope_filter(source)?;
        let records = self.records.read();
        let Some(rows) = records.get(&source.entity) else {
            return Ok(Vec::new());
        };
        Ok(pks
            .iter()
            .filter_map(|pk| rows.get(pk))
            .filter(|record| filter.as_ref().is_none_or(|keep| keep(record)))
            .cloned()
            .collect())
    }
}

fn mismatch(record: &Record, field: &Field, expected: &str) -> String {
    format!(
        "attribute `{}` of {} {} is not {}",
        field.attribute, record.entity, record.pk, expected
    )
}

fn unexpected_attr(record: &Record, field: &Field, expected: &str) -> InclusionError {
    InclusionError::store(mismatch(record, field, expected))
        .with_entity(record.entity.as_str())
        .with_field(field.name.as_str())
}

fn unrenderable_attr(record: &Record, field: &Field, expected: &str) -> InclusionError {
    InclusionError::render(mismatch(record, field, expected))
        .with_entity(record.entity.as_str())
        .with_field(field.name.as_str())
}

impl DataStore for MemoryStore {
    type Object = Arc<Record>;

    fn fetch(&self, source: &DataSource, pks: &PkSet) -> InclusionResult<Vec<Self::Object>> {
        trace!(source = %source, count = pks.len(), "Fetching records");
        self.fetches.lock().push((source.clone(), pks.clone()));
        let pks: Vec<Pk> = pks.iter().cloned().collect();
        self.select(source, &pks)
    }

    fn related(
        &self,
        parent: &Self::Object,
        field: &Field,
        source: &DataSource,
    ) -> InclusionResult<Related<Self::Object>> {
        match (&field.kind, parent.attr(&field.attribute)) {
            (_, None) | (FieldKind::SingleReference(_), Some(Attr::Ref(None))) => Ok(Related::Null),
            (FieldKind::SingleReference(_), Some(Attr::Ref(Some(pk)))) => {
                Ok(Related::Key(pk.clone()))
            }
            (FieldKind::MultiReference(_), Some(Attr::Refs(pks))) => {
                Ok(Related::Many(self.select(source, pks)?))
            }
            (FieldKind::SingleReference(_), Some(_)) => {
                Err(unexpected_attr(parent, field, "a single reference"))
            }
            (FieldKind::MultiReference(_), Some(_)) => {
                Err(unexpected_attr(parent, field, "a list of references"))
            }
            (FieldKind::Scalar | FieldKind::Nested(_), Some(_)) => {
                Err(unexpected_attr(parent, field, "a reference field"))
            }
        }
    }

    fn nested(
        &self,
        parent: &Self::Object,
        field: &Field,
        schema: &Schema,
    ) -> InclusionResult<NestedValue<Self::Object>> {
        let source = schema.default_source();
        match parent.attr(&field.attribute) {
            None => Ok(NestedValue::Skip),
            Some(Attr::Ref(None)) => Ok(NestedValue::Null),
            Some(Attr::Ref(Some(pk))) => Ok(self
                .get(source.entity.as_str(), pk)
                .map_or(NestedValue::Null, NestedValue::One)),
            Some(Attr::Refs(pks)) => Ok(NestedValue::Many(self.select(&source, pks)?)),
            Some(Attr::Value(_)) => Err(unexpected_attr(parent, field, "a relation")),
        }
    }

    fn entity_type(&self, object: &Self::Object) -> EntityType {
        object.entity.clone()
    }

    fn primary_key(&self, object: &Self::Object) -> Pk {
        object.pk.clone()
    }
}

// ============================================================================
// Serializer
// ============================================================================

/// Renders [`Record`]s through schemas.
///
/// `id` and `pk` fields without a stored attribute render the primary key;
/// references render as keys; nested fields render the related records
/// inline. Fields without a stored attribute are left out. An attribute that
/// does not fit its field kind is a [`RenderFailure`](crate::ErrorCode::RenderFailure).
#[derive(Debug, Clone, Copy)]
pub struct RecordSerializer<'a> {
    store: &'a MemoryStore,
    registry: &'a SchemaRegistry,
}

impl<'a> RecordSerializer<'a> {
    /// Create a serializer reading nested records from `store`.
    pub fn new(store: &'a MemoryStore, registry: &'a SchemaRegistry) -> Self {
        Self { store, registry }
    }

    fn render_field(&self, record: &Record, field: &Field) -> InclusionResult<Option<Value>> {
        let attr = record.attr(&field.attribute);
        let value = match (&field.kind, attr) {
            (FieldKind::Scalar, None) => match field.attribute.as_str() {
                "id" | "pk" => record.pk.to_json(),
                _ => return Ok(None),
            },
            (FieldKind::Scalar, Some(Attr::Value(value))) => value.clone(),
            (FieldKind::Scalar, Some(Attr::Ref(pk))) => pk.as_ref().map_or(Value::Null, Pk::to_json),
            (FieldKind::Scalar, Some(Attr::Refs(pks))) => pks.iter().map(Pk::to_json).collect(),
            (FieldKind::SingleReference(_), None | Some(Attr::Ref(None))) => Value::Null,
            (FieldKind::SingleReference(_), Some(Attr::Ref(Some(pk)))) => pk.to_json(),
            (FieldKind::MultiReference(_), None) => Value::Array(Vec::new()),
            (FieldKind::MultiReference(_), Some(Attr::Refs(pks))) => {
                pks.iter().map(Pk::to_json).collect()
            }
            (FieldKind::SingleReference(_) | FieldKind::MultiReference(_), Some(_)) => {
                return Err(unrenderable_attr(record, field, "a matching reference"));
            }
            (FieldKind::Nested(nested), Some(attr)) => {
                let schema = self.registry.resolve(&nested.schema)?;
                let entity = schema.entity().as_str();
                match attr {
                    Attr::Ref(None) => Value::Null,
                    Attr::Ref(Some(pk)) => match self.store.get(entity, pk) {
                        Some(child) => self.render(&schema, &child)?,
                        None => Value::Null,
                    },
                    Attr::Refs(pks) => {
                        let children = self.store.select(&schema.default_source(), pks)?;
                        self.render_many(&schema, &children)?
                    }
                    Attr::Value(_) => return Err(unrenderable_attr(record, field, "a relation")),
                }
            }
            (FieldKind::Nested(_), None) => return Ok(None),
        };
        Ok(Some(value))
    }
}

impl Serializer<Arc<Record>> for RecordSerializer<'_> {
    fn render(&self, schema: &Schema, object: &Arc<Record>) -> InclusionResult<Value> {
        let mut map = Map::new();
        for field in schema.fields() {
            if let Some(value) = self.render_field(object, field)? {
                map.insert(field.name.to_string(), value);
            }
        }
        Ok(Value::Object(map))
    }
}
