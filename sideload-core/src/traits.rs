//! Collaborator interfaces: the data store and the serializer.
//!
//! The engine never talks to a database or renders fields itself. It asks a
//! [`DataStore`] for objects and a [`Serializer`] for their rendered form.

use serde_json::Value;
use sideload_schema::{DataSource, EntityType, Field, Pk, PkSet, Schema, SchemaRegistry};

use crate::error::InclusionResult;

/// Related data behind a reference field of one object.
#[derive(Debug, Clone, PartialEq)]
pub enum Related<O> {
    /// No related object.
    Null,
    /// Identifier-only handle. The object is loaded with
    /// [`DataStore::load`] only once it turns out to be a new inclusion.
    Key(Pk),
    /// The related object, already in memory.
    Object(O),
    /// All related objects of a multi-valued reference.
    Many(Vec<O>),
}

/// Value behind a nested sub-schema field of one object.
#[derive(Debug, Clone, PartialEq)]
pub enum NestedValue<O> {
    /// The value cannot be computed for this object; the field is skipped.
    Skip,
    /// The nested relation is empty.
    Null,
    /// One embedded object.
    One(O),
    /// The embedded collection.
    Many(Vec<O>),
}

/// Root object(s) of a response: one instance or a list.
#[derive(Debug, Clone, PartialEq)]
pub enum Instance<O> {
    /// A single object (detail responses).
    One(O),
    /// A list of objects (list responses, or one page of them).
    Many(Vec<O>),
}

impl<O> Instance<O> {
    /// Iterate over the objects.
    pub fn iter(&self) -> std::slice::Iter<'_, O> {
        match self {
            Self::One(object) => std::slice::from_ref(object).iter(),
            Self::Many(objects) => objects.iter(),
        }
    }

    /// Check if this is a list.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

/// Access to the objects inclusions are built from.
///
/// Implementations own any memoization. Collections returned by
/// [`related`](Self::related) and [`nested`](Self::nested) should reuse data
/// the data layer already loaded; the engine never asks twice for per-item
/// data it has received.
pub trait DataStore {
    /// The object type handed to the serializer.
    type Object;

    /// Fetch every object of `source` whose key is in `pks`, in one call.
    fn fetch(&self, source: &DataSource, pks: &PkSet) -> InclusionResult<Vec<Self::Object>>;

    /// Load a single object of `source`.
    fn load(&self, source: &DataSource, pk: &Pk) -> InclusionResult<Option<Self::Object>> {
        let pks = PkSet::from([pk.clone()]);
        Ok(self.fetch(source, &pks)?.into_iter().next())
    }

    /// Related data behind the reference `field` of `parent`.
    ///
    /// `source` is the collection the related objects live in.
    fn related(
        &self,
        parent: &Self::Object,
        field: &Field,
        source: &DataSource,
    ) -> InclusionResult<Related<Self::Object>>;

    /// Objects embedded by the nested `field` of `parent`, rendered with
    /// `schema`.
    fn nested(
        &self,
        parent: &Self::Object,
        field: &Field,
        schema: &Schema,
    ) -> InclusionResult<NestedValue<Self::Object>>;

    /// Entity type of an object.
    fn entity_type(&self, object: &Self::Object) -> EntityType;

    /// Primary key of an object.
    fn primary_key(&self, object: &Self::Object) -> Pk;
}

/// Renders objects through a schema.
pub trait Serializer<O> {
    /// Render one object.
    fn render(&self, schema: &Schema, object: &O) -> InclusionResult<Value>;

    /// Render a list of objects.
    fn render_many(&self, schema: &Schema, objects: &[O]) -> InclusionResult<Value> {
        objects
            .iter()
            .map(|object| self.render(schema, object))
            .collect::<InclusionResult<Vec<_>>>()
            .map(Value::Array)
    }

    /// Render a response root.
    fn render_instance(&self, schema: &Schema, instance: &Instance<O>) -> InclusionResult<Value> {
        match instance {
            Instance::One(object) => self.render(schema, object),
            Instance::Many(objects) => self.render_many(schema, objects),
        }
    }
}

/// Store and serializer used for one render.
pub struct Context<'a, D: DataStore, S> {
    /// Schema registry resolving named references.
    pub registry: &'a SchemaRegistry,
    /// Data store.
    pub store: &'a D,
    /// Serializer.
    pub serializer: &'a S,
}

impl<D: DataStore, S> Clone for Context<'_, D, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: DataStore, S> Copy for Context<'_, D, S> {}

impl<'a, D, S> Context<'a, D, S>
where
    D: DataStore,
    S: Serializer<D::Object>,
{
    /// Bundle the collaborators of one render.
    pub fn new(registry: &'a SchemaRegistry, store: &'a D, serializer: &'a S) -> Self {
        Self {
            registry,
            store,
            serializer,
        }
    }

    /// Fetch `pks` from `source` and render each object with `schema`.
    pub fn fetch_rendered(
        &self,
        source: &DataSource,
        pks: &PkSet,
        schema: &Schema,
    ) -> InclusionResult<Vec<Value>> {
        if pks.is_empty() {
            return Ok(Vec::new());
        }
        self.store
            .fetch(source, pks)?
            .iter()
            .map(|object| self.serializer.render(schema, object))
            .collect()
    }
}
