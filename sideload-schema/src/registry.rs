//! Named schema registry.
//!
//! Schemas refer to each other either directly or by name. Named references
//! are resolved here on first use, so registration order does not matter and
//! cyclic schema graphs can be declared.
//!
//! ```rust
//! use sideload_schema::{Field, Reference, Schema, SchemaRef, SchemaRegistry};
//!
//! let registry = SchemaRegistry::new();
//!
//! // ChildSchema points at ParentSchema before ParentSchema exists.
//! registry.register_with("ChildSchema", || {
//!     Schema::builder("ChildSchema", "app.Child")
//!         .scalars(["id"])
//!         .field(Field::reference("parent", Reference::to("app.Parent")))
//!         .include("parent", SchemaRef::named("ParentSchema"))
//!         .build()
//! });
//! registry
//!     .register(Schema::builder("ParentSchema", "app.Parent").scalars(["id"]).build().unwrap())
//!     .unwrap();
//!
//! let child = registry.get("ChildSchema").unwrap();
//! let parent = registry.resolve(child.inclusion("parent").unwrap()).unwrap();
//! assert_eq!(parent.name(), "ParentSchema");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use smol_str::SmolStr;
use tracing::trace;

use crate::error::{SchemaError, SchemaResult};
use crate::field::SchemaRef;
use crate::schema::Schema;

type SchemaCtor = Arc<dyn Fn() -> SchemaResult<Schema> + Send + Sync>;

enum Entry {
    Built(Arc<Schema>),
    Deferred(SchemaCtor),
}

/// Registry mapping schema names to schemas.
///
/// Safe to share between threads; entries never change once built.
#[derive(Default)]
pub struct SchemaRegistry {
    entries: RwLock<HashMap<SmolStr, Entry>>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        let mut names: Vec<_> = entries.keys().map(SmolStr::as_str).collect();
        names.sort_unstable();
        f.debug_struct("SchemaRegistry").field("schemas", &names).finish()
    }
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built schema under its own name.
    pub fn register(&self, schema: Schema) -> SchemaResult<Arc<Schema>> {
        let schema = Arc::new(schema);
        let name = SmolStr::new(schema.name());
        let mut entries = self.entries.write();
        if entries.contains_key(&name) {
            return Err(SchemaError::DuplicateSchema {
                name: name.to_string(),
            });
        }
        entries.insert(name, Entry::Built(Arc::clone(&schema)));
        Ok(schema)
    }

    /// Register a constructor that builds the schema on first lookup.
    ///
    /// Re-registering a name replaces a constructor that has not run yet;
    /// a schema that was already built is kept.
    pub fn register_with<F>(&self, name: impl Into<SmolStr>, ctor: F)
    where
        F: Fn() -> SchemaResult<Schema> + Send + Sync + 'static,
    {
        let name = name.into();
        let mut entries = self.entries.write();
        if matches!(entries.get(&name), Some(Entry::Built(_))) {
            return;
        }
        entries.insert(name, Entry::Deferred(Arc::new(ctor)));
    }

    /// Look up a schema by name, building it if needed.
    pub fn get(&self, name: &str) -> SchemaResult<Arc<Schema>> {
        let ctor = {
            let entries = self.entries.read();
            match entries.get(name) {
                Some(Entry::Built(schema)) => return Ok(Arc::clone(schema)),
                Some(Entry::Deferred(ctor)) => Arc::clone(ctor),
                None => return Err(SchemaError::unknown_schema(name)),
            }
        };

        // Build outside the lock: constructors may consult the registry.
        let schema = ctor()?;
        if schema.name() != name {
            return Err(SchemaError::NameMismatch {
                expected: name.to_string(),
                actual: schema.name().to_string(),
            });
        }
        trace!(schema = %name, "Built deferred schema");

        let mut entries = self.entries.write();
        let entry = entries
            .entry(SmolStr::new(name))
            .or_insert_with(|| Entry::Deferred(Arc::clone(&ctor)));
        if let Entry::Built(existing) = &*entry {
            return Ok(Arc::clone(existing));
        }
        let schema = Arc::new(schema);
        *entry = Entry::Built(Arc::clone(&schema));
        Ok(schema)
    }

    /// Resolve a schema reference.
    pub fn resolve(&self, schema: &SchemaRef) -> SchemaResult<Arc<Schema>> {
        match schema {
            SchemaRef::Inline(schema) => Ok(Arc::clone(schema)),
            SchemaRef::Named(name) => self.get(name),
        }
    }

    /// Check if a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
