//! Process-wide memoization of inclusion definitions.
//!
//! Definitions are a pure function of the static schema graph, so they are
//! derived once per root schema and shared by every request afterwards.
//!
//! ```rust
//! use sideload_core::cache::DefinitionCache;
//! use sideload_schema::{Field, Reference, Schema, SchemaRegistry};
//!
//! let registry = SchemaRegistry::new();
//! let tag = registry
//!     .register(Schema::builder("TagSchema", "app.Tag").scalars(["id"]).build().unwrap())
//!     .unwrap();
//! let entry = Schema::builder("EntrySchema", "app.Entry")
//!     .field(Field::references("tags", Reference::to("app.Tag")))
//!     .include("tags", &tag)
//!     .build()
//!     .unwrap();
//!
//! let cache = DefinitionCache::new();
//! let first = cache.definitions(&registry, &entry).unwrap();
//! let second = cache.definitions(&registry, &entry).unwrap();
//! assert_eq!(first.len(), 1);
//! assert_eq!(cache.stats().hits, 1);
//! # drop(second);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sideload_schema::{Schema, SchemaRegistry};
use smol_str::SmolStr;
use tracing::debug;

use crate::error::InclusionResult;
use crate::inclusions::{InclusionDefinition, merge_definitions, root_definitions};

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
}

impl CacheStats {
    /// Calculate the hit rate.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Merged root definitions keyed by schema name.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    entries: RwLock<HashMap<SmolStr, Arc<Vec<InclusionDefinition>>>>,
    stats: RwLock<CacheStats>,
}

impl DefinitionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the merged definitions of a root schema, deriving them on first
    /// use.
    pub fn definitions(
        &self,
        registry: &SchemaRegistry,
        schema: &Schema,
    ) -> InclusionResult<Arc<Vec<InclusionDefinition>>> {
        if let Some(definitions) = self.entries.read().get(schema.name()) {
            self.stats.write().hits += 1;
            return Ok(Arc::clone(definitions));
        }

        let definitions = Arc::new(merge_definitions(&root_definitions(registry, schema)?));
        debug!(
            schema = schema.name(),
            count = definitions.len(),
            "Derived inclusion definitions"
        );

        let mut entries = self.entries.write();
        self.stats.write().misses += 1;
        // another thread may have derived the same entry meanwhile
        let entry = entries
            .entry(SmolStr::new(schema.name()))
            .or_insert(definitions);
        Ok(Arc::clone(entry))
    }

    /// Check if a schema's definitions are cached.
    pub fn contains(&self, schema: &str) -> bool {
        self.entries.read().contains_key(schema)
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Get usage statistics.
    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }

    /// Drop every cached entry and reset statistics.
    pub fn clear(&self) {
        self.entries.write().clear();
        *self.stats.write() = CacheStats::default();
    }
}
