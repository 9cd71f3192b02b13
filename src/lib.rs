//! # Sideload
//!
//! Compound-document inclusions for JSON REST responses.
//!
//! Related objects referenced by a response are rendered once each under an
//! `inclusions` key, grouped by entity type, instead of being nested inside
//! every item that points at them. Clients pick what to include with a query
//! parameter such as `?include=parent.tags` or `?include=*`.
//!
//! Sideload provides:
//! - A schema model describing serializer fields and their inclusions
//! - Two collection strategies: an eager object-graph walk and a
//!   definition-based resolver fetching each entity type once
//! - A response renderer producing the `data`/`inclusions` envelope
//! - An optional Axum integration (feature `axum`)
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use sideload::engine::memory::{MemoryStore, Record, RecordSerializer};
//! use sideload::prelude::*;
//!
//! let store = MemoryStore::new();
//! store.insert(Record::new("shop.Tag", 1).value("name", "new"));
//! let product = store.insert(Record::new("shop.Product", 7).references("tags", [1]));
//!
//! let registry = SchemaRegistry::new();
//! registry
//!     .register(Schema::builder("TagSchema", "shop.Tag").scalars(["id", "name"]).build()?)?;
//! let schema = registry.register(
//!     Schema::builder("ProductSchema", "shop.Product")
//!         .scalars(["id"])
//!         .field(Field::references("tags", Reference::to("shop.Tag")))
//!         .include("tags", SchemaRef::named("TagSchema"))
//!         .build()?,
//! )?;
//!
//! let serializer = RecordSerializer::new(&store, &registry);
//! let ctx = Context::new(&registry, &store, &serializer);
//! let body = InclusionRenderer::new().render(
//!     ctx,
//!     &IncludeRequest::parse(Some("tags")),
//!     RenderResponse::serialized(Arc::clone(&schema), Instance::One(product)),
//! )?;
//!
//! assert_eq!(
//!     body,
//!     json!({
//!         "data": {"id": 7, "tags": [1]},
//!         "inclusions": {"shop.Tag": [{"id": 1, "name": "new"}]}
//!     })
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema model, registry and configuration.
pub mod schema {
    pub use sideload_schema::*;
}

/// The inclusion engine.
pub mod engine {
    pub use sideload_core::*;
}

/// Axum integration.
#[cfg(feature = "axum")]
#[cfg_attr(docsrs, doc(cfg(feature = "axum")))]
pub mod axum {
    pub use sideload_axum::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sideload_core::prelude::*;
    pub use sideload_schema::{
        Field, InclusionStrategy, Reference, Schema, SchemaRef, SchemaRegistry, SideloadConfig,
    };
}

// Re-export key types at the crate root
pub use sideload_core::{InclusionError, InclusionResult};
pub use sideload_schema::{Schema, SchemaError};
