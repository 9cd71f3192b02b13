//! # sideload-core
//!
//! Response inclusions ("sideloading") for REST serialization layers.
//!
//! Instead of nesting related objects inside every item of a response, the
//! related objects are rendered once each under an `inclusions` key, grouped
//! by entity type:
//!
//! ```json
//! {
//!     "data": [{"id": 1, "company": 1}, {"id": 2, "company": 1}],
//!     "inclusions": {"app.Company": [{"id": 1, "name": "SKYNET"}]}
//! }
//! ```
//!
//! This crate provides:
//! - Collaborator traits: [`DataStore`] for loading objects and [`Serializer`]
//!   for rendering them
//! - The schema graph walker and definition merger
//! - Identifier extraction from rendered payloads
//! - The fixed-point inclusion resolver and the hoister
//! - The request-path walker ([`InclusionLoader`])
//! - The response renderer ([`InclusionRenderer`])
//! - An in-memory reference store ([`memory::MemoryStore`])
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use sideload_core::memory::{MemoryStore, Record, RecordSerializer};
//! use sideload_core::prelude::*;
//! use sideload_schema::{Field, Reference, Schema, SchemaRegistry};
//!
//! let store = MemoryStore::new();
//! store.insert(Record::new("app.Company", 1).value("name", "SKYNET"));
//! let basic = store.insert(Record::new("app.Basic", 1).value("name", "basic").reference("company", 1));
//!
//! let registry = SchemaRegistry::new();
//! let company = registry
//!     .register(Schema::builder("CompanySchema", "app.Company").scalars(["id", "name"]).build().unwrap())
//!     .unwrap();
//! let schema = registry
//!     .register(
//!         Schema::builder("BasicSchema", "app.Basic")
//!             .scalars(["name"])
//!             .field(Field::reference("company", Reference::to("app.Company")))
//!             .include("company", &company)
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let serializer = RecordSerializer::new(&store, &registry);
//! let ctx = Context::new(&registry, &store, &serializer);
//! let body = InclusionRenderer::new()
//!     .render(
//!         ctx,
//!         &IncludeRequest::parse(Some("company")),
//!         RenderResponse::serialized(Arc::clone(&schema), Instance::One(basic)),
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     body,
//!     json!({
//!         "data": {"name": "basic", "company": 1},
//!         "inclusions": {"app.Company": [{"id": 1, "name": "SKYNET"}]}
//!     })
//! );
//! ```

pub mod cache;
pub mod error;
pub mod inclusions;
pub mod logging;
pub mod memory;
pub mod path;
pub mod render;
pub mod request;
pub mod traits;

pub use cache::{CacheStats, DefinitionCache};
pub use error::{ErrorCode, ErrorContext, InclusionError, InclusionResult};
pub use inclusions::{
    EntityKeyFormat, Inclusion, InclusionDefinition, InclusionLoader, InclusionMap,
    determine_inclusion_definitions, extract_inclusions, get_pks, hoist, merge_definitions,
    root_definitions,
};
pub use path::{DataPath, InclusionPath, InclusionPrefix};
pub use render::{
    Action, InclusionRenderer, RenderResponse, ResponseBody, has_inclusion_serializers,
    should_skip_inclusions,
};
pub use request::{AllowedPaths, IncludeRequest};
pub use traits::{Context, DataStore, Instance, NestedValue, Related, Serializer};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{InclusionError, InclusionResult};
    pub use crate::inclusions::{EntityKeyFormat, InclusionLoader, InclusionMap};
    pub use crate::render::{Action, InclusionRenderer, RenderResponse};
    pub use crate::request::{AllowedPaths, IncludeRequest};
    pub use crate::traits::{Context, DataStore, Instance, NestedValue, Related, Serializer};
}
