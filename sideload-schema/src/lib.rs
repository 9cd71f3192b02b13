//! # sideload-schema
//!
//! Schema model for the sideload inclusion engine.
//!
//! This crate provides:
//! - Identity types: entity type keys, primary keys, data sources
//! - Field kinds and serializer schema definitions
//! - A registry resolving named schema references lazily
//! - Configuration parser for `sideload.toml` files
//!
//! ## Example
//!
//! ```rust
//! use sideload_schema::{Field, Reference, Schema};
//!
//! let company = Schema::builder("CompanySchema", "app.Company")
//!     .scalars(["id", "name"])
//!     .build()
//!     .unwrap();
//!
//! let basic = Schema::builder("BasicSchema", "app.Basic")
//!     .field(Field::scalar("name"))
//!     .field(Field::reference("company", Reference::to("app.Company")))
//!     .include("company", company)
//!     .build()
//!     .unwrap();
//!
//! assert!(basic.has_inclusions());
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod registry;
pub mod schema;
pub mod types;

pub use config::{InclusionStrategy, SideloadConfig};
pub use error::{SchemaError, SchemaResult};
pub use field::{Field, FieldKind, Nested, Reference, SchemaRef};
pub use registry::SchemaRegistry;
pub use schema::{Schema, SchemaBuilder};
pub use types::{DataSource, EntityType, Pk, PkSet};
