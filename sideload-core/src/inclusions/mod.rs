//! Inclusion discovery, resolution and hoisting.
//!
//! Two strategies build the inclusions of a response:
//!
//! - The **resolved** strategy derives [`InclusionDefinition`]s from the
//!   schema graph once ([`determine_inclusion_definitions`]), merges them
//!   ([`merge_definitions`]), reads identifiers out of the rendered payload
//!   ([`get_pks`]), settles chained inclusions in rounds
//!   ([`extract_inclusions`]) and finally fetches every entity type once
//!   ([`hoist`]).
//! - The **eager** strategy ([`InclusionLoader`]) walks the object graph the
//!   data layer already holds, following only the requested field paths.
//!
//! Both produce an [`InclusionMap`]: entity key to the rendered entities of
//! that type, sorted by identifier and free of duplicates.

pub mod definition;
pub mod extract;
pub mod hoist;
pub mod inclusion;
pub mod loader;
pub mod resolver;
pub mod walker;

#[cfg(test)]
pub(crate) mod fixtures;

pub use definition::{InclusionDefinition, merge_definitions};
pub use extract::get_pks;
pub use hoist::{EntityKeyFormat, InclusionMap, hoist, sort_entities, sort_key};
pub use inclusion::Inclusion;
pub use loader::{InclusionLoader, load_inclusions};
pub use resolver::{extract_inclusions, round_bound};
pub use walker::{Visited, determine_inclusion_definitions, root_definitions};
