//! Static inclusion definitions and their merging.

use std::fmt;
use std::sync::Arc;

use sideload_schema::{DataSource, EntityType, Field, Reference, Schema};
use smol_str::SmolStr;

use crate::path::{DataPath, InclusionPath};

/// Where and how related entities of one reference field can be included.
///
/// Derived from schema structure only, never from request data.
#[derive(Clone)]
pub struct InclusionDefinition {
    field: Field,
    reference: Reference,
    output_schema: Arc<Schema>,
    data_paths: Vec<DataPath>,
    inclusion_path: Option<InclusionPath>,
    depth: usize,
}

impl InclusionDefinition {
    /// Create a definition for a reference field.
    ///
    /// Returns `None` if `field` is not a reference field.
    pub fn new(
        field: Field,
        output_schema: Arc<Schema>,
        data_path: DataPath,
        inclusion_path: Option<InclusionPath>,
    ) -> Option<Self> {
        let reference = field.kind.reference()?.clone();
        Some(Self {
            field,
            reference,
            output_schema,
            data_paths: vec![data_path],
            inclusion_path,
            depth: 0,
        })
    }

    pub(crate) fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Name of the reference field.
    pub fn field_name(&self) -> &str {
        self.field.name()
    }

    /// The reference field itself.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Schema rendering the included entities.
    pub fn output_schema(&self) -> &Arc<Schema> {
        &self.output_schema
    }

    /// Root-relative paths holding this field's identifiers.
    pub fn data_paths(&self) -> &[DataPath] {
        &self.data_paths
    }

    /// Set when identifiers come from a previously resolved inclusion.
    pub fn inclusion_path(&self) -> Option<&InclusionPath> {
        self.inclusion_path.as_ref()
    }

    /// Number of inclusions chained before this one (0 at the root).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Check if the field holds several identifiers.
    pub fn is_many(&self) -> bool {
        self.field.is_many()
    }

    /// Collection the included entities are fetched from.
    ///
    /// Read-only references fall back to the default collection of the
    /// output schema's entity.
    pub fn data_source(&self) -> DataSource {
        self.reference
            .source
            .clone()
            .unwrap_or_else(|| self.output_schema.default_source())
    }

    /// Entity type key of the included entities.
    pub fn entity_type(&self) -> EntityType {
        match &self.reference.source {
            Some(source) => source.entity.clone(),
            None => self.output_schema.entity().clone(),
        }
    }

    /// First segment of every data path.
    pub fn roots(&self) -> impl Iterator<Item = SmolStr> + '_ {
        self.data_paths.iter().map(|path| SmolStr::new(path.first()))
    }

    /// Check if two definitions can share one fetch.
    ///
    /// They can if neither is chained, both read the same collection and
    /// both render with the same schema.
    pub fn is_mergeable_with(&self, other: &Self) -> bool {
        self.inclusion_path.is_none()
            && other.inclusion_path.is_none()
            && self.data_source() == other.data_source()
            && self.output_schema.name() == other.output_schema.name()
    }

    /// Add the data paths of `other` not yet present.
    pub(crate) fn absorb_paths(&mut self, other: &Self) {
        for path in &other.data_paths {
            if !self.data_paths.contains(path) {
                self.data_paths.push(path.clone());
            }
        }
    }
}

impl fmt::Debug for InclusionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InclusionDefinition")
            .field("field", &self.field.name)
            .field("output_schema", &self.output_schema.name())
            .field("data_paths", &self.data_paths)
            .field("inclusion_path", &self.inclusion_path.as_ref().map(ToString::to_string))
            .finish()
    }
}

/// Merge definitions that read the same collection into the same schema.
///
/// Each group keeps the first definition and gains the data paths of the
/// others, in first-seen order. Chained definitions pass through unchanged.
/// Merging an already merged list returns the same grouping.
pub fn merge_definitions(definitions: &[InclusionDefinition]) -> Vec<InclusionDefinition> {
    let mut consumed = vec![false; definitions.len()];
    let mut merged = Vec::with_capacity(definitions.len());

    for (i, definition) in definitions.iter().enumerate() {
        if consumed[i] {
            continue;
        }
        consumed[i] = true;

        let mut group = definition.clone();
        for (j, other) in definitions.iter().enumerate().skip(i + 1) {
            if !consumed[j] && other.is_mergeable_with(definition) {
                consumed[j] = true;
                group.absorb_paths(other);
            }
        }
        merged.push(group);
    }

    merged
}
