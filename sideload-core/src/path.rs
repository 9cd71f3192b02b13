//! Dotted data paths and chained inclusion paths.

use std::fmt;

use serde::{Deserialize, Serialize};
use sideload_schema::EntityType;
use smol_str::SmolStr;

/// Dotted, root-relative path to a field in a rendered payload, e.g.
/// `entries.tags`. The empty path is the payload root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataPath(SmolStr);

impl DataPath {
    /// The payload root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Create a path from its dotted form.
    pub fn new(path: impl Into<SmolStr>) -> Self {
        Self(path.into())
    }

    /// Check if this is the payload root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend the path by one field.
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            Self(SmolStr::new(name))
        } else {
            Self(SmolStr::from(format!("{}.{}", self.0, name)))
        }
    }

    /// First segment of the path.
    pub fn first(&self) -> &str {
        self.0.split_once('.').map_or(self.as_str(), |(first, _)| first)
    }

    /// Split off the first segment.
    pub fn split_first(&self) -> (&str, Option<&str>) {
        match self.0.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (self.as_str(), None),
        }
    }

    /// Path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// Get the dotted form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Location of a chained inclusion's identifiers: a data path inside the
/// rendered entities of a previously resolved inclusion.
///
/// Displayed as `entity_type:field_path`, e.g. `app.Parent:tags`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InclusionPath {
    /// Entity type whose rendered data holds the identifiers.
    pub source: EntityType,
    /// Path inside each rendered source entity.
    pub data_path: DataPath,
}

impl InclusionPath {
    /// Create an inclusion path.
    pub fn new(source: impl Into<EntityType>, data_path: impl Into<DataPath>) -> Self {
        Self {
            source: source.into(),
            data_path: data_path.into(),
        }
    }

    /// Parse the `entity_type:field_path` form.
    pub fn parse(path: &str) -> Option<Self> {
        let (source, data_path) = path.split_once(':')?;
        if source.is_empty() || data_path.is_empty() {
            return None;
        }
        Some(Self::new(source, data_path))
    }
}

impl fmt::Display for InclusionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.data_path)
    }
}

/// Inclusion path context threaded through the schema graph walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InclusionPrefix {
    /// Walking the root schema: definitions resolve from the root payload.
    Root,
    /// Walking the schema of an included entity type.
    Entity(EntityType),
    /// Walking a nested field below an included entity type.
    Path(InclusionPath),
}

impl InclusionPrefix {
    /// Prefix for a field of the schema currently walked.
    pub fn child(&self, name: &str) -> Self {
        match self {
            Self::Root => Self::Root,
            Self::Entity(entity) => Self::Path(InclusionPath::new(entity.clone(), name)),
            Self::Path(path) => Self::Path(InclusionPath {
                source: path.source.clone(),
                data_path: path.data_path.child(name),
            }),
        }
    }

    /// The inclusion path this prefix denotes, if any.
    pub fn into_path(self) -> Option<InclusionPath> {
        match self {
            Self::Path(path) => Some(path),
            Self::Root | Self::Entity(_) => None,
        }
    }
}
