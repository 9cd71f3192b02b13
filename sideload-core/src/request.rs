//! Parsing of the `include` request parameter.

use std::collections::HashSet;

use sideload_schema::Schema;
use smol_str::SmolStr;

use crate::path::DataPath;

/// Token requesting every includable branch.
pub const WILDCARD: &str = "*";

/// Inclusions requested by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IncludeRequest {
    /// Parameter absent: no inclusion work at all.
    #[default]
    Nothing,
    /// `include=*`.
    All,
    /// Comma separated dotted field paths.
    Paths(Vec<DataPath>),
}

impl IncludeRequest {
    /// Parse the raw parameter value.
    ///
    /// ```rust
    /// use sideload_core::IncludeRequest;
    ///
    /// assert_eq!(IncludeRequest::parse(None), IncludeRequest::Nothing);
    /// assert_eq!(IncludeRequest::parse(Some("*")), IncludeRequest::All);
    ///
    /// let request = IncludeRequest::parse(Some("tags, parent.tags,"));
    /// assert_eq!(request.paths().len(), 2);
    /// ```
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Nothing;
        };
        if raw.trim() == WILDCARD {
            return Self::All;
        }
        Self::Paths(
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(DataPath::from)
                .collect(),
        )
    }

    /// Request the given dotted paths.
    pub fn paths_from<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Paths(paths.into_iter().map(DataPath::from).collect())
    }

    /// Check if nothing at all was requested.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Nothing => true,
            Self::All => false,
            Self::Paths(paths) => paths.is_empty(),
        }
    }

    /// Explicitly requested paths (empty for `Nothing` and `All`).
    pub fn paths(&self) -> &[DataPath] {
        match self {
            Self::Paths(paths) => paths,
            Self::Nothing | Self::All => &[],
        }
    }

    /// Requested paths with the wildcard expanded to every top-level field
    /// of `schema`.
    pub fn expand(&self, schema: &Schema) -> Vec<DataPath> {
        match self {
            Self::Nothing => Vec::new(),
            Self::All => schema.field_names().map(DataPath::from).collect(),
            Self::Paths(paths) => paths.clone(),
        }
    }

    /// First segment of every requested path.
    pub fn requested_roots(&self, schema: &Schema) -> HashSet<SmolStr> {
        self.expand(schema)
            .iter()
            .map(|path| SmolStr::new(path.first()))
            .collect()
    }

    /// Exact field paths the request-path walker may follow.
    pub fn allowed_paths(&self) -> AllowedPaths {
        match self {
            Self::Nothing => AllowedPaths::none(),
            Self::All => AllowedPaths::All,
            Self::Paths(paths) => AllowedPaths::Paths(
                paths
                    .iter()
                    .map(|path| path.segments().map(SmolStr::new).collect())
                    .collect(),
            ),
        }
    }
}

/// Allow-list of exact field paths for the request-path walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedPaths {
    /// Every branch is walked.
    All,
    /// Only these field paths are walked.
    Paths(HashSet<Vec<SmolStr>>),
}

impl AllowedPaths {
    /// An allow-list admitting nothing.
    pub fn none() -> Self {
        Self::Paths(HashSet::new())
    }

    /// Check if the allow-list admits nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Paths(paths) if paths.is_empty())
    }

    /// Check if a field path is admitted.
    pub fn allows(&self, path: &[SmolStr]) -> bool {
        match self {
            Self::All => true,
            Self::Paths(paths) => paths.contains(path),
        }
    }
}
