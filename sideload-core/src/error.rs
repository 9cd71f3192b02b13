//! Error types for inclusion resolution with actionable messages.
//!
//! Error codes follow a pattern: P{category}{number}
//! - 1xxx: Schema configuration errors (unknown schema, unsupported field, sort key)
//! - 2xxx: Identifier extraction errors
//! - 3xxx: Resolution errors (runaway rounds, broken invariants)
//! - 4xxx: Data store and serializer failures
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use sideload_core::{ErrorCode, InclusionError};
//!
//! let err = InclusionError::missing_sort_key("app.Tag");
//! assert_eq!(err.code, ErrorCode::MissingSortKey);
//! assert!(err.is_configuration());
//! assert!(err.to_string().starts_with("[P1003]"));
//! ```

use std::fmt;

use sideload_schema::SchemaError;
use thiserror::Error;

/// Result type for inclusion operations.
pub type InclusionResult<T> = Result<T, InclusionError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Schema configuration errors (1xxx)
    /// A named schema could not be resolved (P1001).
    UnknownSchema = 1001,
    /// A field kind that cannot be included (P1002).
    UnsupportedField = 1002,
    /// Rendered entity has no `id`, `pk` or `url` to sort on (P1003).
    MissingSortKey = 1003,
    /// Any other schema declaration mistake (P1004).
    InvalidSchema = 1004,

    // Extraction errors (2xxx)
    /// Rendered value is not a usable identifier (P2001).
    InvalidIdentifier = 2001,
    /// Rendered payload does not match the data path (P2002).
    InvalidPayload = 2002,

    // Resolution errors (3xxx)
    /// Chained inclusions did not settle within the derived round bound (P3001).
    RunawayResolution = 3001,
    /// Inclusion state was used out of order (P3002).
    InvariantViolation = 3002,

    // Store errors (4xxx)
    /// The data store failed (P4001).
    StoreFailure = 4001,
    /// The serializer failed (P4002).
    RenderFailure = 4002,

    // Configuration errors (7xxx)
    /// Invalid configuration (P7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (P9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "P1001").
    pub fn code(&self) -> String {
        format!("P{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnknownSchema => "Unknown schema",
            Self::UnsupportedField => "Field cannot be included",
            Self::MissingSortKey => "Included entity has no sort key",
            Self::InvalidSchema => "Invalid schema declaration",
            Self::InvalidIdentifier => "Invalid identifier",
            Self::InvalidPayload => "Rendered payload does not match data path",
            Self::RunawayResolution => "Inclusion resolution did not terminate",
            Self::InvariantViolation => "Inclusion invariant violated",
            Self::StoreFailure => "Data store failure",
            Self::RenderFailure => "Serializer failure",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The schema involved.
    pub schema: Option<String>,
    /// The entity type involved.
    pub entity: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// The data or inclusion path involved.
    pub path: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
}

/// Errors that can occur while collecting inclusions.
#[derive(Error, Debug)]
pub struct InclusionError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for InclusionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl InclusionError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.context.schema = Some(schema.into());
        self
    }

    /// Set the entity type.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.context.entity = Some(entity.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.context.path = Some(path.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A field with an inclusion target that is not a reference field.
    pub fn unsupported_field(schema: impl Into<String>, field: impl Into<String>) -> Self {
        let schema = schema.into();
        let field = field.into();
        Self::new(
            ErrorCode::UnsupportedField,
            format!("Trying to include unknown field type: {}.{}", schema, field),
        )
        .with_schema(schema)
        .with_field(field)
        .with_suggestion("Only single and multi-valued reference fields can declare an inclusion")
    }

    /// A rendered entity without `id`, `pk` or `url`.
    pub fn missing_sort_key(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self::new(
            ErrorCode::MissingSortKey,
            format!(
                "Included {} does not contain a reference to the 'id'. Please include it in the serializer.",
                entity
            ),
        )
        .with_entity(entity)
        .with_suggestion("Add an `id`, `pk` or `url` field to the inclusion schema")
    }

    /// A rendered value that cannot be read as an identifier.
    pub fn invalid_identifier(path: impl Into<String>, found: &serde_json::Value) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::InvalidIdentifier,
            format!("Expected an identifier or a list of identifiers at `{}`, found {}", path, found),
        )
        .with_path(path)
    }

    /// A rendered payload that cannot be walked along a data path.
    pub fn invalid_payload(path: impl Into<String>, found: &serde_json::Value) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::InvalidPayload,
            format!("Cannot follow data path `{}` into {}", path, found),
        )
        .with_path(path)
    }

    /// Chained inclusions still unresolved after `rounds` rounds.
    pub fn runaway_resolution(rounds: usize, pending: usize) -> Self {
        Self::new(
            ErrorCode::RunawayResolution,
            format!(
                "{} inclusion(s) still unresolved after {} round(s); the schema graph is malformed",
                pending, rounds
            ),
        )
        .with_suggestion("Check the inclusion declarations for a cycle that escaped detection")
    }

    /// Inclusion state used out of order.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvariantViolation, message)
    }

    /// A data store failure.
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreFailure, message)
    }

    /// A serializer failure.
    pub fn render(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RenderFailure, message)
    }

    // ============== Error Type Checks ==============

    /// Check if this error points at a schema or configuration mistake.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnknownSchema
                | ErrorCode::UnsupportedField
                | ErrorCode::MissingSortKey
                | ErrorCode::InvalidSchema
                | ErrorCode::InvalidConfiguration
        )
    }

    /// Check if this error signals a bug rather than a wiring mistake.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::RunawayResolution | ErrorCode::InvariantViolation | ErrorCode::Internal
        )
    }
}

impl From<SchemaError> for InclusionError {
    fn from(err: SchemaError) -> Self {
        let code = match &err {
            SchemaError::UnknownSchema { .. } => ErrorCode::UnknownSchema,
            SchemaError::ConfigError { .. }
            | SchemaError::TomlError { .. }
            | SchemaError::IoError { .. } => ErrorCode::InvalidConfiguration,
            SchemaError::DuplicateSchema { .. }
            | SchemaError::NameMismatch { .. }
            | SchemaError::DuplicateField { .. }
            | SchemaError::InvalidInclusion { .. } => ErrorCode::InvalidSchema,
        };
        Self::new(code, err.to_string()).with_source(err)
    }
}
