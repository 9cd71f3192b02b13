//! Error types for schema declaration and configuration.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while declaring schemas or loading configuration.
///
/// All of these point at a wiring mistake in the API definition rather than
/// at request data, so callers should surface them instead of recovering.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(sideload::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A named schema reference could not be resolved.
    #[error("unknown schema `{name}`")]
    #[diagnostic(
        code(sideload::schema::unknown_schema),
        help("register the schema with the SchemaRegistry before it is first used")
    )]
    UnknownSchema { name: String },

    /// Two schemas registered under the same name.
    #[error("duplicate schema `{name}`")]
    #[diagnostic(code(sideload::schema::duplicate_schema))]
    DuplicateSchema { name: String },

    /// A lazily built schema came out under a different name.
    #[error("schema registered as `{expected}` was built as `{actual}`")]
    #[diagnostic(code(sideload::schema::name_mismatch))]
    NameMismatch { expected: String, actual: String },

    /// A field declared twice in one schema.
    #[error("duplicate field `{schema}.{field}`")]
    #[diagnostic(code(sideload::schema::duplicate_field))]
    DuplicateField { schema: String, field: String },

    /// An inclusion declared on a field that cannot be included.
    #[error("invalid inclusion `{schema}.{field}`: {message}")]
    #[diagnostic(code(sideload::schema::invalid_inclusion))]
    InvalidInclusion {
        schema: String,
        field: String,
        message: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(sideload::schema::config_error))]
    ConfigError { message: String },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(sideload::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },
}

impl SchemaError {
    /// Create an unknown schema error.
    pub fn unknown_schema(name: impl Into<String>) -> Self {
        Self::UnknownSchema { name: name.into() }
    }

    /// Create an invalid inclusion error.
    pub fn invalid_inclusion(
        schema: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidInclusion {
            schema: schema.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}
