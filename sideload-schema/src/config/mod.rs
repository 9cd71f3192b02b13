//! Configuration file parsing for `sideload.toml`.
//!
//! ```toml
//! [request]
//! query_param = "include"
//!
//! [response]
//! data_key = "data"
//! inclusions_key = "inclusions"
//!
//! [loader]
//! strategy = "eager"
//! nested_inclusions_use_complete_path = false
//! entity_key_prefix = "prefix:"
//!
//! [debug]
//! log_level = "debug"
//! log_format = "pretty"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};

/// Main configuration structure for `sideload.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SideloadConfig {
    /// How inclusions are requested.
    #[serde(default)]
    pub request: RequestConfig,

    /// Shape of the rendered response.
    #[serde(default)]
    pub response: ResponseConfig,

    /// How inclusions are collected.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,
}

impl SideloadConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);
        let config: Self =
            toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SchemaResult<()> {
        if self.request.query_param.trim().is_empty() {
            return Err(SchemaError::config("request.query_param must not be empty"));
        }
        if self.response.data_key == self.response.inclusions_key {
            return Err(SchemaError::config(format!(
                "response.data_key and response.inclusions_key are both `{}`",
                self.response.data_key
            )));
        }
        Ok(())
    }
}

/// Request parsing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RequestConfig {
    /// Query parameter carrying the comma separated inclusion paths.
    #[serde(default = "default_query_param")]
    pub query_param: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            query_param: default_query_param(),
        }
    }
}

fn default_query_param() -> String { "include".to_string() }

/// Response envelope configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseConfig {
    /// Key holding the primary payload.
    #[serde(default = "default_data_key")]
    pub data_key: String,

    /// Key holding the included entities.
    #[serde(default = "default_inclusions_key")]
    pub inclusions_key: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            data_key: default_data_key(),
            inclusions_key: default_inclusions_key(),
        }
    }
}

fn default_data_key() -> String { "data".to_string() }
fn default_inclusions_key() -> String { "inclusions".to_string() }

/// Strategy used to collect inclusions for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InclusionStrategy {
    /// Walk the in-memory object graph alongside the schema, reusing objects
    /// the data layer already loaded.
    #[default]
    Eager,
    /// Derive inclusion definitions from the schema once, then resolve
    /// identifiers from the rendered payload.
    Resolved,
}

impl InclusionStrategy {
    /// Check if this is the eager object-graph walk.
    pub fn is_eager(&self) -> bool {
        matches!(self, Self::Eager)
    }

    /// Check if this is the definition-based resolver.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

/// Loader configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// Collection strategy.
    #[serde(default)]
    pub strategy: InclusionStrategy,

    /// Match inclusions of inclusions against the complete field path
    /// (`?include=parent.tags`) instead of the parent's path (`?include=tags`).
    #[serde(default)]
    pub nested_inclusions_use_complete_path: bool,

    /// Prefix prepended to entity type keys in the inclusions mapping.
    #[serde(default)]
    pub entity_key_prefix: Option<String>,
}

/// Debug/logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: Option<String>,

    /// Log format (json, pretty, compact).
    pub log_format: Option<String>,
}

/// Expand environment variables in the format `${VAR_NAME}`.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return result;
    };

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let full_match = &cap[0];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    result
}
