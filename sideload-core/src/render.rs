//! Response rendering with an inclusions envelope.
//!
//! [`InclusionRenderer`] turns a [`RenderResponse`] into the JSON body sent
//! to the client:
//!
//! ```json
//! {
//!     "data": {"id": 1, "tags": [1, 2]},
//!     "inclusions": {"app.Tag": [{"id": 1}, {"id": 2}]}
//! }
//! ```
//!
//! Error responses, raw payloads and custom actions that cannot produce
//! inclusions are passed through untouched. Pagination keys of a paginated
//! response sit next to `data` and `inclusions`.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use sideload_schema::{FieldKind, InclusionStrategy, Schema, SchemaRegistry, SideloadConfig};
use smol_str::SmolStr;
use tracing::debug;

use crate::cache::DefinitionCache;
use crate::error::InclusionResult;
use crate::inclusions::{
    EntityKeyFormat, InclusionLoader, InclusionMap, extract_inclusions, hoist,
};
use crate::request::IncludeRequest;
use crate::traits::{Context, DataStore, Instance, Serializer};

/// Key of the page items in a paginated body.
pub const RESULTS_KEY: &str = "results";

/// The view action that produced a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Action {
    /// No information about the action.
    #[default]
    Unknown,
    /// The view has an action slot, but it is empty.
    Unnamed,
    /// A standard action such as `list` or `retrieve`.
    Standard(SmolStr),
    /// An extra action defined on the view.
    Custom(SmolStr),
}

impl Action {
    /// A standard action.
    pub fn standard(name: impl Into<SmolStr>) -> Self {
        Self::Standard(name.into())
    }

    /// A custom action.
    pub fn custom(name: impl Into<SmolStr>) -> Self {
        Self::Custom(name.into())
    }
}

/// Payload of a response.
#[derive(Debug, Clone)]
pub enum ResponseBody<O> {
    /// Arbitrary JSON not produced by a serializer.
    Raw(Value),
    /// Objects to render through a schema.
    Serialized {
        /// Schema the objects render with.
        schema: Arc<Schema>,
        /// Rendered object(s).
        instance: Instance<O>,
        /// Pagination keys, for one page of a list.
        page: Option<Map<String, Value>>,
    },
}

/// A response about to be rendered.
#[derive(Debug, Clone)]
pub struct RenderResponse<O> {
    status: u16,
    action: Action,
    body: ResponseBody<O>,
}

impl<O> RenderResponse<O> {
    /// A response carrying arbitrary JSON.
    pub fn raw(data: Value) -> Self {
        Self::new(ResponseBody::Raw(data))
    }

    /// A response rendering `instance` through `schema`.
    pub fn serialized(schema: Arc<Schema>, instance: Instance<O>) -> Self {
        Self::new(ResponseBody::Serialized {
            schema,
            instance,
            page: None,
        })
    }

    /// One page of a list, with its pagination keys (`count`, `next`, ...).
    pub fn paginated(schema: Arc<Schema>, objects: Vec<O>, page: Map<String, Value>) -> Self {
        Self::new(ResponseBody::Serialized {
            schema,
            instance: Instance::Many(objects),
            page: Some(page),
        })
    }

    fn new(body: ResponseBody<O>) -> Self {
        Self {
            status: 200,
            action: Action::Unknown,
            body,
        }
    }

    /// Set the HTTP status code.
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set the action that produced the response.
    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Get the HTTP status code.
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Get the body.
    pub fn body(&self) -> &ResponseBody<O> {
        &self.body
    }
}

/// Check if `schema` or any schema nested in it declares inclusions.
pub fn has_inclusion_serializers(registry: &SchemaRegistry, schema: &Schema) -> InclusionResult<bool> {
    let mut visited = HashSet::new();
    has_inclusions_in(registry, schema, &mut visited)
}

fn has_inclusions_in(
    registry: &SchemaRegistry,
    schema: &Schema,
    visited: &mut HashSet<SmolStr>,
) -> InclusionResult<bool> {
    if schema.has_inclusions() {
        return Ok(true);
    }
    if !visited.insert(SmolStr::new(schema.name())) {
        return Ok(false);
    }
    for field in schema.fields() {
        if let FieldKind::Nested(nested) = &field.kind {
            let nested = registry.resolve(&nested.schema)?;
            if has_inclusions_in(registry, &nested, visited)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Check if the inclusion machinery can be skipped for a response.
///
/// Only custom actions whose schema tree declares no inclusion at all are
/// skipped.
pub fn should_skip_inclusions(
    registry: &SchemaRegistry,
    action: &Action,
    schema: &Schema,
) -> InclusionResult<bool> {
    match action {
        Action::Custom(_) => Ok(!has_inclusion_serializers(registry, schema)?),
        _ => Ok(false),
    }
}

/// Renders responses with an inclusions envelope.
#[derive(Debug)]
pub struct InclusionRenderer {
    query_param: String,
    data_key: String,
    inclusions_key: String,
    strategy: InclusionStrategy,
    complete_path: bool,
    keys: EntityKeyFormat,
    cache: DefinitionCache,
}

impl Default for InclusionRenderer {
    fn default() -> Self {
        Self::from_config(&SideloadConfig::default())
    }
}

impl InclusionRenderer {
    /// Create a renderer with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer from configuration.
    pub fn from_config(config: &SideloadConfig) -> Self {
        let keys = match &config.loader.entity_key_prefix {
            Some(prefix) => EntityKeyFormat::prefixed(prefix.clone()),
            None => EntityKeyFormat::plain(),
        };
        Self {
            query_param: config.request.query_param.clone(),
            data_key: config.response.data_key.clone(),
            inclusions_key: config.response.inclusions_key.clone(),
            strategy: config.loader.strategy,
            complete_path: config.loader.nested_inclusions_use_complete_path,
            keys,
            cache: DefinitionCache::new(),
        }
    }

    /// Set the key holding the primary payload.
    pub fn data_key(mut self, key: impl Into<String>) -> Self {
        self.data_key = key.into();
        self
    }

    /// Set the key holding the included entities.
    pub fn inclusions_key(mut self, key: impl Into<String>) -> Self {
        self.inclusions_key = key.into();
        self
    }

    /// Set the collection strategy.
    pub fn strategy(mut self, strategy: InclusionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Match inclusions of included entities against the complete field
    /// path. Only the eager strategy distinguishes the two.
    pub fn nested_inclusions_use_complete_path(mut self, enabled: bool) -> Self {
        self.complete_path = enabled;
        self
    }

    /// Set how entity types are written as keys.
    pub fn entity_keys(mut self, keys: EntityKeyFormat) -> Self {
        self.keys = keys;
        self
    }

    /// Query parameter carrying the requested inclusion paths.
    pub fn query_param(&self) -> &str {
        &self.query_param
    }

    /// Get the definition cache used by the resolved strategy.
    pub fn cache(&self) -> &DefinitionCache {
        &self.cache
    }

    /// Collect the inclusions of `instance`, rendered as `payload`.
    pub fn inclusions<D, S>(
        &self,
        ctx: Context<'_, D, S>,
        request: &IncludeRequest,
        schema: &Schema,
        instance: &Instance<D::Object>,
        payload: &Value,
    ) -> InclusionResult<InclusionMap>
    where
        D: DataStore,
        S: Serializer<D::Object>,
    {
        match self.strategy {
            InclusionStrategy::Eager => InclusionLoader::new(ctx, request.allowed_paths())
                .nested_inclusions_use_complete_path(self.complete_path)
                .entity_keys(self.keys.clone())
                .inclusions_dict(schema, instance),
            InclusionStrategy::Resolved => {
                let definitions = self.cache.definitions(ctx.registry, schema)?;
                let inclusions = extract_inclusions(&ctx, schema, request, payload, &definitions)?;
                hoist(&ctx, inclusions, &self.keys)
            }
        }
    }

    /// Render a response.
    pub fn render<D, S>(
        &self,
        ctx: Context<'_, D, S>,
        request: &IncludeRequest,
        response: RenderResponse<D::Object>,
    ) -> InclusionResult<Value>
    where
        D: DataStore,
        S: Serializer<D::Object>,
    {
        let RenderResponse {
            status,
            action,
            body,
        } = response;

        let (schema, instance, page) = match body {
            ResponseBody::Raw(data) => return Ok(data),
            ResponseBody::Serialized {
                schema,
                instance,
                page,
            } => (schema, instance, page),
        };
        let data = ctx.serializer.render_instance(&schema, &instance)?;

        if status >= 400 {
            return Ok(plain(data, page));
        }
        if action == Action::Unnamed {
            debug!("Skipping inclusions for view that has no action");
            return Ok(plain(data, page));
        }
        if should_skip_inclusions(ctx.registry, &action, &schema)? {
            debug!(action = ?action, schema = schema.name(), "Skipping inclusion machinery for custom action");
            return Ok(plain(data, page));
        }

        let inclusions = self.inclusions(ctx, request, &schema, &instance, &data)?;

        let mut envelope = Map::new();
        envelope.insert(self.data_key.clone(), data);
        envelope.insert(
            self.inclusions_key.clone(),
            Value::Object(
                inclusions
                    .into_iter()
                    .map(|(key, items)| (key, Value::Array(items)))
                    .collect(),
            ),
        );
        for (key, value) in page.into_iter().flatten() {
            if key != RESULTS_KEY {
                envelope.insert(key, value);
            }
        }
        Ok(Value::Object(envelope))
    }
}

/// The body as it renders without inclusions.
fn plain(data: Value, page: Option<Map<String, Value>>) -> Value {
    match page {
        None => data,
        Some(mut page) => {
            page.insert(RESULTS_KEY.to_string(), data);
            Value::Object(page)
        }
    }
}
