//! Axum framework integration for sideload.
//!
//! This crate wires the inclusion renderer into
//! [Axum](https://github.com/tokio-rs/axum) handlers.
//!
//! # Features
//!
//! - **Layer**: [`SideloadLayer`] parses the `include` query parameter once
//!   per request and makes the shared [`Sideload`] state available
//! - **Extractor**: [`IncludeQuery`] hands the requested inclusions to
//!   handlers
//! - **Response**: [`InclusionResponse`] carries the rendered envelope
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use axum::{Extension, Router, routing::get};
//! use sideload_axum::{IncludeQuery, InclusionResponse, Result, Sideload, SideloadLayer};
//!
//! async fn list_tags(
//!     Extension(sideload): Extension<Sideload>,
//!     IncludeQuery(include): IncludeQuery,
//! ) -> Result<InclusionResponse> {
//!     let response = RenderResponse::serialized(sideload.registry().get("TagSchema")?, tags());
//!     sideload.render(&store, &serializer, &include, response)
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let sideload = Sideload::from_config_file(Arc::new(registry()), "sideload.toml").unwrap();
//!
//!     let app = Router::new()
//!         .route("/tags", get(list_tags))
//!         .layer(SideloadLayer::new(sideload));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use axum::{
    Json,
    extract::FromRequestParts,
    http::{Request, StatusCode, request::Parts},
    response::IntoResponse,
};
use serde_json::{Value, json};
use thiserror::Error;
use tower::{Layer, Service};
use tracing::{debug, error, info};

use sideload_core::{
    Context, DataStore, ErrorCode, IncludeRequest, InclusionError, InclusionRenderer,
    RenderResponse, Serializer,
};
use sideload_schema::{SchemaError, SchemaRegistry, SideloadConfig};

// Re-export key types
pub use sideload_core::prelude::*;

/// Query parameter read when no [`SideloadLayer`] is installed.
pub const DEFAULT_QUERY_PARAM: &str = "include";

/// Errors that can occur while rendering inclusions in a handler.
#[derive(Error, Debug)]
pub enum SideloadAxumError {
    /// The inclusion engine failed.
    #[error(transparent)]
    Inclusion(#[from] InclusionError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The response carried a status code HTTP does not know.
    #[error("invalid status code: {0}")]
    InvalidStatus(u16),
}

impl From<SchemaError> for SideloadAxumError {
    fn from(err: SchemaError) -> Self {
        Self::Inclusion(err.into())
    }
}

impl SideloadAxumError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Inclusion(err) if err.code == ErrorCode::StoreFailure => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Inclusion(_) | Self::ConfigError(_) | Self::InvalidStatus(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SideloadAxumError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        error!(status = status.as_u16(), error = %self, "Rendering inclusions failed");
        let code = match &self {
            Self::Inclusion(err) => err.code,
            Self::ConfigError(_) => ErrorCode::InvalidConfiguration,
            Self::InvalidStatus(_) => ErrorCode::Internal,
        };
        let body = json!({"error": {"code": code.code(), "message": self.to_string()}});
        (status, Json(body)).into_response()
    }
}

/// Result type for sideload-axum operations.
pub type Result<T> = std::result::Result<T, SideloadAxumError>;

/// Shared inclusion state: the schema registry and a configured renderer.
///
/// Cheap to clone; clones share the renderer and its definition cache.
#[derive(Clone)]
pub struct Sideload {
    registry: Arc<SchemaRegistry>,
    renderer: Arc<InclusionRenderer>,
}

impl Sideload {
    /// Create state with the default configuration.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::from_config(registry, &SideloadConfig::default())
    }

    /// Create state from configuration.
    pub fn from_config(registry: Arc<SchemaRegistry>, config: &SideloadConfig) -> Self {
        info!(
            query_param = %config.request.query_param,
            strategy = ?config.loader.strategy,
            "Sideload state created"
        );
        Self {
            registry,
            renderer: Arc::new(InclusionRenderer::from_config(config)),
        }
    }

    /// Create state from a `sideload.toml` file.
    pub fn from_config_file(registry: Arc<SchemaRegistry>, path: impl AsRef<Path>) -> Result<Self> {
        let config = SideloadConfig::from_file(path)
            .map_err(|e| SideloadAxumError::ConfigError(e.to_string()))?;
        Ok(Self::from_config(registry, &config))
    }

    /// Get the schema registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Get the renderer.
    pub fn renderer(&self) -> &InclusionRenderer {
        &self.renderer
    }

    /// Query parameter carrying the requested inclusions.
    pub fn query_param(&self) -> &str {
        self.renderer.query_param()
    }

    /// Render a response with its inclusions.
    pub fn render<D, S>(
        &self,
        store: &D,
        serializer: &S,
        include: &IncludeRequest,
        response: RenderResponse<D::Object>,
    ) -> Result<InclusionResponse>
    where
        D: DataStore,
        S: Serializer<D::Object>,
    {
        let status = StatusCode::from_u16(response.status_code())
            .map_err(|_| SideloadAxumError::InvalidStatus(response.status_code()))?;
        let ctx = Context::new(&self.registry, store, serializer);
        let body = self.renderer.render(ctx, include, response)?;
        Ok(InclusionResponse::new(status, body))
    }
}

/// Read the requested inclusions from a query string.
///
/// When the parameter repeats, the last occurrence wins.
pub fn include_from_query(query: Option<&str>, param: &str) -> IncludeRequest {
    let value = query.and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| key == param)
            .map(|(_, value)| value.into_owned())
            .last()
    });
    IncludeRequest::parse(value.as_deref())
}

/// Tower layer parsing the include parameter of every request.
///
/// Inserts the parsed [`IncludeRequest`] and the [`Sideload`] state into the
/// request extensions.
#[derive(Clone)]
pub struct SideloadLayer {
    sideload: Sideload,
}

impl SideloadLayer {
    /// Create a new sideload layer.
    pub fn new(sideload: Sideload) -> Self {
        Self { sideload }
    }

    /// Get the shared state.
    pub fn sideload(&self) -> &Sideload {
        &self.sideload
    }
}

impl<S> Layer<S> for SideloadLayer {
    type Service = SideloadMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SideloadMiddleware {
            inner,
            sideload: self.sideload.clone(),
        }
    }
}

/// Tower middleware service for sideload.
#[derive(Clone)]
pub struct SideloadMiddleware<S> {
    inner: S,
    sideload: Sideload,
}

impl<S, ReqBody> Service<Request<ReqBody>> for SideloadMiddleware<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let include = include_from_query(request.uri().query(), self.sideload.query_param());
        debug!(include = ?include, "SideloadMiddleware parsed include parameter");
        request.extensions_mut().insert(include);
        request.extensions_mut().insert(self.sideload.clone());
        self.inner.call(request)
    }
}

/// Extractor for the inclusions requested by the client.
///
/// Uses the request parsed by [`SideloadLayer`] when installed, otherwise
/// reads the [`DEFAULT_QUERY_PARAM`] parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeQuery(pub IncludeRequest);

impl<S> FromRequestParts<S> for IncludeQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        if let Some(include) = parts.extensions.get::<IncludeRequest>() {
            return Ok(Self(include.clone()));
        }
        Ok(Self(include_from_query(parts.uri.query(), DEFAULT_QUERY_PARAM)))
    }
}

/// A rendered response: status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct InclusionResponse {
    status: StatusCode,
    body: Value,
}

impl InclusionResponse {
    /// Create a response.
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Take the body.
    pub fn into_body(self) -> Value {
        self.body
    }
}

impl IntoResponse for InclusionResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        IncludeQuery, InclusionResponse, Result, Sideload, SideloadAxumError, SideloadLayer,
        SideloadMiddleware,
    };
    pub use sideload_core::prelude::*;
}
