//! Backend invocation layer
//!
//! The [`Backend`] is the single chokepoint for every outbound call. It
//! selects the base URI for a call's route, assembles the URL and query
//! string, serializes the body, executes the exchange, decodes the response
//! and maps the status code into [`ClientError`].
//!
//! A call fails on the first error in this order: URL, serialize,
//! authorization, send, decode, status.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pipekit_core::{ParamsContainer, Route};
use reqwest::header::{AUTHORIZATION, CONNECTION, CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{ContextToken, TokenSource, bearer_value};
use crate::context::CallContext;
use crate::error::{ClientError, Result};
use crate::path::ApiPath;

/// Hosted control-plane API
pub const DEFAULT_BASE_URI: &str = "https://pipekit.io/api";

/// In-cluster execution API
pub const DEFAULT_CLUSTER_BASE_URI: &str = "http://localhost:8080/api";

/// Default timeout applied by the transport built when none is supplied
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Placeholder for calls that send no request body
pub const NO_BODY: Option<&()> = None;

/// Backend configuration
///
/// Created once at startup and consumed by [`Backend::new`]. Each base URI
/// can be overridden independently.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URI of the hosted control plane
    pub base_uri: String,

    /// Base URI of the in-cluster execution API
    pub cluster_base_uri: String,

    /// Timeout for the transport built when `http_client` is not set
    pub timeout: Duration,

    /// Custom transport; its own timeout and pooling settings apply
    pub http_client: Option<Client>,

    /// Source of the `Authorization` header value
    pub token_source: Arc<dyn TokenSource>,
}

impl BackendConfig {
    /// Configuration pointing at the default endpoints
    pub fn new() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            cluster_base_uri: DEFAULT_CLUSTER_BASE_URI.to_string(),
            timeout: DEFAULT_TIMEOUT,
            http_client: None,
            token_source: Arc::new(ContextToken::new()),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognized environment variables, all optional:
    /// - PIPEKIT_BASE_URI (default: https://pipekit.io/api)
    /// - PIPEKIT_CLUSTER_BASE_URI (default: http://localhost:8080/api)
    /// - PIPEKIT_TOKEN (fallback token when the call context carries none)
    /// - PIPEKIT_TIMEOUT (seconds, default: 30)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(uri) = std::env::var("PIPEKIT_BASE_URI") {
            config.base_uri = uri;
        }

        if let Ok(uri) = std::env::var("PIPEKIT_CLUSTER_BASE_URI") {
            config.cluster_base_uri = uri;
        }

        if let Ok(token) = std::env::var("PIPEKIT_TOKEN") {
            config.token_source = Arc::new(ContextToken::with_fallback(token));
        }

        if let Ok(raw) = std::env::var("PIPEKIT_TIMEOUT") {
            let secs = raw.parse::<u64>().map_err(|_| {
                ClientError::Config(format!("PIPEKIT_TIMEOUT must be whole seconds, got {}", raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = uri.into();
        self
    }

    pub fn with_cluster_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.cluster_base_uri = uri.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_token_source(mut self, source: impl TokenSource + 'static) -> Self {
        self.token_source = Arc::new(source);
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, uri) in [
            ("base_uri", &self.base_uri),
            ("cluster_base_uri", &self.cluster_base_uri),
        ] {
            if uri.is_empty() {
                return Err(ClientError::Config(format!("{} cannot be empty", name)));
            }

            if !uri.starts_with("http://") && !uri.starts_with("https://") {
                return Err(ClientError::Config(format!(
                    "{} must start with http:// or https://, got: {}",
                    name, uri
                )));
            }
        }

        if self.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be greater than 0".into()));
        }

        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_uri", &self.base_uri)
            .field("cluster_base_uri", &self.cluster_base_uri)
            .field("timeout", &self.timeout)
            .field("http_client", &self.http_client.is_some())
            .finish_non_exhaustive()
    }
}

/// Executes routed calls against the Pipekit APIs
///
/// Immutable after construction and safe to share across tasks.
#[derive(Clone)]
pub struct Backend {
    base_uri: Url,
    cluster_base_uri: Url,
    client: Client,
    token_source: Arc<dyn TokenSource>,
}

impl Backend {
    /// Builds a backend, parsing both base URIs up front
    pub fn new(config: BackendConfig) -> Result<Self> {
        config.validate()?;

        let base_uri = parse_base_uri(&config.base_uri)?;
        let cluster_base_uri = parse_base_uri(&config.cluster_base_uri)?;

        let client = match config.http_client {
            Some(client) => client,
            None => Client::builder()
                .timeout(config.timeout)
                .pool_max_idle_per_host(0)
                .build()?,
        };

        Ok(Self {
            base_uri,
            cluster_base_uri,
            client,
            token_source: config.token_source,
        })
    }

    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    pub fn cluster_base_uri(&self) -> &Url {
        &self.cluster_base_uri
    }

    /// Base URI serving `route`
    pub fn base_uri_for(&self, route: Route) -> &Url {
        match route {
            Route::Hosted => &self.base_uri,
            Route::InCluster => &self.cluster_base_uri,
        }
    }

    /// Invokes the backend without decoding the response body
    ///
    /// Returns the response status on success.
    pub async fn call<B>(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &ApiPath,
        params: Option<&dyn ParamsContainer>,
        body: Option<&B>,
    ) -> Result<StatusCode>
    where
        B: Serialize + ?Sized,
    {
        let (status, bytes) =
            race_context(ctx, self.exchange(ctx, method, path, params, body, false)).await?;
        check_status(status, &bytes)?;
        Ok(status)
    }

    /// Invokes the backend and decodes the response body into `T`
    ///
    /// Returns `None` when the response carried no body. A body that fails
    /// to decode is an error even when the status signals a failure.
    pub async fn call_json<B, T>(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &ApiPath,
        params: Option<&dyn ParamsContainer>,
        body: Option<&B>,
    ) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (status, bytes) =
            race_context(ctx, self.exchange(ctx, method, path, params, body, true)).await?;

        let decoded = decode_body(&bytes)?;
        check_status(status, &bytes)?;
        Ok(decoded)
    }

    /// Builds the full URL for a routed path plus optional query params
    pub fn format_url(&self, path: &ApiPath, params: Option<&dyn ParamsContainer>) -> Url {
        let mut url = self.base_uri_for(path.route()).clone();
        let joined = join_paths(url.path(), path.as_str());
        url.set_path(&joined);

        let query = params.map(|p| p.params()).filter(|p| !p.is_empty());
        url.set_query(query.map(|p| p.encode()).as_deref());

        url
    }

    /// Runs the exchange, reading the body only when it will be decoded or
    /// reported. The response is released before returning.
    async fn exchange<B>(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &ApiPath,
        params: Option<&dyn ParamsContainer>,
        body: Option<&B>,
        want_body: bool,
    ) -> Result<(StatusCode, Vec<u8>)>
    where
        B: Serialize + ?Sized,
    {
        let url = self.format_url(path, params);

        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(ClientError::Serialize)?;

        let token = self.token_source.token(ctx)?;
        let authorization = HeaderValue::from_str(&bearer_value(&token)?)
            .map_err(|_| ClientError::Auth("token is not a valid header value".into()))?;

        debug!(
            "Dispatching {} {} via {} endpoint",
            method,
            url,
            path.route()
        );

        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(AUTHORIZATION, authorization)
            .header(CONNECTION, HeaderValue::from_static("close"));

        if let Some(payload) = payload {
            trace!("Request body: {} bytes", payload.len());
            request = request.body(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("Received status {}", status);

        let bytes = if want_body || status.as_u16() >= 400 {
            response.bytes().await?.to_vec()
        } else {
            Vec::new()
        };
        trace!("Response body: {} bytes", bytes.len());

        Ok((status, bytes))
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("base_uri", &self.base_uri.as_str())
            .field("cluster_base_uri", &self.cluster_base_uri.as_str())
            .finish_non_exhaustive()
    }
}

/// Races `fut` against the context's cancellation token and deadline
async fn race_context<F, T>(ctx: &CallContext, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if ctx.is_cancelled() {
        return Err(ClientError::Cancelled);
    }

    let deadline = async {
        match ctx.deadline() {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = ctx.cancellation().cancelled() => Err(ClientError::Cancelled),
        _ = deadline => Err(ClientError::DeadlineExceeded),
        result = fut => result,
    }
}

fn parse_base_uri(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(ClientError::Config(format!("{} cannot be used as a base URI", raw)));
    }
    Ok(url)
}

/// Joins path segments the way a filesystem path join would
///
/// Empty and `.` segments are dropped and `..` removes the previous segment.
fn join_paths(base: &str, path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(ClientError::Decode)
}

/// Maps any status of 400 or above to an API error
fn check_status(status: StatusCode, body: &[u8]) -> Result<()> {
    if status.as_u16() < 400 {
        return Ok(());
    }

    let text = String::from_utf8_lossy(body);
    let message = match text.trim() {
        "" => status.canonical_reason().unwrap_or("Unknown error").to_string(),
        text => text.to_string(),
    };

    Err(ClientError::api_error(status.as_u16(), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipekit_core::Params;

    fn backend() -> Backend {
        Backend::new(
            BackendConfig::new()
                .with_base_uri("https://hosted.example.com/api/")
                .with_cluster_base_uri("http://cluster.local:8080/api"),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let backend = Backend::new(BackendConfig::default()).unwrap();
        assert_eq!(backend.base_uri().as_str(), "https://pipekit.io/api");
        assert_eq!(
            backend.cluster_base_uri().as_str(),
            "http://localhost:8080/api"
        );
    }

    #[test]
    fn test_route_selects_base_uri() {
        let backend = backend();

        let hosted = ApiPath::new(Route::Hosted, "v1/users/{u}", &[("u", "u1")]).unwrap();
        let url = backend.format_url(&hosted, None);
        assert_eq!(
            url.as_str(),
            "https://hosted.example.com/api/events-handler/v1/users/u1"
        );

        let cluster = ApiPath::new(Route::InCluster, "v1/users/{u}", &[("u", "u1")]).unwrap();
        let url = backend.format_url(&cluster, None);
        assert_eq!(url.as_str(), "http://cluster.local:8080/api/plumbing/v1/users/u1");
    }

    #[test]
    fn test_format_url_appends_sorted_query() {
        let backend = backend();
        let path = ApiPath::new(Route::Hosted, "v1/runs", &[]).unwrap();
        let params: Params = [("z", "1"), ("a", "x y")].into_iter().collect();

        let url = backend.format_url(&path, Some(&params));
        assert_eq!(url.query(), Some("a=x+y&z=1"));

        let url = backend.format_url(&path, Some(&Params::new()));
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_format_url_keeps_escaped_segments() {
        let backend = backend();
        let path = ApiPath::new(
            Route::Hosted,
            "v1/users/{u}/pipes/{p}",
            &[("u", "a b"), ("p", "c/d")],
        )
        .unwrap();

        let url = backend.format_url(&path, None);
        assert_eq!(
            url.path(),
            "/api/events-handler/v1/users/a%20b/pipes/c%2Fd"
        );
    }

    #[test]
    fn test_format_url_rejects_dot_identifiers() {
        for id in [".", ".."] {
            let err = ApiPath::new(
                Route::Hosted,
                "v1/users/{u}/pipes/{p}/runs/{r}",
                &[("u", "u1"), ("p", id), ("r", id)],
            )
            .unwrap_err();
            assert!(matches!(err, ClientError::InvalidPath(_)));
        }

        let path = ApiPath::new(
            Route::Hosted,
            "v1/users/{u}/pipes/{p}/runs/{r}",
            &[("u", "u1"), ("p", "..x"), ("r", "...")],
        )
        .unwrap();
        assert_eq!(
            backend().format_url(&path, None).path(),
            "/api/events-handler/v1/users/u1/pipes/..x/runs/..."
        );
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/api/", "/v1//runs"), "/api/v1/runs");
        assert_eq!(join_paths("/", "v1"), "/v1");
        assert_eq!(join_paths("/api/./x/..", "v1"), "/api/v1");
        assert_eq!(join_paths("", ""), "/");
    }

    #[test]
    fn test_status_boundary() {
        assert!(check_status(StatusCode::from_u16(399).unwrap(), b"").is_ok());
        assert!(check_status(StatusCode::NO_CONTENT, b"").is_ok());

        match check_status(StatusCode::BAD_REQUEST, b"") {
            Err(ClientError::ApiError { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Bad Request");
            }
            other => panic!("expected API error, got {:?}", other),
        }

        match check_status(StatusCode::INTERNAL_SERVER_ERROR, b" upstream down\n") {
            Err(ClientError::ApiError { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream down");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_body() {
        let empty: Option<serde_json::Value> = decode_body(b"  \n").unwrap();
        assert!(empty.is_none());

        let value: Option<serde_json::Value> = decode_body(br#"{"a":1}"#).unwrap();
        assert_eq!(value.unwrap()["a"], 1);

        let err = decode_body::<serde_json::Value>(b"<html>").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_config_validation() {
        let mut config = BackendConfig::default();
        assert!(config.validate().is_ok());

        config.base_uri = String::new();
        assert!(config.validate().is_err());

        config.base_uri = "ftp://example.com".to_string();
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        config.base_uri = DEFAULT_BASE_URI.to_string();
        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_base_uri_fails_fast() {
        let result = Backend::new(BackendConfig::new().with_cluster_base_uri("http://"));
        assert!(result.is_err());
    }
}
