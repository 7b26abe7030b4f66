//! Pipekit HTTP Client
//!
//! A type-safe client for submitting pipes to the Pipekit workflow service
//! and stopping their runs.
//!
//! Every call is routed either through the hosted control plane or directly
//! to the in-cluster execution API. The [`Backend`] owns both base URIs and
//! performs URL assembly, JSON serialization, the HTTP exchange and status
//! mapping; resource clients such as [`PipesApi`] only decide the route and
//! build the path.
//!
//! # Example
//!
//! ```no_run
//! use pipekit_client::{BackendConfig, CallContext, PipekitClient, PipesClient};
//! use pipekit_core::domain::pipe::Pipe;
//! use pipekit_core::dto::options::{CreateOptions, DeleteOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PipekitClient::new(BackendConfig::default())?;
//!     let ctx = CallContext::new().with_auth_token("my-token");
//!
//!     let mut pipe = Pipe::new("user-1", "pipe-1");
//!     client.pipes().create(&ctx, &mut pipe, CreateOptions::default()).await?;
//!     println!("Started run: {}", pipe.run_id());
//!
//!     client
//!         .pipes()
//!         .stop(&ctx, "user-1", "pipe-1", pipe.run_id(), DeleteOptions::default())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod backend;
pub mod context;
pub mod error;
pub mod path;
pub mod pipes;

// Re-export commonly used types
pub use auth::{ContextToken, StaticToken, TokenSource};
pub use backend::{
    Backend, BackendConfig, DEFAULT_BASE_URI, DEFAULT_CLUSTER_BASE_URI, DEFAULT_TIMEOUT,
};
pub use context::CallContext;
pub use error::{ClientError, Result};
pub use path::ApiPath;
pub use pipes::{PipesApi, PipesClient};

use std::sync::Arc;

/// Composite handle over every Pipekit API
///
/// Builds a single [`Backend`] and wires each resource client to it.
#[derive(Debug, Clone)]
pub struct PipekitClient {
    backend: Arc<Backend>,
    pipes: PipesApi,
}

impl PipekitClient {
    /// Create a new client from a backend configuration
    ///
    /// # Example
    /// ```
    /// use pipekit_client::{BackendConfig, PipekitClient};
    ///
    /// let client = PipekitClient::new(
    ///     BackendConfig::default().with_cluster_base_uri("http://argo.internal:2746/api"),
    /// )
    /// .unwrap();
    /// assert_eq!(client.backend().base_uri().as_str(), "https://pipekit.io/api");
    /// ```
    pub fn new(config: BackendConfig) -> Result<Self> {
        Ok(Self::from_backend(Arc::new(Backend::new(config)?)))
    }

    /// Wire the resource clients to an existing backend
    pub fn from_backend(backend: Arc<Backend>) -> Self {
        Self {
            pipes: PipesApi::new(Arc::clone(&backend)),
            backend,
        }
    }

    /// Access the pipes API
    pub fn pipes(&self) -> &PipesApi {
        &self.pipes
    }

    /// The shared backend
    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }
}
