//! Configuration module
//!
//! Handles CLI configuration: endpoint URIs, token and timeout.

use std::time::Duration;

use anyhow::{Context, Result};
use pipekit_client::{BackendConfig, ContextToken, PipekitClient};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Hosted Pipekit API base URI
    pub base_uri: String,

    /// In-cluster execution API base URI
    pub cluster_base_uri: String,

    /// Token sent with every request when set
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Maps CLI settings onto a backend configuration
    pub fn backend_config(&self) -> BackendConfig {
        let token_source = match &self.token {
            Some(token) => ContextToken::with_fallback(token.clone()),
            None => ContextToken::new(),
        };

        BackendConfig::new()
            .with_base_uri(self.base_uri.clone())
            .with_cluster_base_uri(self.cluster_base_uri.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_token_source(token_source)
    }

    /// Builds the API client
    pub fn client(&self) -> Result<PipekitClient> {
        PipekitClient::new(self.backend_config()).context("Invalid Pipekit client configuration")
    }
}
