//! Asynchronous swarm client implementation.

use crate::models::{InitSwarmOptions, JoinSwarmOptions, LeaveSwarmOptions, UpdateSwarmOptions};
use crate::Result;
use docker_core::client::{ClientConfig, SWARM_DEFAULT_TIMEOUT};
use docker_core::config::DockerClientConfig;
use docker_core::{DoOptions, HttpTransport, HttpTransportBuilder, Transport};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("docker-swarm/", env!("CARGO_PKG_VERSION"));

const INIT_PATH: &str = "/swarm/init";
const JOIN_PATH: &str = "/swarm/join";
const LEAVE_PATH: &str = "/swarm/leave";
const UPDATE_PATH: &str = "/swarm/update";

/// Builder for [`SwarmClient`] over HTTP.
#[derive(Debug, Clone)]
pub struct SwarmClientBuilder {
    inner: HttpTransportBuilder,
}

impl SwarmClientBuilder {
    /// Create a builder for the daemon at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let builder =
            HttpTransportBuilder::new(base_url, Duration::from_secs(SWARM_DEFAULT_TIMEOUT))?
                .with_user_agent(USER_AGENT);

        Ok(Self { inner: builder })
    }

    /// Create a builder from a validated daemon configuration.
    pub fn from_config(config: &DockerClientConfig) -> Result<Self> {
        let builder = HttpTransportBuilder::from_config(config)?.with_user_agent(USER_AGENT);
        Ok(Self { inner: builder })
    }

    /// Pin requests to an Engine API version (e.g. `1.24`).
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.inner = self.inner.with_api_version(version);
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Configure HTTP basic authentication credentials.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.inner = self.inner.with_basic_auth(username, password);
        self
    }

    /// Configure an X-Auth-Token header.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.inner = self.inner.with_token(token);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<SwarmClient> {
        let transport: HttpTransport = self.inner.build()?;
        Ok(SwarmClient::with_transport(Arc::new(transport)))
    }
}

/// Swarm lifecycle client.
///
/// Holds no per-call state; clones share the underlying transport.
#[derive(Clone)]
pub struct SwarmClient {
    transport: Arc<dyn Transport>,
}

impl SwarmClient {
    /// Construct an HTTP client directly from the base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        SwarmClientBuilder::new(base_url)?.build()
    }

    /// Construct an HTTP client from a validated daemon configuration.
    pub fn from_config(config: &DockerClientConfig) -> Result<Self> {
        SwarmClientBuilder::from_config(config)?.build()
    }

    /// Use a custom transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Initialize a new swarm with this node as its first manager.
    ///
    /// Returns the ID of the node.
    pub async fn init_swarm(&self, options: InitSwarmOptions) -> Result<String> {
        let InitSwarmOptions { request, context } = options;
        let do_options = DoOptions::new()
            .with_json(&request)?
            .with_context(context);

        let response = self
            .transport
            .execute(Method::POST, INIT_PATH, do_options)
            .await?;

        // The response is consumed here and released on both arms.
        let node_id = response.json::<String>()?;
        debug!(node_id = %node_id, "swarm initialized");
        Ok(node_id)
    }

    /// Join an existing swarm.
    pub async fn join_swarm(&self, options: JoinSwarmOptions) -> Result<()> {
        let JoinSwarmOptions { request, context } = options;
        let do_options = DoOptions::new()
            .with_json(&request)?
            .with_context(context);

        self.transport
            .execute(Method::POST, JOIN_PATH, do_options)
            .await
            .map(|_| ())
    }

    /// Leave the swarm this node belongs to.
    pub async fn leave_swarm(&self, options: LeaveSwarmOptions) -> Result<()> {
        let do_options = DoOptions::new()
            .with_query(options.to_params())
            .with_context(options.context);

        self.transport
            .execute(Method::POST, LEAVE_PATH, do_options)
            .await
            .map(|_| ())
    }

    /// Update the swarm's configuration.
    pub async fn update_swarm(&self, options: UpdateSwarmOptions) -> Result<()> {
        let do_options = DoOptions::new()
            .with_query(options.to_params())
            .with_json(&options.swarm)?
            .with_context(options.context);

        self.transport
            .execute(Method::POST, UPDATE_PATH, do_options)
            .await
            .map(|_| ())
    }
}
