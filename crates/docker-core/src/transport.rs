//! Request execution shared by every API client.
//!
//! API clients describe a request with a method, a path and [`DoOptions`], and
//! hand it to a [`Transport`]. The transport owns everything below that line:
//! URL building, headers, authentication, status mapping and cancellation.
//! [`HttpTransport`] is the `reqwest`-backed implementation.

use crate::client::{ClientConfig, DEFAULT_TIMEOUT};
use crate::config::DockerClientConfig;
use crate::context::RequestContext;
use crate::query::QueryParams;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("docker-core/", env!("CARGO_PKG_VERSION"));

/// Per-request options handed to [`Transport::execute`].
#[derive(Debug, Clone, Default)]
pub struct DoOptions {
    /// JSON payload, already encoded.
    pub data: Option<serde_json::Value>,
    /// Send a JSON body even when `data` is absent (encoded as `null`).
    pub force_json: bool,
    /// Query string pairs.
    pub query: Vec<(&'static str, String)>,
    /// Caller's cancellation handle.
    pub context: RequestContext,
}

impl DoOptions {
    /// Options for a request with no body and no query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `data` as the JSON body and force a JSON content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if `data` cannot be represented as JSON.
    pub fn with_json<T>(mut self, data: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(data).map_err(|err| Error::Encode(err.to_string()))?;
        self.data = Some(value);
        self.force_json = true;
        Ok(self)
    }

    /// Attach query parameters.
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query.into_pairs();
        self
    }

    /// Attach the caller's cancellation context.
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Returns true when a JSON body will be sent.
    #[must_use]
    pub const fn sends_json(&self) -> bool {
        self.data.is_some() || self.force_json
    }
}

/// A successful daemon response.
///
/// The body has been read in full; dropping the response releases it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    body: Bytes,
}

impl Response {
    /// Wrap a status and body.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// HTTP status returned by the daemon.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Raw response body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response, decoding the first JSON value in the body.
    ///
    /// Anything after that value is ignored, as the daemon's own client does.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body is empty or its first value is
    /// not valid JSON for `T`.
    pub fn json<T>(self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut values = serde_json::Deserializer::from_slice(&self.body).into_iter::<T>();
        match values.next() {
            Some(value) => value.map_err(|err| Error::Decode(err.to_string())),
            None => Err(Error::Decode("empty response body".to_string())),
        }
    }
}

/// Executes a single request against the daemon.
///
/// Implementations must be safe to share between concurrent callers.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `method path` with `options`, returning the response on a 2xx status.
    ///
    /// # Errors
    ///
    /// Returns an error for network failures, non-success statuses and
    /// cancellation.
    async fn execute(&self, method: Method, path: &str, options: DoOptions) -> Result<Response>;
}

/// Error body returned by the daemon.
#[derive(Debug, Deserialize)]
struct DaemonErrorBody {
    message: String,
}

fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<DaemonErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    base_url: Url,
    api_version: Option<String>,
    http_config: ClientConfig,
    user_agent: String,
    basic_auth: Option<(String, SecretString)>,
    token: Option<SecretString>,
    tls_verify: bool,
    tls_ca_cert: Option<PathBuf>,
}

impl HttpTransportBuilder {
    /// Create a builder for the daemon at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let mut url = Url::parse(base_url.as_ref()).map_err(|err| {
            Error::ConfigError(format!(
                "Invalid daemon URL `{}`: {err}",
                base_url.as_ref()
            ))
        })?;

        // Joined paths must land under the base path, not replace its last segment.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            api_version: None,
            http_config: ClientConfig::new().with_timeout(timeout),
            user_agent: USER_AGENT.to_string(),
            basic_auth: None,
            token: None,
            tls_verify: true,
            tls_ca_cert: None,
        })
    }

    /// Create a builder from a validated [`DockerClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the endpoint cannot be parsed.
    pub fn from_config(config: &DockerClientConfig) -> Result<Self> {
        let mut builder = Self::new(config.parse_endpoint()?, config.timeout())?
            .with_tls_verify(config.tls_verify);

        if let Some(version) = &config.api_version {
            builder = builder.with_api_version(version.clone());
        }
        if let Some(ca_cert) = &config.tls_ca_cert {
            builder = builder.with_ca_cert(ca_cert.clone());
        }

        Ok(builder)
    }

    /// Prefix every path with `/v{version}`.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Configure HTTP basic authentication.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.basic_auth = Some((username.into(), SecretString::from(password.into())));
        self
    }

    /// Configure token based authentication (sent as `X-Auth-Token`).
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Trust an additional PEM encoded CA certificate.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the CA certificate cannot be loaded or
    /// the HTTP client cannot be constructed.
    pub fn build(self) -> Result<HttpTransport> {
        let mut builder = ClientBuilder::new()
            .user_agent(&self.user_agent)
            .timeout(self.http_config.timeout)
            .connect_timeout(self.http_config.connect_timeout)
            .pool_idle_timeout(self.http_config.pool_idle_timeout)
            .pool_max_idle_per_host(self.http_config.pool_max_idle_per_host);

        if !self.http_config.enable_compression {
            builder = builder.no_gzip();
        }

        if !self.tls_verify {
            warn!("TLS verification disabled for Docker client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.tls_ca_cert {
            debug!("loading Docker CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        Ok(HttpTransport {
            http,
            base_url: self.base_url,
            api_version: self.api_version,
            basic_auth: self.basic_auth,
            token: self.token,
            enable_logging: self.http_config.enable_logging,
        })
    }
}

/// `reqwest`-backed [`Transport`].
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
    api_version: Option<String>,
    basic_auth: Option<(String, SecretString)>,
    token: Option<SecretString>,
    enable_logging: bool,
}

impl HttpTransport {
    /// Create a transport for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        HttpTransportBuilder::new(base_url, Duration::from_secs(DEFAULT_TIMEOUT))?.build()
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        let normalized = path.trim_start_matches('/');
        let versioned = match &self.api_version {
            Some(version) => format!("v{version}/{normalized}"),
            None => normalized.to_string(),
        };

        self.base_url
            .join(&versioned)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid path `{path}`: {err}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, method: Method, path: &str, options: DoOptions) -> Result<Response> {
        let sends_json = options.sends_json();
        let DoOptions {
            data,
            query,
            context,
            ..
        } = options;

        if context.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let url = self.build_url(path)?;
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(ACCEPT, "application/json");

        if !query.is_empty() {
            request = request.query(&query);
        }
        if let Some((user, pass)) = &self.basic_auth {
            request = request.basic_auth(user, Some(pass.expose_secret()));
        }
        if let Some(token) = &self.token {
            request = request.header("X-Auth-Token", token.expose_secret());
        }
        if sends_json {
            request = request.json(&data.unwrap_or(serde_json::Value::Null));
        }
        if let Some(timeout) = context.timeout() {
            request = request.timeout(timeout);
        }

        if self.enable_logging {
            info!(%method, path, ?query, "Docker request");
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, Error>(Response::new(status, body))
        };

        let response = tokio::select! {
            biased;
            () = context.cancelled() => {
                warn!(%method, path, "Docker request cancelled");
                return Err(Error::Cancelled);
            }
            result = exchange => result?,
        };

        let status = response.status();
        debug!(%status, path, "Docker response");

        if status.is_success() {
            Ok(response)
        } else {
            Err(Error::from_status(status, error_message(response.body())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{
        body_json, body_string, header, header_exists, method, path, query_param,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_transport(server: &MockServer) -> HttpTransport {
        HttpTransport::new(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn execute_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/things"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"Name": "demo"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("\"ok\""))
            .expect(1)
            .mount(&server)
            .await;

        let options = DoOptions::new().with_json(&json!({"Name": "demo"})).unwrap();
        let response = test_transport(&server)
            .execute(Method::POST, "/things", options)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.json::<String>().unwrap(), "ok");
    }

    #[tokio::test]
    async fn execute_forced_json_without_data_sends_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/things"))
            .and(header("content-type", "application/json"))
            .and(body_string("null"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let options = DoOptions {
            force_json: true,
            ..DoOptions::new()
        };
        test_transport(&server)
            .execute(Method::POST, "/things", options)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn execute_appends_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/things"))
            .and(query_param("force", "1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut query = QueryParams::new();
        query.push_flag("force", true);
        test_transport(&server)
            .execute(Method::POST, "/things", DoOptions::new().with_query(query))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn execute_prefixes_api_version() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1.24/swarm/init"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransportBuilder::new(server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_api_version("1.24")
            .build()
            .unwrap();

        transport
            .execute(Method::POST, "/swarm/init", DoOptions::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn execute_keeps_base_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docker/info"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(format!("{}/docker", server.uri())).unwrap();
        transport
            .execute(Method::GET, "/info", DoOptions::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn execute_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/things"))
            .and(header("x-auth-token", "secret-token"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransportBuilder::new(server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_basic_auth("admin", "hunter2")
            .with_token("secret-token")
            .build()
            .unwrap();

        transport
            .execute(Method::POST, "/things", DoOptions::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn execute_maps_daemon_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/swarm/init"))
            .respond_with(ResponseTemplate::new(406).set_body_json(json!({
                "message": "This node is already part of a swarm."
            })))
            .mount(&server)
            .await;

        let err = test_transport(&server)
            .execute(Method::POST, "/swarm/init", DoOptions::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            Error::NotAcceptable("This node is already part of a swarm.".to_string())
        );
    }

    #[tokio::test]
    async fn execute_falls_back_to_plain_text_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/things"))
            .respond_with(ResponseTemplate::new(404).set_body_string("page not found\n"))
            .mount(&server)
            .await;

        let err = test_transport(&server)
            .execute(Method::POST, "/things", DoOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err, Error::NotFound("page not found".to_string()));
    }

    #[tokio::test]
    async fn execute_refuses_cancelled_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        token.cancel();
        let options =
            DoOptions::new().with_context(RequestContext::new().with_cancellation(token));

        let err = test_transport(&server)
            .execute(Method::POST, "/things", options)
            .await
            .unwrap_err();
        assert_eq!(err, Error::Cancelled);
    }

    #[tokio::test]
    async fn execute_aborts_in_flight_request_on_cancel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let options =
            DoOptions::new().with_context(RequestContext::new().with_cancellation(token));
        let err = test_transport(&server)
            .execute(Method::POST, "/things", options)
            .await
            .unwrap_err();
        assert_eq!(err, Error::Cancelled);
    }

    #[tokio::test]
    async fn execute_applies_context_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let options = DoOptions::new()
            .with_context(RequestContext::new().with_timeout(Duration::from_millis(100)));
        let err = test_transport(&server)
            .execute(Method::POST, "/things", options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)), "got {err:?}");
    }

    #[test]
    fn builder_rejects_invalid_url() {
        let result = HttpTransportBuilder::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn builder_from_config_applies_api_version() {
        let config = DockerClientConfig::new("http://127.0.0.1:2375")
            .unwrap()
            .with_api_version("1.41")
            .unwrap();
        let transport = HttpTransportBuilder::from_config(&config)
            .unwrap()
            .build()
            .unwrap();

        let url = transport.build_url("/swarm/update").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:2375/v1.41/swarm/update");
    }

    #[test]
    fn response_json_reports_decode_error() {
        let response = Response::new(StatusCode::OK, "not json");
        let err = response.json::<String>().unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn response_json_reads_first_value_only() {
        let response = Response::new(StatusCode::OK, "\"abc123\"\n\"x\"");
        assert_eq!(response.json::<String>().unwrap(), "abc123");
    }

    #[test]
    fn response_json_rejects_empty_body() {
        let response = Response::new(StatusCode::OK, "");
        let err = response.json::<String>().unwrap_err();
        assert_eq!(err, Error::Decode("empty response body".to_string()));
    }

    #[test]
    fn do_options_with_json_forces_json() {
        let options = DoOptions::new().with_json(&json!({})).unwrap();
        assert!(options.force_json);
        assert!(options.sends_json());
        assert!(!DoOptions::new().sends_json());
    }
}
