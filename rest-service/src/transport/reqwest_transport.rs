//! HTTP transport backed by `reqwest`.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, instrument};
use url::Url;

use super::{RequestOptions, Transport, TransportPayload, TransportResponse};
use crate::error::{ConfigError, TransportError};
use crate::method::RestMethod;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builder for configuring a [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    default_headers: HeaderMap,
    user_agent: Option<String>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
            user_agent: None,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Sets the per-request timeout.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use rest_service::ReqwestTransport;
    ///
    /// let transport = ReqwestTransport::builder()
    ///     .timeout(Duration::from_secs(5))
    ///     .build()
    ///     .unwrap();
    /// # let _ = transport;
    /// ```
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent with every request unless the request sets it.
    ///
    /// ## Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidHeader {
            name: name.as_ref().to_string(),
            reason,
        };
        let header_name =
            HeaderName::try_from(name.as_ref()).map_err(|e| invalid(e.to_string()))?;
        let header_value =
            HeaderValue::try_from(value.as_ref()).map_err(|e| invalid(e.to_string()))?;
        self.default_headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the transport.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ReqwestTransport, ConfigError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.default_headers);
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let client = builder.build().map_err(ConfigError::Client)?;
        Ok(ReqwestTransport { client })
    }
}

/// [`Transport`] that performs real HTTP requests with `reqwest`.
///
/// The body is always returned as bytes; JSON decoding happens in the
/// dispatcher.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Creates a transport with default settings.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    #[instrument(name = "http_send", skip(self, options), fields(http.method = %method))]
    async fn send(
        &self,
        method: RestMethod,
        url: &str,
        options: RequestOptions,
    ) -> Result<TransportResponse, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::with_capacity(options.headers.len());
        for (name, value) in &options.headers {
            let invalid = || TransportError::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::try_from(name.as_str()).map_err(|_| invalid())?;
            let header_value = HeaderValue::try_from(value.as_str()).map_err(|_| invalid())?;
            headers.insert(header_name, header_value);
        }

        let mut request = self
            .client
            .request(method.to_reqwest(), parsed)
            .headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(TransportError::Request)?;
        let status_code = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(TransportError::Request)?;

        debug!(status_code, body_len = body.len(), "response received");

        Ok(TransportResponse {
            status_code,
            headers,
            payload: TransportPayload::Bytes(body),
        })
    }
}

impl Transport for ReqwestTransport {
    fn request<'a>(
        &'a self,
        method: RestMethod,
        url: &'a str,
        options: RequestOptions,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        self.send(method, url, options).boxed()
    }
}
