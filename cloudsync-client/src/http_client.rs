//! Request gateway
//!
//! Generic request/response plumbing shared by every resource operation:
//! build the absolute URL, encode the JSON body, send it through a
//! [`Transport`], decode the answer, and hand failures to exactly one
//! [`FailureHandler`].
//!
//! # design principles
//! - **Fire once** - no retries, no timeout, no deduplication
//! - **Per-call failure override** - the default handler is fixed at construction
//!   and is only bypassed by passing a handler to the call itself
//! - **Pluggable transport** - `reqwest` in production, in-memory stubs in tests

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ClientError, GatewayError, HttpMethod, Result};
use crate::utils::log_sanitizer::sanitize_for_log;

/// What the caller expects back from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    Text,
}

impl ResponseKind {
    fn accept(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Text => "text/plain",
        }
    }
}

/// A fully-resolved request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    pub method: HttpMethod,
    pub url: String,
    /// JSON-encoded body (write verbs only).
    pub body: Option<String>,
    pub expect: ResponseKind,
}

/// Status and body of whatever the service answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub detail: String,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

/// Sends one request and returns one response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: GatewayRequest) -> std::result::Result<RawResponse, TransportFailure>;
}

/// HTTP basic login for the console's own session with the service.
#[derive(Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    auth: Option<BasicAuth>,
}

impl HttpTransport {
    pub fn new(auth: Option<BasicAuth>) -> Self {
        Self::with_client(reqwest::Client::new(), auth)
    }

    pub fn with_client(client: reqwest::Client, auth: Option<BasicAuth>) -> Self {
        Self { client, auth }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: GatewayRequest) -> std::result::Result<RawResponse, TransportFailure> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .header(reqwest::header::ACCEPT, request.expect.accept());

        if let Some(auth) = &self.auth {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(|e| TransportFailure {
            detail: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportFailure {
            detail: format!("Failed to read response body: {e}"),
        })?;

        Ok(RawResponse { status, body })
    }
}

/// Failure continuation.
///
/// Invoked with the failed request's error; never invoked on success.
pub trait FailureHandler: Send + Sync {
    fn on_failure(&self, error: &GatewayError);
}

impl<F> FailureHandler for F
where
    F: Fn(&GatewayError) + Send + Sync,
{
    fn on_failure(&self, error: &GatewayError) {
        self(error);
    }
}

/// Per-call failure override. `None` falls through to the gateway default.
pub type OnError<'a> = Option<&'a dyn FailureHandler>;

/// Stock default handler: surfaces the notice through the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNoticeHandler;

impl FailureHandler for LogNoticeHandler {
    fn on_failure(&self, error: &GatewayError) {
        if error.is_expected() {
            log::warn!("{}", error.notice());
        } else {
            log::error!("{}", error.notice());
        }
    }
}

/// Generic request/response transport for the CloudSync REST API.
#[derive(Clone)]
pub struct RequestGateway {
    base_url: Url,
    transport: Arc<dyn Transport>,
    default_handler: Arc<dyn FailureHandler>,
}

impl fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RequestGateway {
    /// Create a gateway using [`LogNoticeHandler`] as the default handler.
    ///
    /// `base_url` must be an absolute http(s) URL; a trailing `/` is added when
    /// missing so relative resource paths resolve beneath it.
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> std::result::Result<Self, ClientError> {
        Self::with_default_handler(base_url, transport, Arc::new(LogNoticeHandler))
    }

    pub fn with_default_handler(
        base_url: &str,
        transport: Arc<dyn Transport>,
        default_handler: Arc<dyn FailureHandler>,
    ) -> std::result::Result<Self, ClientError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            transport,
            default_handler,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Absolute URL for a resource path relative to the base.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET, decoding the body as JSON.
    pub async fn get_json<T>(&self, path: &str, on_error: OnError<'_>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let text = self
            .execute(HttpMethod::Get, path, None, ResponseKind::Json, on_error)
            .await?;
        self.decode(HttpMethod::Get, path, &text, on_error)
    }

    /// GET, returning the raw body.
    pub async fn get_text(&self, path: &str, on_error: OnError<'_>) -> Result<String> {
        self.execute(HttpMethod::Get, path, None, ResponseKind::Text, on_error)
            .await
    }

    /// POST a JSON body (create semantics).
    pub async fn post<B, T>(&self, path: &str, body: &B, on_error: OnError<'_>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(HttpMethod::Post, path, body, on_error).await
    }

    /// PUT a JSON body (replace semantics).
    pub async fn put<B, T>(&self, path: &str, body: &B, on_error: OnError<'_>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.write(HttpMethod::Put, path, body, on_error).await
    }

    /// DELETE; any response body is ignored.
    pub async fn delete(&self, path: &str, on_error: OnError<'_>) -> Result<()> {
        self.execute(HttpMethod::Delete, path, None, ResponseKind::Json, on_error)
            .await
            .map(drop)
    }

    async fn write<B, T>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        on_error: OnError<'_>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let encoded = match serde_json::to_string(body) {
            Ok(encoded) => encoded,
            Err(e) => {
                let error = GatewayError::Serialization {
                    method,
                    url: self.url_for(path),
                    detail: e.to_string(),
                };
                return Err(self.fail(error, on_error));
            }
        };

        let text = self
            .execute(method, path, Some(encoded), ResponseKind::Json, on_error)
            .await?;
        self.decode(method, path, &text, on_error)
    }

    /// Send the request and return the body of a 2xx response.
    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        expect: ResponseKind,
        on_error: OnError<'_>,
    ) -> Result<String> {
        let url = self.url_for(path);
        log::debug!("{method} {url}");
        if let Some(body) = &body {
            log::debug!("Request Body: {}", sanitize_for_log(body));
        }

        let request = GatewayRequest {
            method,
            url: url.clone(),
            body,
            expect,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(failure) => {
                let error = GatewayError::Network {
                    method,
                    url,
                    detail: failure.detail,
                };
                return Err(self.fail(error, on_error));
            }
        };

        log::debug!("Response Status: {}", response.status);
        log::debug!("Response Body: {}", sanitize_for_log(&response.body));

        if !response.is_success() {
            let error = GatewayError::Status {
                method,
                url,
                status: response.status,
                body: response.body,
            };
            return Err(self.fail(error, on_error));
        }

        Ok(response.body)
    }

    /// Decode a 2xx body. An empty body decodes as JSON `null`, so write
    /// verbs may ask for `Option<_>` or `()`.
    fn decode<T>(&self, method: HttpMethod, path: &str, text: &str, on_error: OnError<'_>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let text = if text.trim().is_empty() { "null" } else { text };
        serde_json::from_str(text).map_err(|e| self.parse_failure(method, path, &e, on_error))
    }

    /// Report a body that arrived but does not have the expected shape.
    pub(crate) fn parse_failure(
        &self,
        method: HttpMethod,
        path: &str,
        detail: &dyn fmt::Display,
        on_error: OnError<'_>,
    ) -> GatewayError {
        log::error!("JSON parse failed: {detail}");
        let error = GatewayError::Parse {
            method,
            url: self.url_for(path),
            detail: detail.to_string(),
        };
        self.fail(error, on_error)
    }

    /// Route a failure to exactly one handler and give it back to the caller.
    fn fail(&self, error: GatewayError, on_error: OnError<'_>) -> GatewayError {
        match on_error {
            Some(handler) => handler.on_failure(&error),
            None => self.default_handler.on_failure(&error),
        }
        error
    }
}

fn normalize_base_url(raw: &str) -> std::result::Result<Url, ClientError> {
    let invalid = |detail: String| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        detail,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
