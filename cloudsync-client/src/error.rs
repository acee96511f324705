use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP verbs issued by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Canonical upper-case verb.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single gateway request.
///
/// Every variant carries the method and the absolute URL of the request so the
/// failure can be surfaced without further context. The gateway never retries
/// and never classifies a failure beyond these variants.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum GatewayError {
    /// The service answered with a non-2xx status.
    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: HttpMethod,
        url: String,
        status: u16,
        /// Response body, as returned by the service.
        body: String,
    },

    /// No response arrived (connection refused, DNS failure, reset...).
    #[error("{method} {url} failed: {detail}")]
    Network {
        method: HttpMethod,
        url: String,
        detail: String,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("{method} {url} returned an unreadable body: {detail}")]
    Parse {
        method: HttpMethod,
        url: String,
        detail: String,
    },

    /// The request body could not be encoded as JSON.
    #[error("{method} {url} could not encode request body: {detail}")]
    Serialization {
        method: HttpMethod,
        url: String,
        detail: String,
    },
}

impl GatewayError {
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::Status { method, .. }
            | Self::Network { method, .. }
            | Self::Parse { method, .. }
            | Self::Serialization { method, .. } => *method,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. }
            | Self::Network { url, .. }
            | Self::Parse { url, .. }
            | Self::Serialization { url, .. } => url,
        }
    }

    /// Raw HTTP status, or `None` when no response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable notice naming the method, URL and status code.
    pub fn notice(&self) -> String {
        let status = self
            .status()
            .map_or_else(|| "no response".to_string(), |s| s.to_string());
        format!(
            "[CloudSync Service Error] Unexpected HTTP response code ({status}) from request: {} {}",
            self.method(),
            self.url()
        )
    }

    /// 是否为预期行为（4xx），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Status { status, .. } if (400..500).contains(status))
    }
}

/// Errors raised outside of a request round-trip.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The configured base URL is not an absolute http(s) URL.
    #[error("Invalid base URL '{url}': {detail}")]
    InvalidBaseUrl { url: String, detail: String },

    /// A string-encoded `data` payload could not be encoded or decoded.
    #[error("Invalid {kind} payload: {detail}")]
    Payload { kind: String, detail: String },

    /// A request failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Result alias for gateway round-trips.
pub type Result<T> = std::result::Result<T, GatewayError>;
