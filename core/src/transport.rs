//! Pluggable transport executing an `HttpRequest`.
//!
//! `ApiClient` owns exactly one transport and calls `send` at most once per
//! request. Transports report only transport-level failures; any HTTP status,
//! including 4xx/5xx, comes back as an `HttpResponse`.

use std::future::Future;

use thiserror::Error;

use crate::error::{ApiError, NetworkErrorKind};
use crate::http::{HttpRequest, HttpResponse};

/// Failures where no response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("transport error: {0}")]
    Other(String),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        let kind = match err {
            TransportError::Timeout => NetworkErrorKind::Timeout,
            TransportError::Connection(_) => NetworkErrorKind::Connection,
            TransportError::Other(_) => NetworkErrorKind::Other,
        };
        ApiError::network(kind, err.to_string())
    }
}

/// Executes HTTP requests.
///
/// Native `impl Future` in traits, no `async-trait` macro required.
pub trait HttpTransport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
