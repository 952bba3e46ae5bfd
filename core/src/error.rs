//! Error types for the back-office API client.
//!
//! # Design
//! Every failure surfaces as a single `ApiError` whose `message()` is safe to
//! show to an end user. Non-2xx responses become `ApiError::Http` carrying the
//! status, the best-effort parsed payload and the derived message. A body
//! that fails to parse as JSON degrades to text, then to no payload at all;
//! it never raises on its own.
//!
//! Message derivation for HTTP errors, first match wins:
//! 1. a non-empty `message`, `error`, `detail` or `title` string in a JSON
//!    object payload;
//! 2. a non-blank text payload;
//! 3. the status table in [`status_message`].

use serde_json::Value;
use thiserror::Error;

use crate::http::HttpResponse;

pub type Result<T> = std::result::Result<T, ApiError>;

pub const BAD_REQUEST_MESSAGE: &str = "Verifique os dados enviados e tente novamente.";
pub const UNAUTHORIZED_MESSAGE: &str = "Sua sessão expirou. Faça login novamente.";
pub const FORBIDDEN_MESSAGE: &str = "Você não tem permissão para realizar esta ação.";
pub const NOT_FOUND_MESSAGE: &str = "Registro não encontrado.";
pub const UNPROCESSABLE_MESSAGE: &str = "Os dados enviados são inválidos. Revise o formulário.";
pub const TOO_MANY_REQUESTS_MESSAGE: &str =
    "Muitas requisições em sequência. Aguarde alguns instantes.";
pub const SERVER_UNSTABLE_MESSAGE: &str =
    "O serviço está instável no momento. Tente novamente em instantes.";
pub const FALLBACK_MESSAGE: &str = "Não foi possível concluir a operação.";
pub const NETWORK_MESSAGE: &str = "Não foi possível conectar ao servidor.";
pub const CANCELLED_MESSAGE: &str = "A requisição foi cancelada.";
pub const DECODE_MESSAGE: &str = "Não foi possível interpretar a resposta do servidor.";

/// Payload keys consulted, in order, for a server-provided message.
const MESSAGE_KEYS: [&str; 4] = ["message", "error", "detail", "title"];

/// Fixed user-facing phrase for a status code.
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => BAD_REQUEST_MESSAGE,
        401 => UNAUTHORIZED_MESSAGE,
        403 => FORBIDDEN_MESSAGE,
        404 => NOT_FOUND_MESSAGE,
        422 => UNPROCESSABLE_MESSAGE,
        429 => TOO_MANY_REQUESTS_MESSAGE,
        500..=599 => SERVER_UNSTABLE_MESSAGE,
        _ => FALLBACK_MESSAGE,
    }
}

/// Best-effort parsed body of an error response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Parse an error body. JSON is attempted when the content type says so
    /// or the body looks like a JSON document; anything else, including JSON
    /// that fails to parse, is kept as text. Non-UTF-8 or empty bodies yield
    /// `None`.
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Option<Self> {
        if body.is_empty() {
            return None;
        }
        let declared_json = content_type.is_some_and(is_json_content_type);
        let looks_json = body
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'{' || *b == b'[');
        if declared_json || looks_json {
            if let Ok(value) = serde_json::from_slice::<Value>(body) {
                return Some(Payload::Json(value));
            }
        }
        std::str::from_utf8(body)
            .ok()
            .map(|text| Payload::Text(text.to_string()))
    }

    /// Message carried by the payload itself, if any.
    pub fn friendly_message(&self) -> Option<String> {
        match self {
            Payload::Json(Value::Object(map)) => MESSAGE_KEYS.iter().find_map(|key| {
                map.get(*key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            }),
            Payload::Json(Value::String(text)) | Payload::Text(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Payload::Json(_) => None,
        }
    }
}

/// Derive the user-facing message for a status and optional payload.
pub fn derive_message(status: u16, payload: Option<&Payload>) -> String {
    payload
        .and_then(Payload::friendly_message)
        .unwrap_or_else(|| status_message(status).to_string())
}

/// `true` for `application/json` and its parameterised / suffixed forms.
pub(crate) fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("application/json")
}

/// A non-2xx response, normalized.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct HttpError {
    pub status: u16,
    pub payload: Option<Payload>,
    pub message: String,
}

impl HttpError {
    pub fn new(status: u16, payload: Option<Payload>) -> Self {
        let message = derive_message(status, payload.as_ref());
        Self {
            status,
            payload,
            message,
        }
    }

    pub fn from_response(response: &HttpResponse) -> Self {
        let payload = Payload::from_body(response.header("content-type"), &response.body);
        Self::new(response.status, payload)
    }
}

/// Why no response was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Connection,
    Timeout,
    Other,
}

/// Errors returned by `ApiClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Programmer error detected before any network call: a missing or null
    /// path parameter, an invalid base URL, an unserializable body.
    #[error("{message}")]
    Configuration { message: String },

    /// No response was received: connection failure or timeout.
    #[error("{message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
        detail: String,
    },

    /// The caller cancelled the request before it completed.
    #[error("{message}")]
    Cancelled { message: String },

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A successful response could not be decoded into the requested type.
    #[error("{message}")]
    Decode { message: String, detail: String },
}

impl ApiError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ApiError::Configuration {
            message: message.into(),
        }
    }

    pub fn network(kind: NetworkErrorKind, detail: impl Into<String>) -> Self {
        ApiError::Network {
            kind,
            message: NETWORK_MESSAGE.to_string(),
            detail: detail.into(),
        }
    }

    pub fn cancelled() -> Self {
        ApiError::Cancelled {
            message: CANCELLED_MESSAGE.to_string(),
        }
    }

    pub fn decode(detail: impl Into<String>) -> Self {
        ApiError::Decode {
            message: DECODE_MESSAGE.to_string(),
            detail: detail.into(),
        }
    }

    /// Message suitable for display. Never empty.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Configuration { message }
            | ApiError::Network { message, .. }
            | ApiError::Cancelled { message }
            | ApiError::Decode { message, .. } => message,
            ApiError::Http(err) => &err.message,
        }
    }

    /// Status code, only when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http(err) => Some(err.status),
            _ => None,
        }
    }

    /// Raw payload of an HTTP error response.
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            ApiError::Http(err) => err.payload.as_ref(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ApiError::Network {
                kind: NetworkErrorKind::Timeout,
                ..
            }
        )
    }
}
