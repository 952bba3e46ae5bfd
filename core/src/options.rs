//! Per-call request options.

use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::body::RequestBody;
use crate::path::PathParams;
use crate::query::Query;
use crate::response::ParseAs;
use crate::value::Scalar;

/// Everything about a call except its path template and method.
///
/// ```ignore
/// let options = RequestOptions::new()
///     .path_param("id", client_id)
///     .query(Query::new().set("page", 2))
///     .json(&update)
///     .header("x-request-id", request_id);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub(crate) path_params: PathParams,
    pub(crate) query: Query,
    pub(crate) body: Option<RequestBody>,
    pub(crate) body_error: Option<String>,
    pub(crate) parse_as: ParseAs,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path_params(mut self, params: PathParams) -> Self {
        self.path_params = params;
        self
    }

    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.path_params.insert(name, Some(value.into()));
        self
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self.body_error = None;
        self
    }

    /// Serialize `value` as the JSON body. A serialization failure is
    /// reported by the call as a configuration error.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match RequestBody::json(value) {
            Ok(body) => {
                self.body = Some(body);
                self.body_error = None;
            }
            Err(err) => {
                self.body = None;
                self.body_error = Some(err.message().to_string());
            }
        }
        self
    }

    pub fn parse_as(mut self, parse_as: ParseAs) -> Self {
        self.parse_as = parse_as;
        self
    }

    /// Set a header for this call only; overrides a default header of the
    /// same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
