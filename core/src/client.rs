//! Request engine for the back-office REST API.
//!
//! # Design
//! `ApiClient` holds an immutable `ClientConfig` and a transport, nothing
//! else. Each call is split the same way:
//! - `build_request` turns a path template and `RequestOptions` into an
//!   `HttpRequest` without touching the network;
//! - the transport performs exactly one round-trip;
//! - `parse_response` turns the `HttpResponse` into a `ParsedResponse` or a
//!   normalized `ApiError`.
//!
//! `request` ties the three together and adds the timeout, cancellation and
//! debug logging. There are no retries; callers decide what to do with an
//! error.

use std::sync::Arc;

use ::http::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, HttpError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::options::RequestOptions;
use crate::path::expand_path;
use crate::query::append_query;
use crate::response::{parse_body, ParseAs, ParsedResponse};
use crate::transport::{HttpTransport, TransportError};

/// A typed API operation: method, path template, body and response types.
///
/// ```ignore
/// struct GetClient;
/// impl Endpoint for GetClient {
///     const METHOD: HttpMethod = HttpMethod::Get;
///     const PATH: &'static str = "clients/{id}";
///     type Body = ();
///     type Response = Client;
/// }
/// let client = api.call::<GetClient>(None, RequestOptions::new().path_param("id", "42")).await?;
/// ```
pub trait Endpoint {
    const METHOD: HttpMethod;
    const PATH: &'static str;
    type Body: Serialize;
    type Response: DeserializeOwned;
}

#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    config: Arc<ClientConfig>,
    transport: T,
}

#[cfg(feature = "reqwest-transport")]
impl ApiClient<crate::backends::ReqwestTransport> {
    /// Client backed by a fresh reqwest connection pool.
    pub fn from_config(config: ClientConfig) -> Self {
        Self::new(config, crate::backends::ReqwestTransport::new())
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request for `path` and `method` without sending it.
    ///
    /// Fails with `ApiError::Configuration` for a missing or null path
    /// parameter, an invalid header, or a body that could not be serialized.
    pub fn build_request(
        &self,
        path: &str,
        method: HttpMethod,
        options: &RequestOptions,
    ) -> Result<HttpRequest> {
        if let Some(message) = &options.body_error {
            return Err(ApiError::configuration(message.clone()));
        }

        let expanded = expand_path(path, &options.path_params)?;
        let mut url = format!(
            "{}/{}",
            self.config.base_url(),
            expanded.trim_start_matches('/')
        );
        append_query(&mut url, &options.query);

        for (name, value) in &options.headers {
            validate_header(name, value)?;
        }
        let mut headers: Vec<(String, String)> = self
            .config
            .default_headers()
            .iter()
            .filter(|(k, _)| !options.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(k)))
            .cloned()
            .collect();
        headers.extend(options.headers.iter().cloned());

        let body = options.body.clone().map(|body| {
            let has_content_type = headers
                .iter()
                .any(|(k, _)| k.eq_ignore_ascii_case("content-type"));
            if let (false, Some(content_type)) = (has_content_type, body.content_type()) {
                headers.push(("content-type".to_string(), content_type));
            }
            body.into_bytes()
        });

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
            timeout: Some(options.timeout.unwrap_or_else(|| self.config.timeout())),
        })
    }

    /// Interpret a response: non-2xx becomes `ApiError::Http`, anything else
    /// is parsed according to `parse_as`. A 304 carries no body and reads as
    /// `ParsedResponse::Empty`.
    pub fn parse_response(&self, response: HttpResponse, parse_as: ParseAs) -> Result<ParsedResponse> {
        if !response.is_success() && response.status != NOT_MODIFIED {
            return Err(HttpError::from_response(&response).into());
        }
        Ok(parse_body(&response, parse_as))
    }

    /// Build, send and parse a request.
    pub async fn request(
        &self,
        path: &str,
        method: HttpMethod,
        options: RequestOptions,
    ) -> Result<ParsedResponse> {
        let request = self.build_request(path, method, &options)?;
        let timeout = request.timeout.unwrap_or_else(|| self.config.timeout());
        let logging = !self.config.environment().is_production();
        let url = request.url.clone();

        if logging {
            debug!(%method, %url, "api request started");
        }

        let send = tokio::time::timeout(timeout, self.transport.send(request));
        let outcome = match &options.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    if logging {
                        debug!(%method, %url, "api request cancelled");
                    }
                    return Err(ApiError::cancelled());
                }
                outcome = send => outcome,
            },
            None => send.await,
        };

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(self.network_failure(method, &url, err, logging)),
            Err(_) => {
                return Err(self.network_failure(method, &url, TransportError::Timeout, logging))
            }
        };

        if logging {
            debug!(%method, %url, status = response.status, "api response received");
        }

        let result = self.parse_response(response, options.parse_as);
        if let (true, Err(err)) = (logging, &result) {
            warn!(%method, %url, status = ?err.status(), error = %err, "api request failed");
        }
        result
    }

    /// `request` followed by decoding the body into `R`.
    pub async fn request_json<R: DeserializeOwned>(
        &self,
        path: &str,
        method: HttpMethod,
        options: RequestOptions,
    ) -> Result<R> {
        self.request(path, method, options).await?.into_json()
    }

    /// Call a typed [`Endpoint`]. `body`, when given, is sent as JSON and
    /// replaces any body already set on `options`.
    pub async fn call<E: Endpoint>(
        &self,
        body: Option<&E::Body>,
        options: RequestOptions,
    ) -> Result<E::Response> {
        let options = match body {
            Some(body) => options.json(body),
            None => options,
        };
        self.request_json(E::PATH, E::METHOD, options).await
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(path, HttpMethod::Get, options).await
    }

    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(path, HttpMethod::Post, options).await
    }

    pub async fn put(&self, path: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(path, HttpMethod::Put, options).await
    }

    pub async fn patch(&self, path: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(path, HttpMethod::Patch, options).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(path, HttpMethod::Delete, options).await
    }

    fn network_failure(
        &self,
        method: HttpMethod,
        url: &str,
        err: TransportError,
        logging: bool,
    ) -> ApiError {
        if logging {
            warn!(%method, %url, error = %err, "api request got no response");
        }
        err.into()
    }
}

const NOT_MODIFIED: u16 = 304;

fn validate_header(name: &str, value: &str) -> Result<()> {
    if HeaderName::from_bytes(name.as_bytes()).is_err() {
        return Err(ApiError::configuration(format!("invalid header name `{name}`")));
    }
    if HeaderValue::from_bytes(value.as_bytes()).is_err() {
        return Err(ApiError::configuration(format!("invalid value for header `{name}`")));
    }
    Ok(())
}
