//! Ureq-based transport (blocking client driven from the async engine).
//!
//! The blocking call runs on tokio's blocking pool so the caller's task is
//! never stalled. Dropping the returned future does not stop the worker
//! thread: a cancelled call still runs to completion or to its timeout in
//! the background. Use `ReqwestTransport` when cancellation must abort the
//! connection.

use std::io::Read as _;

use ureq::http;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{HttpTransport, TransportError};

/// An [`HttpTransport`] backed by a [`ureq::Agent`].
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    /// Agent with no global timeout; each request carries its own.
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            // Status codes are interpreted by the engine, not the agent.
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl HttpTransport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?
    }
}

fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    let method = match request.method {
        HttpMethod::Get => http::Method::GET,
        HttpMethod::Post => http::Method::POST,
        HttpMethod::Put => http::Method::PUT,
        HttpMethod::Patch => http::Method::PATCH,
        HttpMethod::Delete => http::Method::DELETE,
    };

    let mut builder = http::Request::builder().method(method).uri(&request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let timeout = request.timeout;
    let result = match request.body {
        Some(body) => {
            let req = builder
                .body(body)
                .map_err(|e| TransportError::Other(e.to_string()))?;
            let req = agent.configure_request(req).timeout_global(timeout).build();
            agent.run(req)
        }
        None => {
            let req = builder
                .body(())
                .map_err(|e| TransportError::Other(e.to_string()))?;
            let req = agent.configure_request(req).timeout_global(timeout).build();
            agent.run(req)
        }
    };

    match result {
        Ok(resp) => convert_response(resp),
        Err(ureq::Error::Timeout(_)) => Err(TransportError::Timeout),
        Err(ureq::Error::HostNotFound) => {
            Err(TransportError::Connection("host not found".to_owned()))
        }
        Err(ureq::Error::Io(e)) => Err(TransportError::Connection(e.to_string())),
        Err(e) => Err(TransportError::Other(e.to_string())),
    }
}

fn convert_response(response: http::Response<ureq::Body>) -> Result<HttpResponse, TransportError> {
    let (parts, body) = response.into_parts();

    let headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let mut bytes = Vec::new();
    body.into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    Ok(HttpResponse {
        status: parts.status.as_u16(),
        headers,
        body: bytes,
    })
}
