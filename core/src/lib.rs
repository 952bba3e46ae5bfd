//! Client core for the back-office REST API.
//!
//! # Overview
//! Two independent pieces every back-office screen builds on:
//! - a typed request engine (`ApiClient`) that expands path templates,
//!   encodes query strings and bodies, performs one HTTP call and normalizes
//!   failures into `ApiError` with a user-facing message;
//! - the CNPJ validator in [`taxid`].
//!
//! # Design
//! - `ApiClient` is stateless apart from its immutable `ClientConfig`; build
//!   as many as needed, each with its own base URL.
//! - Request building and response parsing are pure (`build_request`,
//!   `parse_response`); only an `HttpTransport` performs I/O, so the engine is
//!   tested with in-memory transports and end-to-end against `mock-server`.
//! - Resource modules (clients, contracts, invoices, ...) live with the
//!   callers and describe their operations through `Endpoint`.

pub mod backends;
pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod options;
pub mod path;
pub mod query;
pub mod response;
pub mod taxid;
pub mod transport;
pub mod value;

#[cfg(feature = "reqwest-transport")]
pub use backends::ReqwestTransport;
#[cfg(feature = "ureq-transport")]
pub use backends::UreqTransport;
pub use body::{Multipart, RequestBody};
pub use client::{ApiClient, Endpoint};
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, HttpError, NetworkErrorKind, Payload, Result};
pub use self::http::{HttpMethod, HttpRequest, HttpResponse};
pub use options::RequestOptions;
pub use path::PathParams;
pub use query::{Query, QueryValue};
pub use response::{ParseAs, ParsedResponse};
pub use taxid::{clean_tax_id, format_tax_id, is_valid_tax_id};
pub use transport::{HttpTransport, TransportError};
pub use value::Scalar;

pub use tokio_util::sync::CancellationToken;
