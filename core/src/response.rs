//! Response body parsing.
//!
//! # Design
//! Status codes that carry no body (204, 205, 304) and `content-length: 0`
//! always produce `ParsedResponse::Empty`. Otherwise an explicit `ParseAs`
//! wins; `ParseAs::Auto` negotiates on `content-type`. A body declared as
//! JSON that fails to parse degrades to text instead of failing the call.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{is_json_content_type, ApiError, Result};
use crate::http::HttpResponse;

/// How to read a successful response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseAs {
    /// JSON for `application/json*`, text for everything else.
    #[default]
    Auto,
    Json,
    Text,
    Blob,
    Binary,
}

impl FromStr for ParseAs {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(ParseAs::Auto),
            "json" => Ok(ParseAs::Json),
            "text" => Ok(ParseAs::Text),
            "blob" => Ok(ParseAs::Blob),
            "binary" | "arrayBuffer" => Ok(ParseAs::Binary),
            other => Err(ApiError::configuration(format!("unknown parse mode `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Empty,
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl ParsedResponse {
    pub fn is_empty(&self) -> bool {
        matches!(self, ParsedResponse::Empty)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParsedResponse::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Decode into `T`. `Empty` decodes from JSON `null`, so `()` and
    /// `Option<T>` accept bodiless responses.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        let decoded = match self {
            ParsedResponse::Empty => serde_json::from_value(Value::Null),
            ParsedResponse::Json(value) => serde_json::from_value(value),
            ParsedResponse::Text(text) => serde_json::from_str(&text)
                .or_else(|_| serde_json::from_value(Value::String(text))),
            ParsedResponse::Bytes(bytes) => serde_json::from_slice(&bytes),
        };
        decoded.map_err(|e| ApiError::decode(e.to_string()))
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            ParsedResponse::Text(text) => Some(text),
            ParsedResponse::Json(value) => Some(value.to_string()),
            ParsedResponse::Bytes(bytes) => String::from_utf8(bytes).ok(),
            ParsedResponse::Empty => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ParsedResponse::Bytes(bytes) => bytes,
            ParsedResponse::Text(text) => text.into_bytes(),
            ParsedResponse::Json(value) => value.to_string().into_bytes(),
            ParsedResponse::Empty => Vec::new(),
        }
    }
}

/// `true` when the response cannot carry a body.
pub fn has_no_body(response: &HttpResponse) -> bool {
    matches!(response.status, 204 | 205 | 304)
        || response
            .header("content-length")
            .is_some_and(|len| len.trim() == "0")
}

/// Parse a successful response body. Never fails.
pub fn parse_body(response: &HttpResponse, parse_as: ParseAs) -> ParsedResponse {
    if has_no_body(response) {
        return ParsedResponse::Empty;
    }
    let mode = match parse_as {
        ParseAs::Auto => {
            if response.header("content-type").is_some_and(is_json_content_type) {
                ParseAs::Json
            } else {
                ParseAs::Text
            }
        }
        explicit => explicit,
    };
    match mode {
        ParseAs::Json => parse_json(&response.body),
        ParseAs::Blob | ParseAs::Binary => ParsedResponse::Bytes(response.body.clone()),
        ParseAs::Text | ParseAs::Auto => {
            ParsedResponse::Text(String::from_utf8_lossy(&response.body).into_owned())
        }
    }
}

fn parse_json(body: &[u8]) -> ParsedResponse {
    if body.iter().all(u8::is_ascii_whitespace) {
        return ParsedResponse::Empty;
    }
    match serde_json::from_slice(body) {
        Ok(value) => ParsedResponse::Json(value),
        Err(_) => ParsedResponse::Text(String::from_utf8_lossy(body).into_owned()),
    }
}
