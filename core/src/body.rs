//! Request bodies.
//!
//! Raw bodies (bytes, text, URL-encoded forms, multipart forms) are sent as
//! they are; anything else is serialized to JSON. The content type implied by
//! the body is only applied when the caller has not set one.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, Result};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const TEXT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
    Form(Vec<(String, String)>),
    Multipart(Multipart),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::configuration(format!("request body not serializable: {e}")))
    }

    /// Content type implied by the body, `None` for raw bytes.
    pub fn content_type(&self) -> Option<String> {
        match self {
            RequestBody::Json(_) => Some(JSON_CONTENT_TYPE.to_string()),
            RequestBody::Text(_) => Some(TEXT_CONTENT_TYPE.to_string()),
            RequestBody::Bytes(_) => None,
            RequestBody::Form(_) => Some(FORM_CONTENT_TYPE.to_string()),
            RequestBody::Multipart(m) => Some(m.content_type()),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            // Serializing a `Value` cannot fail.
            RequestBody::Json(value) => serde_json::to_vec(&value).unwrap_or_default(),
            RequestBody::Text(text) => text.into_bytes(),
            RequestBody::Bytes(bytes) => bytes,
            RequestBody::Form(pairs) => encode_form(&pairs).into_bytes(),
            RequestBody::Multipart(m) => m.encode(),
        }
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        RequestBody::Text(value)
    }
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        RequestBody::Text(value.to_string())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(value: Vec<u8>) -> Self {
        RequestBody::Bytes(value)
    }
}

impl From<Multipart> for RequestBody {
    fn from(value: Multipart) -> Self {
        RequestBody::Multipart(value)
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

fn encode_form(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `application/x-www-form-urlencoded` uses `+` for spaces.
fn form_encode(s: &str) -> String {
    urlencoding::encode(s).replace("%20", "+")
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A `multipart/form-data` body, used for attachments such as invoice PDFs.
#[derive(Debug, Clone, PartialEq)]
pub struct Multipart {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

impl Multipart {
    pub fn new() -> Self {
        Self::with_boundary(format!("----backoffice-{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            filename: None,
            content_type: None,
            data: value.into().into_bytes(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.parts.push(Part {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
            data,
        });
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let mut disposition = format!(
                "Content-Disposition: form-data; name=\"{}\"",
                escape_quoted(&part.name)
            );
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{}\"", escape_quoted(filename)));
            }
            out.extend_from_slice(disposition.as_bytes());
            out.extend_from_slice(b"\r\n");
            if let Some(ct) = &part.content_type {
                out.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

fn escape_quoted(s: &str) -> String {
    s.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_body() {
        let body = RequestBody::json(&json!({"companyName": "Acme"})).unwrap();
        assert_eq!(body.content_type().as_deref(), Some(JSON_CONTENT_TYPE));
        assert_eq!(body.into_bytes(), br#"{"companyName":"Acme"}"#.to_vec());
    }

    #[test]
    fn raw_bodies_pass_through() {
        let bytes = vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xff];
        let body = RequestBody::from(bytes.clone());
        assert_eq!(body.content_type(), None);
        assert_eq!(body.into_bytes(), bytes);

        let body = RequestBody::from("{\"already\":\"encoded\"}");
        assert_eq!(body.content_type().as_deref(), Some(TEXT_CONTENT_TYPE));
        assert_eq!(body.into_bytes(), b"{\"already\":\"encoded\"}".to_vec());
    }

    #[test]
    fn form_body_is_url_encoded() {
        let body = RequestBody::Form(vec![
            ("username".to_string(), "ana maria".to_string()),
            ("password".to_string(), "a&b=c".to_string()),
        ]);
        assert_eq!(body.content_type().as_deref(), Some(FORM_CONTENT_TYPE));
        assert_eq!(body.into_bytes(), b"username=ana+maria&password=a%26b%3Dc".to_vec());
    }

    #[test]
    fn multipart_layout() {
        let form = Multipart::with_boundary("XYZ")
            .text("description", "Nota fiscal")
            .file("file", "nf.pdf", "application/pdf", b"%PDF".to_vec());
        assert_eq!(form.content_type(), "multipart/form-data; boundary=XYZ");
        let encoded = String::from_utf8(form.encode()).unwrap();
        assert_eq!(
            encoded,
            "--XYZ\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nNota fiscal\r\n\
             --XYZ\r\nContent-Disposition: form-data; name=\"file\"; filename=\"nf.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n%PDF\r\n--XYZ--\r\n"
        );
    }

    #[test]
    fn generated_boundaries_differ() {
        let first = Multipart::new();
        assert_ne!(first.boundary(), Multipart::new().boundary());
        assert!(first.boundary().starts_with("----backoffice-"));
        assert_eq!(first.boundary().len(), "----backoffice-".len() + 32);
    }
}
