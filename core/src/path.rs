//! Path template expansion.
//!
//! Templates such as `clients/{id}/contracts/{contractId}` name their
//! parameters between braces. Every placeholder must be bound to a non-null
//! value; values are URL-encoded as path segments.

use crate::error::{ApiError, Result};
use crate::value::Scalar;

/// Named path parameters. A name may be bound to `None` to model an
/// explicit null coming from a form; that still counts as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathParams {
    entries: Vec<(String, Option<Scalar>)>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.insert(name, Some(value.into()));
        self
    }

    pub fn with_opt<V: Into<Scalar>>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.insert(name, value.map(Into::into));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<Scalar>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replace every `{name}` in `template` with the URL-encoded value bound in
/// `params`.
pub fn expand_path(template: &str, params: &PathParams) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            ApiError::configuration(format!("unterminated placeholder in path template `{template}`"))
        })?;
        let name = &after[..close];
        if name.is_empty() || name.contains('{') {
            return Err(ApiError::configuration(format!(
                "malformed placeholder in path template `{template}`"
            )));
        }
        let value = params.get(name).ok_or_else(|| {
            ApiError::configuration(format!(
                "missing path parameter `{name}` for template `{template}`"
            ))
        })?;
        out.push_str(&urlencoding::encode(&value.to_string()));
        rest = &after[close + 1..];
    }

    if rest.contains('}') {
        return Err(ApiError::configuration(format!(
            "unbalanced `}}` in path template `{template}`"
        )));
    }
    out.push_str(rest);
    Ok(out)
}
