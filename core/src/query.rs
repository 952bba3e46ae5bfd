//! Query-string parameters.
//!
//! Entries keep insertion order. Null values, and null elements of lists,
//! are dropped; lists become repeated `key=value` pairs in list order.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::value::Scalar;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    One(Scalar),
    Many(Vec<Option<Scalar>>),
}

/// Ordered query parameters for a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    entries: Vec<(String, QueryValue)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.push(key, QueryValue::One(value.into()))
    }

    pub fn set_opt<V: Into<Scalar>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        let value = value.map_or(QueryValue::Null, |v| QueryValue::One(v.into()));
        self.push(key, value)
    }

    pub fn set_list<I, V>(self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        let values = values.into_iter().map(|v| Some(v.into())).collect();
        self.push(key, QueryValue::Many(values))
    }

    pub fn set_list_opt<I, V>(self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<V>>,
        V: Into<Scalar>,
    {
        let values = values.into_iter().map(|v| v.map(Into::into)).collect();
        self.push(key, QueryValue::Many(values))
    }

    pub fn push(mut self, key: impl Into<String>, value: QueryValue) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    /// Build from any serializable filter struct or map. Top-level fields
    /// become keys; `null` fields are dropped and arrays become repeated
    /// keys. Nested objects are rejected.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| ApiError::configuration(format!("query parameters not serializable: {e}")))?;
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::new()),
            other => {
                return Err(ApiError::configuration(format!(
                    "query parameters must serialize to an object, got `{other}`"
                )))
            }
        };

        let mut query = Self::new();
        for (key, value) in map {
            let value = match value {
                Value::Null => QueryValue::Null,
                Value::Array(items) => {
                    let items = items
                        .iter()
                        .map(|item| match item {
                            Value::Null => Ok(None),
                            other => Scalar::from_json(other)
                                .map(Some)
                                .ok_or_else(|| nested_error(&key)),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    QueryValue::Many(items)
                }
                other => QueryValue::One(Scalar::from_json(&other).ok_or_else(|| nested_error(&key))?),
            };
            query = query.push(key, value);
        }
        Ok(query)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encoded query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        for (key, value) in &self.entries {
            match value {
                QueryValue::Null => {}
                QueryValue::One(v) => pairs.push(encode_pair(key, v)),
                QueryValue::Many(items) => {
                    pairs.extend(items.iter().flatten().map(|v| encode_pair(key, v)))
                }
            }
        }
        pairs.join("&")
    }
}

fn encode_pair(key: &str, value: &Scalar) -> String {
    format!(
        "{}={}",
        urlencoding::encode(key),
        urlencoding::encode(&value.to_string())
    )
}

fn nested_error(key: &str) -> ApiError {
    ApiError::configuration(format!("query parameter `{key}` must be a scalar or a list of scalars"))
}

/// Append `query` to `url`, respecting an existing `?`.
pub(crate) fn append_query(url: &mut String, query: &Query) {
    let encoded = query.to_query_string();
    if encoded.is_empty() {
        return;
    }
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(&encoded);
}
