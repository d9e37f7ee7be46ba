use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::mailjet::types::Headers;

/// A single header line
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HeaderEntry {
    #[serde(alias = "key")]
    pub name: String,
    #[serde(deserialize_with = "text_value")]
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderValue {
    One(String),
    Many(Vec<String>),
}

/// Numbers and booleans are accepted as header values and sent as text
fn scalar_text(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("invalid header value: {}", other)),
    }
}

fn text_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    scalar_text(Value::deserialize(deserializer)?).map_err(de::Error::custom)
}

impl<'de> Deserialize<'de> for HeaderValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(scalar_text)
                .collect::<Result<Vec<_>, _>>()
                .map(HeaderValue::Many)
                .map_err(de::Error::custom),
            other => scalar_text(other)
                .map(HeaderValue::One)
                .map_err(de::Error::custom),
        }
    }
}

/// Headers as handed over by the caller: either a mapping of name to one or
/// more values, or a list of `{key, value}` pairs.
///
/// Mapping order is the order the entries were inserted (or appear in the
/// JSON object), not sorted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeadersInput {
    Map(Vec<(String, HeaderValue)>),
    List(Vec<HeaderEntry>),
}

impl Default for HeadersInput {
    fn default() -> Self {
        HeadersInput::List(Vec::new())
    }
}

impl HeadersInput {
    /// Flatten into one entry per value, preserving order and duplicates
    pub fn normalize(&self) -> Vec<HeaderEntry> {
        match *self {
            HeadersInput::List(ref entries) => entries.clone(),
            HeadersInput::Map(ref map) => map
                .iter()
                .flat_map(|(name, value)| match *value {
                    HeaderValue::One(ref v) => vec![HeaderEntry::new(name.as_str(), v.as_str())],
                    HeaderValue::Many(ref vs) => vs
                        .iter()
                        .map(|v| HeaderEntry::new(name.as_str(), v.as_str()))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Normalize and re-key into the provider header mapping
    pub fn to_headers(&self) -> Headers {
        Headers(self.normalize())
    }
}

impl<N: Into<String>, V: Into<String>> From<Vec<(N, V)>> for HeadersInput {
    fn from(pairs: Vec<(N, V)>) -> Self {
        HeadersInput::Map(
            pairs
                .into_iter()
                .map(|(n, v)| (n.into(), HeaderValue::One(v.into())))
                .collect(),
        )
    }
}

impl From<Vec<HeaderEntry>> for HeadersInput {
    fn from(entries: Vec<HeaderEntry>) -> Self {
        HeadersInput::List(entries)
    }
}

struct HeadersInputVisitor;

impl<'de> Visitor<'de> for HeadersInputVisitor {
    type Value = HeadersInput;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of header names to values, or a list of {key, value} pairs")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = Vec::with_capacity(access.size_hint().unwrap_or(0));

        while let Some((name, value)) = access.next_entry::<String, HeaderValue>()? {
            map.push((name, value));
        }

        Ok(HeadersInput::Map(map))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));

        while let Some(entry) = access.next_element::<HeaderEntry>()? {
            entries.push(entry);
        }

        Ok(HeadersInput::List(entries))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(HeadersInput::default())
    }
}

impl<'de> Deserialize<'de> for HeadersInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(HeadersInputVisitor)
    }
}
