//! The per-request parameter bag.

use axum::body::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::cookie::{parse_pairs, CookieJar};

/// Key under which the cookie jar lives in the bag.
pub const COOKIE_KEY: &str = "cookie";

/// A file received in a multipart body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedFile {
    pub name: String,
    pub mimetype: String,
    pub size: usize,
    #[serde(skip)]
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mimetype: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            mimetype: mimetype.into(),
            size: data.len(),
            data,
        }
    }
}

/// One entry of the bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    Value(Value),
    File(UploadedFile),
}

/// Query, body, upload and cookie parameters merged into one mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamBag {
    entries: BTreeMap<String, Param>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, param: Param) {
        self.entries.insert(key.into(), param);
    }

    pub fn insert_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.insert(key, Param::Value(value.into()));
    }

    /// Overwrite every key present in `fields`.
    pub fn extend_values(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.insert(key, Param::Value(value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Param> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        match self.get(key)? {
            Param::Value(v) => Some(v),
            Param::File(_) => None,
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.value(key)?.as_str()
    }

    pub fn file(&self, key: &str) -> Option<&UploadedFile> {
        match self.get(key)? {
            Param::File(f) => Some(f),
            Param::Value(_) => None,
        }
    }

    /// A scalar parameter rendered as a string (numbers and booleans included).
    pub fn string(&self, key: &str) -> Option<String> {
        match self.value(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// JavaScript-style truthiness of a parameter; absent keys are falsy.
    pub fn is_truthy(&self, key: &str) -> bool {
        match self.get(key) {
            None => false,
            Some(Param::File(_)) => true,
            Some(Param::Value(v)) => match v {
                Value::Null => false,
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
                Value::String(s) => !s.is_empty(),
                Value::Array(_) | Value::Object(_) => true,
            },
        }
    }

    /// The session cookies the handler should present upstream.
    pub fn cookie_jar(&self) -> CookieJar {
        match self.value(COOKIE_KEY) {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(name, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((name.clone(), value))
                })
                .collect(),
            Some(Value::String(raw)) => parse_pairs(raw),
            _ => CookieJar::new(),
        }
    }

    /// Scalar and structured values, files excluded.
    pub fn fields(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter_map(|(key, param)| match param {
                Param::Value(v) => Some((key.clone(), v.clone())),
                Param::File(_) => None,
            })
            .collect()
    }

    pub fn has_files(&self) -> bool {
        self.entries.values().any(|p| matches!(p, Param::File(_)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Param)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Convert a cookie jar into the JSON object stored in the bag.
pub fn jar_to_value(jar: &CookieJar) -> Value {
    Value::Object(
        jar.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}
