//! Lenient JSON:API document parsing for MBTA v3 responses.
//!
//! The envelope is parsed once; individual resources are decoded on demand
//! with [`Resource::from_value`] so a single malformed record only loses
//! itself.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// Top-level JSON:API response.
///
/// `data` is an array for collection endpoints and an object for single
/// resources, so both are kept as raw [`Value`]s.
#[derive(Debug, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub included: Value,
}

impl Document {
    /// The fallback document: no data and nothing included.
    pub fn empty() -> Self {
        Self {
            data: Value::Array(Vec::new()),
            included: Value::Array(Vec::new()),
        }
    }

    /// Primary resources, whether `data` holds one object or a list.
    pub fn resources(&self) -> impl Iterator<Item = &Value> {
        as_items(&self.data)
    }

    /// The primary resource of a single-resource response.
    pub fn single(&self) -> Option<&Value> {
        match &self.data {
            Value::Object(_) => Some(&self.data),
            _ => None,
        }
    }

    /// Included resources of the given JSON:API `type`.
    pub fn included_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        as_items(&self.included).filter(move |v| v["type"].as_str() == Some(kind))
    }

    pub fn is_empty(&self) -> bool {
        self.resources().next().is_none()
    }
}

fn as_items(value: &Value) -> impl Iterator<Item = &Value> {
    let items: &[Value] = match value {
        Value::Array(items) => items,
        Value::Object(_) => std::slice::from_ref(value),
        _ => &[],
    };
    items.iter()
}

/// Relationship linkage, kept raw: to-one links are objects, to-many links
/// are arrays, and missing links are null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Value,
}

/// One JSON:API resource with typed attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource<A> {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: A,
    #[serde(default)]
    pub relationships: HashMap<String, Relationship>,
}

impl<A: DeserializeOwned + Default> Resource<A> {
    /// Decodes one resource, or `None` when its shape does not match `A`.
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    /// Id of the resource linked under `name`, if any.
    pub fn related_id(&self, name: &str) -> Option<&str> {
        self.relationships.get(name)?.data.get("id")?.as_str()
    }
}

/// Decodes a response body into a [`Document`].
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON object.
pub fn parse_document(bytes: &[u8]) -> serde_json::Result<Document> {
    serde_json::from_slice(bytes)
}
