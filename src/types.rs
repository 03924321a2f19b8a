//! Shared value types produced by the resolution pipeline.
//!
//! A render builds one [`Metadata`] map and one [`Prefixes`] map. Both are
//! insertion-ordered so the emitted markup follows registration order, and
//! both serialize as plain JSON objects for the `show --json` command.

use serde::Serialize;
use serde::ser::SerializeMap;

/// A resolved property value: a single string or a sequence of strings.
///
/// Absence is always an empty string or an empty list, never a missing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    List(Vec<String>),
}

impl MetaValue {
    pub fn empty_text() -> Self {
        MetaValue::Text(String::new())
    }

    pub fn empty_list() -> Self {
        MetaValue::List(Vec::new())
    }

    /// True when there is nothing worth emitting: an empty string, or a list
    /// whose elements are all empty.
    pub fn is_empty(&self) -> bool {
        match self {
            MetaValue::Text(s) => s.is_empty(),
            MetaValue::List(items) => items.iter().all(String::is_empty),
        }
    }

    /// Borrow every element: one for text, each item for a list.
    pub fn values(&self) -> Vec<&str> {
        match self {
            MetaValue::Text(s) => vec![s.as_str()],
            MetaValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// The text form. Lists collapse to their first element.
    pub fn as_text(&self) -> &str {
        match self {
            MetaValue::Text(s) => s,
            MetaValue::List(items) => items.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// Convert into a list. Non-empty text becomes a one-element list.
    pub fn into_list(self) -> Vec<String> {
        match self {
            MetaValue::Text(s) if s.is_empty() => Vec::new(),
            MetaValue::Text(s) => vec![s],
            MetaValue::List(items) => items,
        }
    }

    /// Convert into text. Lists collapse to their first element.
    pub fn into_text(self) -> String {
        match self {
            MetaValue::Text(s) => s,
            MetaValue::List(items) => items.into_iter().next().unwrap_or_default(),
        }
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(items: Vec<String>) -> Self {
        MetaValue::List(items)
    }
}

/// Insertion-ordered map from property key (`og:title`, `twitter:card`, ...)
/// to its resolved value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, MetaValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Append one element to a list-valued key, creating it when absent.
    /// Existing text values are promoted to a list first.
    pub fn push(&mut self, key: impl Into<String>, item: impl Into<String>) {
        let key = key.into();
        let item = item.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, value)) => {
                let mut items = std::mem::replace(value, MetaValue::empty_list()).into_list();
                items.push(item);
                *value = MetaValue::List(items);
            }
            None => self.entries.push((key, MetaValue::List(vec![item]))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Metadata {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Namespace short-name → URI pairs for the document `prefix` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefixes {
    entries: Vec<(String, String)>,
}

impl Prefixes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a namespace declaration.
    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        let uri = uri.into();
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some(slot) => slot.1 = uri,
            None => self.entries.push((prefix, uri)),
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Render as the space-separated `prefix: uri` list used in RDFa.
    pub fn to_attribute_value(&self) -> String {
        self.entries
            .iter()
            .map(|(p, u)| format!("{p}: {u}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
