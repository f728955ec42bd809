/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Content model values.
//!
//! [`ContentValue`] is the in-memory data model projected onto element trees.
//! It is independent of any serialization format; conversion from
//! `serde_json::Value` is provided and keeps object key order, which is the
//! enumeration order used by the map operators.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;

/// A value of the application model.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ContentValue {
    /// A null/missing value.
    #[default]
    Null,

    /// A boolean value.
    Bool(bool),

    /// A numeric value.
    Number(f64),

    /// A string value.
    String(String),

    /// A point in time.
    Date(DateTime<Utc>),

    /// An ordered sequence of values.
    List(Vec<ContentValue>),

    /// Insertion-ordered string keys to values.
    Map(IndexMap<String, ContentValue>),
}

impl ContentValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ContentValue::Null)
    }

    /// Emptiness as understood by conditional operators.
    ///
    /// - `Null`, `false`, `0`, `""` are empty
    /// - lists and maps are empty when they have no entries
    /// - dates are never empty
    pub fn is_empty(&self) -> bool {
        match self {
            ContentValue::Null => true,
            ContentValue::Bool(b) => !*b,
            ContentValue::Number(n) => *n == 0.0,
            ContentValue::String(s) => s.is_empty(),
            ContentValue::Date(_) => false,
            ContentValue::List(items) => items.is_empty(),
            ContentValue::Map(entries) => entries.is_empty(),
        }
    }

    /// True for values that have a direct textual form.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            ContentValue::Bool(_)
                | ContentValue::Number(_)
                | ContentValue::String(_)
                | ContentValue::Date(_)
        )
    }

    /// True for values a property path can descend into.
    pub fn is_container(&self) -> bool {
        matches!(self, ContentValue::List(_) | ContentValue::Map(_))
    }

    /// Human readable kind name, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentValue::Null => "null",
            ContentValue::Bool(_) => "boolean",
            ContentValue::Number(_) => "number",
            ContentValue::String(_) => "string",
            ContentValue::Date(_) => "date",
            ContentValue::List(_) => "list",
            ContentValue::Map(_) => "map",
        }
    }

    /// Direct property lookup.
    ///
    /// Maps are looked up by key; lists accept a decimal index.
    pub fn property(&self, name: &str) -> Option<&ContentValue> {
        match self {
            ContentValue::Map(entries) => entries.get(name),
            ContentValue::List(items) => name.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Render a primitive value as text.
    ///
    /// Returns `None` for null, lists and maps.
    pub fn to_text(&self) -> Option<String> {
        match self {
            ContentValue::String(s) => Some(s.clone()),
            ContentValue::Bool(b) => Some(b.to_string()),
            ContentValue::Number(n) => Some(format_number(*n)),
            ContentValue::Date(d) => Some(d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ContentValue::Null | ContentValue::List(_) | ContentValue::Map(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContentValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ContentValue]> {
        match self {
            ContentValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ContentValue>> {
        match self {
            ContentValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Integral numbers print without a fraction so ids and counters read naturally.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<bool> for ContentValue {
    fn from(b: bool) -> Self {
        ContentValue::Bool(b)
    }
}

impl From<f64> for ContentValue {
    fn from(n: f64) -> Self {
        ContentValue::Number(n)
    }
}

impl From<i64> for ContentValue {
    fn from(n: i64) -> Self {
        ContentValue::Number(n as f64)
    }
}

impl From<i32> for ContentValue {
    fn from(n: i32) -> Self {
        ContentValue::Number(f64::from(n))
    }
}

impl From<&str> for ContentValue {
    fn from(s: &str) -> Self {
        ContentValue::String(s.to_string())
    }
}

impl From<String> for ContentValue {
    fn from(s: String) -> Self {
        ContentValue::String(s)
    }
}

impl From<DateTime<Utc>> for ContentValue {
    fn from(d: DateTime<Utc>) -> Self {
        ContentValue::Date(d)
    }
}

impl<T: Into<ContentValue>> From<Option<T>> for ContentValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ContentValue::Null, Into::into)
    }
}

impl<T: Into<ContentValue>> From<Vec<T>> for ContentValue {
    fn from(items: Vec<T>) -> Self {
        ContentValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, ContentValue>> for ContentValue {
    fn from(entries: IndexMap<String, ContentValue>) -> Self {
        ContentValue::Map(entries)
    }
}

impl<K: Into<String>, V: Into<ContentValue>> FromIterator<(K, V)> for ContentValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ContentValue::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<serde_json::Value> for ContentValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ContentValue::Null,
            serde_json::Value::Bool(b) => ContentValue::Bool(b),
            serde_json::Value::Number(n) => {
                n.as_f64().map_or(ContentValue::Null, ContentValue::Number)
            }
            serde_json::Value::String(s) => ContentValue::String(s),
            serde_json::Value::Array(items) => {
                ContentValue::List(items.into_iter().map(ContentValue::from).collect())
            }
            serde_json::Value::Object(entries) => ContentValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, ContentValue::from(v)))
                    .collect(),
            ),
        }
    }
}
