/*
 * content.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Content adapter.
//!
//! [`Content`] wraps the application model and resolves operator operands,
//! i.e. dotted property paths, to values. A path starting with a dot is
//! absolute and evaluated against the model root; any other path is relative
//! to the scope handed in by the caller. The single dot denotes the scope
//! itself.
//!
//! When an object lacks a property, resolution falls back to the accessors
//! registered on the adapter under the (camel case) property name. This is
//! how derived values, e.g. a full name computed from first and last names,
//! are exposed to templates without changing the model.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::error::{TemplateError, TemplateResult};
use crate::value::ContentValue;

/// Computes a derived property from the object currently being resolved.
pub type Accessor = Box<dyn Fn(&ContentValue) -> ContentValue>;

/// Adapter over the application model.
#[derive(Default)]
pub struct Content {
    model: ContentValue,
    accessors: HashMap<String, Accessor>,
}

impl Content {
    pub fn new(model: impl Into<ContentValue>) -> Self {
        Self {
            model: model.into(),
            accessors: HashMap::new(),
        }
    }

    /// Register an accessor consulted when a property is missing.
    ///
    /// The name is normalized the same way path segments are, so both
    /// `full-name` and `fullName` register the `fullName` accessor.
    pub fn with_accessor(
        mut self,
        name: &str,
        accessor: impl Fn(&ContentValue) -> ContentValue + 'static,
    ) -> Self {
        self.accessors
            .insert(to_script_case(name).into_owned(), Box::new(accessor));
        self
    }

    pub fn model(&self) -> &ContentValue {
        &self.model
    }

    /// Resolve a property path.
    ///
    /// Intermediate `null` values short-circuit to `null`; descending into
    /// a primitive value, or a missing property with no registered accessor,
    /// is a content resolution error.
    pub fn get_value<'s>(
        &'s self,
        scope: &'s ContentValue,
        path: &str,
    ) -> TemplateResult<Cow<'s, ContentValue>> {
        if path == "." {
            return Ok(Cow::Borrowed(scope));
        }
        match path.strip_prefix('.') {
            Some(absolute) => self.get_relative_value(&self.model, absolute, path),
            None => self.get_relative_value(scope, path, path),
        }
    }

    fn get_relative_value<'s>(
        &'s self,
        context: &'s ContentValue,
        path: &str,
        full_path: &str,
    ) -> TemplateResult<Cow<'s, ContentValue>> {
        if path.is_empty() {
            return Err(TemplateError::undefined(full_path));
        }

        let mut segments = path.split('.').peekable();
        let mut current = Cow::Borrowed(context);
        while let Some(segment) = segments.next() {
            current = self.get_property(current, segment, full_path)?;
            if segments.peek().is_none() {
                break;
            }
            if current.is_null() {
                return Ok(Cow::Owned(ContentValue::Null));
            }
            if !current.is_container() {
                return Err(TemplateError::ContentResolution {
                    path: full_path.to_string(),
                    message: format!(
                        "Cannot descend into {} value at segment `{}`.",
                        current.kind(),
                        segment
                    ),
                });
            }
        }
        Ok(current)
    }

    fn get_property<'s>(
        &'s self,
        object: Cow<'s, ContentValue>,
        segment: &str,
        full_path: &str,
    ) -> TemplateResult<Cow<'s, ContentValue>> {
        let name = to_script_case(segment);
        match object {
            Cow::Borrowed(o) => {
                if let Some(value) = o.property(&name) {
                    return Ok(Cow::Borrowed(value));
                }
                self.call_accessor(o, &name, full_path).map(Cow::Owned)
            }
            Cow::Owned(o) => {
                if let Some(value) = o.property(&name) {
                    return Ok(Cow::Owned(value.clone()));
                }
                self.call_accessor(&o, &name, full_path).map(Cow::Owned)
            }
        }
    }

    fn call_accessor(
        &self,
        object: &ContentValue,
        name: &str,
        full_path: &str,
    ) -> TemplateResult<ContentValue> {
        match self.accessors.get(name) {
            Some(accessor) => Ok(accessor(object)),
            None => Err(TemplateError::undefined(full_path)),
        }
    }

    /// Resolve a path that must denote a list.
    ///
    /// `Ok(None)` means the value is `null`; callers treat it as an empty
    /// list and report a warning.
    pub fn get_iterable<'s>(
        &'s self,
        scope: &'s ContentValue,
        path: &str,
    ) -> TemplateResult<Option<Cow<'s, [ContentValue]>>> {
        match self.get_value(scope, path)? {
            Cow::Borrowed(ContentValue::List(items)) => Ok(Some(Cow::Borrowed(items.as_slice()))),
            Cow::Owned(ContentValue::List(items)) => Ok(Some(Cow::Owned(items))),
            value if value.is_null() => Ok(None),
            value => Err(TemplateError::ContentType {
                path: path.to_string(),
                expected: "list",
                found: value.kind(),
            }),
        }
    }

    /// Resolve a path that must denote a key/value map.
    ///
    /// Returns the entries in insertion order; `Ok(None)` means `null`.
    pub fn get_map<'s>(
        &'s self,
        scope: &'s ContentValue,
        path: &str,
    ) -> TemplateResult<Option<Vec<(Cow<'s, str>, Cow<'s, ContentValue>)>>> {
        match self.get_value(scope, path)? {
            Cow::Borrowed(ContentValue::Map(entries)) => Ok(Some(
                entries
                    .iter()
                    .map(|(k, v)| (Cow::Borrowed(k.as_str()), Cow::Borrowed(v)))
                    .collect(),
            )),
            Cow::Owned(ContentValue::Map(entries)) => Ok(Some(
                entries
                    .into_iter()
                    .map(|(k, v)| (Cow::Owned(k), Cow::Owned(v)))
                    .collect(),
            )),
            value if value.is_null() => Ok(None),
            value => Err(TemplateError::ContentType {
                path: path.to_string(),
                expected: "map",
                found: value.kind(),
            }),
        }
    }

    /// Emptiness test on a resolved value.
    ///
    /// A missing property is an error, not an empty value.
    pub fn is_empty(&self, scope: &ContentValue, path: &str) -> TemplateResult<bool> {
        Ok(self.get_value(scope, path)?.is_empty())
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut accessors: Vec<&str> = self.accessors.keys().map(String::as_str).collect();
        accessors.sort_unstable();
        f.debug_struct("Content")
            .field("model", &self.model)
            .field("accessors", &accessors)
            .finish()
    }
}

impl From<ContentValue> for Content {
    fn from(model: ContentValue) -> Self {
        Content::new(model)
    }
}

impl From<serde_json::Value> for Content {
    fn from(model: serde_json::Value) -> Self {
        Content::new(model)
    }
}

/// Convert hyphen case names to camel case, e.g. `get-user-name` to `getUserName`.
pub(crate) fn to_script_case(name: &str) -> Cow<'_, str> {
    if !name.contains('-') {
        return Cow::Borrowed(name);
    }
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
