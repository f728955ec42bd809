/*
 * operators/mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Operator implementations.
//!
//! Operators are grouped by type, one trait per group. Each operator code
//! of the catalog maps to a unit type implementing its group trait, and the
//! dispatch functions of each module resolve the code to that type.

pub(crate) mod attribute;
pub(crate) mod conditional;
pub(crate) mod content;
pub(crate) mod jump;

use std::borrow::Cow;

use crate::error::{TemplateError, TemplateResult};
use crate::format::FormatRegistry;
use crate::value::ContentValue;

/// One operator invocation on an element.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Call<'o, N> {
    pub element: N,
    pub operand: &'o str,
    /// Format class declared on the same element.
    pub format: Option<&'o str>,
}

/// What the traversal does after a content operator.
#[derive(Debug)]
pub(crate) enum Flow<'s> {
    /// The operator rendered the whole branch.
    Stop,
    /// Inject the children with this scope.
    Descend(Cow<'s, ContentValue>),
}

/// Render a value as text, through the declared format class if any.
pub(crate) fn format_value(
    formats: &FormatRegistry,
    format: Option<&str>,
    value: &ContentValue,
    path: &str,
    element: impl FnOnce() -> String,
) -> TemplateResult<String> {
    match format {
        Some(name) => {
            let format = formats.get(name).ok_or_else(|| {
                TemplateError::configuration(element(), format!("Missing format class `{}`.", name))
            })?;
            format.format(value)
        }
        None => primitive_text(value, path),
    }
}

pub(crate) fn primitive_text(value: &ContentValue, path: &str) -> TemplateResult<String> {
    value.to_text().ok_or_else(|| TemplateError::ContentType {
        path: path.to_string(),
        expected: "primitive",
        found: value.kind(),
    })
}

/// Split `name:value;name:value;...` pairs.
///
/// A single trailing `;` is accepted. The split is on the last `:` of a
/// pair so names may carry a namespace prefix and conditional expressions
/// may hold time literals.
pub(crate) fn parse_name_values(operand: &str) -> Result<Vec<(&str, &str)>, String> {
    let operand = operand.strip_suffix(';').unwrap_or(operand);
    operand
        .split(';')
        .map(|pair| match pair.rsplit_once(':') {
            Some((name, value)) if !name.is_empty() && !value.is_empty() => Ok((name, value)),
            Some(_) => Err(format!("Empty name or value in pair `{}`.", pair)),
            None if pair.is_empty() => Err("Empty name/value pair.".to_string()),
            None => Err(format!("Missing `:` separator in pair `{}`.", pair)),
        })
        .collect()
}
