/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template scanning, content resolution and injection.

use thiserror::Error;

/// Errors that can occur during template operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    /// Programmer-caused misuse of the operator language on an element:
    /// duplicate operators, empty operands, malformed operand lists,
    /// numbering outside an ordered container, missing format class, ...
    #[error("Invalid operators on element {element}: {message}")]
    Configuration { element: String, message: String },

    /// A property path could not be resolved against the model.
    #[error("Undefined content value for property `{path}`: {message}")]
    ContentResolution { path: String, message: String },

    /// A content value has the wrong shape for the operator consuming it.
    #[error("Invalid content type for property `{path}`: expected {expected} but got {found}")]
    ContentType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A format class failed to format or parse a value.
    #[error("Format error: {message}")]
    Format { message: String },

    /// The reference document could not be loaded from markup.
    #[error("Markup error: {message}")]
    Markup { message: String },
}

impl TemplateError {
    pub(crate) fn configuration(element: impl Into<String>, message: impl Into<String>) -> Self {
        TemplateError::Configuration {
            element: element.into(),
            message: message.into(),
        }
    }

    pub(crate) fn undefined(path: impl Into<String>) -> Self {
        TemplateError::ContentResolution {
            path: path.into(),
            message: "Undefined content value.".to_string(),
        }
    }

    /// Property path carried by content errors, if any.
    pub fn property_path(&self) -> Option<&str> {
        match self {
            TemplateError::ContentResolution { path, .. }
            | TemplateError::ContentType { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
