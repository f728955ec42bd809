/*
 * eval_context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Evaluation context for template injection.
//!
//! This module provides [`EvalContext`], which is threaded through the
//! recursive injection to hold:
//!
//! 1. **Content**: the adapter over the injected model
//! 2. **Scratch state**: the operators list and the numbering index stack
//! 3. **Diagnostics**: warnings and recovered errors, each tied to an element
//! 4. **Configuration**: injection options and registered format classes

use crate::content::Content;
use crate::format::FormatRegistry;
use crate::numbering::IndexStack;
use crate::operators_list::OperatorsList;
use crate::options::InjectOptions;

/// Diagnostic codes.
pub mod codes {
    /// Undefined content value; the operator was skipped.
    pub const UNDEFINED_VALUE: &str = "T-2-1";
    /// Null list or map value rendered as empty.
    pub const NULL_COLLECTION: &str = "T-2-2";
    /// Null object value; the subtree was reset.
    pub const NULL_OBJECT: &str = "T-2-3";
    /// Null or empty CSS class value; the class rule was skipped.
    pub const NULL_CSS_CLASS: &str = "T-2-4";
    /// Content type error recorded while recovering subtrees.
    pub const CONTENT_TYPE: &str = "T-3-1";
    /// Malformed conditional expression, evaluated as false.
    pub const CONDITIONAL_EXPRESSION: &str = "T-4-1";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Error,
    Warning,
}

/// A diagnostic message tied to the element being injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub code: Option<String>,
    pub message: String,
    /// Element description, e.g. `ul#users`.
    pub element: Option<String>,
}

/// Collector for diagnostic messages during injection.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add an error message with error code and element.
    pub fn error_with_code(&mut self, code: &str, message: impl Into<String>, element: &str) {
        let message = message.into();
        tracing::error!(code, element, "{}", message);
        self.add(Diagnostic {
            kind: DiagnosticKind::Error,
            code: Some(code.to_string()),
            message,
            element: Some(element.to_string()),
        });
    }

    /// Add a warning message with error code and element.
    pub fn warn_with_code(&mut self, code: &str, message: impl Into<String>, element: &str) {
        let message = message.into();
        tracing::warn!(code, element, "{}", message);
        self.add(Diagnostic {
            kind: DiagnosticKind::Warning,
            code: Some(code.to_string()),
            message,
            element: Some(element.to_string()),
        });
    }

    /// Check if any errors were collected (warnings don't count).
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }
}

/// Context for one injection call.
pub struct EvalContext<'a> {
    /// Adapter over the injected model.
    pub content: &'a Content,

    pub formats: &'a FormatRegistry,

    pub options: &'a InjectOptions,

    /// Scratch operators list, rescanned for every element.
    pub operators: OperatorsList,

    /// Numbering index stack.
    pub indexes: IndexStack,

    pub diagnostics: DiagnosticCollector,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        content: &'a Content,
        formats: &'a FormatRegistry,
        options: &'a InjectOptions,
    ) -> Self {
        Self {
            content,
            formats,
            options,
            operators: OperatorsList::new(),
            indexes: IndexStack::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    pub fn warn_with_code(&mut self, code: &str, message: impl Into<String>, element: &str) {
        self.diagnostics.warn_with_code(code, message, element);
    }

    pub fn error_with_code(&mut self, code: &str, message: impl Into<String>, element: &str) {
        self.diagnostics.error_with_code(code, message, element);
    }

    pub fn into_diagnostics(self) -> DiagnosticCollector {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ContentValue;

    #[test]
    fn test_diagnostic_collector() {
        let mut collector = DiagnosticCollector::new();
        assert!(collector.is_empty());

        collector.warn_with_code(codes::NULL_COLLECTION, "Null list.", "ul#users");
        assert!(!collector.has_errors());

        collector.error_with_code(codes::CONTENT_TYPE, "Bad type.", "ul");
        assert!(collector.has_errors());
        assert_eq!(collector.len(), 2);
        assert_eq!(collector.diagnostics()[0].element.as_deref(), Some("ul#users"));
        assert_eq!(collector.diagnostics()[0].code.as_deref(), Some("T-2-2"));
    }

    #[test]
    fn test_eval_context_collects_diagnostics() {
        let content = Content::new(ContentValue::Null);
        let formats = FormatRegistry::new();
        let options = InjectOptions::default();

        let mut ctx = EvalContext::new(&content, &formats, &options);
        ctx.warn_with_code(codes::UNDEFINED_VALUE, "Undefined.", "p");
        ctx.error_with_code(codes::CONTENT_TYPE, "Bad type.", "ul");
        assert_eq!(ctx.indexes.depth(), 0);

        let diagnostics = ctx.into_diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.diagnostics()[0].kind, DiagnosticKind::Warning);
        assert_eq!(diagnostics.diagnostics()[1].kind, DiagnosticKind::Error);
    }
}
