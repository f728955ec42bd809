/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Attribute-driven template injection for element trees.
//!
//! A template is an ordinary element tree whose elements carry operator
//! attributes (`data-text`, `data-list`, `data-if`, ...). Injecting a content
//! model walks the tree and lets each operator project a part of the model
//! onto its element. Injection is repeatable: injecting another model into
//! the same tree replaces whatever the previous injection rendered.
//!
//! Supported operators:
//!
//! - Jump: `goto`
//! - Conditional: `if`, `exclude`
//! - Formatting: `format`
//! - Content: `text`, `html`, `object`, `list`, `olist`, `map`, `omap`, `numbering`
//! - Attribute: `attr`, `css-class`, `id`, `src`, `href`, `title`, `value`
//!
//! # Architecture
//!
//! The engine is **independent of any concrete element tree**. It works
//! against the [`Tree`] trait; [`Document`] is the bundled arena
//! implementation, loaded from XML-like markup. The content model is a
//! [`ContentValue`] wrapped in a [`Content`] adapter that resolves property
//! paths and optional named accessors.
//!
//! # Example
//!
//! ```
//! use dom_template::{Document, Template};
//! use serde_json::json;
//!
//! let doc = Document::parse(
//!     r#"<section><h1 data-text="title"/><p data-if="description" data-text="description"/></section>"#,
//! )
//! .unwrap();
//!
//! let mut template = Template::new(doc);
//! template
//!     .inject(json!({"title": "Hello", "description": ""}))
//!     .unwrap();
//!
//! assert_eq!(
//!     template.tree().to_markup(),
//!     r#"<section><h1 data-text="title">Hello</h1><p data-if="description" data-text="description" hidden="hidden"/></section>"#
//! );
//! ```

pub mod content;
pub mod document;
pub mod error;
pub mod eval_context;
pub mod expression;
pub mod format;
pub mod numbering;
pub mod opcode;
pub mod operators_list;
pub mod options;
pub mod template;
pub mod tree;
pub mod value;

mod operators;

// Re-export main types at crate root
pub use content::Content;
pub use document::{Document, NodeId};
pub use error::{TemplateError, TemplateResult};
pub use eval_context::{Diagnostic, DiagnosticCollector, DiagnosticKind};
pub use expression::ExpressionWarning;
pub use format::{DateFormat, Format, FormatRegistry, NumberFormat};
pub use numbering::{IndexStack, NumberingError, NumberingFormat};
pub use opcode::Opcode;
pub use options::{InjectOptions, SubtreeContentPolicy};
pub use template::Template;
pub use tree::Tree;
pub use value::ContentValue;
