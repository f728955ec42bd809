/*
 * operators_list.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Per-element operators scan.
//!
//! An element carries at most one jump, conditional, formatting and content
//! operator, and any number of attribute operators. The list is scratch
//! state: every scan starts from empty.

use crate::error::{TemplateError, TemplateResult};
use crate::opcode::{AttributeOp, ConditionalOp, ContentOp, JumpOp, Opcode, OpcodeType};
use crate::options::SubtreeContentPolicy;
use crate::tree::Tree;

/// Operator code paired with its operand, the attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorMeta<Op> {
    pub opcode: Op,
    pub operand: String,
}

impl<Op> OperatorMeta<Op> {
    fn new(opcode: Op, operand: impl Into<String>) -> Self {
        Self {
            opcode,
            operand: operand.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorsList {
    jump: Option<OperatorMeta<JumpOp>>,
    conditional: Option<OperatorMeta<ConditionalOp>>,
    formatting: Option<OperatorMeta<()>>,
    content: Option<OperatorMeta<ContentOp>>,
    attributes: Vec<OperatorMeta<AttributeOp>>,
}

impl OperatorsList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the operators of an element.
    pub fn scan<T: Tree>(
        &mut self,
        tree: &T,
        element: T::Node,
        prefix: &str,
    ) -> TemplateResult<()> {
        self.collect(tree, element, prefix)?;
        self.check_formatting(tree, element)
    }

    /// Scan a list or map item; without a content operator the item binds
    /// its scope with `object` when it has children, `text` otherwise.
    pub fn scan_list_item<T: Tree>(
        &mut self,
        tree: &T,
        element: T::Node,
        prefix: &str,
    ) -> TemplateResult<()> {
        self.collect(tree, element, prefix)?;
        if self.content.is_none() {
            let opcode = if tree.has_children(element) {
                ContentOp::Object
            } else {
                ContentOp::Text
            };
            self.content = Some(OperatorMeta::new(opcode, "."));
        }
        self.check_formatting(tree, element)
    }

    /// Scan the root of a subtree injection.
    ///
    /// The content operator always binds the injected value itself, so its
    /// operand is forced to `.`; text, html and numbering cannot bind a
    /// subtree and are rejected.
    pub fn scan_subtree_root<T: Tree>(
        &mut self,
        tree: &T,
        element: T::Node,
        prefix: &str,
        policy: SubtreeContentPolicy,
    ) -> TemplateResult<()> {
        self.collect(tree, element, prefix)?;
        let opcode = match (self.content.take(), policy) {
            (Some(content), _) => content.opcode,
            (None, SubtreeContentPolicy::DefaultToObject) => ContentOp::Object,
            (None, SubtreeContentPolicy::Reject) => {
                return Err(TemplateError::configuration(
                    tree.describe(element),
                    "Missing content operator. Element not usable for subtree injection.",
                ));
            }
        };
        if matches!(
            opcode,
            ContentOp::Text | ContentOp::Html | ContentOp::Numbering
        ) {
            return Err(TemplateError::configuration(
                tree.describe(element),
                format!("Subtree injection forbids {} operator.", Opcode::Content(opcode)),
            ));
        }
        self.content = Some(OperatorMeta::new(opcode, "."));
        self.check_formatting(tree, element)
    }

    pub fn jump(&self) -> Option<&OperatorMeta<JumpOp>> {
        self.jump.as_ref()
    }

    pub fn conditional(&self) -> Option<&OperatorMeta<ConditionalOp>> {
        self.conditional.as_ref()
    }

    /// Name of the format class declared on the element.
    pub fn format_name(&self) -> Option<&str> {
        self.formatting.as_ref().map(|meta| meta.operand.as_str())
    }

    pub fn content(&self) -> Option<&OperatorMeta<ContentOp>> {
        self.content.as_ref()
    }

    pub fn attributes(&self) -> &[OperatorMeta<AttributeOp>] {
        &self.attributes
    }

    fn reset(&mut self) {
        self.jump = None;
        self.conditional = None;
        self.formatting = None;
        self.content = None;
        self.attributes.clear();
    }

    fn collect<T: Tree>(&mut self, tree: &T, element: T::Node, prefix: &str) -> TemplateResult<()> {
        self.reset();
        for (name, operand) in tree.attributes(element) {
            let Some(opcode) = Opcode::from_attr_name(&name, prefix) else {
                continue;
            };
            if operand.is_empty() {
                return Err(TemplateError::configuration(
                    tree.describe(element),
                    format!("Empty operand for {} operator.", opcode),
                ));
            }
            let duplicate = match opcode {
                Opcode::Jump(op) => self.jump.replace(OperatorMeta::new(op, operand)).is_some(),
                Opcode::Conditional(op) => self
                    .conditional
                    .replace(OperatorMeta::new(op, operand))
                    .is_some(),
                Opcode::Formatting => self
                    .formatting
                    .replace(OperatorMeta::new((), operand))
                    .is_some(),
                Opcode::Content(op) => self
                    .content
                    .replace(OperatorMeta::new(op, operand))
                    .is_some(),
                Opcode::Attribute(op) => {
                    self.attributes.push(OperatorMeta::new(op, operand));
                    false
                }
            };
            if duplicate {
                return Err(only_one(tree, element, opcode.opcode_type()));
            }
        }
        Ok(())
    }

    fn check_formatting<T: Tree>(&self, tree: &T, element: T::Node) -> TemplateResult<()> {
        if self.formatting.is_none() {
            return Ok(());
        }
        let has_text = matches!(
            self.content,
            Some(OperatorMeta {
                opcode: ContentOp::Text,
                ..
            })
        );
        let has_value = self
            .attributes
            .iter()
            .any(|meta| meta.opcode == AttributeOp::Value);
        if has_text || has_value {
            Ok(())
        } else {
            Err(TemplateError::configuration(
                tree.describe(element),
                "Format operator requires a text or value operator on the same element.",
            ))
        }
    }
}

fn only_one<T: Tree>(tree: &T, element: T::Node, opcode_type: OpcodeType) -> TemplateError {
    TemplateError::configuration(
        tree.describe(element),
        format!("Only one {} operator is allowed.", opcode_type),
    )
}
