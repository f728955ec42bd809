/*
 * operators/jump.rs
 * Copyright (c) 2025 Posit, PBC
 */

use crate::opcode::JumpOp;
use crate::tree::Tree;

pub(crate) trait JumpOperator {
    /// Element the traversal continues with, if it exists.
    fn target<T: Tree>(&self, tree: &T, operand: &str) -> Option<T::Node>;
}

/// Continue with the element whose id is the operand.
pub(crate) struct GotoOperator;

impl JumpOperator for GotoOperator {
    fn target<T: Tree>(&self, tree: &T, operand: &str) -> Option<T::Node> {
        tree.element_by_id(operand)
    }
}

pub(crate) fn target<T: Tree>(op: JumpOp, tree: &T, operand: &str) -> Option<T::Node> {
    match op {
        JumpOp::Goto => GotoOperator.target(tree, operand),
    }
}
