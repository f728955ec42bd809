/*
 * operators/conditional.rs
 * Copyright (c) 2025 Posit, PBC
 */

use crate::eval_context::codes;
use crate::expression::{ConditionalExpression, is_excluded};
use crate::opcode::ConditionalOp;
use crate::template::Injector;
use crate::tree::Tree;
use crate::value::ContentValue;

pub(crate) trait ConditionalOperator {
    /// True when the branch is enabled.
    fn evaluate<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        element: T::Node,
        scope: &ContentValue,
        operand: &str,
    ) -> bool;
}

pub(crate) struct IfOperator;

impl ConditionalOperator for IfOperator {
    fn evaluate<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        element: T::Node,
        scope: &ContentValue,
        operand: &str,
    ) -> bool {
        match ConditionalExpression::parse(operand).evaluate(inj.ctx.content, scope) {
            Ok(enabled) => enabled,
            Err(warning) => {
                let element = inj.tree.describe(element);
                inj.ctx
                    .warn_with_code(codes::CONDITIONAL_EXPRESSION, warning.to_string(), &element);
                false
            }
        }
    }
}

/// Statically excluded branch, no model access.
pub(crate) struct ExcludeOperator;

impl ConditionalOperator for ExcludeOperator {
    fn evaluate<T: Tree>(
        &self,
        _inj: &mut Injector<'_, T>,
        _element: T::Node,
        _scope: &ContentValue,
        operand: &str,
    ) -> bool {
        !is_excluded(operand)
    }
}

pub(crate) fn evaluate<T: Tree>(
    op: ConditionalOp,
    inj: &mut Injector<'_, T>,
    element: T::Node,
    scope: &ContentValue,
    operand: &str,
) -> bool {
    match op {
        ConditionalOp::If => IfOperator.evaluate(inj, element, scope, operand),
        ConditionalOp::Exclude => ExcludeOperator.evaluate(inj, element, scope, operand),
    }
}
