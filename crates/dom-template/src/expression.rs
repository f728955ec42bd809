/*
 * expression.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conditional expressions.
//!
//! An expression is one or more statements separated by `;`, all of which
//! must hold:
//!
//! ```text
//! [!]path[(=|<|>)literal]
//! ```
//!
//! - `path` holds when the value is not empty, `!path` when it is empty
//! - `path=literal` compares null (`null`), booleans, numbers, strings and
//!   dates; a date literal may be partial, e.g. `1964-03`, and only the
//!   given fields are compared
//! - `path<literal`, `path>literal` compare numbers and dates
//!
//! A path that does not resolve is treated as null. Malformed statements
//! evaluate to false with a warning, whatever their negation.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{Datelike, TimeZone, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::content::Content;
use crate::value::ContentValue;

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?$").unwrap());

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})(?:-(\d{2})(?:-(\d{2})(?:T(\d{2})(?::(\d{2})(?::(\d{2})Z?)?)?)?)?)?$",
    )
    .unwrap()
});

/// Reason a statement evaluated to false without being compared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionWarning {
    #[error("Invalid conditional expression `{expression}`. Not supported operator `{operator}`.")]
    UnsupportedOperator { expression: String, operator: char },

    #[error(
        "Invalid conditional expression `{expression}`. Missing operand for operator `{operator}`."
    )]
    MissingOperand { expression: String, operator: char },

    #[error(
        "Invalid conditional expression `{expression}`. \
         Operator `{operator}` does not accept {kind} values."
    )]
    ValueNotAccepted {
        expression: String,
        operator: char,
        kind: &'static str,
    },

    #[error("Invalid conditional expression `{expression}`. Operand does not match {kind} value.")]
    OperandMismatch {
        expression: String,
        kind: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    NotEmpty,
    Equals,
    LessThan,
    GreaterThan,
    Unsupported(char),
}

impl Comparison {
    fn for_char(c: char) -> Self {
        match c {
            '=' => Comparison::Equals,
            '<' => Comparison::LessThan,
            '>' => Comparison::GreaterThan,
            other => Comparison::Unsupported(other),
        }
    }

    fn symbol(self) -> char {
        match self {
            Comparison::NotEmpty => '?',
            Comparison::Equals => '=',
            Comparison::LessThan => '<',
            Comparison::GreaterThan => '>',
            Comparison::Unsupported(c) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Statement<'e> {
    not: bool,
    path: &'e str,
    comparison: Comparison,
    operand: Option<&'e str>,
}

/// A parsed conditional expression.
#[derive(Debug, Clone)]
pub struct ConditionalExpression<'e> {
    expression: &'e str,
    statements: Vec<Statement<'e>>,
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '$' | '-')
}

impl<'e> ConditionalExpression<'e> {
    pub fn parse(expression: &'e str) -> Self {
        let statements = expression
            .split(';')
            .filter(|s| !s.is_empty())
            .map(parse_statement)
            .collect();
        Self {
            expression,
            statements,
        }
    }

    /// Evaluate against a scope; statements are checked left to right and
    /// evaluation stops at the first one that does not hold.
    pub fn evaluate(
        &self,
        content: &Content,
        scope: &ContentValue,
    ) -> Result<bool, ExpressionWarning> {
        let mut value = false;
        for statement in &self.statements {
            let resolved = content
                .get_value(scope, statement.path)
                .unwrap_or(Cow::Owned(ContentValue::Null));
            value = self.evaluate_statement(statement, &resolved)?;
            if !value {
                break;
            }
        }
        Ok(value)
    }

    fn evaluate_statement(
        &self,
        statement: &Statement<'_>,
        value: &ContentValue,
    ) -> Result<bool, ExpressionWarning> {
        let result = match statement.comparison {
            Comparison::Unsupported(operator) => {
                return Err(ExpressionWarning::UnsupportedOperator {
                    expression: self.expression.to_string(),
                    operator,
                });
            }
            Comparison::NotEmpty => !value.is_empty(),
            comparison => {
                let Some(operand) = statement.operand else {
                    return Err(ExpressionWarning::MissingOperand {
                        expression: self.expression.to_string(),
                        operator: comparison.symbol(),
                    });
                };
                match comparison {
                    Comparison::Equals => self.equals(value, operand)?,
                    Comparison::LessThan => {
                        self.compare(comparison, value, operand)? == Some(Ordering::Less)
                    }
                    _ => self.compare(comparison, value, operand)? == Some(Ordering::Greater),
                }
            }
        };
        Ok(result != statement.not)
    }

    fn equals(&self, value: &ContentValue, operand: &str) -> Result<bool, ExpressionWarning> {
        match value {
            ContentValue::Null => Ok(operand == "null"),
            ContentValue::Bool(b) => match operand {
                "true" => Ok(*b),
                "false" => Ok(!*b),
                _ => Err(self.mismatch(value)),
            },
            ContentValue::Number(n) => Ok(self.number_operand(value, operand)? == *n),
            ContentValue::String(s) => Ok(s == operand),
            ContentValue::Date(date) => {
                let captures = self.date_operand(value, operand)?;
                let fields = [
                    date.year(),
                    date.month() as i32,
                    date.day() as i32,
                    date.hour() as i32,
                    date.minute() as i32,
                    date.second() as i32,
                ];
                Ok(fields.iter().enumerate().all(|(i, field)| {
                    captures
                        .get(i + 1)
                        .and_then(|m| m.as_str().parse::<i32>().ok())
                        .is_none_or(|expected| expected == *field)
                }))
            }
            ContentValue::List(_) | ContentValue::Map(_) => {
                Err(ExpressionWarning::ValueNotAccepted {
                    expression: self.expression.to_string(),
                    operator: '=',
                    kind: value.kind(),
                })
            }
        }
    }

    fn compare(
        &self,
        comparison: Comparison,
        value: &ContentValue,
        operand: &str,
    ) -> Result<Option<Ordering>, ExpressionWarning> {
        match value {
            ContentValue::Number(n) => Ok(n.partial_cmp(&self.number_operand(value, operand)?)),
            ContentValue::Date(date) => {
                let captures = self.date_operand(value, operand)?;
                let field = |i: usize, default: u32| {
                    captures
                        .get(i)
                        .and_then(|m| m.as_str().parse::<u32>().ok())
                        .unwrap_or(default)
                };
                let year = captures
                    .get(1)
                    .and_then(|m| m.as_str().parse::<i32>().ok())
                    .unwrap_or_default();
                let literal = Utc
                    .with_ymd_and_hms(
                        year,
                        field(2, 1),
                        field(3, 1),
                        field(4, 0),
                        field(5, 0),
                        field(6, 0),
                    )
                    .single()
                    .ok_or_else(|| self.mismatch(value))?;
                Ok(Some(date.cmp(&literal)))
            }
            _ => Err(ExpressionWarning::ValueNotAccepted {
                expression: self.expression.to_string(),
                operator: comparison.symbol(),
                kind: value.kind(),
            }),
        }
    }

    fn number_operand(
        &self,
        value: &ContentValue,
        operand: &str,
    ) -> Result<f64, ExpressionWarning> {
        if !NUMBER_PATTERN.is_match(operand) {
            return Err(self.mismatch(value));
        }
        operand.parse::<f64>().map_err(|_| self.mismatch(value))
    }

    fn date_operand<'o>(
        &self,
        value: &ContentValue,
        operand: &'o str,
    ) -> Result<Captures<'o>, ExpressionWarning> {
        DATE_PATTERN
            .captures(operand)
            .ok_or_else(|| self.mismatch(value))
    }

    fn mismatch(&self, value: &ContentValue) -> ExpressionWarning {
        ExpressionWarning::OperandMismatch {
            expression: self.expression.to_string(),
            kind: value.kind(),
        }
    }
}

fn parse_statement(source: &str) -> Statement<'_> {
    let (not, rest) = match source.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, source),
    };
    match rest.char_indices().find(|(_, c)| !is_path_char(*c)) {
        None => Statement {
            not,
            path: rest,
            comparison: Comparison::NotEmpty,
            operand: None,
        },
        Some((pos, c)) => {
            let operand = &rest[pos + c.len_utf8()..];
            Statement {
                not,
                path: &rest[..pos],
                comparison: Comparison::for_char(c),
                operand: (!operand.is_empty()).then_some(operand),
            }
        }
    }
}

/// Value of an `exclude` operand: `true`, in any case, excludes the branch.
pub fn is_excluded(operand: &str) -> bool {
    operand.eq_ignore_ascii_case("true")
}
