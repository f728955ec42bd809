/*
 * operators/attribute.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Attribute operators.
//!
//! They set element attributes from content values and never change the
//! traversal scope. A `null` value removes the attribute.

use crate::error::{TemplateError, TemplateResult};
use crate::eval_context::codes;
use crate::expression::ConditionalExpression;
use crate::opcode::AttributeOp;
use crate::operators::{Call, format_value, parse_name_values, primitive_text};
use crate::template::Injector;
use crate::tree::Tree;
use crate::value::ContentValue;

const ELEMENTS_WITH_SRC: [&str; 7] = [
    "iframe", "script", "img", "input", "textarea", "video", "audio",
];

pub(crate) trait AttributeOperator {
    fn execute<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
        scope: &ContentValue,
    ) -> TemplateResult<()>;

    /// Remove whatever `execute` may have set.
    fn reset<T: Tree>(&self, tree: &mut T, call: &Call<'_, T::Node>) -> TemplateResult<()>;
}

/// `id`, `title` and `href`: the attribute of the same name.
pub(crate) struct PropertyAttribute {
    name: &'static str,
}

impl AttributeOperator for PropertyAttribute {
    fn execute<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
        scope: &ContentValue,
    ) -> TemplateResult<()> {
        let value = inj.ctx.content.get_value(scope, call.operand)?;
        set_or_remove(inj.tree, call.element, self.name, &value, call.operand)
    }

    fn reset<T: Tree>(&self, tree: &mut T, call: &Call<'_, T::Node>) -> TemplateResult<()> {
        tree.remove_attribute(call.element, self.name);
        Ok(())
    }
}

pub(crate) struct SrcOperator;

impl AttributeOperator for SrcOperator {
    fn execute<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
        scope: &ContentValue,
    ) -> TemplateResult<()> {
        let tag = inj.tree.tag(call.element);
        if !ELEMENTS_WITH_SRC.contains(&tag) {
            return Err(TemplateError::configuration(
                inj.tree.describe(call.element),
                format!("Src operator is not supported on <{}>.", tag),
            ));
        }
        let value = inj.ctx.content.get_value(scope, call.operand)?;
        set_or_remove(inj.tree, call.element, "src", &value, call.operand)
    }

    fn reset<T: Tree>(&self, tree: &mut T, call: &Call<'_, T::Node>) -> TemplateResult<()> {
        tree.remove_attribute(call.element, "src");
        Ok(())
    }
}

/// Form control value, rendered through the element format class if any.
pub(crate) struct ValueOperator;

impl AttributeOperator for ValueOperator {
    fn execute<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
        scope: &ContentValue,
    ) -> TemplateResult<()> {
        let value = inj.ctx.content.get_value(scope, call.operand)?;
        if value.is_null() {
            inj.tree.remove_attribute(call.element, "value");
            return Ok(());
        }
        let tree = &*inj.tree;
        let text = format_value(inj.ctx.formats, call.format, &value, call.operand, || {
            tree.describe(call.element)
        })?;
        inj.tree.set_attribute(call.element, "value", &text);
        Ok(())
    }

    fn reset<T: Tree>(&self, tree: &mut T, call: &Call<'_, T::Node>) -> TemplateResult<()> {
        tree.remove_attribute(call.element, "value");
        Ok(())
    }
}

/// `name:path;name:path;...`, one attribute per pair.
pub(crate) struct AttrOperator;

impl AttributeOperator for AttrOperator {
    fn execute<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
        scope: &ContentValue,
    ) -> TemplateResult<()> {
        for (name, path) in pairs(&*inj.tree, call)? {
            let value = inj.ctx.content.get_value(scope, path)?;
            set_or_remove(inj.tree, call.element, name, &value, path)?;
        }
        Ok(())
    }

    fn reset<T: Tree>(&self, tree: &mut T, call: &Call<'_, T::Node>) -> TemplateResult<()> {
        for (name, _) in pairs(&*tree, call)? {
            tree.remove_attribute(call.element, name);
        }
        Ok(())
    }
}

/// `expression:class;...` and `[!]path;...` class rules.
///
/// A conditional rule keeps its class present while the expression holds.
/// A property rule takes the class name from the resolved value, hyphen
/// cased, and adds it, or removes it when the path is prefixed with `!`.
pub(crate) struct CssClassOperator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassRule<'o> {
    Conditional { expression: &'o str, class: &'o str },
    Property { path: &'o str, enabled: bool },
}

impl CssClassOperator {
    fn rules<'o, T: Tree>(
        tree: &T,
        call: &Call<'o, T::Node>,
    ) -> TemplateResult<Vec<ClassRule<'o>>> {
        parse_class_rules(call.operand)
            .map_err(|message| TemplateError::configuration(tree.describe(call.element), message))
    }

    fn apply_conditional<T: Tree>(
        inj: &mut Injector<'_, T>,
        element: T::Node,
        scope: &ContentValue,
        expression: &str,
        class: &str,
    ) {
        let statement = ConditionalExpression::parse(expression);
        let enabled = match statement.evaluate(inj.ctx.content, scope) {
            Ok(enabled) => enabled,
            Err(warning) => {
                let described = inj.tree.describe(element);
                inj.ctx.warn_with_code(
                    codes::CONDITIONAL_EXPRESSION,
                    warning.to_string(),
                    &described,
                );
                false
            }
        };
        if enabled {
            inj.tree.add_css_class(element, class);
        } else {
            inj.tree.remove_css_class(element, class);
        }
    }

    fn apply_property<T: Tree>(
        inj: &mut Injector<'_, T>,
        element: T::Node,
        scope: &ContentValue,
        path: &str,
        enabled: bool,
    ) -> TemplateResult<()> {
        let content = inj.ctx.content;
        let value = content.get_value(scope, path)?;
        let class = match &*value {
            ContentValue::String(name) if !name.is_empty() => css_class_name(name),
            ContentValue::Null | ContentValue::String(_) => {
                let described = inj.tree.describe(element);
                inj.ctx.warn_with_code(
                    codes::NULL_CSS_CLASS,
                    format!("Empty CSS class for property `{}`. Rule skipped.", path),
                    &described,
                );
                return Ok(());
            }
            other => {
                return Err(TemplateError::ContentType {
                    path: path.to_string(),
                    expected: "string",
                    found: other.kind(),
                });
            }
        };
        if enabled {
            inj.tree.add_css_class(element, &class);
        } else {
            inj.tree.remove_css_class(element, &class);
        }
        Ok(())
    }
}

impl AttributeOperator for CssClassOperator {
    fn execute<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
        scope: &ContentValue,
    ) -> TemplateResult<()> {
        for rule in Self::rules(&*inj.tree, call)? {
            match rule {
                ClassRule::Conditional { expression, class } => {
                    Self::apply_conditional(inj, call.element, scope, expression, class);
                }
                ClassRule::Property { path, enabled } => {
                    Self::apply_property(inj, call.element, scope, path, enabled)?;
                }
            }
        }
        Ok(())
    }

    /// Property rules name no class of their own and are left alone.
    fn reset<T: Tree>(&self, tree: &mut T, call: &Call<'_, T::Node>) -> TemplateResult<()> {
        for rule in Self::rules(&*tree, call)? {
            if let ClassRule::Conditional { class, .. } = rule {
                tree.remove_css_class(call.element, class);
            }
        }
        Ok(())
    }
}

/// Split a class operand into rules; a rule without `:` is a property rule.
fn parse_class_rules(operand: &str) -> Result<Vec<ClassRule<'_>>, String> {
    let operand = operand.strip_suffix(';').unwrap_or(operand);
    operand
        .split(';')
        .map(|rule| match rule.rsplit_once(':') {
            Some((expression, class)) if !expression.is_empty() && !class.is_empty() => {
                Ok(ClassRule::Conditional { expression, class })
            }
            Some(_) => Err(format!("Empty expression or class in rule `{}`.", rule)),
            None => match rule.strip_prefix('!') {
                _ if rule.is_empty() => Err("Empty CSS class rule.".to_string()),
                Some("") => Err(format!("Missing property path in rule `{}`.", rule)),
                Some(path) => Ok(ClassRule::Property { path, enabled: false }),
                None => Ok(ClassRule::Property { path: rule, enabled: true }),
            },
        })
        .collect()
}

/// Class name from a content value: all upper case constants are lower
/// cased with `_` turned into `-`; anything else is hyphen cased.
fn css_class_name(value: &str) -> String {
    if value == value.to_uppercase() {
        return value.to_lowercase().replace('_', "-");
    }
    let mut class = String::with_capacity(value.len() + 4);
    for (i, c) in value.chars().enumerate() {
        if i == 0 {
            class.extend(c.to_lowercase());
        } else if c.is_uppercase() {
            class.push('-');
            class.extend(c.to_lowercase());
        } else {
            class.push(c);
        }
    }
    class
}

fn pairs<'o, T: Tree>(
    tree: &T,
    call: &Call<'o, T::Node>,
) -> TemplateResult<Vec<(&'o str, &'o str)>> {
    parse_name_values(call.operand)
        .map_err(|message| TemplateError::configuration(tree.describe(call.element), message))
}

fn set_or_remove<T: Tree>(
    tree: &mut T,
    element: T::Node,
    name: &str,
    value: &ContentValue,
    path: &str,
) -> TemplateResult<()> {
    if value.is_null() {
        tree.remove_attribute(element, name);
    } else {
        let text = primitive_text(value, path)?;
        tree.set_attribute(element, name, &text);
    }
    Ok(())
}

pub(crate) fn execute<T: Tree>(
    op: AttributeOp,
    inj: &mut Injector<'_, T>,
    call: &Call<'_, T::Node>,
    scope: &ContentValue,
) -> TemplateResult<()> {
    match op {
        AttributeOp::Id => PropertyAttribute { name: "id" }.execute(inj, call, scope),
        AttributeOp::Title => PropertyAttribute { name: "title" }.execute(inj, call, scope),
        AttributeOp::Href => PropertyAttribute { name: "href" }.execute(inj, call, scope),
        AttributeOp::Src => SrcOperator.execute(inj, call, scope),
        AttributeOp::Value => ValueOperator.execute(inj, call, scope),
        AttributeOp::Attr => AttrOperator.execute(inj, call, scope),
        AttributeOp::CssClass => CssClassOperator.execute(inj, call, scope),
    }
}

pub(crate) fn reset<T: Tree>(
    op: AttributeOp,
    tree: &mut T,
    call: &Call<'_, T::Node>,
) -> TemplateResult<()> {
    match op {
        AttributeOp::Id => PropertyAttribute { name: "id" }.reset(tree, call),
        AttributeOp::Title => PropertyAttribute { name: "title" }.reset(tree, call),
        AttributeOp::Href => PropertyAttribute { name: "href" }.reset(tree, call),
        AttributeOp::Src => SrcOperator.reset(tree, call),
        AttributeOp::Value => ValueOperator.reset(tree, call),
        AttributeOp::Attr => AttrOperator.reset(tree, call),
        AttributeOp::CssClass => CssClassOperator.reset(tree, call),
    }
}
