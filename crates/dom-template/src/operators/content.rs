/*
 * operators/content.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Content operators.
//!
//! A content operator either renders the element content itself and ends
//! the branch, or binds a new scope for the children. List and map
//! operators keep their item templates stashed on the element so that
//! re-injection always starts from the pristine templates.

use crate::error::{TemplateError, TemplateResult};
use crate::eval_context::codes;
use crate::opcode::ContentOp;
use crate::operators::{Call, Flow, format_value};
use crate::template::Injector;
use crate::tree::Tree;
use crate::value::ContentValue;

pub(crate) trait ContentOperator {
    fn execute<'a: 's, 's, T: Tree>(
        &self,
        inj: &mut Injector<'a, T>,
        call: &Call<'_, T::Node>,
        scope: &'s ContentValue,
    ) -> TemplateResult<Flow<'s>>;

    fn reset<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
    ) -> TemplateResult<()>;
}

pub(crate) struct TextOperator;

impl ContentOperator for TextOperator {
    fn execute<'a: 's, 's, T: Tree>(
        &self,
        inj: &mut Injector<'a, T>,
        call: &Call<'_, T::Node>,
        scope: &'s ContentValue,
    ) -> TemplateResult<Flow<'s>> {
        if scope.is_null() {
            inj.tree.remove_text(call.element);
            return Ok(Flow::Stop);
        }
        if inj.tree.has_children(call.element) {
            return Err(TemplateError::configuration(
                inj.tree.describe(call.element),
                "Text operator on element with children.",
            ));
        }
        let value = inj.ctx.content.get_value(scope, call.operand)?;
        if value.is_null() || value.as_str() == Some("") {
            inj.tree.remove_text(call.element);
            return Ok(Flow::Stop);
        }
        let tree = &*inj.tree;
        let text = format_value(inj.ctx.formats, call.format, &value, call.operand, || {
            tree.describe(call.element)
        })?;
        inj.tree.set_text(call.element, &text);
        Ok(Flow::Stop)
    }

    fn reset<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
    ) -> TemplateResult<()> {
        inj.tree.remove_text(call.element);
        Ok(())
    }
}

pub(crate) struct HtmlOperator;

impl ContentOperator for HtmlOperator {
    fn execute<'a: 's, 's, T: Tree>(
        &self,
        inj: &mut Injector<'a, T>,
        call: &Call<'_, T::Node>,
        scope: &'s ContentValue,
    ) -> TemplateResult<Flow<'s>> {
        if scope.is_null() {
            inj.tree.remove_children(call.element);
            return Ok(Flow::Stop);
        }
        if inj.tree.has_children(call.element) {
            return Err(TemplateError::configuration(
                inj.tree.describe(call.element),
                "Html operator on element with children.",
            ));
        }
        let value = inj.ctx.content.get_value(scope, call.operand)?;
        match &*value {
            ContentValue::Null => inj.tree.remove_children(call.element),
            ContentValue::String(markup) => inj.tree.set_html(call.element, markup),
            other => {
                return Err(TemplateError::ContentType {
                    path: call.operand.to_string(),
                    expected: "string",
                    found: other.kind(),
                });
            }
        }
        Ok(Flow::Stop)
    }

    fn reset<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
    ) -> TemplateResult<()> {
        inj.tree.remove_children(call.element);
        Ok(())
    }
}

pub(crate) struct ObjectOperator;

impl ContentOperator for ObjectOperator {
    fn execute<'a: 's, 's, T: Tree>(
        &self,
        inj: &mut Injector<'a, T>,
        call: &Call<'_, T::Node>,
        scope: &'s ContentValue,
    ) -> TemplateResult<Flow<'s>> {
        if scope.is_null() {
            reset_children(inj, call.element)?;
            return Ok(Flow::Stop);
        }
        let value = inj.ctx.content.get_value(scope, call.operand)?;
        if value.is_null() {
            let element = inj.tree.describe(call.element);
            inj.ctx.warn_with_code(
                codes::NULL_OBJECT,
                format!("Null object for property `{}`. Reset element content.", call.operand),
                &element,
            );
            reset_children(inj, call.element)?;
            return Ok(Flow::Stop);
        }
        if call.operand != "." && !matches!(*value, ContentValue::Map(_)) {
            return Err(TemplateError::ContentType {
                path: call.operand.to_string(),
                expected: "map",
                found: value.kind(),
            });
        }
        Ok(Flow::Descend(value))
    }

    fn reset<T: Tree>(
        &self,
        _inj: &mut Injector<'_, T>,
        _call: &Call<'_, T::Node>,
    ) -> TemplateResult<()> {
        Ok(())
    }
}

/// `list` and `olist`: the first child is the item template.
pub(crate) struct ListOperator {
    ordered: bool,
}

impl ContentOperator for ListOperator {
    fn execute<'a: 's, 's, T: Tree>(
        &self,
        inj: &mut Injector<'a, T>,
        call: &Call<'_, T::Node>,
        scope: &'s ContentValue,
    ) -> TemplateResult<Flow<'s>> {
        let templates = item_templates(inj.tree, call.element, &["item"])?;
        inj.tree.remove_children(call.element);
        if scope.is_null() {
            return Ok(Flow::Stop);
        }

        let Some(items) = inj.ctx.content.get_iterable(scope, call.operand)? else {
            warn_null_collection(inj, call);
            return Ok(Flow::Stop);
        };
        tracing::debug!(
            element = %inj.tree.describe(call.element),
            items = items.len(),
            ordered = self.ordered,
            "Render list."
        );

        push_level(inj, self.ordered);
        let result = items.iter().try_for_each(|item| {
            inj.ctx.indexes.increment();
            let node = inj.tree.clone_node(templates[0]);
            inj.tree.append_child(call.element, node);
            inj.inject_item(node, item)
        });
        inj.ctx.indexes.pop();
        result.map(|()| Flow::Stop)
    }

    fn reset<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
    ) -> TemplateResult<()> {
        item_templates(inj.tree, call.element, &["item"])?;
        inj.tree.remove_children(call.element);
        Ok(())
    }
}

/// `map` and `omap`: the first two children are the key and value templates.
pub(crate) struct MapOperator {
    ordered: bool,
}

impl ContentOperator for MapOperator {
    fn execute<'a: 's, 's, T: Tree>(
        &self,
        inj: &mut Injector<'a, T>,
        call: &Call<'_, T::Node>,
        scope: &'s ContentValue,
    ) -> TemplateResult<Flow<'s>> {
        let templates = item_templates(inj.tree, call.element, &["key", "value"])?;
        inj.tree.remove_children(call.element);
        if scope.is_null() {
            return Ok(Flow::Stop);
        }

        let Some(entries) = inj.ctx.content.get_map(scope, call.operand)? else {
            warn_null_collection(inj, call);
            return Ok(Flow::Stop);
        };
        tracing::debug!(
            element = %inj.tree.describe(call.element),
            entries = entries.len(),
            ordered = self.ordered,
            "Render map."
        );

        push_level(inj, self.ordered);
        let result = entries.iter().try_for_each(|(key, value)| {
            inj.ctx.indexes.increment();
            let key_node = inj.tree.clone_node(templates[0]);
            let value_node = inj.tree.clone_node(templates[1]);
            inj.tree.append_child(call.element, key_node);
            inj.tree.append_child(call.element, value_node);
            inj.inject_item(key_node, &ContentValue::String(key.to_string()))?;
            inj.inject_item(value_node, value)
        });
        inj.ctx.indexes.pop();
        result.map(|()| Flow::Stop)
    }

    fn reset<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
    ) -> TemplateResult<()> {
        item_templates(inj.tree, call.element, &["key", "value"])?;
        inj.tree.remove_children(call.element);
        Ok(())
    }
}

/// Position of the element in the enclosing ordered lists and maps.
pub(crate) struct NumberingOperator;

impl ContentOperator for NumberingOperator {
    fn execute<'a: 's, 's, T: Tree>(
        &self,
        inj: &mut Injector<'a, T>,
        call: &Call<'_, T::Node>,
        _scope: &'s ContentValue,
    ) -> TemplateResult<Flow<'s>> {
        let text = inj
            .ctx
            .indexes
            .format(call.operand)
            .map_err(|err| {
                TemplateError::configuration(inj.tree.describe(call.element), err.to_string())
            })?;
        inj.tree.set_text(call.element, &text);
        Ok(Flow::Stop)
    }

    fn reset<T: Tree>(
        &self,
        inj: &mut Injector<'_, T>,
        call: &Call<'_, T::Node>,
    ) -> TemplateResult<()> {
        inj.tree.remove_text(call.element);
        Ok(())
    }
}

/// Stashed templates of a list or map element, detaching them from the
/// element children on first use.
fn item_templates<T: Tree>(
    tree: &mut T,
    element: T::Node,
    roles: &[&str],
) -> TemplateResult<Vec<T::Node>> {
    if let Some(templates) = tree.stashed_templates(element) {
        return Ok(templates);
    }
    let children = tree.children(element);
    let mut templates = Vec::with_capacity(roles.len());
    for (i, role) in roles.iter().enumerate() {
        let Some(template) = children.get(i).copied() else {
            return Err(TemplateError::configuration(
                tree.describe(element),
                format!("Missing {} template.", role),
            ));
        };
        templates.push(template);
    }
    for template in &templates {
        tree.detach(*template);
    }
    tree.stash_templates(element, templates.clone());
    Ok(templates)
}

fn reset_children<T: Tree>(inj: &mut Injector<'_, T>, element: T::Node) -> TemplateResult<()> {
    for child in inj.tree.children(element) {
        inj.reset(child)?;
    }
    Ok(())
}

fn push_level<T: Tree>(inj: &mut Injector<'_, T>, ordered: bool) {
    if ordered {
        inj.ctx.indexes.push_ordered();
    } else {
        inj.ctx.indexes.push_unordered();
    }
}

fn warn_null_collection<T: Tree>(inj: &mut Injector<'_, T>, call: &Call<'_, T::Node>) {
    let element = inj.tree.describe(call.element);
    inj.ctx.warn_with_code(
        codes::NULL_COLLECTION,
        format!("Null value for property `{}`. Render it as empty.", call.operand),
        &element,
    );
}

pub(crate) fn execute<'a: 's, 's, T: Tree>(
    op: ContentOp,
    inj: &mut Injector<'a, T>,
    call: &Call<'_, T::Node>,
    scope: &'s ContentValue,
) -> TemplateResult<Flow<'s>> {
    match op {
        ContentOp::Text => TextOperator.execute(inj, call, scope),
        ContentOp::Html => HtmlOperator.execute(inj, call, scope),
        ContentOp::Object => ObjectOperator.execute(inj, call, scope),
        ContentOp::List => ListOperator { ordered: false }.execute(inj, call, scope),
        ContentOp::OList => ListOperator { ordered: true }.execute(inj, call, scope),
        ContentOp::Map => MapOperator { ordered: false }.execute(inj, call, scope),
        ContentOp::OMap => MapOperator { ordered: true }.execute(inj, call, scope),
        ContentOp::Numbering => NumberingOperator.execute(inj, call, scope),
    }
}

pub(crate) fn reset<T: Tree>(
    op: ContentOp,
    inj: &mut Injector<'_, T>,
    call: &Call<'_, T::Node>,
) -> TemplateResult<()> {
    match op {
        ContentOp::Text => TextOperator.reset(inj, call),
        ContentOp::Html => HtmlOperator.reset(inj, call),
        ContentOp::Object => ObjectOperator.reset(inj, call),
        ContentOp::List | ContentOp::OList => ListOperator { ordered: false }.reset(inj, call),
        ContentOp::Map | ContentOp::OMap => MapOperator { ordered: false }.reset(inj, call),
        ContentOp::Numbering => NumberingOperator.reset(inj, call),
    }
}
