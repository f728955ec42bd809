/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template injection.
//!
//! [`Template`] owns an element tree and projects content models onto it.
//! Injection is a depth-first traversal; on every element it:
//!
//! 1. scans the element operators
//! 2. follows a jump operator to its target element, if the target exists
//! 3. evaluates the conditional operator, hiding the element and ending the
//!    branch when it does not hold
//! 4. executes the attribute operators, in document order
//! 5. executes the content operator, which either ends the branch or
//!    yields the scope for the children
//! 6. injects the children
//!
//! Steps 3 and 4 are skipped on a `null` scope, so a branch with a `null`
//! scope only clears the content left by previous injections.

use std::borrow::Cow;

use crate::content::Content;
use crate::error::{TemplateError, TemplateResult};
use crate::eval_context::{DiagnosticCollector, EvalContext, codes};
use crate::format::{Format, FormatRegistry};
use crate::numbering::IndexStack;
use crate::operators::{Call, Flow, attribute, conditional, content, jump};
use crate::operators_list::OperatorsList;
use crate::options::InjectOptions;
use crate::tree::Tree;
use crate::value::ContentValue;

/// Template bound to one element tree.
///
/// # Example
///
/// ```
/// use dom_template::{Document, Template};
/// use serde_json::json;
///
/// let doc = Document::parse(r#"<ul data-list="."><li/></ul>"#).unwrap();
/// let mut template = Template::new(doc);
/// template.inject(json!(["a", "b"])).unwrap();
/// assert_eq!(template.tree().to_markup(), "<ul data-list=\".\"><li>a</li><li>b</li></ul>");
/// ```
#[derive(Debug)]
pub struct Template<T: Tree> {
    tree: T,
    options: InjectOptions,
    formats: FormatRegistry,
    indexes: IndexStack,
    diagnostics: DiagnosticCollector,
}

impl<T: Tree> Template<T> {
    pub fn new(tree: T) -> Self {
        Self {
            tree,
            options: InjectOptions::default(),
            formats: FormatRegistry::new(),
            indexes: IndexStack::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    pub fn with_options(mut self, options: InjectOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a format class for the formatting operator.
    pub fn register_format(&mut self, name: impl Into<String>, format: impl Format + 'static) {
        self.formats.register(name, format);
    }

    pub fn options(&self) -> &InjectOptions {
        &self.options
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn into_tree(self) -> T {
        self.tree
    }

    /// Diagnostics of the last injection or reset.
    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }

    /// Numbering levels left open by the last call; zero once it returned.
    pub fn numbering_depth(&self) -> usize {
        self.indexes.depth()
    }

    /// Inject a model into the whole tree.
    pub fn inject(&mut self, value: impl Into<Content>) -> TemplateResult<()> {
        let content = value.into();
        let root = self.tree.root();
        self.run(&content, |inj| inj.inject_document(root))
    }

    /// Inject a model into the subtree rooted at `element`.
    ///
    /// A `null` model resets the subtree instead.
    pub fn inject_element(
        &mut self,
        element: T::Node,
        value: impl Into<Content>,
    ) -> TemplateResult<()> {
        let content = value.into();
        if content.model().is_null() {
            return self.reset(element);
        }
        self.run(&content, |inj| inj.inject_subtree(element))
    }

    /// Inject a value into a single list item element.
    pub fn inject_item(
        &mut self,
        element: T::Node,
        value: impl Into<Content>,
    ) -> TemplateResult<()> {
        let content = value.into();
        self.run(&content, |inj| {
            let scope = inj.ctx.content.model();
            inj.inject_item(element, scope)
        })
    }

    /// Clear whatever injection rendered into the subtree rooted at
    /// `element`. Conditional operators are ignored; jumps are followed.
    pub fn reset(&mut self, element: T::Node) -> TemplateResult<()> {
        let content = Content::default();
        self.run(&content, |inj| inj.reset(element))
    }

    fn run<F>(&mut self, content: &Content, f: F) -> TemplateResult<()>
    where
        F: FnOnce(&mut Injector<'_, T>) -> TemplateResult<()>,
    {
        let mut ctx = EvalContext::new(content, &self.formats, &self.options);
        ctx.indexes = std::mem::take(&mut self.indexes);
        let mut injector = Injector {
            tree: &mut self.tree,
            ctx,
        };
        let result = f(&mut injector);
        let Injector { mut ctx, .. } = injector;
        self.indexes = std::mem::take(&mut ctx.indexes);
        self.diagnostics = ctx.into_diagnostics();
        result
    }
}

enum ScanKind {
    Element,
    ListItem,
    SubtreeRoot,
}

/// Traversal state of one injection call.
pub(crate) struct Injector<'a, T: Tree> {
    pub(crate) tree: &'a mut T,
    pub(crate) ctx: EvalContext<'a>,
}

impl<'a, T: Tree> Injector<'a, T> {
    fn inject_document(&mut self, root: T::Node) -> TemplateResult<()> {
        let scope = self.ctx.content.model();
        self.inject_element(root, scope)
    }

    fn inject_subtree(&mut self, element: T::Node) -> TemplateResult<()> {
        let scope = self.ctx.content.model();
        let ops = self.scan(element, ScanKind::SubtreeRoot)?;
        self.inject(element, scope, ops)
    }

    /// Inject a list or map item with the item value as scope.
    pub(crate) fn inject_item<'s>(
        &mut self,
        element: T::Node,
        scope: &'s ContentValue,
    ) -> TemplateResult<()>
    where
        'a: 's,
    {
        let ops = self.scan(element, ScanKind::ListItem)?;
        self.inject(element, scope, ops)
    }

    fn inject_element<'s>(
        &mut self,
        element: T::Node,
        scope: &'s ContentValue,
    ) -> TemplateResult<()>
    where
        'a: 's,
    {
        let ops = self.scan(element, ScanKind::Element)?;
        self.inject(element, scope, ops)
    }

    fn scan(&mut self, element: T::Node, kind: ScanKind) -> TemplateResult<OperatorsList> {
        let options = self.ctx.options;
        let prefix = options.operator_prefix.as_str();
        let tree = &*self.tree;
        match kind {
            ScanKind::Element => self.ctx.operators.scan(tree, element, prefix)?,
            ScanKind::ListItem => self.ctx.operators.scan_list_item(tree, element, prefix)?,
            ScanKind::SubtreeRoot => self.ctx.operators.scan_subtree_root(
                tree,
                element,
                prefix,
                options.subtree_content_policy,
            )?,
        }
        Ok(self.ctx.operators.clone())
    }

    /// Follow the jump operator, if any; returns the element to continue with.
    fn follow_jump(
        &mut self,
        element: T::Node,
        ops: &mut OperatorsList,
    ) -> TemplateResult<T::Node> {
        let target = ops
            .jump()
            .and_then(|meta| jump::target(meta.opcode, &*self.tree, &meta.operand));
        match target {
            Some(target) => {
                tracing::debug!(
                    from = %self.tree.describe(element),
                    to = %self.tree.describe(target),
                    "Follow jump operator."
                );
                *ops = self.scan(target, ScanKind::Element)?;
                Ok(target)
            }
            None => Ok(element),
        }
    }

    fn inject<'s>(
        &mut self,
        element: T::Node,
        scope: &'s ContentValue,
        mut ops: OperatorsList,
    ) -> TemplateResult<()>
    where
        'a: 's,
    {
        let element = self.follow_jump(element, &mut ops)?;

        if !scope.is_null() {
            if let Some(meta) = ops.conditional() {
                if !conditional::evaluate(meta.opcode, self, element, scope, &meta.operand) {
                    tracing::debug!(
                        element = %self.tree.describe(element),
                        "Element rejected by conditional operator."
                    );
                    self.tree.hide(element);
                    return Ok(());
                }
                self.tree.show(element);
            }

            for meta in ops.attributes() {
                let call = Call {
                    element,
                    operand: &meta.operand,
                    format: ops.format_name(),
                };
                tracing::debug!(
                    operator = ?meta.opcode,
                    operand = call.operand,
                    "Execute attribute operator."
                );
                let result = attribute::execute(meta.opcode, self, &call, scope);
                self.recoverable(element, result)?;
            }
        }

        let scope: Cow<'s, ContentValue> = match ops.content() {
            None => Cow::Borrowed(scope),
            Some(meta) => {
                let call = Call {
                    element,
                    operand: &meta.operand,
                    format: ops.format_name(),
                };
                tracing::debug!(
                    operator = ?meta.opcode,
                    operand = call.operand,
                    "Execute content operator."
                );
                let result = content::execute(meta.opcode, self, &call, scope);
                match self.recoverable(element, result)? {
                    Some(Flow::Descend(scope)) => scope,
                    Some(Flow::Stop) | None => return Ok(()),
                }
            }
        };

        for child in self.tree.children(element) {
            let result = self.inject_element(child, &scope);
            self.recover_subtree(child, result)?;
        }
        Ok(())
    }

    pub(crate) fn reset(&mut self, element: T::Node) -> TemplateResult<()> {
        let mut ops = self.scan(element, ScanKind::Element)?;
        let element = self.follow_jump(element, &mut ops)?;

        for meta in ops.attributes() {
            let call = Call {
                element,
                operand: &meta.operand,
                format: None,
            };
            attribute::reset(meta.opcode, &mut *self.tree, &call)?;
        }
        if let Some(meta) = ops.content() {
            let call = Call {
                element,
                operand: &meta.operand,
                format: None,
            };
            content::reset(meta.opcode, self, &call)?;
        }

        for child in self.tree.children(element) {
            self.reset(child)?;
        }
        Ok(())
    }

    /// Undefined content values skip the operator with a warning, unless
    /// strict mode is on.
    fn recoverable<R>(
        &mut self,
        element: T::Node,
        result: TemplateResult<R>,
    ) -> TemplateResult<Option<R>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err @ TemplateError::ContentResolution { .. }) if !self.ctx.options.strict_mode => {
                let element = self.tree.describe(element);
                self.ctx
                    .warn_with_code(codes::UNDEFINED_VALUE, err.to_string(), &element);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Content type errors abandon the child subtree when recovery is on.
    fn recover_subtree(
        &mut self,
        child: T::Node,
        result: TemplateResult<()>,
    ) -> TemplateResult<()> {
        match result {
            Err(err @ TemplateError::ContentType { .. }) if self.ctx.options.recover_subtrees => {
                let element = self.tree.describe(child);
                self.ctx
                    .error_with_code(codes::CONTENT_TYPE, err.to_string(), &element);
                Ok(())
            }
            other => other,
        }
    }
}
