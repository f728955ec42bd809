/*
 * tree.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Element tree capabilities consumed by the template engine.
//!
//! The engine never depends on a concrete tree. Any element tree that can
//! read and write attributes, move and clone elements, and keep a small
//! per-element stash of item templates can be injected. [`crate::Document`]
//! is the tree shipped with this crate.

use std::fmt::Debug;
use std::hash::Hash;

pub trait Tree {
    /// Element handle. Handles stay valid while the element is alive,
    /// including while it is detached.
    type Node: Copy + Eq + Hash + Debug;

    fn root(&self) -> Self::Node;

    /// Lower case tag name.
    fn tag(&self, node: Self::Node) -> &str;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// All attributes in document order.
    fn attributes(&self, node: Self::Node) -> Vec<(String, String)>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: Self::Node, name: &str);

    /// Child elements in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn append_child(&mut self, parent: Self::Node, child: Self::Node);

    /// Remove an element from its parent, keeping it alive.
    fn detach(&mut self, node: Self::Node);

    /// Drop all child elements and raw markup.
    fn remove_children(&mut self, node: Self::Node);

    /// Deep copy of a subtree; the copy is detached.
    fn clone_node(&mut self, node: Self::Node) -> Self::Node;

    fn show(&mut self, node: Self::Node);

    fn hide(&mut self, node: Self::Node);

    fn is_hidden(&self, node: Self::Node) -> bool;

    fn set_text(&mut self, node: Self::Node, text: &str);

    fn remove_text(&mut self, node: Self::Node);

    /// Replace the element content with raw markup.
    fn set_html(&mut self, node: Self::Node, markup: &str);

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Keep detached item templates with their list or map element.
    fn stash_templates(&mut self, node: Self::Node, templates: Vec<Self::Node>);

    fn stashed_templates(&self, node: Self::Node) -> Option<Vec<Self::Node>>;

    fn has_children(&self, node: Self::Node) -> bool {
        !self.children(node).is_empty()
    }

    fn first_child(&self, node: Self::Node) -> Option<Self::Node> {
        self.children(node).first().copied()
    }

    fn has_css_class(&self, node: Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn add_css_class(&mut self, node: Self::Node, class: &str) {
        if self.has_css_class(node, class) {
            return;
        }
        let classes = match self.attribute(node, "class") {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{} {}", existing.trim(), class)
            }
            _ => class.to_string(),
        };
        self.set_attribute(node, "class", &classes);
    }

    fn remove_css_class(&mut self, node: Self::Node, class: &str) {
        let Some(existing) = self.attribute(node, "class") else {
            return;
        };
        let remaining: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attribute(node, "class");
        } else {
            let classes = remaining.join(" ");
            self.set_attribute(node, "class", &classes);
        }
    }

    /// Short element description for diagnostics, e.g. `ul#users`.
    fn describe(&self, node: Self::Node) -> String {
        match self.attribute(node, "id") {
            Some(id) => format!("{}#{}", self.tag(node), id),
            None => self.tag(node).to_string(),
        }
    }
}
