/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Arena element tree.
//!
//! [`Document`] is a small element tree that implements [`Tree`]. It is
//! loaded from well-formed XML (XHTML fragments included) with `quick-xml`
//! and serialized back to markup. Element content is modelled the way the
//! engine sees it: child elements, an optional text and optional raw markup
//! set by the html operator.
//!
//! Comments, processing instructions and whitespace-only text are dropped
//! on load.

use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use crate::error::{TemplateError, TemplateResult};
use crate::tree::Tree;

/// Handle of an element in a [`Document`].
///
/// Handles of removed elements must not be used; their slots are recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    text: Option<String>,
    html: Option<String>,
    templates: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl Document {
    /// Create a document with an empty root element.
    pub fn new(root_tag: &str) -> Self {
        let mut document = Document {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
        };
        document.root = document.create_element(root_tag);
        document
    }

    pub fn parse(markup: &str) -> TemplateResult<Self> {
        let mut reader = Reader::from_str(markup);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        let mut document: Option<Document> = None;
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let node = open_element(&mut document, &stack, &e)?;
                    stack.push(node);
                }
                Ok(Event::Empty(e)) => {
                    open_element(&mut document, &stack, &e)?;
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|err| TemplateError::Markup {
                        message: format!("Invalid text content: {}", err),
                    })?;
                    append_text(&mut document, &stack, &text);
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    append_text(&mut document, &stack, &text);
                }
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(err) => {
                    return Err(TemplateError::Markup {
                        message: format!(
                            "{} at position {}",
                            err,
                            reader.error_position()
                        ),
                    });
                }
            }
        }

        if let Some(open) = stack.last() {
            let tag = document.as_ref().map_or("", |d| d.tag(*open));
            return Err(TemplateError::Markup {
                message: format!("Unexpected end of markup, expected closing tag </{}>", tag),
            });
        }
        document.ok_or_else(|| TemplateError::Markup {
            message: "Markup has no root element.".to_string(),
        })
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..NodeData::default()
        })
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.data(node).text.as_deref()
    }

    pub fn html(&self, node: NodeId) -> Option<&str> {
        self.data(node).html.as_deref()
    }

    /// Attached elements with the given tag, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.walk(self.root, &mut |node| {
            if self.data(node).tag == tag {
                found.push(node);
            }
        });
        found
    }

    /// Text of the attached elements with the given tag, in document order.
    pub fn texts_by_tag(&self, tag: &str) -> Vec<String> {
        self.elements_by_tag(tag)
            .into_iter()
            .map(|node| self.text(node).unwrap_or_default().to_string())
            .collect()
    }

    /// Number of live elements, attached, detached or stashed.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_markup(&self) -> String {
        self.markup_of(self.root)
    }

    /// Serialize one element and its subtree.
    pub fn markup_of(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let data = self.data(node);
        out.push('<');
        out.push_str(&data.tag);
        for (name, value) in &data.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if data.text.is_none() && data.html.is_none() && data.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &data.text {
            out.push_str(&escape(text.as_str()));
        }
        if let Some(html) = &data.html {
            out.push_str(html);
        }
        for child in &data.children {
            self.write_markup(*child, out);
        }
        out.push_str("</");
        out.push_str(&data.tag);
        out.push('>');
    }

    fn walk(&self, node: NodeId, visit: &mut impl FnMut(NodeId)) {
        visit(node);
        for child in &self.data(node).children {
            self.walk(*child, visit);
        }
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0]
    }

    fn data_mut(&mut self, node: NodeId) -> &mut NodeData {
        &mut self.nodes[node.0]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = data;
                id
            }
            None => {
                self.nodes.push(data);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, node: NodeId) {
        let data = std::mem::take(self.data_mut(node));
        for child in data.children.into_iter().chain(data.templates) {
            self.release(child);
        }
        self.free.push(node);
    }

    fn unlink(&mut self, node: NodeId) {
        if let Some(parent) = self.data_mut(node).parent.take() {
            self.data_mut(parent).children.retain(|c| *c != node);
        }
    }
}

fn open_element(
    document: &mut Option<Document>,
    stack: &[NodeId],
    e: &BytesStart<'_>,
) -> TemplateResult<NodeId> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| TemplateError::Markup {
            message: format!("Invalid attribute on <{}>: {}", tag, err),
        })?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|err| TemplateError::Markup {
            message: format!("Invalid attribute value: {}", err),
        })?;
        attributes.push((name, value.into_owned()));
    }

    let document = match document {
        Some(document) => document,
        None => {
            let mut created = Document::new(&tag);
            created.data_mut(created.root).attributes = attributes;
            let root = created.root;
            *document = Some(created);
            return Ok(root);
        }
    };

    let Some(parent) = stack.last().copied() else {
        return Err(TemplateError::Markup {
            message: format!("Multiple root elements, found <{}> after the root.", tag),
        });
    };
    let node = document.create_element(&tag);
    document.data_mut(node).attributes = attributes;
    document.append_child(parent, node);
    Ok(node)
}

fn append_text(document: &mut Option<Document>, stack: &[NodeId], text: &str) {
    if text.trim().is_empty() {
        return;
    }
    if let (Some(document), Some(node)) = (document.as_mut(), stack.last()) {
        document
            .data_mut(*node)
            .text
            .get_or_insert_with(String::new)
            .push_str(text);
    }
}

impl FromStr for Document {
    type Err = TemplateError;

    fn from_str(markup: &str) -> Result<Self, Self::Err> {
        Document::parse(markup)
    }
}

impl Tree for Document {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn tag(&self, node: NodeId) -> &str {
        &self.data(node).tag
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.data(node)
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.data(node).attributes.clone()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let attributes = &mut self.data_mut(node).attributes;
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.data_mut(node).attributes.retain(|(n, _)| n != name);
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.data(node).children.clone()
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.unlink(child);
        self.data_mut(child).parent = Some(parent);
        self.data_mut(parent).children.push(child);
    }

    fn detach(&mut self, node: NodeId) {
        self.unlink(node);
    }

    fn remove_children(&mut self, node: NodeId) {
        let data = self.data_mut(node);
        data.html = None;
        let children = std::mem::take(&mut data.children);
        for child in children {
            self.release(child);
        }
    }

    fn clone_node(&mut self, node: NodeId) -> NodeId {
        let source = self.data(node).clone();
        let children: Vec<NodeId> = source
            .children
            .iter()
            .map(|child| self.clone_node(*child))
            .collect();
        let templates: Vec<NodeId> = source
            .templates
            .iter()
            .map(|template| self.clone_node(*template))
            .collect();
        let copy = self.alloc(NodeData {
            parent: None,
            children: children.clone(),
            templates,
            ..source
        });
        for child in children {
            self.data_mut(child).parent = Some(copy);
        }
        copy
    }

    fn show(&mut self, node: NodeId) {
        self.remove_attribute(node, "hidden");
    }

    fn hide(&mut self, node: NodeId) {
        self.set_attribute(node, "hidden", "hidden");
    }

    fn is_hidden(&self, node: NodeId) -> bool {
        self.attribute(node, "hidden").is_some()
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.data_mut(node).text = Some(text.to_string());
    }

    fn remove_text(&mut self, node: NodeId) {
        self.data_mut(node).text = None;
    }

    fn set_html(&mut self, node: NodeId, markup: &str) {
        self.remove_children(node);
        let data = self.data_mut(node);
        data.text = None;
        data.html = Some(markup.to_string());
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut found = None;
        self.walk(self.root, &mut |node| {
            if found.is_none() && self.attribute(node, "id") == Some(id) {
                found = Some(node);
            }
        });
        found
    }

    fn stash_templates(&mut self, node: NodeId, templates: Vec<NodeId>) {
        self.data_mut(node).templates = templates;
    }

    fn stashed_templates(&self, node: NodeId) -> Option<Vec<NodeId>> {
        let templates = &self.data(node).templates;
        if templates.is_empty() {
            None
        } else {
            Some(templates.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_and_serialize() {
        let doc = Document::parse(
            r#"<div id="main">
                 <h1 data-text="title">Placeholder &amp; co</h1>
                 <img src="a.png"/>
               </div>"#,
        )
        .unwrap();
        assert_eq!(
            doc.to_markup(),
            r#"<div id="main"><h1 data-text="title">Placeholder &amp; co</h1><img src="a.png"/></div>"#
        );
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Document::parse(""),
            Err(TemplateError::Markup { .. })
        ));
        assert!(matches!(
            Document::parse("<a><b></a>"),
            Err(TemplateError::Markup { .. })
        ));
        assert!(matches!(
            Document::parse("<a/><b/>"),
            Err(TemplateError::Markup { .. })
        ));
        assert!(matches!(
            Document::parse("<a><b>"),
            Err(TemplateError::Markup { .. })
        ));
    }

    #[test]
    fn test_clone_is_deep_and_detached() {
        let mut doc: Document = "<ul><li><b>x</b></li></ul>".parse().unwrap();
        let li = doc.first_child(doc.root()).unwrap();
        let copy = doc.clone_node(li);

        assert_eq!(doc.parent(copy), None);
        assert_eq!(doc.markup_of(copy), "<li><b>x</b></li>");
        let b = doc.first_child(copy).unwrap();
        assert_eq!(doc.parent(b), Some(copy));

        doc.set_text(b, "changed");
        assert_eq!(doc.to_markup(), "<ul><li><b>x</b></li></ul>");
    }

    #[test]
    fn test_remove_children_recycles_slots() {
        let mut doc: Document = "<ul><li/><li/></ul>".parse().unwrap();
        let root = doc.root();
        assert_eq!(doc.len(), 3);
        doc.remove_children(root);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.to_markup(), "<ul/>");

        let li = doc.create_element("li");
        doc.append_child(root, li);
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_detach_keeps_element_alive() {
        let mut doc: Document = "<ul><li>item</li></ul>".parse().unwrap();
        let root = doc.root();
        let li = doc.first_child(root).unwrap();
        doc.detach(li);
        doc.stash_templates(root, vec![li]);

        assert_eq!(doc.to_markup(), "<ul/>");
        assert_eq!(doc.stashed_templates(root), Some(vec![li]));
        assert_eq!(doc.text(li), Some("item"));
    }

    #[test]
    fn test_css_classes() {
        let mut doc: Document = r#"<p class="a b"/>"#.parse().unwrap();
        let p = doc.root();
        doc.add_css_class(p, "c");
        doc.add_css_class(p, "a");
        assert_eq!(doc.attribute(p, "class"), Some("a b c"));
        doc.remove_css_class(p, "b");
        assert_eq!(doc.attribute(p, "class"), Some("a c"));
        doc.remove_css_class(p, "a");
        doc.remove_css_class(p, "c");
        assert_eq!(doc.attribute(p, "class"), None);
    }

    #[test]
    fn test_element_by_id_and_describe() {
        let doc: Document = r#"<div><section id="s1"><p id="p1"/></section></div>"#
            .parse()
            .unwrap();
        let p = doc.element_by_id("p1").unwrap();
        assert_eq!(doc.describe(p), "p#p1");
        assert_eq!(doc.describe(doc.root()), "div");
        assert_eq!(doc.element_by_id("missing"), None);
    }

    #[test]
    fn test_html_replaces_content() {
        let mut doc: Document = "<div><p>old</p></div>".parse().unwrap();
        let root = doc.root();
        doc.set_html(root, "<b>new</b>");
        assert!(!doc.has_children(root));
        assert_eq!(doc.to_markup(), "<div><b>new</b></div>");
    }
}
