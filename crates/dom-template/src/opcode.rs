/*
 * opcode.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Operator catalog.
//!
//! Maps operator attribute names to typed operator codes. The catalog is
//! closed: an attribute that carries the operator prefix but is not listed
//! here is an ordinary attribute and is left alone.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOp {
    Goto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalOp {
    If,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOp {
    Text,
    Html,
    Object,
    List,
    OList,
    Map,
    OMap,
    Numbering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    Attr,
    CssClass,
    Id,
    Src,
    Href,
    Title,
    Value,
}

/// Operator code grouped by operator type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Jump(JumpOp),
    Conditional(ConditionalOp),
    Formatting,
    Content(ContentOp),
    Attribute(AttributeOp),
}

/// Operator types. An element carries at most one operator of each type,
/// except for attribute operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeType {
    Jump,
    Conditional,
    Formatting,
    Content,
    Attribute,
}

impl fmt::Display for OpcodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpcodeType::Jump => "JUMP",
            OpcodeType::Conditional => "CONDITIONAL",
            OpcodeType::Formatting => "FORMATTING",
            OpcodeType::Content => "CONTENT",
            OpcodeType::Attribute => "ATTRIBUTE",
        };
        f.write_str(name)
    }
}

const CATALOG: [(&str, Opcode); 19] = [
    ("goto", Opcode::Jump(JumpOp::Goto)),
    ("if", Opcode::Conditional(ConditionalOp::If)),
    ("exclude", Opcode::Conditional(ConditionalOp::Exclude)),
    ("format", Opcode::Formatting),
    ("text", Opcode::Content(ContentOp::Text)),
    ("html", Opcode::Content(ContentOp::Html)),
    ("object", Opcode::Content(ContentOp::Object)),
    ("list", Opcode::Content(ContentOp::List)),
    ("olist", Opcode::Content(ContentOp::OList)),
    ("map", Opcode::Content(ContentOp::Map)),
    ("omap", Opcode::Content(ContentOp::OMap)),
    ("numbering", Opcode::Content(ContentOp::Numbering)),
    ("attr", Opcode::Attribute(AttributeOp::Attr)),
    ("css-class", Opcode::Attribute(AttributeOp::CssClass)),
    ("id", Opcode::Attribute(AttributeOp::Id)),
    ("src", Opcode::Attribute(AttributeOp::Src)),
    ("href", Opcode::Attribute(AttributeOp::Href)),
    ("title", Opcode::Attribute(AttributeOp::Title)),
    ("value", Opcode::Attribute(AttributeOp::Value)),
];

impl Opcode {
    /// Classify an attribute name; `None` when it is not an operator.
    pub fn from_attr_name(name: &str, prefix: &str) -> Option<Opcode> {
        let name = name.strip_prefix(prefix)?;
        CATALOG
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, opcode)| *opcode)
    }

    pub fn opcode_type(self) -> OpcodeType {
        match self {
            Opcode::Jump(_) => OpcodeType::Jump,
            Opcode::Conditional(_) => OpcodeType::Conditional,
            Opcode::Formatting => OpcodeType::Formatting,
            Opcode::Content(_) => OpcodeType::Content,
            Opcode::Attribute(_) => OpcodeType::Attribute,
        }
    }

    /// Operator name without prefix, as written in templates.
    pub fn name(self) -> &'static str {
        CATALOG
            .iter()
            .find(|(_, opcode)| *opcode == self)
            .map_or("", |(name, _)| name)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
