/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Injection options.

use serde::Deserialize;

/// What subtree injection does with a root element lacking a content operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubtreeContentPolicy {
    /// Treat the element as `object` bound to the injected value.
    #[default]
    DefaultToObject,
    /// Fail with a configuration error.
    Reject,
}

/// Options shared by all injections of a template.
///
/// Deserializable from configuration, e.g.
///
/// ```yaml
/// operator-prefix: "data-"
/// strict-mode: false
/// subtree-content-policy: default-to-object
/// recover-subtrees: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InjectOptions {
    /// Attribute name prefix of operators.
    pub operator_prefix: String,

    /// Fail on undefined content values instead of skipping the operator.
    pub strict_mode: bool,

    pub subtree_content_policy: SubtreeContentPolicy,

    /// Record content type errors and continue with the next sibling.
    pub recover_subtrees: bool,
}

impl Default for InjectOptions {
    fn default() -> Self {
        Self {
            operator_prefix: "data-".to_string(),
            strict_mode: false,
            subtree_content_policy: SubtreeContentPolicy::default(),
            recover_subtrees: false,
        }
    }
}

impl InjectOptions {
    pub fn with_operator_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.operator_prefix = prefix.into();
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn with_subtree_content_policy(mut self, policy: SubtreeContentPolicy) -> Self {
        self.subtree_content_policy = policy;
        self
    }

    pub fn with_recover_subtrees(mut self, recover: bool) -> Self {
        self.recover_subtrees = recover;
        self
    }
}
