/*
 * property_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Property tests for repeated injection and numbering.
 */

use dom_template::{ContentValue, Document, Template, TemplateError};
use proptest::prelude::*;

// =============================================================================
// Helpers
// =============================================================================

fn template(markup: &str) -> Template<Document> {
    Template::new(Document::parse(markup).expect("Failed to parse template"))
}

fn rendered(markup: &str, value: ContentValue) -> String {
    let mut t = template(markup);
    t.inject(value).expect("Injection failed");
    t.tree().to_markup()
}

fn strings(items: &[String]) -> ContentValue {
    ContentValue::List(items.iter().map(|s| ContentValue::from(s.as_str())).collect())
}

const PEOPLE: &str = r#"<table data-list="people"><tr><td data-text="name"/><td data-if="admin" data-text="role"/></tr></table>"#;

fn people(entries: &[(String, bool)]) -> ContentValue {
    let list: Vec<ContentValue> = entries
        .iter()
        .map(|(name, admin)| {
            [
                ("name", ContentValue::from(name.as_str())),
                ("admin", ContentValue::Bool(*admin)),
                ("role", ContentValue::from("admin")),
            ]
            .into_iter()
            .collect::<ContentValue>()
        })
        .collect();
    [("people", ContentValue::List(list))].into_iter().collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Injecting `b` after `a` renders the same markup as injecting `b` alone.
    #[test]
    fn reinjection_matches_fresh_injection(
        a in prop::collection::vec("[a-z]{0,6}", 0..8),
        b in prop::collection::vec("[a-z]{0,6}", 0..8),
    ) {
        let markup = r#"<ul data-list="."><li data-text="."/></ul>"#;
        let mut t = template(markup);
        t.inject(strings(&a)).unwrap();
        t.inject(strings(&b)).unwrap();
        prop_assert_eq!(t.tree().to_markup(), rendered(markup, strings(&b)));
    }

    /// Re-injection with nested conditionals is stable too.
    #[test]
    fn reinjection_with_conditionals_matches_fresh_injection(
        a in prop::collection::vec(("[a-z]{1,6}", any::<bool>()), 0..6),
        b in prop::collection::vec(("[a-z]{1,6}", any::<bool>()), 0..6),
    ) {
        let mut t = template(PEOPLE);
        t.inject(people(&a)).unwrap();
        t.inject(people(&b)).unwrap();
        prop_assert_eq!(t.tree().to_markup(), rendered(PEOPLE, people(&b)));
    }

    /// Ordered list items are numbered 1..=n.
    #[test]
    fn arabic_numbering_counts_items(n in 0usize..40) {
        let mut t = template(r#"<ol data-olist="."><li data-numbering="%n"/></ol>"#);
        t.inject(ContentValue::List(vec![ContentValue::Null; n])).unwrap();
        let expected: Vec<String> = (1..=n).map(|i| i.to_string()).collect();
        prop_assert_eq!(t.tree().texts_by_tag("li"), expected);
        prop_assert_eq!(t.numbering_depth(), 0);
    }

    /// Nested ordered lists number each level independently.
    #[test]
    fn nested_numbering_restarts_per_parent(shape in prop::collection::vec(0usize..5, 1..6)) {
        let mut t = template(
            r#"<ol data-olist="."><li><ol data-olist="."><li data-numbering="%n.%s"/></ol></li></ol>"#,
        );
        let model = ContentValue::List(
            shape
                .iter()
                .map(|&len| ContentValue::List(vec![ContentValue::Number(0.0); len]))
                .collect(),
        );
        t.inject(model).unwrap();

        let mut expected = Vec::new();
        for (outer, &len) in shape.iter().enumerate() {
            for inner in 0..len {
                expected.push(format!("{}.{}", outer + 1, (b'a' + inner as u8) as char));
            }
        }
        let numbered: Vec<String> = t
            .tree()
            .texts_by_tag("li")
            .into_iter()
            .filter(|text| !text.is_empty())
            .collect();
        prop_assert_eq!(numbered, expected);
    }

    /// The numbering stack is balanced even when an item fails.
    #[test]
    fn numbering_stack_balanced_on_error(len in 1usize..5, fail_at in 0usize..5) {
        let mut t = template(r#"<ol data-olist="."><li data-list="."><b/></li></ol>"#);
        let items: Vec<ContentValue> = (0..len)
            .map(|i| {
                if i == fail_at {
                    ContentValue::from("not a list")
                } else {
                    ContentValue::List(vec![ContentValue::from("x")])
                }
            })
            .collect();
        let result = t.inject(ContentValue::List(items));
        if fail_at < len {
            let is_content_type = matches!(result, Err(TemplateError::ContentType { .. }));
            prop_assert!(is_content_type);
        } else {
            prop_assert!(result.is_ok());
        }
        prop_assert_eq!(t.numbering_depth(), 0);
    }
}
