/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Integration tests for dom-template using test fixtures.
 */

use chrono::{TimeZone, Utc};
use dom_template::{
    Content, ContentValue, DateFormat, Document, InjectOptions, NumberFormat, SubtreeContentPolicy,
    Template, TemplateError, Tree,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> std::path::PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

/// Helper to load a template from fixtures
fn load_template(name: &str) -> Template<Document> {
    let markup = std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to read fixture: {}", name));
    let doc = Document::parse(&markup)
        .unwrap_or_else(|err| panic!("Failed to parse {}: {}", name, err));
    Template::new(doc)
}

fn by_id(template: &Template<Document>, id: &str) -> dom_template::NodeId {
    template
        .tree()
        .element_by_id(id)
        .unwrap_or_else(|| panic!("No element #{}", id))
}

#[test]
fn test_list_reinjection_replaces_items() {
    let mut template = load_template("list.xml");

    template.inject(json!([1, 2, 3])).unwrap();
    assert_eq!(template.tree().texts_by_tag("li"), vec!["1", "2", "3"]);

    template.inject(json!([])).unwrap();
    let ul = by_id(&template, "items");
    assert!(template.tree().children(ul).is_empty());

    template.inject(json!(["a", "b"])).unwrap();
    assert_eq!(template.tree().texts_by_tag("li"), vec!["a", "b"]);
    assert_eq!(
        template.tree().to_markup(),
        r#"<ul id="items" data-list="."><li data-text=".">a</li><li data-text=".">b</li></ul>"#
    );
}

#[test]
fn test_list_reinjection_does_not_leak_nodes() {
    let mut template = load_template("list.xml");
    template.inject(json!([1, 2, 3])).unwrap();
    let size = template.tree().len();
    for _ in 0..5 {
        template.inject(json!([4, 5, 6])).unwrap();
    }
    assert_eq!(template.tree().len(), size);
}

#[test]
fn test_relative_and_absolute_paths_agree() {
    let mut template = load_template("person.xml");
    template
        .inject(json!({"person": {"name": "Iulian", "address": {"city": "Brasov"}}}))
        .unwrap();

    assert_eq!(template.tree().texts_by_tag("h1"), vec!["Iulian", "Iulian"]);
    assert_eq!(template.tree().texts_by_tag("p"), vec!["Brasov", "Brasov"]);
    assert!(template.diagnostics().is_empty());
}

#[test]
fn test_null_object_resets_branch() {
    let mut template = load_template("person.xml");
    template
        .inject(json!({"person": {"name": "Iulian", "address": {"city": "Brasov"}}}))
        .unwrap();
    template.inject(json!({"person": null})).unwrap();

    assert_eq!(template.tree().texts_by_tag("h1"), vec!["", ""]);
    assert_eq!(template.tree().texts_by_tag("p"), vec!["", ""]);
}

#[test]
fn test_null_intermediate_property_resolves_to_null() {
    let mut template = load_template("person.xml");
    template
        .inject(json!({"person": {"name": "Iulian", "address": null}}))
        .unwrap();
    assert_eq!(template.tree().texts_by_tag("p"), vec!["", ""]);
    assert!(template.diagnostics().is_empty());
}

#[test]
fn test_conditional_true_branch() {
    let mut template = load_template("conditional.xml");
    template
        .inject(json!({"age": 42, "name": "Iulian", "items": ["x", "y"], "label": "none"}))
        .unwrap();

    let tree = template.tree();
    let adult = by_id(&template, "adult");
    assert!(!tree.is_hidden(adult));
    assert_eq!(tree.attribute(adult, "title"), Some("Iulian"));
    assert_eq!(tree.texts_by_tag("p"), vec!["Iulian"]);
    assert!(!tree.is_hidden(by_id(&template, "with-items")));
    assert_eq!(tree.texts_by_tag("li"), vec!["x", "y"]);
    assert!(tree.is_hidden(by_id(&template, "no-items")));
}

#[test]
fn test_conditional_false_branch_has_no_side_effects() {
    let mut template = load_template("conditional.xml");
    template
        .inject(json!({"age": 10, "name": "Iulian", "items": [], "label": "none"}))
        .unwrap();

    let tree = template.tree();
    let adult = by_id(&template, "adult");
    assert!(tree.is_hidden(adult));
    assert_eq!(tree.attribute(adult, "title"), None);
    assert_eq!(tree.texts_by_tag("p"), vec![""]);

    // Hidden list keeps its item template in place.
    assert!(tree.is_hidden(by_id(&template, "with-items")));
    assert_eq!(tree.elements_by_tag("li").len(), 1);

    assert!(!tree.is_hidden(by_id(&template, "no-items")));
    assert_eq!(tree.texts_by_tag("span"), vec!["none"]);
}

#[test]
fn test_conditional_shows_previously_hidden_element() {
    let mut template = load_template("conditional.xml");
    template
        .inject(json!({"age": 10, "name": "a", "items": [], "label": "l"}))
        .unwrap();
    template
        .inject(json!({"age": 30, "name": "b", "items": [], "label": "l"}))
        .unwrap();
    assert!(!template.tree().is_hidden(by_id(&template, "adult")));
}

#[test]
fn test_nested_numbering() {
    let mut template = load_template("numbering.xml");
    template
        .inject(json!({"chapters": [{"sections": [1, 2]}, {"sections": [1, 2]}]}))
        .unwrap();

    assert_eq!(template.tree().texts_by_tag("h2"), vec!["I", "II"]);
    let sections: Vec<String> = template
        .tree()
        .texts_by_tag("li")
        .into_iter()
        .filter(|text| !text.is_empty())
        .collect();
    assert_eq!(sections, vec!["I.A", "I.B", "II.A", "II.B"]);
    assert_eq!(template.numbering_depth(), 0);
}

#[test]
fn test_map_renders_key_value_pairs() {
    let mut template = load_template("glossary.xml");
    template
        .inject(json!({"terms": {
            "DOM": "Document Object Model",
            "XML": "Extensible Markup Language"
        }}))
        .unwrap();

    assert_eq!(template.tree().texts_by_tag("dt"), vec!["DOM", "XML"]);
    assert_eq!(
        template.tree().texts_by_tag("dd"),
        vec!["Document Object Model", "Extensible Markup Language"]
    );

    template.inject(json!({"terms": {}})).unwrap();
    assert!(template.tree().elements_by_tag("dt").is_empty());
}

#[test]
fn test_map_with_list_value_is_content_type_error() {
    let mut template = load_template("glossary.xml");
    let err = template.inject(json!({"terms": ["a"]})).unwrap_err();
    assert!(matches!(err, TemplateError::ContentType { expected: "map", .. }));
}

fn profile_model(active: bool) -> ContentValue {
    [
        ("id", ContentValue::Number(1964.0)),
        ("description", "Founder".into()),
        ("born", Utc.with_ymd_and_hms(1964, 3, 21, 0, 0, 0).unwrap().into()),
        ("salary", ContentValue::Number(1_234_567.5)),
        ("homepage", "https://example.org/".into()),
        ("avatar", "avatar.png".into()),
        ("active", active.into()),
        ("status", "online".into()),
        ("bio", "<b>bio</b>".into()),
    ]
    .into_iter()
    .collect()
}

fn profile_template() -> Template<Document> {
    let mut template = load_template("profile.xml");
    template.register_format("date", DateFormat::new("%Y-%m-%d"));
    template.register_format("money", NumberFormat::new(2).with_grouping(','));
    template
}

#[test]
fn test_attribute_operators() {
    let mut template = profile_template();
    template.inject(profile_model(true)).unwrap();

    let tree = template.tree();
    let form = tree.root();
    assert_eq!(tree.attribute(form, "title"), Some("Founder"));
    assert_eq!(tree.attribute(form, "id"), Some("1964"));

    let input = tree.elements_by_tag("input")[0];
    assert_eq!(tree.attribute(input, "value"), Some("1964-03-21"));
    assert_eq!(tree.texts_by_tag("span"), vec!["1,234,567.50"]);

    let a = tree.elements_by_tag("a")[0];
    assert_eq!(tree.attribute(a, "href"), Some("https://example.org/"));
    let img = tree.elements_by_tag("img")[0];
    assert_eq!(tree.attribute(img, "src"), Some("avatar.png"));

    let em = tree.elements_by_tag("em")[0];
    assert!(tree.has_css_class(em, "enabled"));
    assert!(!tree.has_css_class(em, "disabled"));
    assert_eq!(tree.html(tree.elements_by_tag("div")[0]), Some("<b>bio</b>"));
}

#[test]
fn test_css_class_follows_model() {
    let mut template = profile_template();
    template.inject(profile_model(true)).unwrap();
    template.inject(profile_model(false)).unwrap();

    let tree = template.tree();
    let em = tree.elements_by_tag("em")[0];
    assert_eq!(tree.attribute(em, "class"), Some("disabled"));
}

#[test]
fn test_reset_clears_rendered_content() {
    let mut template = profile_template();
    template.inject(profile_model(true)).unwrap();
    let root = template.tree().root();
    template.reset(root).unwrap();

    let tree = template.tree();
    assert_eq!(tree.attribute(root, "title"), None);
    let input = tree.elements_by_tag("input")[0];
    assert_eq!(tree.attribute(input, "value"), None);
    assert_eq!(tree.texts_by_tag("span"), vec![""]);
    let em = tree.elements_by_tag("em")[0];
    assert_eq!(tree.attribute(em, "class"), None);
    assert_eq!(tree.html(tree.elements_by_tag("div")[0]), None);
}

#[test]
fn test_reset_ignores_conditionals() {
    let mut template = load_template("conditional.xml");
    template
        .inject(json!({"age": 42, "name": "Iulian", "items": ["x"], "label": "l"}))
        .unwrap();
    let root = template.tree().root();
    template.reset(root).unwrap();

    assert_eq!(template.tree().texts_by_tag("p"), vec![""]);
    assert!(template.tree().elements_by_tag("li").is_empty());
}

#[test]
fn test_missing_format_class() {
    let mut template = load_template("profile.xml");
    let err = template.inject(profile_model(true)).unwrap_err();
    assert_eq!(
        err,
        TemplateError::Configuration {
            element: "input".to_string(),
            message: "Missing format class `date`.".to_string(),
        }
    );
}

#[test]
fn test_goto_redirects_injection() {
    let mut template = load_template("redirect.xml");
    template.inject(json!({"message": "moved"})).unwrap();
    assert_eq!(template.tree().texts_by_tag("p"), vec!["moved"]);
}

#[test]
fn test_inject_element_into_subtree() {
    let mut template = load_template("person.xml");
    let relative = by_id(&template, "relative");
    template
        .inject_element(relative, json!({"name": "Ana", "address": {"city": "Cluj"}}))
        .unwrap();

    assert_eq!(template.tree().texts_by_tag("h1"), vec!["Ana", ""]);

    template.inject_element(relative, ContentValue::Null).unwrap();
    assert_eq!(template.tree().texts_by_tag("h1"), vec!["", ""]);
}

#[test]
fn test_subtree_without_content_operator_rejected_by_policy() {
    let mut template = load_template("person.xml").with_options(
        InjectOptions::default().with_subtree_content_policy(SubtreeContentPolicy::Reject),
    );
    let absolute = by_id(&template, "absolute");
    let err = template
        .inject_element(absolute, json!({"person": {"name": "x"}}))
        .unwrap_err();
    assert!(matches!(err, TemplateError::Configuration { .. }));

    // The tolerant default binds the subtree as an object.
    let relative = by_id(&template, "relative");
    template
        .inject_element(relative, json!({"name": "y", "address": {"city": "z"}}))
        .unwrap();
}

#[test]
fn test_named_accessor() {
    let mut template = load_template("person.xml");
    let model = json!({
        "person": {"first": "Ada", "last": "Lovelace", "address": {"city": "London"}}
    });
    let content = Content::new(model).with_accessor("name", |person| {
        match (person.property("first"), person.property("last")) {
            (Some(first), Some(last)) => ContentValue::String(format!(
                "{} {}",
                first.as_str().unwrap_or_default(),
                last.as_str().unwrap_or_default()
            )),
            _ => ContentValue::Null,
        }
    });
    template.inject(content).unwrap();
    assert_eq!(
        template.tree().texts_by_tag("h1"),
        vec!["Ada Lovelace", "Ada Lovelace"]
    );
}

#[test]
fn test_custom_operator_prefix() {
    let doc = Document::parse(r#"<p x-text="name" data-text="ignored"/>"#).unwrap();
    let mut template =
        Template::new(doc).with_options(InjectOptions::default().with_operator_prefix("x-"));
    template.inject(json!({"name": "prefixed"})).unwrap();
    assert_eq!(template.tree().texts_by_tag("p"), vec!["prefixed"]);
}

#[test]
fn test_options_from_json() {
    let options: InjectOptions = serde_json::from_value(json!({
        "strict-mode": true,
        "subtree-content-policy": "reject"
    }))
    .unwrap();
    let mut template = load_template("person.xml").with_options(options);
    let err = template.inject(json!({})).unwrap_err();
    assert!(matches!(err, TemplateError::ContentResolution { .. }));
}

#[test]
fn test_ordered_map_numbers_keys() {
    let mut template = load_template("ordered-glossary.xml");
    template.inject(json!({"a": "v0", "b": "v1"})).unwrap();
    assert_eq!(template.tree().texts_by_tag("dt"), vec!["I", "II"]);
    assert_eq!(template.tree().texts_by_tag("dd"), vec!["v0", "v1"]);

    template.inject(json!({"c": "v2"})).unwrap();
    assert_eq!(template.tree().texts_by_tag("dt"), vec!["I"]);
    assert_eq!(template.tree().texts_by_tag("dd"), vec!["v2"]);
    assert_eq!(template.numbering_depth(), 0);
}

#[test]
fn test_exclude_hides_branch_statically() {
    let mut template = load_template("exclude.xml");
    template.inject(json!({"name": "shown"})).unwrap();

    let gone = by_id(&template, "gone");
    let kept = by_id(&template, "kept");
    assert!(template.tree().is_hidden(gone));
    assert_eq!(template.tree().text(gone), None);
    assert!(!template.tree().is_hidden(kept));
    assert_eq!(template.tree().text(kept), Some("shown"));
}

#[test]
fn test_src_on_unsupported_element_is_configuration_error() {
    let doc = Document::parse(r#"<div data-src="image"/>"#).unwrap();
    let mut template = Template::new(doc);
    let err = template.inject(json!({"image": "a.png"})).unwrap_err();
    assert_eq!(
        err,
        TemplateError::Configuration {
            element: "div".to_string(),
            message: "Src operator is not supported on <div>.".to_string(),
        }
    );
}

#[test]
fn test_attr_with_empty_value_is_configuration_error() {
    let doc = Document::parse(r#"<a data-attr="title:;"/>"#).unwrap();
    let mut template = Template::new(doc);
    let err = template.inject(json!({"title": "x"})).unwrap_err();
    assert_eq!(
        err,
        TemplateError::Configuration {
            element: "a".to_string(),
            message: "Empty name or value in pair `title:`.".to_string(),
        }
    );
}
