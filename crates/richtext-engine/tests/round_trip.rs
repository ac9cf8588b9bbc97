use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use richtext_engine::{CreateOptions, FormatRegistry, create_from_markup, to_html_string};

#[test]
fn fixture_inline_nesting() {
    assert_fixture("inline_nesting", None);
}

#[test]
fn fixture_objects() {
    assert_fixture("objects", None);
}

#[test]
fn fixture_escaping() {
    assert_fixture("escaping", None);
}

#[test]
fn fixture_disarmed() {
    assert_fixture("disarmed", None);
}

#[test]
fn fixture_nested_list() {
    assert_fixture("nested_list", Some("li"));
}

#[test]
fn fixture_paragraphs() {
    assert_fixture("paragraphs", Some("p"));
}

fn assert_fixture(name: &str, multiline: Option<&str>) {
    let markup = std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.html",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    let markup = markup.trim_end();

    let options = multiline.map_or_else(CreateOptions::default, CreateOptions::multiline);
    let registry = FormatRegistry::new();
    let value = create_from_markup(markup, &options, &registry);

    assert_eq!(to_html_string(&value, multiline, &registry), markup);
}

fn normalize(markup: &str) -> String {
    let registry = FormatRegistry::new();
    let value = create_from_markup(markup, &CreateOptions::default(), &registry);
    to_html_string(&value, None, &registry)
}

#[test]
fn whitespace_collapses() {
    assert_snapshot!(normalize("  a \n\t b   <em> c </em>  "), @"a b <em> c </em>");
}

#[test]
fn malformed_markup_still_reads() {
    assert_snapshot!(normalize("<em>open <strong>both</em> tail"), @"<em>open <strong>both</strong></em> tail");
}

#[test]
fn event_handlers_survive_serialization() {
    assert_snapshot!(normalize(r#"<img onerror="x()" src="y">"#), @r#"<img onerror="x()" src="y">"#);
}
