// ABOUTME: Integration tests for loading rule files from disk and using them through the Parser.
// ABOUTME: Checks literals, extended fields and rule validation errors.

use std::fs;

use hermes_extract::{load_registry_from_path, FieldSpec, FieldType, Parser};
use tempfile::TempDir;

const RULES: &str = r#"[
    {
        "domain": "news.example.org",
        "supported_domains": ["amp.example.org"],
        "author": "Newsroom",
        "title": { "selectors": [["meta[name='headline']", "content"], "h1"] },
        "date_published": {
            "selectors": [".dateline"],
            "format": "%d/%m/%Y %H:%M",
            "timezone": "+02:00"
        },
        "extend": {
            "tags": { "selectors": ["a.tag"], "allow_multiple": true },
            "section": { "selectors": [["meta[name='section']", "content"]] }
        }
    }
]"#;

const PAGE: &str = r#"<html><head>
    <meta name="headline" content="  Rule Headline ">
    <meta name="section" content="World">
</head><body>
    <h1>Page heading</h1>
    <p class="dateline">05/03/2024 14:30</p>
    <a class="tag" href="/t/a">alpha</a><a class="tag" href="/t/b">beta</a>
    <article><p>Some body text for the story, long enough to count.</p></article>
</body></html>"#;

#[test]
fn rule_file_round_trips_through_parser() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");
    fs::write(&path, RULES).unwrap();

    let registry = load_registry_from_path(&path).unwrap();
    let def = registry.get("amp.example.org").unwrap();
    assert_eq!(def.domain, "news.example.org");
    assert!(matches!(def.field(FieldType::Author), Some(FieldSpec::Literal(_))));

    let parser = Parser::builder().registry(registry).build();
    let result = parser
        .parse_html(PAGE, "https://news.example.org/world/1")
        .unwrap()
        .into_full()
        .unwrap();

    assert_eq!(result.title.as_deref(), Some("Rule Headline"));
    assert_eq!(result.author.as_deref(), Some("Newsroom"));
    assert_eq!(
        result.date_published.map(|d| d.to_rfc3339()),
        Some("2024-03-05T12:30:00+00:00".to_string())
    );
    assert_eq!(result.extended["tags"], serde_json::json!(["alpha", "beta"]));
    assert_eq!(result.extended["section"], serde_json::json!("World"));
}

#[test]
fn multi_selector_outside_content_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");
    fs::write(
        &path,
        r#"{ "domain": "x.com", "author": { "selectors": [["a", "b", "c"]] } }"#,
    )
    .unwrap();

    let err = load_registry_from_path(&path).unwrap_err();
    assert!(err.is_invalid_rule(), "{}", err);
}

#[test]
fn empty_selector_list_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");
    fs::write(&path, r#"{ "domain": "x.com", "title": { "selectors": [] } }"#).unwrap();

    assert!(load_registry_from_path(&path).unwrap_err().is_invalid_rule());
}
