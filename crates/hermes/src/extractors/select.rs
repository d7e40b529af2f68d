// ABOUTME: Selector resolution and per-field resolution: first matching rule wins, then mutate, clean and render.
// ABOUTME: Text, attribute and html selectors each have their own match predicate and value path.

//! Selector resolution and field resolution.
//!
//! Key behaviors:
//! - Selectors are tried in declared order; the first one whose predicate
//!   holds wins. There is no scoring.
//! - Text selectors need exactly one element with non-empty trimmed text;
//!   attribute pairs need exactly one element with a non-empty trimmed
//!   attribute. `allow_multiple` lifts the exactly-one requirement.
//! - In html mode a multi-selector (or a pair) only needs every member to
//!   match something.
//! - "Nothing matched" is `Ok(None)`, never an error.

use serde_json::Value;

use crate::cleaners::{CleanOptions, FieldCleaner};
use crate::dom::{select_doc, Document, Selection};
use crate::error::ExtractError;
use crate::extractors::content::{build_region, clean_by_selectors, transform_elements};
use crate::extractors::definition::{FieldRules, FieldSpec, Selector};
use crate::field::{FieldContext, FieldType, SelectMode};
use crate::formats::render;

fn exists(doc: &Document, css: &str) -> bool {
    select_doc(doc, css).length() > 0
}

fn selector_matches(doc: &Document, selector: &Selector, mode: SelectMode, allow_multiple: bool) -> bool {
    let arity_ok = |n: usize| n > 0 && (allow_multiple || n == 1);
    match (selector, mode) {
        (Selector::Multi(members), SelectMode::Html) => members.iter().all(|css| exists(doc, css)),
        (Selector::Multi(_), SelectMode::Text) => false,
        (Selector::Attribute { selector, attr }, SelectMode::Html) => {
            exists(doc, selector) && exists(doc, attr)
        }
        (Selector::Attribute { selector, attr }, SelectMode::Text) => {
            let matched = select_doc(doc, selector);
            arity_ok(matched.length())
                && matched
                    .attr(attr)
                    .map_or(false, |value| !value.trim().is_empty())
        }
        (Selector::Text(css), _) => {
            let matched = select_doc(doc, css);
            arity_ok(matched.length()) && !matched.text().trim().is_empty()
        }
    }
}

/// Returns the first selector in `selectors` that matches `doc`.
pub fn find_matching_selector<'s>(
    doc: &Document,
    selectors: &'s [Selector],
    mode: SelectMode,
    allow_multiple: bool,
) -> Option<&'s Selector> {
    selectors.iter().find(|selector| {
        let matched = selector_matches(doc, selector, mode, allow_multiple);
        if !matched {
            tracing::trace!(selector = %selector, "selector did not match");
        }
        matched
    })
}

/// Trimmed text or attribute values of the elements `selector` matched,
/// after removing `clean` matches and applying transforms inside each.
fn text_values(doc: &Document, selector: &Selector, rules: &FieldRules) -> Vec<String> {
    let (css, attr) = match selector {
        Selector::Text(css) => (css.as_str(), None),
        Selector::Attribute { selector, attr } => (selector.as_str(), Some(attr.as_str())),
        Selector::Multi(_) => return Vec::new(),
    };
    let matched = select_doc(doc, css);
    let nodes: Vec<Selection> = if rules.allow_multiple {
        matched.nodes().iter().map(|n| Selection::from(*n)).collect()
    } else {
        matched.nodes().first().map(|n| Selection::from(*n)).into_iter().collect()
    };

    nodes
        .iter()
        .filter_map(|el| {
            let value = match attr {
                Some(attr) => el.attr(attr).map(|v| v.trim().to_string()),
                None => {
                    clean_by_selectors(el, &rules.clean);
                    transform_elements(el, &rules.transforms);
                    Some(el.text().trim().to_string())
                }
            };
            value.filter(|v| !v.is_empty())
        })
        .collect()
}

/// Resolves one field against its spec.
///
/// Literal specs are returned unchanged. Html-mode fields are rendered in
/// `ctx.content_type` after transforms, clean and the content cleaner. Text
/// fields go through the field's cleaner when `default_cleaner` is set;
/// attribute values are returned trimmed and uncleaned.
pub fn select_field(
    doc: &Document,
    field: FieldType,
    spec: Option<&FieldSpec>,
    ctx: &FieldContext<'_>,
    cleaner: &dyn FieldCleaner,
) -> Result<Option<String>, ExtractError> {
    let rules = match spec {
        None => return Ok(None),
        Some(FieldSpec::Literal(value)) => return Ok(Some(value.clone())),
        Some(FieldSpec::Rules(rules)) => rules,
    };

    let mode = field.mode();
    let Some(selector) = find_matching_selector(doc, &rules.selectors, mode, rules.allow_multiple)
    else {
        return Ok(None);
    };
    tracing::debug!(field = %field, selector = %selector, "selector matched");

    if mode == SelectMode::Html {
        let Some(region) = build_region(doc, selector) else {
            return Ok(None);
        };
        transform_elements(&region, &rules.transforms);
        clean_by_selectors(&region, &rules.clean);
        cleaner.content(&region, ctx, rules.default_cleaner);
        return render(&region, ctx.content_type).map(Some);
    }

    let Some(value) = text_values(doc, selector, rules).into_iter().next() else {
        return Ok(None);
    };
    if matches!(selector, Selector::Attribute { .. }) || !rules.default_cleaner {
        return Ok(Some(value));
    }
    let opts = CleanOptions {
        format: rules.format.as_deref(),
        timezone: rules.timezone.as_deref(),
    };
    Ok(cleaner.clean_text(field, &value, ctx, &opts))
}

/// Resolves a named extended field. Multiple matches yield an array when the
/// rule allows them.
pub fn select_extended(doc: &Document, name: &str, rules: &FieldRules) -> Option<Value> {
    let selector =
        find_matching_selector(doc, &rules.selectors, SelectMode::Text, rules.allow_multiple)?;
    tracing::debug!(field = %name, selector = %selector, "selector matched");

    let mut values = text_values(doc, selector, rules);
    if rules.allow_multiple {
        if values.is_empty() {
            return None;
        }
        Some(Value::Array(values.into_iter().map(Value::String).collect()))
    } else if values.is_empty() {
        None
    } else {
        Some(Value::String(values.swap_remove(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaners::DefaultCleaners;
    use crate::options::ContentType;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head>
        <meta property="og:image" content="  https://example.com/og.jpg  ">
    </head><body>
        <h1 class="headline">  Breaking News  </h1>
        <h2 class="headline">Second headline</h2>
        <p class="byline">By <a href="/jane">Jane Doe</a><span class="share">Share</span></p>
        <img class="hero" src="/a.jpg"><img class="hero" src="/b.jpg">
        <span class="tag">one</span><span class="tag">two</span><span class="tag"> </span>
        <article><h2>Part</h2><p>Body text here.</p><div class="ads">ad</div></article>
        <aside class="related"><p>Elsewhere</p></aside>
    </body></html>"#;

    fn rules(selectors: Vec<Selector>) -> FieldRules {
        FieldRules::new(selectors)
    }

    #[test]
    fn order_dominates_specificity() {
        let doc = Document::from(PAGE);
        let selectors = vec![Selector::text("h1"), Selector::text("h1.headline")];
        let found = find_matching_selector(&doc, &selectors, SelectMode::Text, false);
        assert_eq!(found, Some(&selectors[0]));
    }

    #[test]
    fn text_selector_needs_exactly_one_match() {
        let doc = Document::from(PAGE);
        let selectors = vec![Selector::text(".headline"), Selector::text("h2.headline")];
        let found = find_matching_selector(&doc, &selectors, SelectMode::Text, false);
        assert_eq!(found, Some(&selectors[1]));
        assert_eq!(
            find_matching_selector(&doc, &selectors[..1], SelectMode::Text, true),
            Some(&selectors[0])
        );
    }

    #[test]
    fn pair_selector_rejects_multiple_elements() {
        let doc = Document::from(PAGE);
        let selectors = vec![Selector::attribute("img.hero", "src")];
        assert!(find_matching_selector(&doc, &selectors, SelectMode::Text, false).is_none());
    }

    #[test]
    fn pair_selector_needs_non_empty_attribute() {
        let doc = Document::from(r#"<img class="a" src="  "><img class="b" src="/x.jpg">"#);
        let selectors = vec![Selector::attribute("img.a", "src"), Selector::attribute("img.b", "src")];
        let found = find_matching_selector(&doc, &selectors, SelectMode::Text, false);
        assert_eq!(found, Some(&selectors[1]));
    }

    #[test]
    fn html_pair_is_an_existence_check() {
        let doc = Document::from(PAGE);
        // Neither member needs to be unique or carry text.
        let pair = vec![Selector::attribute("img.hero", "span.tag")];
        assert!(find_matching_selector(&doc, &pair, SelectMode::Html, false).is_some());
        let missing = vec![Selector::attribute("img.hero", "video")];
        assert!(find_matching_selector(&doc, &missing, SelectMode::Html, false).is_none());
    }

    #[test]
    fn multi_selector_requires_every_member() {
        let doc = Document::from(PAGE);
        let selectors = vec![
            Selector::multi(["article", "figure"]),
            Selector::multi(["article", "aside.related"]),
        ];
        let found = find_matching_selector(&doc, &selectors, SelectMode::Html, false);
        assert_eq!(found, Some(&selectors[1]));
        assert!(find_matching_selector(&doc, &selectors, SelectMode::Text, false).is_none());
    }

    #[test]
    fn text_field_is_trimmed_and_cleaned() {
        let doc = Document::from(PAGE);
        let ctx = FieldContext::new(&doc, None, ContentType::Html);
        let spec = FieldSpec::Rules(rules(vec![Selector::text("h1.headline")]));
        let title = select_field(&doc, FieldType::Title, Some(&spec), &ctx, &DefaultCleaners).unwrap();
        assert_eq!(title.as_deref(), Some("Breaking News"));
    }

    #[test]
    fn text_field_cleans_before_reading() {
        let doc = Document::from(PAGE);
        let ctx = FieldContext::new(&doc, None, ContentType::Html);
        let spec = FieldSpec::Rules(rules(vec![Selector::text("p.byline")]).clean([".share"]));
        let author = select_field(&doc, FieldType::Author, Some(&spec), &ctx, &DefaultCleaners).unwrap();
        assert_eq!(author.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn default_cleaner_can_be_disabled() {
        let doc = Document::from(PAGE);
        let ctx = FieldContext::new(&doc, None, ContentType::Html);
        let spec = FieldSpec::Rules(rules(vec![Selector::text("p.byline")]).default_cleaner(false));
        let author = select_field(&doc, FieldType::Author, Some(&spec), &ctx, &DefaultCleaners).unwrap();
        assert_eq!(author.as_deref(), Some("By Jane DoeShare"));
    }

    #[test]
    fn attribute_value_is_trimmed_not_cleaned() {
        let doc = Document::from(PAGE);
        let ctx = FieldContext::new(&doc, None, ContentType::Html);
        let spec = FieldSpec::Rules(rules(vec![Selector::attribute(
            "meta[property='og:image']",
            "content",
        )]));
        let image =
            select_field(&doc, FieldType::LeadImageUrl, Some(&spec), &ctx, &DefaultCleaners).unwrap();
        assert_eq!(image.as_deref(), Some("https://example.com/og.jpg"));
    }

    #[test]
    fn literal_and_absent_specs() {
        let doc = Document::from(PAGE);
        let ctx = FieldContext::new(&doc, None, ContentType::Html);
        let literal = FieldSpec::Literal("  Fixed Credit ".to_string());
        assert_eq!(
            select_field(&doc, FieldType::Author, Some(&literal), &ctx, &DefaultCleaners).unwrap(),
            Some("  Fixed Credit ".to_string())
        );
        assert_eq!(
            select_field(&doc, FieldType::Author, None, &ctx, &DefaultCleaners).unwrap(),
            None
        );
    }

    #[test]
    fn html_field_is_transformed_cleaned_and_rendered() {
        let doc = Document::from(PAGE);
        let ctx = FieldContext::new(&doc, None, ContentType::Html);
        let spec = FieldSpec::Rules(
            rules(vec![Selector::text("article")])
                .transform("h2", crate::extractors::definition::Transform::Rename("h3".to_string()))
                .clean([".ads"])
                .default_cleaner(false),
        );
        let html = select_field(&doc, FieldType::Content, Some(&spec), &ctx, &DefaultCleaners)
            .unwrap()
            .unwrap();
        assert!(html.starts_with("<div><article>"), "{}", html);
        assert!(html.contains("<h3>Part</h3>"), "{}", html);
        assert!(!html.contains("<h2"), "{}", html);
        assert!(!html.contains("ads"), "{}", html);
    }

    #[test]
    fn html_field_renders_text() {
        let doc = Document::from(PAGE);
        let ctx = FieldContext::new(&doc, None, ContentType::Text);
        let spec = FieldSpec::Rules(rules(vec![Selector::multi(["article p", "aside.related p"])]));
        let text = select_field(&doc, FieldType::Content, Some(&spec), &ctx, &DefaultCleaners)
            .unwrap()
            .unwrap();
        assert!(!text.contains('<'));
        assert!(text.contains("Body text here."));
        assert!(text.find("Body").unwrap() < text.find("Elsewhere").unwrap());
    }

    #[test]
    fn extended_fields_collect_all_matches() {
        let doc = Document::from(PAGE);
        let tags = rules(vec![Selector::text(".tag")]).allow_multiple(true);
        assert_eq!(
            select_extended(&doc, "tags", &tags),
            Some(serde_json::json!(["one", "two"]))
        );
        let single = rules(vec![Selector::text("h2.headline")]);
        assert_eq!(
            select_extended(&doc, "kicker", &single),
            Some(Value::String("Second headline".to_string()))
        );
        let strict = rules(vec![Selector::text(".tag")]);
        assert_eq!(select_extended(&doc, "tags", &strict), None);
    }
}
