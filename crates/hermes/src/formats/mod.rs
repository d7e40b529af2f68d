// ABOUTME: Renderers turning a matched content region into html, markdown or plain text.
// ABOUTME: Markdown goes through htmd; plain text collapses whitespace and keeps line breaks.

//! Output format conversion module.
//!
//! A region is rendered by serializing it as markup first; plain text and
//! markdown are derived from that markup, so every representation sees the
//! same mutated tree.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::dom::Selection;
use crate::error::ExtractError;
use crate::options::ContentType;

static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").unwrap());
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NEWLINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
static HORIZONTAL_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

/// Renders `region` in the requested representation.
pub fn render(region: &Selection, content_type: ContentType) -> Result<String, ExtractError> {
    let html = region.html().to_string();
    match content_type {
        ContentType::Html => Ok(html),
        ContentType::Text => Ok(html_to_text(&html)),
        ContentType::Markdown => html_to_markdown(&html),
    }
}

/// Preprocess HTML before conversion: replace <br> tags with newlines.
fn preprocess_br_tags(html: &str) -> String {
    BR_RE.replace_all(html, "\n").to_string()
}

/// Collapse more than 2 consecutive blank lines to exactly 2.
fn collapse_blank_lines_to_two(text: &str) -> String {
    BLANK_LINES_RE.replace_all(text, "\n\n").to_string()
}

fn collapse_newlines_to_one(text: &str) -> String {
    NEWLINES_RE.replace_all(text, "\n").to_string()
}

/// Convert HTML to Markdown using htmd.
///
/// Skips script, style and noscript content and normalizes consecutive
/// blank lines to at most two.
pub fn html_to_markdown(html: &str) -> Result<String, ExtractError> {
    let preprocessed = preprocess_br_tags(html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript"])
        .build();

    let md = converter
        .convert(&preprocessed)
        .map_err(|e| ExtractError::render("markdown", "html_to_markdown", Some(e.into())))?;

    Ok(collapse_blank_lines_to_two(md.trim()))
}

/// Convert HTML to plain text by extracting text nodes.
///
/// Treats <br> as newline, collapses multiple blank lines to one,
/// and trims leading/trailing whitespace.
pub fn html_to_text(html: &str) -> String {
    let preprocessed = preprocess_br_tags(html);

    let document = Html::parse_document(&preprocessed);
    let raw_text: String = document.root_element().text().collect::<Vec<_>>().join(" ");

    let normalized = HORIZONTAL_WS_RE.replace_all(&raw_text, " ");
    let lines: Vec<&str> = normalized.split('\n').map(str::trim).collect();
    collapse_newlines_to_one(&lines.join("\n")).trim().to_string()
}

/// First 200 characters of the text of `html`, or `None` when it has no text.
pub fn extract_excerpt(html: &str) -> Option<String> {
    let text = html_to_text(html);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn render_html_is_outer_markup() {
        let doc = Document::from(r#"<div id="r"><p>Hello <b>world</b></p></div>"#);
        let html = render(&doc.select("#r"), ContentType::Html).unwrap();
        assert_eq!(html, r#"<div id="r"><p>Hello <b>world</b></p></div>"#);
    }

    #[test]
    fn render_text_has_no_markup() {
        let doc = Document::from(r#"<div id="r"><h2>Head</h2><p>Hello <b>world</b></p></div>"#);
        let text = render(&doc.select("#r"), ContentType::Text).unwrap();
        assert!(!text.contains('<'), "{}", text);
        assert!(text.contains("Head"));
        assert!(text.contains("world"));
    }

    #[test]
    fn render_markdown_converts_headings() {
        let doc = Document::from(r#"<div id="r"><h3>Sub</h3><p>Body</p></div>"#);
        let md = render(&doc.select("#r"), ContentType::Markdown).unwrap();
        assert!(md.contains("### Sub"), "{}", md);
        assert!(md.contains("Body"));
    }

    #[test]
    fn html_round_trip_preserves_structure() {
        let doc = Document::from(
            r#"<div id="r"><h3 class="x">A</h3><p>B <a href="/c">C</a></p><ul><li>D</li></ul></div>"#,
        );
        let region = doc.select("#r");
        let html = render(&region, ContentType::Html).unwrap();
        let reparsed = Document::from(html.as_str());
        let again = reparsed.select("#r");
        assert_eq!(again.text().to_string(), region.text().to_string());
        assert_eq!(again.html().to_string(), html);
    }

    #[test]
    fn html_to_markdown_skips_script_and_style() {
        let html = "<p>Before</p><script>alert(1)</script><style>.x{}</style><p>After</p>";
        let md = html_to_markdown(html).unwrap();
        assert!(!md.contains("alert"), "{}", md);
        assert!(!md.contains(".x{}"), "{}", md);
        assert!(md.contains("Before") && md.contains("After"), "{}", md);
    }

    #[test]
    fn html_to_markdown_collapses_excessive_blank_lines() {
        let md = html_to_markdown("<p>Para 1</p>\n\n\n\n\n<p>Para 2</p>").unwrap();
        assert!(!md.contains("\n\n\n"), "{:?}", md);
    }

    #[test]
    fn html_to_markdown_preserves_links_and_images() {
        let md = html_to_markdown(
            r#"<p>Visit <a href="https://example.com">Example</a></p><img src="https://example.com/i.png" alt="Test">"#,
        )
        .unwrap();
        assert!(md.contains("[Example](https://example.com)"), "{}", md);
        assert!(md.contains("![Test](https://example.com/i.png)"), "{}", md);
    }

    #[test]
    fn html_to_text_collapses_whitespace() {
        assert_eq!(html_to_text("<p>Hello   world</p>"), "Hello world");
        assert_eq!(html_to_text("   <p>  trimmed  </p>   "), "trimmed");
    }

    #[test]
    fn html_to_text_keeps_single_line_breaks() {
        let text = html_to_text("<p>Line 1<br>Line 2</p>\n\n\n<p>Para 2</p>");
        assert!(text.contains("Line 1\nLine 2"), "{:?}", text);
        assert!(!text.contains("\n\n"), "{:?}", text);
    }

    #[test]
    fn extract_excerpt_truncates_to_200_chars() {
        let html = format!("<p>{}</p>", "a".repeat(300));
        assert_eq!(extract_excerpt(&html), Some("a".repeat(200)));
        assert_eq!(extract_excerpt("<html><body></body></html>"), None);
    }

    #[test]
    fn preprocess_br_handles_variants() {
        for br in ["<br>", "<br/>", "<br />", "<BR>", "<BR />"] {
            assert_eq!(preprocess_br_tags(br), "\n");
        }
    }
}
