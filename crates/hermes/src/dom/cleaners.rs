// ABOUTME: Default DOM cleaners for extracted content regions.
// ABOUTME: Strips junk tags and attributes, tidies headers, images, links and empty paragraphs in place.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::scoring::get_weight;
use super::{normalize_spaces, select_within, unwrap, Selection};

// Keep class for elements that should be preserved
const KEEP_CLASS: &str = "hermes-parser-keep";

// Selectors to mark as keep (YouTube, Vimeo, Reddit iframes)
const KEEP_SELECTORS: &[&str] = &[
    r#"iframe[src^="https://www.youtube.com"]"#,
    r#"iframe[src^="https://www.youtube-nocookie.com"]"#,
    r#"iframe[src^="http://www.youtube.com"]"#,
    r#"iframe[src^="https://player.vimeo"]"#,
    r#"iframe[src^="http://player.vimeo"]"#,
    r#"iframe[src^="https://www.redditmedia.com"]"#,
];

// Tags to strip from output
const STRIP_OUTPUT_TAGS: &[&str] = &[
    "title", "script", "noscript", "link", "style", "hr", "embed", "iframe", "object", "form",
    "nav", "aside", "button", "input", "select", "textarea",
];

const HEADER_TAG_LIST: &str = "h2, h3, h4, h5, h6";

// Attributes to always remove
const REMOVE_ATTRS: &[&str] = &["style", "align"];

static SPACER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)transparent|spacer|blank").unwrap());

/// Tags embeds from known video/social hosts so junk stripping leaves them alone.
pub fn mark_to_keep(region: &Selection) {
    for css in KEEP_SELECTORS {
        select_within(region, css).add_class(KEEP_CLASS);
    }
}

fn is_kept(el: &Selection) -> bool {
    el.has_class(KEEP_CLASS) || el.select(&format!(".{}", KEEP_CLASS)).length() > 0
}

/// Removes script, style, embed and form-ish tags unless marked to keep.
pub fn strip_junk_tags(region: &Selection) {
    let css = STRIP_OUTPUT_TAGS.join(", ");
    for node in select_within(region, &css).nodes() {
        let el = Selection::from(*node);
        if !is_kept(&el) {
            el.remove();
        }
    }
}

/// Drops presentational attributes.
pub fn clean_attributes(region: &Selection) {
    for attr in REMOVE_ATTRS {
        for node in select_within(region, &format!("[{}]", attr)).nodes() {
            Selection::from(*node).remove_attr(attr);
        }
    }
}

/// Fewer than three `h1`s are treated as titles and removed; otherwise
/// they are section headers and get demoted to `h2`.
pub fn clean_h_ones(region: &Selection) {
    let h1s = select_within(region, "h1");
    match h1s.length() {
        0 => {}
        n if n < 3 => h1s.remove(),
        _ => h1s.rename("h2"),
    }
}

/// Check whether a subheading is redundant or junk.
pub fn should_remove_header(el: &Selection, title: &str) -> bool {
    let header_text = normalize_spaces(&el.text());
    if !title.is_empty() && header_text == normalize_spaces(title) {
        return true;
    }
    if get_weight(el) < 0 {
        return true;
    }
    header_text.len() < 3
}

/// Removes `h2`-`h6` headers that repeat the title, carry negative class
/// hints, or are too short to mean anything.
pub fn clean_headers(region: &Selection, title: &str) {
    for node in select_within(region, HEADER_TAG_LIST).nodes() {
        let el = Selection::from(*node);
        if should_remove_header(&el, title) {
            el.remove();
        }
    }
}

/// Check if image should be removed (spacer or too small)
pub fn should_remove_image(el: &Selection) -> bool {
    match el.attr("src") {
        Some(src) if SPACER_RE.is_match(&src) => return true,
        Some(_) => {}
        None => {
            if el.attr("srcset").is_none() {
                return true;
            }
        }
    }

    let dimension = |name: &str| {
        el.attr(name)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(20)
    };
    dimension("height") < 10 || dimension("width") < 10
}

pub fn clean_images(region: &Selection) {
    for node in select_within(region, "img").nodes() {
        let el = Selection::from(*node);
        if should_remove_image(&el) {
            el.remove();
        }
    }
}

/// Unwraps anchors whose href is empty or a bare `#`, keeping their text.
pub fn rewrite_empty_links(region: &Selection) {
    for node in select_within(region, "a").nodes() {
        let el = Selection::from(*node);
        let href = el.attr("href").map(|h| h.trim().to_string());
        if matches!(href.as_deref(), None | Some("") | Some("#")) {
            unwrap(&el);
        }
    }
}

/// Check if paragraph is empty (no text content and no media)
pub fn is_empty_paragraph(el: &Selection) -> bool {
    el.text().trim().is_empty() && el.select("img, picture, video, iframe").length() == 0
}

pub fn remove_empty_paragraphs(region: &Selection) {
    for node in select_within(region, "p").nodes() {
        let el = Selection::from(*node);
        if is_empty_paragraph(&el) {
            el.remove();
        }
    }
}

fn absolutize(base: &Url, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('#') || value.starts_with("data:") {
        return None;
    }
    base.join(value).ok().map(|u| u.to_string())
}

fn absolutize_srcset(base: &Url, srcset: &str) -> String {
    srcset
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            let url = absolutize(base, url).unwrap_or_else(|| url.to_string());
            let descriptor: Vec<&str> = parts.collect();
            if descriptor.is_empty() {
                Some(url)
            } else {
                Some(format!("{} {}", url, descriptor.join(" ")))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolves relative `href`, `src` and `srcset` values against `base`.
pub fn make_links_absolute(region: &Selection, base: &Url) {
    for attr in ["href", "src"] {
        for node in select_within(region, &format!("[{}]", attr)).nodes() {
            let el = Selection::from(*node);
            if let Some(resolved) = el.attr(attr).and_then(|v| absolutize(base, &v)) {
                el.set_attr(attr, &resolved);
            }
        }
    }
    for node in select_within(region, "[srcset]").nodes() {
        let el = Selection::from(*node);
        if let Some(srcset) = el.attr("srcset") {
            el.set_attr("srcset", &absolutize_srcset(base, &srcset));
        }
    }
}

/// Runs the default content cleaning pipeline over `region` in place.
pub fn clean_article(region: &Selection, title: &str) {
    mark_to_keep(region);
    strip_junk_tags(region);
    clean_attributes(region);
    clean_h_ones(region);
    clean_headers(region, title);
    clean_images(region);
    rewrite_empty_links(region);
    remove_empty_paragraphs(region);
}
