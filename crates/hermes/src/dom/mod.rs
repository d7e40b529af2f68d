// ABOUTME: DOM manipulation helpers over dom_query for matched regions.
// ABOUTME: Provides node conversion, unwrapping and the capability-limited NodeHandle for transform callbacks.

//! DOM utilities for region manipulation.
//!
//! The document is a `dom_query::Document`; regions are `Selection`s into it.
//! Every mutation goes through `&Selection`, so a region can be mutated in
//! place while the document is only borrowed.

pub mod cleaners;
pub mod scoring;

pub use dom_query::{Document, Selection};

use crate::extractors::compiled::get_or_compile;

/// Lowercase tag name of the first node in the selection.
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes()
        .first()
        .and_then(|n| n.node_name())
        .map(|t| t.to_lowercase())
}

/// All attributes of the first node, in source order.
pub fn attributes(sel: &Selection) -> Vec<(String, String)> {
    sel.nodes()
        .first()
        .map(|node| {
            node.attrs()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn attributes_html(sel: &Selection) -> String {
    attributes(sel)
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", name, escape_attr(value)))
        .collect()
}

/// Converts each element in `sel` to `tag`, keeping attributes and children.
///
/// `<noscript>` contents are raw text when parsed with scripting enabled, so
/// they are re-parsed as markup under the new tag.
pub fn convert_node_to(sel: &Selection, tag: &str) {
    for node in sel.nodes() {
        let el = Selection::from(*node);
        if tag_name(&el).as_deref() == Some("noscript") {
            let inner = if el.children().length() > 0 {
                el.inner_html().to_string()
            } else {
                el.text().to_string()
            };
            let html = format!("<{tag}{}>{}</{tag}>", attributes_html(&el), inner);
            el.replace_with_html(html.as_str());
        } else {
            el.rename(tag);
        }
    }
}

/// Removes each element in `sel` but keeps its children in place.
pub fn unwrap(sel: &Selection) {
    for node in sel.nodes() {
        let el = Selection::from(*node);
        let inner = el.inner_html().to_string();
        el.replace_with_html(inner.as_str());
    }
}

/// Selects within `scope` using a cached matcher; invalid selectors match nothing.
pub fn select_within<'a>(scope: &Selection<'a>, css: &str) -> Selection<'a> {
    match get_or_compile(css) {
        Some(matcher) => scope.select_matcher(&matcher),
        None => Selection::default(),
    }
}

/// Selects across the whole document using a cached matcher.
pub fn select_doc<'a>(doc: &'a Document, css: &str) -> Selection<'a> {
    match get_or_compile(css) {
        Some(matcher) => doc.select_matcher(&matcher),
        None => Selection::default(),
    }
}

/// Collapses runs of whitespace into single spaces and trims.
pub fn normalize_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Mutation handle passed to transform callbacks.
///
/// It can read the matched element, query other elements inside the region
/// being transformed, and rename elements. Nothing else in the document is
/// reachable through it.
pub struct NodeHandle<'a, 'r> {
    node: Selection<'a>,
    region: &'r Selection<'a>,
}

impl<'a, 'r> NodeHandle<'a, 'r> {
    pub(crate) fn new(node: Selection<'a>, region: &'r Selection<'a>) -> Self {
        Self { node, region }
    }

    /// Lowercase tag name of the element.
    pub fn tag_name(&self) -> Option<String> {
        tag_name(&self.node)
    }

    /// Attribute value, if present.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.node.attr(name).map(|v| v.to_string())
    }

    /// Text content of the element.
    pub fn text(&self) -> String {
        self.node.text().to_string()
    }

    /// Outer HTML of the element.
    pub fn html(&self) -> String {
        self.node.html().to_string()
    }

    /// Elements inside the region matching `css`.
    pub fn query(&self, css: &str) -> Vec<NodeHandle<'a, 'r>> {
        select_within(self.region, css)
            .nodes()
            .iter()
            .map(|n| NodeHandle::new(Selection::from(*n), self.region))
            .collect()
    }

    /// Elements inside this element matching `css`.
    pub fn query_within(&self, css: &str) -> Vec<NodeHandle<'a, 'r>> {
        select_within(&self.node, css)
            .nodes()
            .iter()
            .map(|n| NodeHandle::new(Selection::from(*n), self.region))
            .collect()
    }

    /// Converts this element to `tag`, keeping attributes and children.
    pub fn rename(&self, tag: &str) {
        convert_node_to(&self.node, tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_node_to_keeps_attributes_and_children() {
        let doc = Document::from(r#"<div id="r"><h2 class="sub">Hello <b>there</b></h2></div>"#);
        convert_node_to(&doc.select("h2"), "h3");
        let html = doc.select("#r").html().to_string();
        assert!(html.contains(r#"<h3 class="sub">Hello <b>there</b></h3>"#), "{}", html);
        assert!(!html.contains("<h2"));
    }

    #[test]
    fn convert_noscript_parses_inner_markup() {
        let doc = Document::from(
            r#"<div id="r"><noscript data-x="1"><img src="/a.jpg"></noscript></div>"#,
        );
        convert_node_to(&doc.select("noscript"), "div");
        let region = doc.select("#r");
        assert_eq!(region.select("img").length(), 1);
        assert_eq!(region.select("div[data-x='1'] img").length(), 1);
    }

    #[test]
    fn unwrap_keeps_children() {
        let doc = Document::from(r#"<p id="p">A <span>B <i>C</i></span> D</p>"#);
        unwrap(&doc.select("span"));
        let p = doc.select("#p");
        assert_eq!(p.select("span").length(), 0);
        assert_eq!(p.select("i").length(), 1);
        assert_eq!(normalize_spaces(&p.text()), "A B C D");
    }

    #[test]
    fn select_within_ignores_invalid_selectors() {
        let doc = Document::from("<p>x</p>");
        let body = doc.select("body");
        assert_eq!(select_within(&body, "p").length(), 1);
        assert_eq!(select_within(&body, "p[[").length(), 0);
    }

    #[test]
    fn node_handle_queries_inside_region_only() {
        let doc = Document::from(
            r#"<p class="outside">o</p><div id="r"><p class="inside">i</p><span>s</span></div>"#,
        );
        let region = doc.select("#r");
        let span = region.select("span");
        let handle = NodeHandle::new(span, &region);
        let found = handle.query("p");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].attr("class").as_deref(), Some("inside"));
        found[0].rename("h4");
        assert_eq!(region.select("h4.inside").length(), 1);
    }

    #[test]
    fn tag_name_is_lowercase() {
        let doc = Document::from("<DIV id=x></DIV>");
        assert_eq!(tag_name(&doc.select("#x")).as_deref(), Some("div"));
        assert_eq!(attributes(&doc.select("#x")), vec![("id".to_string(), "x".to_string())]);
    }
}
