// ABOUTME: Content mutation for matched regions: ordered transforms, then removal of clean selectors.
// ABOUTME: Also builds the wrapped region an html-mode selector match is rendered from.

//! Content mutator.
//!
//! Html-mode matches are wrapped where they stand in the document, so the
//! transforms, clean list and content cleaner change the page every later
//! field reads:
//!
//! - a single selector becomes `<div>match</div>`
//! - a multi-selector becomes `<div><div>m1 m2 ..</div></div>`, members in
//!   selector-list order, moved next to the first member
//!
//! The outermost `div` is the region.

use dom_query::NodeRef;

use crate::dom::{
    convert_node_to, select_doc, select_within, tag_name, unwrap, Document, NodeHandle, Selection,
};
use crate::extractors::custom::NodeTransform;
use crate::extractors::definition::{Selector, Transform};

const WRAPPER: &str = "<div></div>";

fn is_inside(node: &NodeRef<'_>, ancestor: &NodeRef<'_>) -> bool {
    node.ancestors_it(None).any(|a| a.id == ancestor.id)
}

/// Elements an html-mode selector covers, as a union: an element is never
/// listed together with one of its ancestors.
fn matched_nodes<'a>(doc: &'a Document, selector: &Selector) -> Vec<NodeRef<'a>> {
    match selector {
        Selector::Text(css) | Selector::Attribute { selector: css, .. } => select_doc(doc, css)
            .nodes()
            .first()
            .copied()
            .into_iter()
            .collect(),
        Selector::Multi(members) => {
            let mut union: Vec<NodeRef<'a>> = Vec::new();
            for css in members {
                for node in select_doc(doc, css).nodes() {
                    if union
                        .iter()
                        .any(|kept| kept.id == node.id || is_inside(node, kept))
                    {
                        continue;
                    }
                    union.retain(|kept| !is_inside(kept, node));
                    union.push(*node);
                }
            }
            union
        }
    }
}

/// Parses `inner` inside a neutral `div`; see [`region_of`].
pub fn wrap_markup(inner: &str) -> Document {
    Document::from(format!("<div>{}</div>", inner).as_str())
}

/// The wrapper element of a document made by [`wrap_markup`].
pub fn region_of(doc: &Document) -> Selection<'_> {
    doc.select("body > div").first()
}

/// Wraps the match for `selector` in place and returns the wrapper.
///
/// `None` when the selector matches nothing.
pub fn build_region<'a>(doc: &'a Document, selector: &Selector) -> Option<Selection<'a>> {
    let nodes = matched_nodes(doc, selector);
    let (first, rest) = nodes.split_first()?;
    first.wrap_html(WRAPPER);
    let mut region = first.parent()?;
    if let Selector::Multi(_) = selector {
        let inner = region;
        for node in rest {
            inner.append_child(node);
        }
        inner.wrap_html(WRAPPER);
        region = inner.parent()?;
    }
    Some(Selection::from(region))
}

/// Applies a rule-file transform to each element of `sel`.
fn apply_node_transform(sel: &Selection, transform: &NodeTransform) {
    match transform {
        NodeTransform::Tag { value } => convert_node_to(sel, value),
        NodeTransform::Noop => {}
        NodeTransform::NoscriptToDiv => convert_node_to(sel, "div"),
        NodeTransform::Unwrap => unwrap(sel),
        NodeTransform::MoveAttr { from, to } => {
            for node in sel.nodes() {
                let el = Selection::from(*node);
                if let Some(value) = el.attr(from) {
                    el.set_attr(to, &value);
                }
            }
        }
        NodeTransform::SetAttr { name, value } => sel.set_attr(name, value),
    }
}

/// Applies `transforms` in order to the elements they select inside `region`.
///
/// A callback's returned tag name converts that element; `None` leaves it to
/// whatever the callback did through its handle.
pub fn transform_elements(region: &Selection, transforms: &[(String, Transform)]) {
    for (css, transform) in transforms {
        let matched = select_within(region, css);
        if matched.length() == 0 {
            continue;
        }
        match transform {
            Transform::Rename(tag) => convert_node_to(&matched, tag),
            Transform::Apply(node) => apply_node_transform(&matched, node),
            Transform::Mutate(callback) => {
                for node in matched.nodes() {
                    let el = Selection::from(*node);
                    let before = tag_name(&el);
                    let handle = NodeHandle::new(el.clone(), region);
                    if let Some(tag) = callback.call(&handle) {
                        tracing::debug!(
                            selector = %css,
                            from = ?before,
                            to = %tag,
                            "transform callback renamed element"
                        );
                        convert_node_to(&el, &tag);
                    }
                }
            }
        }
    }
}

/// Removes every element inside `region` matching any of `clean`.
pub fn clean_by_selectors(region: &Selection, clean: &[String]) {
    if clean.is_empty() {
        return;
    }
    select_within(region, &clean.join(", ")).remove();
}
