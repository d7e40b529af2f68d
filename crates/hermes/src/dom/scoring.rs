// ABOUTME: Lightweight readability scoring for the generic content fallback.
// ABOUTME: Weighs class/id hints, paragraph text and link density to pick a content container.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize_spaces, tag_name, Document, Selection};

static POSITIVE_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)article|articlecontent|instapaper_body|blog|body|content|entry-content-asset|entry|hentry|main|Normal|page|pagination|permalink|post|story|text|[-_]copy|\Bcopy")
        .unwrap()
});
static NEGATIVE_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)adbox|advert|author|bio|bookmark|bottom|byline|clear|com-|combx|comment|comment\B|contact|copy|credit|crumb|date|deck|excerpt|featured|foot|footer|footnote|graf|head|info|infotext|instapaper_ignore|jump|linebreak|link|masthead|media|meta|modal|outbrain|promo|pr_|related|respond|roundcontent|scroll|secondary|share|shopping|shoutbox|side|sidebar|sponsor|stamp|sub|summary|tags|tools|widget")
        .unwrap()
});
static PHOTO_HINTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)figure|photo|image|caption").unwrap());
static CANDIDATES_BLACKLIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(ad-break|ad-banner|adbox|advert|addthis|agegate|aux|blogger-labels|combx|comment|conversation|disqus|entry-unrelated|extra|foot|header|hidden|loader|login|menu|meta|nav|outbrain|pager|pagination|predicta|presence_control_external|popup|printfriendly|related|remove|remark|rss|share|shoutbox|sidebar|sociable|sponsor|taboola|tools)")
        .unwrap()
});
static CANDIDATES_WHITELIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(and|article|body|blogindex|column|content|entry-content-asset|format|hfeed|hentry|hatom|main|page|posts|shadow)")
        .unwrap()
});

/// Containers considered as article roots.
const CANDIDATE_SELECTOR: &str = "article, main, section, div, td";
const PARAGRAPH_TAGS: &[&str] = &["p", "pre", "blockquote"];
const NESTED_TAGS: &[&str] = &["div", "section"];

/// Weight from className and id hints.
pub fn get_weight(sel: &Selection) -> i32 {
    let class = sel.attr("class").map(|v| v.to_string()).unwrap_or_default();
    let id = sel.attr("id").map(|v| v.to_string()).unwrap_or_default();
    let mut score = 0i32;

    if !id.is_empty() {
        if POSITIVE_SCORE_RE.is_match(&id) {
            score += 25;
        }
        if NEGATIVE_SCORE_RE.is_match(&id) {
            score -= 25;
        }
    }

    if !class.is_empty() {
        if score == 0 {
            if POSITIVE_SCORE_RE.is_match(&class) {
                score += 25;
            }
            if NEGATIVE_SCORE_RE.is_match(&class) {
                score -= 25;
            }
        }
        if PHOTO_HINTS_RE.is_match(&class) {
            score += 10;
        }
    }

    score
}

/// Ratio of link text to total text.
pub fn link_density(sel: &Selection) -> f64 {
    let total_len = normalize_spaces(&sel.text()).len();
    if total_len == 0 {
        return 0.0;
    }
    let link_len: usize = sel
        .select("a")
        .nodes()
        .iter()
        .map(|a| normalize_spaces(&Selection::from(*a).text()).len())
        .sum();
    link_len as f64 / total_len as f64
}

/// Check if element should be skipped as an unlikely content root.
pub fn is_unlikely_candidate(sel: &Selection) -> bool {
    let class = sel.attr("class").map(|v| v.to_string()).unwrap_or_default();
    let id = sel.attr("id").map(|v| v.to_string()).unwrap_or_default();
    if class.is_empty() && id.is_empty() {
        return false;
    }
    let class_and_id = format!("{} {}", class, id);
    if CANDIDATES_WHITELIST.is_match(&class_and_id) {
        return false;
    }
    CANDIDATES_BLACKLIST.is_match(&class_and_id)
}

fn score_paragraph(text: &str) -> f64 {
    let text = text.trim();
    if text.len() < 25 {
        return 0.0;
    }
    let commas = text.matches(',').count() as f64;
    let length_bonus = ((text.len() / 100) as f64).min(3.0);
    1.0 + commas + length_bonus
}

/// Scores a container by the paragraphs it directly holds (nested
/// containers one level down count half), weighted by class hints and
/// discounted by link density.
pub fn score_candidate(sel: &Selection) -> f64 {
    let mut score = 0.0;
    for child in sel.children().nodes() {
        let child = Selection::from(*child);
        let tag = tag_name(&child).unwrap_or_default();
        if PARAGRAPH_TAGS.contains(&tag.as_str()) {
            score += score_paragraph(&child.text());
        } else if NESTED_TAGS.contains(&tag.as_str()) {
            for grandchild in child.children().nodes() {
                let grandchild = Selection::from(*grandchild);
                let gtag = tag_name(&grandchild).unwrap_or_default();
                if PARAGRAPH_TAGS.contains(&gtag.as_str()) {
                    score += score_paragraph(&grandchild.text()) / 2.0;
                }
            }
        }
    }
    if score == 0.0 {
        return 0.0;
    }
    let weighted = score + f64::from(get_weight(sel)) / 5.0;
    weighted * (1.0 - link_density(sel))
}

/// Picks the best-scoring content container, or `<body>` when nothing scores.
pub fn find_top_candidate(doc: &Document) -> Option<Selection<'_>> {
    let mut best: Option<(f64, Selection<'_>)> = None;
    for node in doc.select(CANDIDATE_SELECTOR).nodes() {
        let candidate = Selection::from(*node);
        if is_unlikely_candidate(&candidate) {
            continue;
        }
        let score = score_candidate(&candidate);
        if score <= 0.0 {
            continue;
        }
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, candidate));
        }
    }

    match best {
        Some((_, candidate)) => Some(candidate),
        None => {
            let body = doc.select("body");
            if body.length() > 0 {
                Some(body)
            } else {
                None
            }
        }
    }
}
