// ABOUTME: Rule-free fallback strategies, one per field, behind the injectable GenericExtractor trait.
// ABOUTME: Uses meta tags, common markup conventions and readability-style scoring for content.

//! Generic extraction.
//!
//! Used for every field a custom definition does not cover, and for the
//! whole document when the wildcard definition is selected. Each strategy
//! only sees the context its field declares (see [`FieldType::dependencies`]).

use crate::cleaners::{CleanOptions, DefaultCleaners, FieldCleaner};
use crate::dom::cleaners::{clean_article, make_links_absolute};
use crate::dom::scoring::find_top_candidate;
use crate::dom::{select_doc, Document, Selection};
use crate::error::ExtractError;
use crate::extractors::content::{region_of, wrap_markup};
use crate::extractors::root::resolve_in_order;
use crate::field::{FieldContext, FieldType};
use crate::formats::{html_to_text, render};
use crate::options::ExtractOptions;
use crate::result::Extraction;

/// Title sources: (selector, attribute) in priority order; `None` reads text.
const GENERIC_TITLE_SELECTORS: &[(&str, Option<&str>)] = &[
    ("meta[property='og:title']", Some("content")),
    ("meta[name='twitter:title']", Some("content")),
    ("article h1", None),
    (".entry-title", None),
    ("h1.title", None),
    ("title", None),
    ("h1", None),
];

/// Generic author selectors in priority order.
const GENERIC_AUTHOR_SELECTORS: &[(&str, Option<&str>)] = &[
    ("meta[name='author']", Some("content")),
    ("meta[property='article:author']", Some("content")),
    ("[rel='author']", None),
    (".byline", None),
    (".author", None),
    ("[itemprop='author']", None),
];

const GENERIC_DATE_SELECTORS: &[(&str, Option<&str>)] = &[
    ("meta[property='article:published_time']", Some("content")),
    ("meta[name='date']", Some("content")),
    ("meta[itemprop='datePublished']", Some("content")),
    ("time[datetime]", Some("datetime")),
    ("[itemprop='datePublished']", None),
];

/// Generic lead image selectors in priority order.
const GENERIC_IMAGE_SELECTORS: &[(&str, Option<&str>)] = &[
    ("meta[property='og:image']", Some("content")),
    ("meta[name='twitter:image']", Some("content")),
    ("link[rel='image_src']", Some("href")),
];

const GENERIC_NEXT_PAGE_SELECTORS: &[(&str, Option<&str>)] = &[
    ("link[rel='next']", Some("href")),
    (".next a[href]", Some("href")),
    (".pagination a[rel='next'][href]", Some("href")),
];

const GENERIC_DESCRIPTION_SELECTORS: &[(&str, Option<&str>)] = &[
    ("meta[name='description']", Some("content")),
    ("meta[property='og:description']", Some("content")),
    ("meta[name='twitter:description']", Some("content")),
];

const GENERIC_URL_SELECTORS: &[(&str, Option<&str>)] = &[
    ("link[rel='canonical']", Some("href")),
    ("meta[property='og:url']", Some("content")),
];

/// One rule-free strategy per field type.
///
/// Strategies must tolerate partial context: content may be asked for before
/// the author exists, and any of `title`, `content`, `excerpt` may be `None`.
pub trait GenericExtractor: Send + Sync {
    fn title(&self, ctx: &FieldContext<'_>) -> Option<String>;
    fn author(&self, ctx: &FieldContext<'_>) -> Option<String>;
    fn date_published(&self, ctx: &FieldContext<'_>) -> Option<String>;
    fn next_page_url(&self, ctx: &FieldContext<'_>) -> Option<String>;
    /// Rendered in `ctx.content_type`; rendering failures propagate.
    fn content(&self, ctx: &FieldContext<'_>) -> Result<Option<String>, ExtractError>;
    fn lead_image_url(&self, ctx: &FieldContext<'_>) -> Option<String>;
    fn excerpt(&self, ctx: &FieldContext<'_>) -> Option<String>;
    fn dek(&self, ctx: &FieldContext<'_>) -> Option<String>;
    fn word_count(&self, ctx: &FieldContext<'_>) -> Option<String>;
    fn direction(&self, ctx: &FieldContext<'_>) -> Option<String>;
    /// The page's canonical URL; the domain is derived from it.
    fn url_and_domain(&self, ctx: &FieldContext<'_>) -> Option<String>;

    /// Dispatches to the strategy for `field`.
    fn extract_field(
        &self,
        field: FieldType,
        ctx: &FieldContext<'_>,
    ) -> Result<Option<String>, ExtractError> {
        Ok(match field {
            FieldType::Title => self.title(ctx),
            FieldType::Author => self.author(ctx),
            FieldType::DatePublished => self.date_published(ctx),
            FieldType::NextPageUrl => self.next_page_url(ctx),
            FieldType::Content => return self.content(ctx),
            FieldType::LeadImageUrl => self.lead_image_url(ctx),
            FieldType::Excerpt => self.excerpt(ctx),
            FieldType::Dek => self.dek(ctx),
            FieldType::WordCount => self.word_count(ctx),
            FieldType::Direction => self.direction(ctx),
            FieldType::UrlAndDomain => self.url_and_domain(ctx),
        })
    }

    /// Extracts a whole document without custom rules.
    fn extract_all(
        &self,
        base: FieldContext<'_>,
        opts: &ExtractOptions,
    ) -> Result<Extraction, ExtractError> {
        if opts.content_only {
            let ctx = base.with_title(opts.extracted_title.as_deref());
            let content = self.content(&ctx)?;
            return Ok(Extraction::ContentOnly { content });
        }
        resolve_in_order(base, |field, ctx| self.extract_field(field, ctx)).map(Extraction::from)
    }
}

/// First non-empty value among `selectors`: attribute when one is named, text otherwise.
fn first_value(doc: &Document, selectors: &[(&str, Option<&str>)]) -> Option<String> {
    selectors.iter().find_map(|(css, attr)| {
        select_doc(doc, css).nodes().iter().find_map(|node| {
            let el = Selection::from(*node);
            let value = match attr {
                Some(attr) => el.attr(attr).map(|v| v.trim().to_string()),
                None => Some(el.text().trim().to_string()),
            };
            value.filter(|v| !v.is_empty())
        })
    })
}

fn is_rtl_char(ch: char) -> bool {
    let code = ch as u32;
    // Hebrew: U+0590..U+05FF, U+FB1D..U+FB4F
    // Arabic: U+0600..U+06FF, U+0750..U+077F, U+08A0..U+08FF, U+FB50..U+FDFF, U+FE70..U+FEFF
    (0x0590..=0x05FF).contains(&code)
        || (0xFB1D..=0xFB4F).contains(&code)
        || (0x0600..=0x06FF).contains(&code)
        || (0x0750..=0x077F).contains(&code)
        || (0x08A0..=0x08FF).contains(&code)
        || (0xFB50..=0xFDFF).contains(&code)
        || (0xFE70..=0xFEFF).contains(&code)
}

/// "rtl" when at least 30% of the letters are Hebrew or Arabic.
fn text_direction(text: &str) -> Option<&'static str> {
    let (mut letters, mut rtl) = (0u32, 0u32);
    for ch in text.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if is_rtl_char(ch) {
            rtl += 1;
        }
    }
    if letters == 0 {
        return None;
    }
    Some(if f64::from(rtl) / f64::from(letters) >= 0.30 {
        "rtl"
    } else {
        "ltr"
    })
}

/// Default rule-free strategies.
#[derive(Debug, Clone, Default)]
pub struct DefaultGenericExtractor {
    cleaners: DefaultCleaners,
}

impl DefaultGenericExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GenericExtractor for DefaultGenericExtractor {
    fn title(&self, ctx: &FieldContext<'_>) -> Option<String> {
        let raw = first_value(ctx.doc, GENERIC_TITLE_SELECTORS)?;
        self.cleaners.title(&raw, ctx)
    }

    fn author(&self, ctx: &FieldContext<'_>) -> Option<String> {
        let raw = first_value(ctx.doc, GENERIC_AUTHOR_SELECTORS)?;
        self.cleaners.author(&raw, ctx)
    }

    fn date_published(&self, ctx: &FieldContext<'_>) -> Option<String> {
        GENERIC_DATE_SELECTORS.iter().find_map(|selector| {
            let raw = first_value(ctx.doc, std::slice::from_ref(selector))?;
            self.cleaners
                .date_published(&raw, ctx, &CleanOptions::default())
        })
    }

    fn next_page_url(&self, ctx: &FieldContext<'_>) -> Option<String> {
        let raw = first_value(ctx.doc, GENERIC_NEXT_PAGE_SELECTORS)?;
        self.cleaners.next_page_url(&raw, ctx)
    }

    fn content(&self, ctx: &FieldContext<'_>) -> Result<Option<String>, ExtractError> {
        let Some(candidate) = find_top_candidate(ctx.doc) else {
            return Ok(None);
        };
        let region_doc = wrap_markup(&candidate.html());
        let region = region_of(&region_doc);
        clean_article(&region, ctx.title.unwrap_or_default());
        if let Some(base) = ctx.url {
            make_links_absolute(&region, base);
        }
        if region.text().trim().is_empty() {
            return Ok(None);
        }
        render(&region, ctx.content_type).map(Some)
    }

    fn lead_image_url(&self, ctx: &FieldContext<'_>) -> Option<String> {
        if let Some(url) = first_value(ctx.doc, GENERIC_IMAGE_SELECTORS)
            .and_then(|raw| self.cleaners.lead_image_url(&raw, ctx))
        {
            return Some(url);
        }
        // First image of the extracted content, then of the page.
        let from_content = ctx.content.and_then(|content| {
            let doc = Document::from(content);
            first_value(&doc, &[("img[src]", Some("src"))])
        });
        from_content
            .or_else(|| first_value(ctx.doc, &[("img[src]", Some("src"))]))
            .and_then(|raw| self.cleaners.lead_image_url(&raw, ctx))
    }

    fn excerpt(&self, ctx: &FieldContext<'_>) -> Option<String> {
        first_value(ctx.doc, GENERIC_DESCRIPTION_SELECTORS)
            .or_else(|| ctx.content.map(str::to_string))
            .and_then(|raw| self.cleaners.excerpt(&raw, ctx))
    }

    /// There is no reliable rule-free signal for a dek.
    fn dek(&self, _ctx: &FieldContext<'_>) -> Option<String> {
        None
    }

    fn word_count(&self, ctx: &FieldContext<'_>) -> Option<String> {
        let content = ctx.content?;
        let text = html_to_text(content);
        Some(text.split_whitespace().count().to_string())
    }

    fn direction(&self, ctx: &FieldContext<'_>) -> Option<String> {
        for css in ["html", "body"] {
            if let Some(dir) = first_value(ctx.doc, &[(css, Some("dir"))]) {
                let dir = dir.to_lowercase();
                if dir == "rtl" || dir == "ltr" {
                    return Some(dir);
                }
            }
        }
        let mut text = ctx.title.unwrap_or_default().to_string();
        if let Some(content) = ctx.content {
            text.push(' ');
            text.push_str(&html_to_text(content));
        }
        Some(text_direction(&text).unwrap_or("ltr").to_string())
    }

    fn url_and_domain(&self, ctx: &FieldContext<'_>) -> Option<String> {
        first_value(ctx.doc, GENERIC_URL_SELECTORS)
            .and_then(|raw| self.cleaners.url(&raw, ctx))
            .or_else(|| ctx.url.map(|u| u.to_string()))
    }
}
