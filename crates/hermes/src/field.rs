// ABOUTME: Field type tags for the extraction result and the static field dependency table.
// ABOUTME: Encodes which already-extracted fields each field may read, and the evaluation order.

//! Field types and their data dependencies.
//!
//! Each extracted field may read values produced by earlier fields (the
//! lead image strategy looks at the extracted content, the dek compares
//! against the excerpt, and so on). Those reads are declared here instead of
//! being implied by the order of calls in the orchestrator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dom::Document;
use crate::options::ContentType;

/// One of the named slots an extractor definition can provide rules for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Title,
    Content,
    Author,
    DatePublished,
    NextPageUrl,
    LeadImageUrl,
    Excerpt,
    Dek,
    WordCount,
    Direction,
    UrlAndDomain,
}

/// How matched DOM is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Text content of a single element, or a single attribute value.
    Text,
    /// A mutated, cleaned and rendered DOM region.
    Html,
}

impl FieldType {
    /// Order in which the orchestrator resolves fields. Every field appears
    /// after all of its dependencies.
    pub const EVALUATION_ORDER: [FieldType; 11] = [
        FieldType::Title,
        FieldType::DatePublished,
        FieldType::Author,
        FieldType::NextPageUrl,
        FieldType::Content,
        FieldType::LeadImageUrl,
        FieldType::Excerpt,
        FieldType::Dek,
        FieldType::WordCount,
        FieldType::Direction,
        FieldType::UrlAndDomain,
    ];

    /// The rule-file key for this field.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Title => "title",
            FieldType::Content => "content",
            FieldType::Author => "author",
            FieldType::DatePublished => "date_published",
            FieldType::NextPageUrl => "next_page_url",
            FieldType::LeadImageUrl => "lead_image_url",
            FieldType::Excerpt => "excerpt",
            FieldType::Dek => "dek",
            FieldType::WordCount => "word_count",
            FieldType::Direction => "direction",
            FieldType::UrlAndDomain => "url_and_domain",
        }
    }

    /// Selection mode used for this field's custom rules.
    pub fn mode(self) -> SelectMode {
        match self {
            FieldType::Content => SelectMode::Html,
            _ => SelectMode::Text,
        }
    }

    /// Fields whose resolved values are handed to this field's custom rules,
    /// cleaner and generic fallback.
    pub fn dependencies(self) -> &'static [FieldType] {
        match self {
            FieldType::Content => &[FieldType::Title],
            FieldType::LeadImageUrl => &[FieldType::Content],
            FieldType::Excerpt => &[FieldType::Content],
            FieldType::Dek => &[FieldType::Content, FieldType::Excerpt],
            FieldType::WordCount => &[FieldType::Content],
            FieldType::Direction => &[FieldType::Title, FieldType::Content],
            _ => &[],
        }
    }

    /// Returns true if this field may read `other`.
    pub fn depends_on(self, other: FieldType) -> bool {
        self.dependencies().contains(&other)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::EVALUATION_ORDER
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown field type: {}", s))
    }
}

/// What one field's rules, cleaner and generic fallback get to see.
#[derive(Clone, Copy)]
pub struct FieldContext<'a> {
    pub doc: &'a Document,
    pub url: Option<&'a Url>,
    pub content_type: ContentType,
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub excerpt: Option<&'a str>,
}

impl<'a> FieldContext<'a> {
    pub fn new(doc: &'a Document, url: Option<&'a Url>, content_type: ContentType) -> Self {
        Self {
            doc,
            url,
            content_type,
            title: None,
            content: None,
            excerpt: None,
        }
    }

    pub fn with_title(mut self, title: Option<&'a str>) -> Self {
        self.title = title;
        self
    }
}

/// Field values resolved so far in one extraction.
#[derive(Debug, Clone, Default)]
pub struct FieldValues(BTreeMap<FieldType, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FieldType) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn insert(&mut self, field: FieldType, value: String) {
        self.0.insert(field, value);
    }

    /// Context for `field`, carrying only the values it declares as dependencies.
    pub fn context_for<'a>(&'a self, field: FieldType, base: FieldContext<'a>) -> FieldContext<'a> {
        let pick = |dep: FieldType| {
            if field.depends_on(dep) {
                self.get(dep)
            } else {
                None
            }
        };
        FieldContext {
            title: pick(FieldType::Title),
            content: pick(FieldType::Content),
            excerpt: pick(FieldType::Excerpt),
            ..base
        }
    }
}
