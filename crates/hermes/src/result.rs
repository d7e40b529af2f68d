// ABOUTME: ExtractionResult holding every resolved article field, and the content-only Extraction variant.
// ABOUTME: Includes the markdown summary formatter and presence helpers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::cleaners::parse_date;
use crate::field::{FieldType, FieldValues};

/// The structured article record for one document.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExtractionResult {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub date_published: Option<DateTime<Utc>>,
    pub lead_image_url: Option<String>,
    pub dek: Option<String>,
    pub next_page_url: Option<String>,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub excerpt: Option<String>,
    pub word_count: Option<usize>,
    pub direction: Option<String>,
    /// Values of a definition's extended fields, by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extended: BTreeMap<String, Value>,
}

impl ExtractionResult {
    /// Assembles the typed record from resolved field values.
    ///
    /// `url_and_domain` carries the URL; the domain is its host. A URL,
    /// date or word count that does not parse is dropped.
    pub fn from_values(values: &FieldValues) -> Self {
        let text = |field: FieldType| values.get(field).map(str::to_string);
        let parsed = values
            .get(FieldType::UrlAndDomain)
            .and_then(|u| Url::parse(u.trim()).ok());
        let url = parsed.as_ref().map(Url::to_string);
        let domain = parsed
            .as_ref()
            .and_then(|u| u.host_str().map(str::to_string));

        Self {
            title: text(FieldType::Title),
            content: text(FieldType::Content),
            author: text(FieldType::Author),
            date_published: values
                .get(FieldType::DatePublished)
                .and_then(|d| parse_date(d, None, None)),
            lead_image_url: text(FieldType::LeadImageUrl),
            dek: text(FieldType::Dek),
            next_page_url: text(FieldType::NextPageUrl),
            url,
            domain,
            excerpt: text(FieldType::Excerpt),
            word_count: values
                .get(FieldType::WordCount)
                .and_then(|n| n.trim().parse().ok()),
            direction: text(FieldType::Direction),
            extended: BTreeMap::new(),
        }
    }

    /// Format the result as a markdown document.
    pub fn format_markdown(&self) -> String {
        let mut parts = Vec::new();

        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            parts.push(format!("# {}", title));
        }

        // Metadata line
        let mut meta = Vec::new();
        if let Some(author) = self.author.as_deref().filter(|a| !a.is_empty()) {
            meta.push(format!("By {}", author));
        }
        if let Some(date) = self.date_published {
            meta.push(date.format("%Y-%m-%d").to_string());
        }
        if !meta.is_empty() {
            parts.push(meta.join(" | "));
        }

        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            parts.push(format!("Source: {}", url));
        }

        if let Some(dek) = self.dek.as_deref().filter(|d| !d.is_empty()) {
            parts.push(format!("*{}*", dek));
        }

        if let Some(excerpt) = self.excerpt.as_deref().filter(|e| !e.is_empty()) {
            parts.push(format!("> {}", excerpt));
        }

        if let Some(img) = self.lead_image_url.as_deref().filter(|i| !i.is_empty()) {
            parts.push(format!("![Lead Image]({})", img));
        }

        let content = self.content.as_deref().filter(|c| !c.is_empty());
        if let Some(content) = content {
            if !parts.is_empty() {
                parts.push("---".to_string());
            }
            parts.push(content.to_string());
        }

        parts.join("\n\n")
    }

    /// Returns true if the result has no meaningful content.
    pub fn is_empty(&self) -> bool {
        self.title.as_deref().map_or(true, str::is_empty)
            && self.content.as_deref().map_or(true, str::is_empty)
    }

    /// Returns true if the result has an author.
    pub fn has_author(&self) -> bool {
        self.author.as_ref().map_or(false, |a| !a.is_empty())
    }

    /// Returns true if the result has a published date.
    pub fn has_date(&self) -> bool {
        self.date_published.is_some()
    }

    /// Returns true if the result has a lead image.
    pub fn has_image(&self) -> bool {
        self.lead_image_url
            .as_ref()
            .map_or(false, |u| !u.is_empty())
    }
}

/// What an extraction call returns: the full record, or only the content in
/// content-only mode.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Extraction {
    Full(Box<ExtractionResult>),
    ContentOnly { content: Option<String> },
}

impl Extraction {
    pub fn content(&self) -> Option<&str> {
        match self {
            Extraction::Full(result) => result.content.as_deref(),
            Extraction::ContentOnly { content } => content.as_deref(),
        }
    }

    pub fn as_full(&self) -> Option<&ExtractionResult> {
        match self {
            Extraction::Full(result) => Some(result),
            Extraction::ContentOnly { .. } => None,
        }
    }

    pub fn into_full(self) -> Option<ExtractionResult> {
        match self {
            Extraction::Full(result) => Some(*result),
            Extraction::ContentOnly { .. } => None,
        }
    }
}

impl From<ExtractionResult> for Extraction {
    fn from(result: ExtractionResult) -> Self {
        Extraction::Full(Box::new(result))
    }
}
