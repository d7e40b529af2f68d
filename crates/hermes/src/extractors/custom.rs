// ABOUTME: Serde data model for site-specific extraction rule files.
// ABOUTME: Defines configurable selectors, clean lists and ordered transforms per field.

//! Custom extractor definitions as they appear in rule files.
//!
//! These types mirror the JSON shape authors write. They are compiled into an
//! [`ExtractorDefinition`](crate::extractors::definition::ExtractorDefinition)
//! before use, which validates selector shapes against each field's mode.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::field::FieldType;

/// Specifies how to select content from the DOM, by JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorSpec {
    /// A simple CSS selector string, e.g., "h1.title"
    Css(String),
    /// A list of selectors: `["img", "src"]` outside html mode, or a
    /// multi-selector whose members must all match in html mode.
    List(Vec<String>),
}

impl From<&str> for SelectorSpec {
    fn from(css: &str) -> Self {
        SelectorSpec::Css(css.to_string())
    }
}

/// A declarative transformation applied to matched elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeTransform {
    /// Rename the element to a different tag
    Tag { value: String },
    /// Do nothing (placeholder)
    Noop,
    /// Replace <noscript> with <div>, parsing its text as markup
    NoscriptToDiv,
    /// Remove the element but keep its children in place
    Unwrap,
    /// If element has attr `from`, copy value to `to` (overwrites existing `to`)
    MoveAttr { from: String, to: String },
    /// Set attribute to a fixed value
    SetAttr { name: String, value: String },
}

/// A transform entry: either a bare replacement tag name or a declarative transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransformSpec {
    Rename(String),
    Node(NodeTransform),
}

/// Selector-keyed transforms, kept in the order they were declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transforms(Vec<(String, TransformSpec)>);

impl Transforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transform; declaration order is application order.
    pub fn push(&mut self, selector: impl Into<String>, spec: TransformSpec) {
        self.0.push((selector.into(), spec));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TransformSpec)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, TransformSpec)> for Transforms {
    fn from_iter<I: IntoIterator<Item = (K, TransformSpec)>>(iter: I) -> Self {
        Transforms(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl Serialize for Transforms {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

struct TransformsVisitor;

impl<'de> Visitor<'de> for TransformsVisitor {
    type Value = Transforms;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from CSS selector to transform")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((selector, spec)) = map.next_entry::<String, TransformSpec>()? {
            entries.push((selector, spec));
        }
        Ok(Transforms(entries))
    }
}

impl<'de> Deserialize<'de> for Transforms {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TransformsVisitor)
    }
}

fn default_true() -> bool {
    true
}

/// Configuration for extracting a single field from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldExtractor {
    /// List of selectors to try in order
    pub selectors: Vec<SelectorSpec>,
    /// Selectors for elements to remove from the match
    #[serde(default)]
    pub clean: Vec<String>,
    /// Transforms to apply to specific elements within the match
    #[serde(default)]
    pub transforms: Transforms,
    /// Whether to run the field's default cleaner
    #[serde(default = "default_true")]
    pub default_cleaner: bool,
    /// Accept more than one matching element and return every value
    #[serde(default)]
    pub allow_multiple: bool,
    /// Optional format string for date parsing
    #[serde(default)]
    pub format: Option<String>,
    /// Optional timezone for date parsing
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self {
            selectors: Vec::new(),
            clean: Vec::new(),
            transforms: Transforms::new(),
            default_cleaner: true,
            allow_multiple: false,
            format: None,
            timezone: None,
        }
    }
}

/// A field entry in a rule file: a fixed value or a set of rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldConfig {
    /// The field always has this value for the source.
    Literal(String),
    Extractor(FieldExtractor),
}

/// A complete custom extractor configuration for a domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomExtractor {
    /// Primary domain this extractor applies to; `*` marks the generic extractor
    pub domain: String,
    /// Additional domains this extractor supports
    #[serde(default)]
    pub supported_domains: Vec<String>,
    #[serde(default)]
    pub title: Option<FieldConfig>,
    #[serde(default)]
    pub author: Option<FieldConfig>,
    #[serde(default)]
    pub content: Option<FieldConfig>,
    #[serde(default)]
    pub date_published: Option<FieldConfig>,
    #[serde(default)]
    pub lead_image_url: Option<FieldConfig>,
    /// Dek (subheadline) extractor
    #[serde(default)]
    pub dek: Option<FieldConfig>,
    /// Next page URL extractor for paginated content
    #[serde(default)]
    pub next_page_url: Option<FieldConfig>,
    #[serde(default)]
    pub excerpt: Option<FieldConfig>,
    #[serde(default)]
    pub word_count: Option<FieldConfig>,
    #[serde(default)]
    pub direction: Option<FieldConfig>,
    #[serde(default)]
    pub url_and_domain: Option<FieldConfig>,
    /// Additional named fields
    #[serde(default)]
    pub extend: BTreeMap<String, FieldExtractor>,
}

impl CustomExtractor {
    /// Returns the configured entry for a field, if any.
    pub fn field(&self, field: FieldType) -> Option<&FieldConfig> {
        match field {
            FieldType::Title => self.title.as_ref(),
            FieldType::Content => self.content.as_ref(),
            FieldType::Author => self.author.as_ref(),
            FieldType::DatePublished => self.date_published.as_ref(),
            FieldType::NextPageUrl => self.next_page_url.as_ref(),
            FieldType::LeadImageUrl => self.lead_image_url.as_ref(),
            FieldType::Excerpt => self.excerpt.as_ref(),
            FieldType::Dek => self.dek.as_ref(),
            FieldType::WordCount => self.word_count.as_ref(),
            FieldType::Direction => self.direction.as_ref(),
            FieldType::UrlAndDomain => self.url_and_domain.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"{
        "domain": "example.com",
        "supported_domains": ["www.example.com"],
        "title": { "selectors": ["h1.title", ["meta[property='og:title']", "content"]] },
        "author": "Staff Reporter",
        "content": {
            "selectors": [["article .lede", "article .body"], "article"],
            "clean": [".ads", ".social-share"],
            "transforms": {
                "h2": "h3",
                "noscript": { "type": "noscript_to_div" },
                "img[data-src]": { "type": "move_attr", "from": "data-src", "to": "src" },
                "a.button": { "type": "unwrap" }
            },
            "default_cleaner": false
        },
        "extend": {
            "tags": { "selectors": [".tag"], "allow_multiple": true }
        }
    }"#;

    #[test]
    fn parses_mercury_style_rules() {
        let ext: CustomExtractor = serde_json::from_str(RULES).unwrap();
        assert_eq!(ext.domain, "example.com");
        assert_eq!(ext.supported_domains, vec!["www.example.com"]);
        assert_eq!(
            ext.author,
            Some(FieldConfig::Literal("Staff Reporter".to_string()))
        );

        let Some(FieldConfig::Extractor(title)) = ext.title else {
            panic!("title should be an extractor");
        };
        assert_eq!(title.selectors.len(), 2);
        assert_eq!(title.selectors[0], SelectorSpec::Css("h1.title".to_string()));
        assert!(title.default_cleaner, "default_cleaner defaults to true");

        let Some(FieldConfig::Extractor(content)) = ext.content else {
            panic!("content should be an extractor");
        };
        assert!(!content.default_cleaner);
        assert_eq!(content.clean, vec![".ads", ".social-share"]);
        assert!(ext.extend["tags"].allow_multiple);
    }

    #[test]
    fn transforms_keep_declaration_order() {
        let ext: CustomExtractor = serde_json::from_str(RULES).unwrap();
        let Some(FieldConfig::Extractor(content)) = ext.content else {
            panic!("content should be an extractor");
        };
        let keys: Vec<&str> = content.transforms.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["h2", "noscript", "img[data-src]", "a.button"]);

        let specs: Vec<&TransformSpec> = content.transforms.iter().map(|(_, v)| v).collect();
        assert_eq!(specs[0], &TransformSpec::Rename("h3".to_string()));
        assert_eq!(specs[1], &TransformSpec::Node(NodeTransform::NoscriptToDiv));
        assert_eq!(
            specs[2],
            &TransformSpec::Node(NodeTransform::MoveAttr {
                from: "data-src".to_string(),
                to: "src".to_string(),
            })
        );
    }

    #[test]
    fn serde_round_trip_preserves_transform_order() {
        let ext: CustomExtractor = serde_json::from_str(RULES).unwrap();
        let json = serde_json::to_string(&ext).unwrap();
        let parsed: CustomExtractor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ext);
    }

    #[test]
    fn unknown_rule_keys_are_rejected() {
        let json = r#"{ "domain": "x.com", "title": { "selector": ["h1"] } }"#;
        assert!(serde_json::from_str::<CustomExtractor>(json).is_err());
    }

    #[test]
    fn field_accessor_covers_every_field() {
        let ext = CustomExtractor {
            domain: "x.com".to_string(),
            word_count: Some(FieldConfig::Literal("10".to_string())),
            ..Default::default()
        };
        assert!(ext.field(FieldType::WordCount).is_some());
        assert!(ext.field(FieldType::Title).is_none());
    }

    #[test]
    fn field_extractor_default_enables_cleaner() {
        let fe = FieldExtractor::default();
        assert!(fe.default_cleaner);
        assert!(!fe.allow_multiple);
        assert!(fe.transforms.is_empty());
    }
}
