// ABOUTME: Configuration for the extractor: ContentType, parser Options, per-call ExtractOptions and ParserBuilder.
// ABOUTME: ParserBuilder provides a fluent API for constructing Parser instances with injected strategies.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::cleaners::{DefaultCleaners, FieldCleaner};
use crate::extractors::definition::ExtractorRegistry;
use crate::extractors::generic::{DefaultGenericExtractor, GenericExtractor};
use crate::parser::Parser;

/// The content type format for rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Html,
    Markdown,
    Text,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Html => "html",
            ContentType::Markdown => "markdown",
            ContentType::Text => "text",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for ContentType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => ContentType::Markdown,
            "text" | "txt" => ContentType::Text,
            _ => ContentType::Html,
        }
    }
}

/// Parser-wide defaults.
#[derive(Debug, Clone)]
pub struct Options {
    pub content_type: ContentType,
    pub fallback: bool,
    pub registry: Option<ExtractorRegistry>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            content_type: ContentType::Html,
            fallback: true,
            registry: None,
        }
    }
}

/// Options for a single extraction call.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Address of the page; used for relative URL resolution and the url/domain fields.
    pub url: Option<Url>,
    pub content_type: ContentType,
    /// Resolve only `content`.
    pub content_only: bool,
    /// Use the generic extractor when a custom rule yields nothing.
    pub fallback: bool,
    /// Title already known to the caller, used as context in content-only mode.
    pub extracted_title: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            url: None,
            content_type: ContentType::Html,
            content_only: false,
            fallback: true,
            extracted_title: None,
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn content_only(mut self, title: Option<String>) -> Self {
        self.content_only = true;
        self.extracted_title = title;
        self
    }

    pub fn fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }
}

/// Builder for constructing Parser instances with custom configuration.
#[derive(Clone)]
pub struct ParserBuilder {
    opts: Options,
    generic: Option<Arc<dyn GenericExtractor>>,
    cleaner: Option<Arc<dyn FieldCleaner>>,
}

impl ParserBuilder {
    /// Create a new ParserBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
            generic: None,
            cleaner: None,
        }
    }

    /// Set the content type for rendered content.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.opts.content_type = content_type;
        self
    }

    /// Enable or disable generic fallback for fields whose rules yield nothing.
    pub fn fallback(mut self, enabled: bool) -> Self {
        self.opts.fallback = enabled;
        self
    }

    /// Set a custom extractor registry.
    pub fn registry(mut self, reg: ExtractorRegistry) -> Self {
        self.opts.registry = Some(reg);
        self
    }

    /// Replace the rule-free fallback strategy.
    pub fn generic_extractor(mut self, generic: Arc<dyn GenericExtractor>) -> Self {
        self.generic = Some(generic);
        self
    }

    /// Replace the per-field cleaners.
    pub fn cleaner(mut self, cleaner: Arc<dyn FieldCleaner>) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Build the Parser with the configured options.
    pub fn build(self) -> Parser {
        let cleaner: Arc<dyn FieldCleaner> = match self.cleaner {
            Some(cleaner) => cleaner,
            None => Arc::new(DefaultCleaners),
        };
        let generic: Arc<dyn GenericExtractor> = match self.generic {
            Some(generic) => generic,
            None => Arc::new(DefaultGenericExtractor::new()),
        };
        Parser::new(self.opts, generic, cleaner)
    }
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_parses_aliases() {
        assert_eq!(ContentType::from("md"), ContentType::Markdown);
        assert_eq!(ContentType::from("TEXT"), ContentType::Text);
        assert_eq!(ContentType::from("anything"), ContentType::Html);
        assert_eq!(ContentType::Markdown.to_string(), "markdown");
    }

    #[test]
    fn extract_options_default_to_fallback() {
        let opts = ExtractOptions::default();
        assert!(opts.fallback);
        assert!(!opts.content_only);
        assert_eq!(opts.content_type, ContentType::Html);
    }

    #[test]
    fn content_only_records_title() {
        let opts = ExtractOptions::new()
            .content_type(ContentType::Text)
            .content_only(Some("Known".to_string()));
        assert!(opts.content_only);
        assert_eq!(opts.extracted_title.as_deref(), Some("Known"));
    }

    #[test]
    fn builder_applies_options() {
        let parser = ParserBuilder::new()
            .content_type(ContentType::Markdown)
            .fallback(false)
            .build();
        assert_eq!(parser.options().content_type, ContentType::Markdown);
        assert!(!parser.options().fallback);
    }
}
