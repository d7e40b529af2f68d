// ABOUTME: Parser façade: parses HTML, finds the extractor definition for the page URL and runs extraction.
// ABOUTME: Holds the registry plus the injected generic extractor and cleaners.

use std::sync::Arc;

use url::Url;

use crate::cleaners::FieldCleaner;
use crate::dom::Document;
use crate::error::ExtractError;
use crate::extractors::definition::{ExtractorDefinition, ExtractorRegistry};
use crate::extractors::generic::GenericExtractor;
use crate::extractors::loader::load_builtin_registry;
use crate::extractors::root::RootExtractor;
use crate::options::{ExtractOptions, Options, ParserBuilder};
use crate::result::Extraction;

/// Extracts articles from HTML documents.
///
/// Each call parses its own document, so one `Parser` can serve many threads.
#[derive(Debug, Clone)]
pub struct Parser {
    opts: Options,
    registry: ExtractorRegistry,
    root: RootExtractor,
}

impl Parser {
    /// Create a new ParserBuilder for configuring the parser.
    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    /// Create a parser. Without a registry in `opts` the builtin one is used.
    pub fn new(
        opts: Options,
        generic: Arc<dyn GenericExtractor>,
        cleaner: Arc<dyn FieldCleaner>,
    ) -> Self {
        let registry = match opts.registry.clone() {
            Some(registry) => registry,
            None => load_builtin_registry().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "builtin extractors failed to load");
                ExtractorRegistry::new()
            }),
        };
        Self {
            opts,
            registry,
            root: RootExtractor::new(generic, cleaner),
        }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Per-call options seeded from the parser defaults.
    pub fn extract_options(&self, url: Url) -> ExtractOptions {
        ExtractOptions::new()
            .url(url)
            .content_type(self.opts.content_type)
            .fallback(self.opts.fallback)
    }

    /// Parse `html` fetched from `url` with the parser defaults.
    pub fn parse_html(&self, html: &str, url: &str) -> Result<Extraction, ExtractError> {
        let parsed = parse_url(url)?;
        self.parse_html_with(html, &self.extract_options(parsed))
    }

    /// Parse `html` with explicit per-call options; the definition is looked up
    /// from `opts.url`.
    pub fn parse_html_with(
        &self,
        html: &str,
        opts: &ExtractOptions,
    ) -> Result<Extraction, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::extract(
                opts.url.as_ref().map(Url::as_str).unwrap_or_default(),
                "parse_html",
                Some(anyhow::anyhow!("empty HTML")),
            ));
        }
        let definition = opts.url.as_ref().and_then(|u| self.registry.lookup(u));
        if let Some(def) = &definition {
            tracing::debug!(domain = %def.domain, "using custom extractor");
        }
        let doc = Document::from(html);
        self.root.extract(&doc, definition.as_deref(), opts)
    }

    /// Extract `html` with a specific definition, bypassing the registry.
    pub fn extract_with(
        &self,
        html: &str,
        definition: Option<&ExtractorDefinition>,
        opts: &ExtractOptions,
    ) -> Result<Extraction, ExtractError> {
        let doc = Document::from(html);
        self.root.extract(&doc, definition, opts)
    }
}

impl Default for Parser {
    fn default() -> Self {
        ParserBuilder::new().build()
    }
}

fn parse_url(url: &str) -> Result<Url, ExtractError> {
    if url.is_empty() {
        return Err(ExtractError::invalid_url(url, "parse_html", None));
    }
    let parsed = Url::parse(url).map_err(|e| {
        ExtractError::invalid_url(url, "parse_html", Some(anyhow::Error::new(e)))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ExtractError::invalid_url(
            url,
            "parse_html",
            Some(anyhow::anyhow!("unsupported scheme {}", parsed.scheme())),
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::loader::load_registry_from_str;
    use crate::options::ContentType;

    const RULES: &str = r#"{
        "domain": "example.com",
        "title": { "selectors": ["h1.headline"] },
        "content": { "selectors": ["article"], "transforms": { "h2": "h3" } }
    }"#;

    const PAGE: &str = r#"<html><head><title>Ignored</title></head><body>
        <h1 class="headline">  Breaking News  </h1>
        <article><h2>Section <em>one</em></h2><p>Body paragraph, with words.</p></article>
    </body></html>"#;

    fn parser() -> Parser {
        Parser::builder()
            .registry(load_registry_from_str(RULES).unwrap())
            .build()
    }

    #[test]
    fn rejects_bad_urls() {
        let parser = parser();
        assert!(parser.parse_html(PAGE, "").unwrap_err().is_invalid_url());
        assert!(parser.parse_html(PAGE, "not a url").unwrap_err().is_invalid_url());
        assert!(parser
            .parse_html(PAGE, "ftp://example.com/a")
            .unwrap_err()
            .is_invalid_url());
    }

    #[test]
    fn empty_html_is_an_error() {
        let err = parser().parse_html("  ", "https://example.com/a").unwrap_err();
        assert!(err.is_extract());
    }

    #[test]
    fn uses_definition_for_host_and_base_domain() {
        let parser = parser();
        for url in ["https://example.com/a", "https://www.example.com/a"] {
            let result = parser.parse_html(PAGE, url).unwrap().into_full().unwrap();
            assert_eq!(result.title.as_deref(), Some("Breaking News"));
            let content = result.content.unwrap();
            assert!(content.contains("<h3>Section <em>one</em></h3>"), "{}", content);
            assert!(!content.contains("<h2"), "{}", content);
        }
    }

    #[test]
    fn content_only_text() {
        let parser = Parser::builder()
            .registry(load_registry_from_str(RULES).unwrap())
            .content_type(ContentType::Text)
            .build();
        let url = Url::parse("https://example.com/a").unwrap();
        let opts = parser.extract_options(url).content_only(None);
        let extraction = parser.parse_html_with(PAGE, &opts).unwrap();
        let json = serde_json::to_value(&extraction).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        let text = obj["content"].as_str().unwrap();
        assert!(text.contains("Body paragraph"));
        assert!(!text.contains('<'));
    }
}
