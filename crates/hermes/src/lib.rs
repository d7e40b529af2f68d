// ABOUTME: Main library entry point for the Hermes article extractor.
// ABOUTME: Re-exports the public API: Parser, ParserBuilder, definitions, results, options and errors.

//! Hermes - rule-driven article extraction from HTML documents.
//!
//! Per-site rule sets pick fields out of a page with ordered CSS selectors;
//! anything they do not cover falls back to rule-free generic strategies.
//! Fields are resolved in dependency order, so strategies for the lead
//! image, excerpt or word count can read the already-extracted content.
//!
//! # Example
//!
//! ```no_run
//! use hermes_extract::{ExtractError, Parser};
//!
//! fn main() -> Result<(), ExtractError> {
//!     let parser = Parser::builder().build();
//!     let html = std::fs::read_to_string("article.html")
//!         .map_err(|e| ExtractError::io("article.html", "read", e))?;
//!     let extraction = parser.parse_html(&html, "https://example.com/article")?;
//!     if let Some(result) = extraction.as_full() {
//!         println!("{}", result.format_markdown());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cleaners;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod field;
pub mod formats;
pub mod options;
pub mod parser;
pub mod result;

pub use crate::cleaners::{DefaultCleaners, FieldCleaner};
pub use crate::error::{ErrorCode, ExtractError};
pub use crate::extractors::custom::{
    CustomExtractor, FieldConfig, FieldExtractor, NodeTransform, SelectorSpec, TransformSpec,
};
pub use crate::extractors::definition::{
    ExtractorDefinition, ExtractorRegistry, FieldRules, FieldSpec, Selector, Transform,
};
pub use crate::extractors::generic::{DefaultGenericExtractor, GenericExtractor};
pub use crate::extractors::loader::{
    load_builtin_registry, load_registry_from_path, load_registry_from_str,
};
pub use crate::extractors::root::RootExtractor;
pub use crate::field::{FieldContext, FieldType};
pub use crate::options::{ContentType, ExtractOptions, Options, ParserBuilder};
pub use crate::parser::Parser;
pub use crate::result::{Extraction, ExtractionResult};
