// ABOUTME: Loads extractor definitions from JSON rule files into an ExtractorRegistry.
// ABOUTME: Provides the embedded builtin registry plus loaders for strings and files on disk.

//! Custom extractor registry loader.
//!
//! A rule file holds either a single extractor object or an array of them.
//! Every entry is validated while loading, so a registry never holds a
//! definition with malformed selectors.

use std::path::Path;

use crate::error::ExtractError;
use crate::extractors::custom::CustomExtractor;
use crate::extractors::definition::{ExtractorDefinition, ExtractorRegistry};

/// Embedded JSON containing the builtin custom extractors.
const BUILTIN_EXTRACTORS_JSON: &str = include_str!("../../data/custom_extractors.json");

fn parse_error(e: serde_json::Error) -> ExtractError {
    ExtractError::invalid_rule("rule file", "parse_rules", Some(anyhow::Error::new(e)))
}

/// Parses and validates every extractor in `json`.
pub fn load_definitions_from_str(json: &str) -> Result<Vec<ExtractorDefinition>, ExtractError> {
    let extractors: Vec<CustomExtractor> = if json.trim_start().starts_with('[') {
        serde_json::from_str(json).map_err(parse_error)?
    } else {
        vec![serde_json::from_str(json).map_err(parse_error)?]
    };
    extractors
        .iter()
        .map(ExtractorDefinition::try_from)
        .collect()
}

/// Builds a registry from the extractors in `json`.
pub fn load_registry_from_str(json: &str) -> Result<ExtractorRegistry, ExtractError> {
    let mut registry = ExtractorRegistry::new();
    for definition in load_definitions_from_str(json)? {
        tracing::debug!(domain = %definition.domain, "registered extractor");
        registry.register(definition);
    }
    Ok(registry)
}

/// Builds a registry from a rule file on disk.
pub fn load_registry_from_path(path: impl AsRef<Path>) -> Result<ExtractorRegistry, ExtractError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .map_err(|e| ExtractError::io(path.display().to_string(), "read_rules", e))?;
    load_registry_from_str(&json)
}

/// Loads the builtin extractor registry from embedded JSON.
pub fn load_builtin_registry() -> Result<ExtractorRegistry, ExtractError> {
    load_registry_from_str(BUILTIN_EXTRACTORS_JSON)
}
