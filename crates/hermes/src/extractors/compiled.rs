// ABOUTME: Pre-compiled CSS selector cache shared by rule validation and matching.
// ABOUTME: Eliminates repeated parsing of rule selectors across fields and documents.

//! Selector caching for efficient repeated DOM queries.
//!
//! Rule selectors are compiled once when a definition is built (which also
//! validates them) and reused for every document the definition runs on.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use dom_query::Matcher;
use once_cell::sync::Lazy;

use crate::error::ExtractError;

/// Thread-safe cache of compiled CSS selectors. Invalid selectors are cached as `None`.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Matcher>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `Some(Matcher)` if the selector is valid, `None` if invalid.
pub fn get_or_compile(css: &str) -> Option<Matcher> {
    {
        let cache = SELECTOR_CACHE
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Matcher::new(css).ok();
    let mut cache = SELECTOR_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    // another thread may have inserted while we compiled
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}

/// Compiles a selector for rule validation, reporting why it is unusable.
pub fn compile(css: &str) -> Result<Matcher, ExtractError> {
    if css.trim().is_empty() {
        return Err(ExtractError::invalid_rule(
            css,
            "compile_selector",
            Some(anyhow::anyhow!("empty selector")),
        ));
    }
    if let Some(matcher) = get_or_compile(css) {
        return Ok(matcher);
    }
    let reason = match Matcher::new(css) {
        Err(e) => format!("{:?}", e),
        Ok(_) => "unparseable selector".to_string(),
    };
    Err(ExtractError::invalid_rule(
        css,
        "compile_selector",
        Some(anyhow::anyhow!(reason)),
    ))
}
