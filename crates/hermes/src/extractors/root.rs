// ABOUTME: Root orchestrator: resolves every field in dependency order from custom rules,
// ABOUTME: falling back to the generic extractor, and assembles the ExtractionResult.

//! Root extraction.
//!
//! For each field, in [`FieldType::EVALUATION_ORDER`]:
//!
//! 1. the definition's rules (or literal) are resolved against the document;
//! 2. an absent or blank value, or one that does not parse as the field's
//!    type, falls back to the generic extractor when fallback is enabled;
//! 3. the value is recorded so later fields can read it through their
//!    declared dependencies.
//!
//! The wildcard definition skips this loop and hands the document to
//! [`GenericExtractor::extract_all`].

use std::sync::Arc;

use chrono::SecondsFormat;
use url::Url;

use crate::cleaners::{parse_date, resolve_url, FieldCleaner};
use crate::dom::Document;
use crate::error::ExtractError;
use crate::extractors::definition::ExtractorDefinition;
use crate::extractors::generic::GenericExtractor;
use crate::extractors::select::{select_extended, select_field};
use crate::field::{FieldContext, FieldType, FieldValues};
use crate::options::ExtractOptions;
use crate::result::{Extraction, ExtractionResult};

/// Resolves every field in evaluation order with `resolve`, giving each call
/// a context that carries the field's dependencies.
///
/// Blank values are treated as absent.
pub(crate) fn resolve_in_order<F>(
    base: FieldContext<'_>,
    mut resolve: F,
) -> Result<ExtractionResult, ExtractError>
where
    F: FnMut(FieldType, &FieldContext<'_>) -> Result<Option<String>, ExtractError>,
{
    let mut values = FieldValues::new();
    for field in FieldType::EVALUATION_ORDER {
        let value = {
            let ctx = values.context_for(field, base);
            resolve(field, &ctx)?
        };
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            values.insert(field, value);
        }
    }
    Ok(ExtractionResult::from_values(&values))
}

/// `value` in the form the result stores it, or `None` when it is blank or
/// does not parse as the field's type.
///
/// Dates are stored as RFC 3339 and `url_and_domain` is resolved against the
/// page URL.
fn usable_value(field: FieldType, value: String, url: Option<&Url>) -> Option<String> {
    if value.trim().is_empty() {
        return None;
    }
    match field {
        FieldType::DatePublished => parse_date(&value, None, None)
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
        FieldType::WordCount => value.trim().parse::<usize>().ok().map(|n| n.to_string()),
        FieldType::UrlAndDomain => resolve_url(&value, url).map(String::from),
        _ => Some(value),
    }
}

/// Coordinates custom rules, cleaners and the generic fallback for one document.
#[derive(Clone)]
pub struct RootExtractor {
    generic: Arc<dyn GenericExtractor>,
    cleaner: Arc<dyn FieldCleaner>,
}

impl RootExtractor {
    pub fn new(generic: Arc<dyn GenericExtractor>, cleaner: Arc<dyn FieldCleaner>) -> Self {
        Self { generic, cleaner }
    }

    /// Custom value for `field`, then the generic one when allowed.
    fn resolve_field(
        &self,
        doc: &Document,
        definition: Option<&ExtractorDefinition>,
        field: FieldType,
        ctx: &FieldContext<'_>,
        fallback: bool,
    ) -> Result<Option<String>, ExtractError> {
        let spec = definition.and_then(|def| def.field(field));
        let custom = select_field(doc, field, spec, ctx, self.cleaner.as_ref())?;
        let found = custom.is_some();
        let custom = custom.and_then(|v| usable_value(field, v, ctx.url));
        if custom.is_some() || !fallback {
            return Ok(custom);
        }
        if found {
            tracing::debug!(field = %field, "custom value unusable, using generic extractor");
        } else if spec.is_some() {
            tracing::debug!(field = %field, "custom rules found nothing, using generic extractor");
        }
        Ok(self
            .generic
            .extract_field(field, ctx)?
            .and_then(|v| usable_value(field, v, ctx.url)))
    }

    /// Extracts `doc` with `definition`, or with the generic extractor alone
    /// when there is none.
    pub fn extract(
        &self,
        doc: &Document,
        definition: Option<&ExtractorDefinition>,
        opts: &ExtractOptions,
    ) -> Result<Extraction, ExtractError> {
        let base = FieldContext::new(doc, opts.url.as_ref(), opts.content_type);

        if definition.map_or(false, ExtractorDefinition::is_wildcard) {
            tracing::debug!("wildcard definition, delegating to generic extractor");
            return self.generic.extract_all(base, opts);
        }

        if opts.content_only {
            let ctx = base.with_title(opts.extracted_title.as_deref());
            let content =
                self.resolve_field(doc, definition, FieldType::Content, &ctx, opts.fallback)?;
            return Ok(Extraction::ContentOnly { content });
        }

        let mut result = resolve_in_order(base, |field, ctx| {
            self.resolve_field(doc, definition, field, ctx, opts.fallback)
        })?;

        if let Some(def) = definition {
            for (name, rules) in def.extended_fields() {
                if let Some(value) = select_extended(doc, name, rules) {
                    result.extended.insert(name.to_string(), value);
                }
            }
        }

        Ok(Extraction::from(result))
    }
}

impl std::fmt::Debug for RootExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootExtractor").finish_non_exhaustive()
    }
}
