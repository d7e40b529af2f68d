// ABOUTME: Per-field normalizers applied to extracted values: titles, authors, dates, URLs and content regions.
// ABOUTME: FieldCleaner is the injectable interface; DefaultCleaners is the stock implementation.

//! Field cleaners.
//!
//! Every field has one normalizer. Text normalizers receive the trimmed raw
//! value and return `None` when nothing usable is left; the content
//! normalizer works on the matched region in place. Cleaners never fail.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::dom::cleaners::{clean_article, make_links_absolute};
use crate::dom::{normalize_spaces, Selection};
use crate::field::{FieldContext, FieldType};
use crate::formats::{extract_excerpt, html_to_text};

static CLEAN_AUTHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(posted |written )?by\b\s*:?\s*(.*)$").unwrap());
static TITLE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+[|\-–—:]\s+").unwrap());
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d,.]*").unwrap());

const DEK_MIN_LEN: usize = 5;
const DEK_MAX_LEN: usize = 1000;

/// Rule-level options for cleaners, merged from the matching field rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions<'a> {
    /// strftime pattern for the date cleaner.
    pub format: Option<&'a str>,
    /// `UTC` or a fixed offset such as `+05:30`.
    pub timezone: Option<&'a str>,
}

/// One normalizer per field type.
pub trait FieldCleaner: Send + Sync {
    fn title(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String>;
    fn author(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String>;
    fn date_published(
        &self,
        value: &str,
        ctx: &FieldContext<'_>,
        opts: &CleanOptions<'_>,
    ) -> Option<String>;
    fn dek(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String>;
    fn excerpt(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String>;
    fn lead_image_url(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String>;
    fn next_page_url(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String>;
    fn word_count(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String>;
    fn direction(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String>;
    fn url(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String>;

    /// Cleans a content region in place. `default_cleaner` is the rule's flag.
    fn content(&self, region: &Selection<'_>, ctx: &FieldContext<'_>, default_cleaner: bool);

    /// Dispatches a text value to the normalizer for `field`.
    fn clean_text(
        &self,
        field: FieldType,
        value: &str,
        ctx: &FieldContext<'_>,
        opts: &CleanOptions<'_>,
    ) -> Option<String> {
        match field {
            FieldType::Title => self.title(value, ctx),
            FieldType::Author => self.author(value, ctx),
            FieldType::DatePublished => self.date_published(value, ctx, opts),
            FieldType::Dek => self.dek(value, ctx),
            FieldType::Excerpt => self.excerpt(value, ctx),
            FieldType::LeadImageUrl => self.lead_image_url(value, ctx),
            FieldType::NextPageUrl => self.next_page_url(value, ctx),
            FieldType::WordCount => self.word_count(value, ctx),
            FieldType::Direction => self.direction(value, ctx),
            FieldType::UrlAndDomain => self.url(value, ctx),
            FieldType::Content => non_empty(normalize_spaces(value)),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn strip_tags(value: &str) -> String {
    if value.contains('<') {
        normalize_spaces(&html_to_text(value))
    } else {
        normalize_spaces(value)
    }
}

/// Resolves `value` against the page URL and keeps only http(s) results.
pub fn resolve_url(value: &str, base: Option<&Url>) -> Option<Url> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let url = match base {
        Some(base) => base.join(value).ok()?,
        None => Url::parse(value).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let tz = tz.trim();
    if tz.eq_ignore_ascii_case("utc") || tz.eq_ignore_ascii_case("gmt") || tz == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match tz.chars().next()? {
        '+' => (1, &tz[1..]),
        '-' => (-1, &tz[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn from_local(naive: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a date string, optionally with an explicit strftime `format` and a
/// `timezone` for values that carry none. Values without a zone are read as UTC.
pub fn parse_date(s: &str, format: Option<&str>, timezone: Option<&str>) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let offset = match timezone {
        Some(tz) => parse_offset(tz).or_else(|| {
            tracing::warn!(timezone = %tz, "unsupported timezone, reading date as UTC");
            None
        }),
        None => None,
    }
    .or_else(|| FixedOffset::east_opt(0))?;

    if let Some(fmt) = format {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return from_local(naive, offset);
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return from_local(date.and_hms_opt(0, 0, 0)?, offset);
        }
    }

    // Fast path: RFC3339/ISO8601
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Common loose date-only formats, read at midnight so the day never shifts.
    const LOOSE_PATTERNS: &[&str] = &[
        "%b %e, %Y", // Jan 5, 2024
        "%e %b %Y",  // 5 Jan 2024
        "%b %d, %Y", // Jan 05, 2024
        "%d %b %Y",  // 05 Jan 2024
        "%B %e, %Y", // January 5, 2024
        "%e %B %Y",  // 5 January 2024
        "%B %d, %Y", // January 05, 2024
        "%d %B %Y",  // 05 January 2024
    ];
    for pat in LOOSE_PATTERNS {
        if let Ok(date) = NaiveDate::parse_from_str(s, pat) {
            return from_local(date.and_hms_opt(0, 0, 0)?, offset);
        }
    }

    dateparser::parse_with_timezone(s, &offset)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Stock normalizers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCleaners;

impl DefaultCleaners {
    fn first_words(text: &str, n: usize) -> String {
        text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
    }

    /// Drops a trailing or leading "| Site Name" segment when it names the host.
    fn strip_site_name(title: &str, url: Option<&Url>) -> String {
        let Some(host) = url.and_then(Url::host_str) else {
            return title.to_string();
        };
        let host = host.to_lowercase().replace('-', "");
        let names_host = |segment: &str| {
            let squashed: String = segment
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            squashed.len() >= 3 && host.contains(&squashed)
        };

        let parts: Vec<&str> = TITLE_SPLIT_RE.split(title).collect();
        if parts.len() < 2 {
            return title.to_string();
        }
        if names_host(parts[parts.len() - 1]) {
            if let Some(sep) = TITLE_SPLIT_RE.find_iter(title).last() {
                return title[..sep.start()].trim().to_string();
            }
        }
        if names_host(parts[0]) {
            if let Some(sep) = TITLE_SPLIT_RE.find(title) {
                return title[sep.end()..].trim().to_string();
            }
        }
        title.to_string()
    }
}

impl FieldCleaner for DefaultCleaners {
    fn title(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String> {
        let title = strip_tags(value);
        non_empty(Self::strip_site_name(&title, ctx.url))
    }

    fn author(&self, value: &str, _ctx: &FieldContext<'_>) -> Option<String> {
        let text = strip_tags(value);
        let author = match CLEAN_AUTHOR_RE.captures(&text) {
            Some(caps) => caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
            None => text,
        };
        non_empty(author)
    }

    fn date_published(
        &self,
        value: &str,
        _ctx: &FieldContext<'_>,
        opts: &CleanOptions<'_>,
    ) -> Option<String> {
        parse_date(value, opts.format, opts.timezone)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    fn dek(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String> {
        let dek = strip_tags(value);
        if dek.len() < DEK_MIN_LEN || dek.len() > DEK_MAX_LEN {
            return None;
        }
        if dek.starts_with("http://") || dek.starts_with("https://") {
            return None;
        }
        if let Some(excerpt) = ctx.excerpt {
            let words = dek.split_whitespace().count().min(10);
            if Self::first_words(excerpt, words) == Self::first_words(&dek, words) {
                return None;
            }
        }
        Some(dek)
    }

    fn excerpt(&self, value: &str, _ctx: &FieldContext<'_>) -> Option<String> {
        extract_excerpt(value).map(|e| normalize_spaces(&e))
    }

    fn lead_image_url(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String> {
        resolve_url(value, ctx.url).map(String::from)
    }

    fn next_page_url(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String> {
        let next = resolve_url(value, ctx.url)?;
        if ctx.url.is_some_and(|page| page.as_str() == next.as_str()) {
            return None;
        }
        Some(next.into())
    }

    fn word_count(&self, value: &str, _ctx: &FieldContext<'_>) -> Option<String> {
        let digits: String = DIGITS_RE
            .find(value)?
            .as_str()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        digits.parse::<usize>().ok().map(|n| n.to_string())
    }

    fn direction(&self, value: &str, _ctx: &FieldContext<'_>) -> Option<String> {
        let dir = value.trim().to_lowercase();
        matches!(dir.as_str(), "ltr" | "rtl").then_some(dir)
    }

    fn url(&self, value: &str, ctx: &FieldContext<'_>) -> Option<String> {
        resolve_url(value, ctx.url).map(String::from)
    }

    fn content(&self, region: &Selection<'_>, ctx: &FieldContext<'_>, default_cleaner: bool) {
        if default_cleaner {
            clean_article(region, ctx.title.unwrap_or_default());
        }
        if let Some(base) = ctx.url {
            make_links_absolute(region, base);
        }
    }
}
