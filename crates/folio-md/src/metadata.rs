//! Post metadata inferred from the file name and the markdown body.
//!
//! Every derivation has a total fallback, so extraction never fails: a
//! missing heading falls back to a title built from the file name and then
//! to a timestamp, a missing or broken date falls back to the file name and
//! then to the current time.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::clock::Clock;
use crate::date::{date_from_file_name, parse_date, to_iso};

/// Excerpt used when a post has no body paragraph ("more content coming soon").
pub const DEFAULT_EXCERPT_PLACEHOLDER: &str = "敬请期待更多内容。";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("Invalid title regex"));

/// Metadata derived for a single post.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// File name without its `.md` extension
    pub slug: String,

    /// Display title (never empty)
    pub title: String,

    /// Publication instant
    pub published_at: DateTime<Utc>,

    /// First body paragraph, or the placeholder
    pub excerpt: String,
}

/// Derive all metadata for a post.
pub fn extract_metadata(
    file_name: &str,
    content: &str,
    clock: &dyn Clock,
    excerpt_placeholder: &str,
) -> Metadata {
    let slug = derive_slug(file_name);
    let title = extract_title(content)
        .or_else(|| title_from_slug(&slug))
        .unwrap_or_else(|| {
            tracing::debug!("No title found for \"{}\", using timestamp", file_name);
            to_iso(&clock.now())
        });
    let published_at = derive_published_at(file_name, content, clock);
    let excerpt =
        extract_excerpt(content).unwrap_or_else(|| excerpt_placeholder.to_string());

    Metadata {
        slug,
        title,
        published_at,
        excerpt,
    }
}

/// Strip a trailing `.md` extension, ignoring case.
pub fn derive_slug(file_name: &str) -> String {
    let cut = file_name.len().saturating_sub(3);
    match file_name.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(".md") => file_name[..cut].to_string(),
        _ => file_name.to_string(),
    }
}

/// Text of the first level-1 heading.
pub fn extract_title(content: &str) -> Option<String> {
    TITLE_RE
        .captures(content)
        .map(|caps| caps[1].trim().to_string())
}

/// Build a title from a slug such as `2024-03-15-hello-world`.
///
/// A leading date is dropped and the remaining dash/underscore separated
/// words are capitalized. A slug made only of a date keeps its digits, with
/// separators turned into spaces.
pub fn title_from_slug(slug: &str) -> Option<String> {
    static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^\d{4}([-_]?\d{2})?([-_]?\d{2})?[-_]?").expect("Invalid date prefix regex")
    });
    static SEPARATORS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[-_]+").expect("Invalid separator regex"));

    let rest = DATE_PREFIX.replace(slug, "");
    let words: Vec<String> = SEPARATORS
        .split(&rest)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect();

    if !words.is_empty() {
        return Some(words.join(" "));
    }

    let cleaned = SEPARATORS.replace_all(slug, " ");
    (!cleaned.is_empty()).then(|| cleaned.into_owned())
}

/// Publication date from a `date:` line, the file name, or the clock.
pub fn derive_published_at(file_name: &str, content: &str, clock: &dyn Clock) -> DateTime<Utc> {
    static DATE_LINE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?im)^date:[ \t]*(.+)$").expect("Invalid date line regex"));

    if let Some(caps) = DATE_LINE.captures(content) {
        let value = caps[1].trim();
        match parse_date(value) {
            Some(date) => return date,
            None => tracing::debug!("Ignoring unparseable date \"{}\" in {}", value, file_name),
        }
    }

    date_from_file_name(file_name).unwrap_or_else(|| clock.now())
}

/// First non-empty paragraph of the body, with the title heading removed
/// and line breaks folded into spaces.
pub fn extract_excerpt(content: &str) -> Option<String> {
    static SECTION_BREAK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{2,}").expect("Invalid section regex"));

    let body = TITLE_RE.replace(content, "");
    SECTION_BREAK
        .split(&body)
        .map(|section| section.replace('\n', " ").trim().to_string())
        .find(|section| !section.is_empty())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
