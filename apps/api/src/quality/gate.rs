//! Quality gate: accept/reject decisions over generated text.
//!
//! Confidence values are fixed policy constants, not statistics. The only
//! requirement on them is the ordering: AI-accepted > fallback > rule-based.

use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::quality::copy_detector::is_just_copy;
use crate::quality::normalizer::{has_author_prefix, remove_author_prefix};

pub const AI_TITLE_CONFIDENCE: f32 = 0.95;
pub const STRICT_VALID_TITLE_CONFIDENCE: f32 = 0.8;
pub const FALLBACK_TITLE_CONFIDENCE: f32 = 0.6;

pub const AI_SUMMARY_QUALITY: f32 = 0.9;
pub const FALLBACK_SUMMARY_QUALITY: f32 = 0.3;

pub const AI_TAG_CONFIDENCE: f32 = 0.85;
pub const FALLBACK_TAG_CONFIDENCE: f32 = 0.3;

/// Accepted length of an LLM-generated title.
pub const AI_TITLE_CHARS: RangeInclusive<usize> = 10..=100;
/// Accepted length on the strict validation path.
pub const STRICT_TITLE_CHARS: RangeInclusive<usize> = 20..=100;
/// Accepted length of an LLM-generated summary.
pub const SUMMARY_CHARS: RangeInclusive<usize> = 50..=500;

const GENERIC_TITLES: &[&str] = &[
    "instagram post",
    "twitter post",
    "reddit post",
    "tweet",
    "post",
    "photo",
    "video",
    "image",
    "reel",
    "untitled",
    "no title",
];

static HTML_ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)&(?:#\d+|#x[0-9a-f]+|[a-z]+);").expect("valid html entity regex")
});

/// Why a candidate was turned down.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct Rejection(pub String);

/// A problem found by strict title validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleIssue {
    Empty,
    AuthorPrefix,
    TooShort,
    TooLong,
    GenericTitle,
    HtmlEntities,
}

impl TitleIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleIssue::Empty => "empty",
            TitleIssue::AuthorPrefix => "author_prefix",
            TitleIssue::TooShort => "too_short",
            TitleIssue::TooLong => "too_long",
            TitleIssue::GenericTitle => "generic_title",
            TitleIssue::HtmlEntities => "html_entities",
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cleans an LLM title (whitespace, wrapping quotes, author prefix) and checks its length.
pub fn gate_ai_title(candidate: &str, author: &str) -> Result<String, Rejection> {
    let unquoted = candidate.trim().trim_matches(|c: char| c == '"' || c == '\'');
    let title = remove_author_prefix(unquoted, author).trim();

    if title.is_empty() {
        return Err(Rejection("title is empty after normalization".to_string()));
    }

    let len = char_len(title);
    if !AI_TITLE_CHARS.contains(&len) {
        return Err(Rejection(format!(
            "title length {len} outside {}..={}",
            AI_TITLE_CHARS.start(),
            AI_TITLE_CHARS.end()
        )));
    }

    Ok(title.to_string())
}

/// Accepts an LLM summary unless it copies the source or has the wrong length.
pub fn gate_summary(original: &str, candidate: &str) -> Result<String, Rejection> {
    let summary = candidate.trim();

    if is_just_copy(original, summary) {
        return Err(Rejection("summary copies the source content".to_string()));
    }

    let len = char_len(summary);
    if !SUMMARY_CHARS.contains(&len) {
        return Err(Rejection(format!(
            "summary length {len} outside {}..={}",
            SUMMARY_CHARS.start(),
            SUMMARY_CHARS.end()
        )));
    }

    Ok(summary.to_string())
}

/// Runs every strict check against `title`. An empty result means it is valid.
pub fn strict_title_issues(title: &str, author: &str) -> Vec<TitleIssue> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return vec![TitleIssue::Empty];
    }

    let mut issues = Vec::new();

    if has_author_prefix(trimmed, author) {
        issues.push(TitleIssue::AuthorPrefix);
    }

    let len = char_len(trimmed);
    if len < *STRICT_TITLE_CHARS.start() {
        issues.push(TitleIssue::TooShort);
    } else if len > *STRICT_TITLE_CHARS.end() {
        issues.push(TitleIssue::TooLong);
    }

    if GENERIC_TITLES.contains(&trimmed.to_lowercase().as_str()) {
        issues.push(TitleIssue::GenericTitle);
    }

    if HTML_ENTITY_RE.is_match(trimmed) {
        issues.push(TitleIssue::HtmlEntities);
    }

    issues
}

/// Decodes the handful of HTML entities scrapers commonly leave behind.
pub fn decode_html_entities(text: &str) -> String {
    HTML_ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[0];
            let decoded = match entity.to_lowercase().as_str() {
                "&amp;" => Some('&'),
                "&quot;" => Some('"'),
                "&apos;" => Some('\''),
                "&lt;" => Some('<'),
                "&gt;" => Some('>'),
                "&nbsp;" => Some(' '),
                lower => numeric_entity(lower),
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| entity.to_string())
        })
        .into_owned()
}

fn numeric_entity(entity: &str) -> Option<char> {
    let body = entity.strip_prefix("&#")?.strip_suffix(';')?;
    let code = match body.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => body.parse().ok()?,
    };
    char::from_u32(code)
}
