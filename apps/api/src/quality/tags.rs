//! Tag hygiene: normalization, caption scanning and the rule-based tag set.

use std::cmp::Reverse;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::content::{TagSet, Vibe};

/// Max tags per layer (primary, contextual).
pub const MAX_TAGS_PER_LAYER: usize = 2;
/// Contextual tag used when nothing better is known.
pub const UNCATEGORIZED: &str = "uncategorized";

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w&])#(\w+)").expect("valid hashtag regex"));
static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w@])@([A-Za-z0-9_](?:[A-Za-z0-9_.]*[A-Za-z0-9_])?)")
        .expect("valid mention regex")
});
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));

const STOPWORDS: &[&str] = &[
    "about", "after", "again", "also", "been", "before", "being", "could", "does", "doing",
    "down", "each", "even", "every", "from", "have", "having", "here", "http", "https", "into",
    "just", "like", "made", "make", "many", "more", "most", "much", "must", "only", "other",
    "over", "really", "same", "should", "some", "such", "than", "that", "their", "them", "then",
    "there", "these", "they", "thing", "things", "this", "those", "through", "today", "very",
    "want", "were", "what", "when", "where", "which", "while", "will", "with", "would", "your",
    "yours",
];

/// Lowercases and hyphenates a raw tag. Returns `None` when nothing usable remains.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().trim_start_matches('#').chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !out.ends_with('-') {
            out.push('-');
        }
    }
    let tag = out.trim_matches('-');
    (!tag.is_empty()).then(|| tag.to_string())
}

/// Normalizes, deduplicates and caps a tag layer.
pub fn clean_tags<S: AsRef<str>>(raw: &[S], limit: usize) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.iter().filter_map(|t| normalize_tag(t.as_ref())) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
        if tags.len() == limit {
            break;
        }
    }
    tags
}

/// Maps free text onto the vibe vocabulary, defaulting to contemplative.
pub fn parse_vibe(raw: Option<&str>) -> Vibe {
    raw.and_then(normalize_tag)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

/// Hashtags in order of appearance, without the `#`.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for cap in HASHTAG_RE.captures_iter(text) {
        let tag = cap[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// @mentions in order of appearance, without the `@`.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    for cap in MENTION_RE.captures_iter(text) {
        let mention = cap[1].to_string();
        if !mentions.contains(&mention) {
            mentions.push(mention);
        }
    }
    mentions
}

/// Content words ranked by frequency, ties broken by first appearance.
fn keywords(text: &str) -> Vec<String> {
    let without_urls = URL_RE.replace_all(text, " ");
    let without_mentions = MENTION_RE.replace_all(&without_urls, " ");

    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let words = without_mentions
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4 && w.chars().all(char::is_alphabetic))
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()));

    for (position, word) in words.enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by_key(|(_, (count, first))| (Reverse(*count), *first));
    ranked.into_iter().map(|(word, _)| word).collect()
}

/// Builds a deterministic tag set from the caption alone.
///
/// Candidates are hashtags first, then keywords. The first two become primary
/// tags and the next two contextual ones; the platform fills any gap.
pub fn fallback_tag_set(text: &str, platform: &str) -> TagSet {
    let candidates: Vec<String> = extract_hashtags(text)
        .into_iter()
        .chain(keywords(text))
        .collect();
    let candidates = clean_tags(&candidates, MAX_TAGS_PER_LAYER * 2);
    let platform_tag = normalize_tag(platform).unwrap_or_else(|| UNCATEGORIZED.to_string());

    let (primary, contextual) = if candidates.is_empty() {
        (vec![platform_tag], vec![UNCATEGORIZED.to_string()])
    } else if candidates.len() <= MAX_TAGS_PER_LAYER {
        (candidates, vec![platform_tag])
    } else {
        let (head, tail) = candidates.split_at(MAX_TAGS_PER_LAYER);
        (head.to_vec(), tail.to_vec())
    };

    TagSet {
        primary,
        contextual,
        vibe: Vibe::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("Terence Tao").as_deref(), Some("terence-tao"));
        assert_eq!(normalize_tag("#Data_Viz").as_deref(), Some("data-viz"));
        assert_eq!(normalize_tag("  --Category   Theory!! ").as_deref(), Some("category-theory"));
        assert_eq!(normalize_tag("  "), None);
        assert_eq!(normalize_tag("!!!"), None);
    }

    #[test]
    fn test_clean_tags_dedupes_and_caps() {
        let raw = vec!["BMW", "bmw", "", "M3 GTR", "Racing"];
        assert_eq!(clean_tags(&raw, 2), vec!["bmw", "m3-gtr"]);
    }

    #[test]
    fn test_parse_vibe_defaults() {
        assert_eq!(parse_vibe(Some(" Kinetic ")), Vibe::Kinetic);
        assert_eq!(parse_vibe(Some("dreamy")), Vibe::Contemplative);
        assert_eq!(parse_vibe(None), Vibe::Contemplative);
    }

    #[test]
    fn test_extract_hashtags_and_mentions() {
        let text = "Sunset run with @anna.k and @bob_ #running #Sunset #running email me@example.com &#39;";
        assert_eq!(extract_hashtags(text), vec!["running", "Sunset"]);
        assert_eq!(extract_mentions(text), vec!["anna.k", "bob_"]);
    }

    #[test]
    fn test_fallback_prefers_hashtags_then_keywords() {
        let tags = fallback_tag_set(
            "Restoring a vintage motorcycle engine. The engine took weeks. #restoration",
            "instagram",
        );
        assert_eq!(tags.primary, vec!["restoration", "engine"]);
        assert_eq!(tags.contextual, vec!["restoring", "vintage"]);
        assert_eq!(tags.vibe, Vibe::Contemplative);
    }

    #[test]
    fn test_fallback_with_few_candidates_uses_platform() {
        let tags = fallback_tag_set("Breakdance!", "Reddit");
        assert_eq!(tags.primary, vec!["breakdance"]);
        assert_eq!(tags.contextual, vec!["reddit"]);
    }

    #[test]
    fn test_fallback_with_no_candidates() {
        let tags = fallback_tag_set("lol ok 123 https://t.co/abcdefg", "twitter");
        assert_eq!(tags.primary, vec!["twitter"]);
        assert_eq!(tags.contextual, vec![UNCATEGORIZED]);
    }

    #[test]
    fn test_fallback_tags_are_normalized() {
        let tags = fallback_tag_set("#Street_Food tacos tacos TACOS in Mexico City", "instagram");
        for tag in tags.primary.iter().chain(tags.contextual.iter()) {
            assert_eq!(tag, &tag.to_lowercase());
            assert!(!tag.is_empty());
            assert!(!tag.contains(' '));
        }
        assert_eq!(tags.primary[0], "street-food");
        assert_eq!(tags.primary[1], "tacos");
    }
}
