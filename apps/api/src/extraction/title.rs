//! Title extraction (LLM with truncation fallback) and strict title validation.

use tracing::info;

use crate::extraction::composer::{log_fallback, ContentComposer, FallbackReason};
use crate::extraction::prompts::MEMORABLE_TITLE;
use crate::models::content::{ContentItem, TitleResult};
use crate::quality::gate::{
    decode_html_entities, gate_ai_title, strict_title_issues, AI_TITLE_CONFIDENCE,
    FALLBACK_TITLE_CONFIDENCE, STRICT_VALID_TITLE_CONFIDENCE,
};
use crate::quality::normalizer::remove_author_prefix;
use crate::quality::truncator::{smart_truncate, take_chars, FALLBACK_TITLE_CHARS};

/// Caption chars sent to the LLM.
const TITLE_CAPTION_CHARS: usize = 800;

pub const FALLBACK_USED: &str = "fallback_used";
pub const EMPTY_CONTENT: &str = "empty_content";

/// Produces a title for `item`, always returning a result.
pub async fn extract_title(composer: &ContentComposer, item: &ContentItem) -> TitleResult {
    let clean = remove_author_prefix(&item.raw_text, &item.author);

    match ai_title(composer, clean, item).await {
        Ok(title) => {
            info!("ai_title_generated: {}", title.chars().take(50).collect::<String>());
            TitleResult {
                title,
                is_valid: true,
                issues: vec![],
                confidence: AI_TITLE_CONFIDENCE,
            }
        }
        Err(reason) => {
            log_fallback("title", &reason);
            fallback_title(clean, &item.platform)
        }
    }
}

async fn ai_title(
    composer: &ContentComposer,
    clean: &str,
    item: &ContentItem,
) -> Result<String, FallbackReason> {
    let (caption, _) = take_chars(clean, TITLE_CAPTION_CHARS);
    let prediction = composer
        .attempt(
            &MEMORABLE_TITLE,
            &[
                ("caption", caption.to_string()),
                ("author", item.author.clone()),
                ("platform", item.platform.clone()),
            ],
        )
        .await?;

    let candidate = prediction.text("title").unwrap_or_default();
    Ok(gate_ai_title(&candidate, &item.author)?)
}

fn untitled(platform: &str) -> String {
    match platform.trim() {
        "" => "Untitled post".to_string(),
        platform => format!("Untitled {platform} post"),
    }
}

/// Rule-based title from already-normalized text.
pub fn fallback_title(clean: &str, platform: &str) -> TitleResult {
    let title = smart_truncate(clean.trim(), FALLBACK_TITLE_CHARS);

    if title.is_empty() {
        return TitleResult {
            title: untitled(platform),
            is_valid: false,
            issues: vec![FALLBACK_USED.to_string(), EMPTY_CONTENT.to_string()],
            confidence: FALLBACK_TITLE_CONFIDENCE,
        };
    }

    TitleResult {
        title,
        is_valid: true,
        issues: vec![FALLBACK_USED.to_string()],
        confidence: FALLBACK_TITLE_CONFIDENCE,
    }
}

/// Strict validation path (20–100 chars).
///
/// `is_valid` describes the submitted title; the returned `title` is the
/// submitted one when valid, otherwise a repaired version.
pub fn validate_title(
    title: &str,
    author: &str,
    original_content: &str,
    platform: &str,
) -> TitleResult {
    let issues = strict_title_issues(title, author);

    if issues.is_empty() {
        return TitleResult {
            title: title.trim().to_string(),
            is_valid: true,
            issues: vec![],
            confidence: STRICT_VALID_TITLE_CONFIDENCE,
        };
    }

    TitleResult {
        title: repair_title(title, author, original_content, platform),
        is_valid: false,
        issues: issues.iter().map(|i| i.as_str().to_string()).collect(),
        confidence: FALLBACK_TITLE_CONFIDENCE,
    }
}

/// Cheap fixes first (entities, author prefix), then regeneration from content.
/// With nothing usable left the placeholder title is returned.
fn repair_title(title: &str, author: &str, original_content: &str, platform: &str) -> String {
    let decoded = decode_html_entities(title);
    let candidate = remove_author_prefix(&decoded, author).trim();
    if strict_title_issues(candidate, author).is_empty() {
        return candidate.to_string();
    }

    let source = decode_html_entities(original_content);
    let regenerated = smart_truncate(
        remove_author_prefix(&source, author).trim(),
        FALLBACK_TITLE_CHARS,
    );

    if regenerated.is_empty() {
        untitled(platform)
    } else {
        regenerated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::llm_client::testing::{Script, ScriptedGenerator};
    use crate::llm_client::Generator;

    fn item(raw: &str, author: &str) -> ContentItem {
        ContentItem {
            raw_text: raw.to_string(),
            author: author.to_string(),
            platform: "instagram".to_string(),
            ..Default::default()
        }
    }

    fn composer_with(generator: Arc<ScriptedGenerator>) -> ContentComposer {
        let generator: Arc<dyn Generator> = generator;
        ContentComposer::new(Some(generator), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_ai_title_accepted() {
        let generator = Arc::new(ScriptedGenerator::reply(
            json!({"title": "\"Hand-built walnut desk with hidden drawers\""}),
        ));
        let composer = composer_with(generator.clone());

        let result = extract_title(&composer, &item("woodshop: Finally finished it!", "woodshop")).await;

        assert_eq!(result.title, "Hand-built walnut desk with hidden drawers");
        assert!(result.is_valid);
        assert!(result.issues.is_empty());
        assert_eq!(result.confidence, AI_TITLE_CONFIDENCE);
        assert_eq!(generator.input("caption").as_deref(), Some("Finally finished it!"));
    }

    #[tokio::test]
    async fn test_short_ai_title_forces_truncation_fallback() {
        let composer = composer_with(Arc::new(ScriptedGenerator::reply(json!({"title": "Hi!!!"}))));
        let result = extract_title(
            &composer,
            &item("johndoe: This is great. It really is amazing and wonderful.", "johndoe"),
        )
        .await;

        assert_eq!(result.title, "This is great. It really is amazing and wonderful.");
        assert_eq!(result.issues, vec![FALLBACK_USED]);
        assert_eq!(result.confidence, FALLBACK_TITLE_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_failing_llm_falls_back() {
        let composer = composer_with(Arc::new(ScriptedGenerator::new(Script::Fail)));
        let long = format!("{} and it keeps going", "word ".repeat(30));
        let result = extract_title(&composer, &item(&long, "")).await;
        assert!(result.title.ends_with("..."));
        assert!(result.title.chars().count() <= FALLBACK_TITLE_CHARS + 3);
        assert_eq!(result.confidence, FALLBACK_TITLE_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_caption_is_truncated_for_llm() {
        let generator = Arc::new(ScriptedGenerator::reply(json!({"title": "A fine long title"})));
        let composer = composer_with(generator.clone());
        extract_title(&composer, &item(&"x".repeat(5000), "")).await;
        assert_eq!(generator.input("caption").unwrap().chars().count(), TITLE_CAPTION_CHARS);
    }

    #[tokio::test]
    async fn test_mock_mode_uses_fallback() {
        let composer = ContentComposer::new(None, Duration::from_secs(1));
        let result = extract_title(&composer, &item("@johndoe Check this out", "johndoe")).await;
        assert_eq!(result.title, "Check this out");
        assert!(result.is_valid);
    }

    #[test]
    fn test_fallback_on_empty_content() {
        let result = fallback_title("", "reddit");
        assert_eq!(result.title, "Untitled reddit post");
        assert!(!result.is_valid);
        assert_eq!(result.issues, vec![FALLBACK_USED, EMPTY_CONTENT]);
    }

    #[test]
    fn test_validate_title_valid() {
        let result =
            validate_title("  Slow-roasted tomatoes with burrata ", "chef_ana", "", "instagram");
        assert!(result.is_valid);
        assert_eq!(result.title, "Slow-roasted tomatoes with burrata");
        assert_eq!(result.confidence, STRICT_VALID_TITLE_CONFIDENCE);
    }

    #[test]
    fn test_validate_title_repairs_prefix_and_entities() {
        let result = validate_title(
            "chef_ana: Slow-roasted tomatoes &amp; burrata",
            "chef_ana",
            "irrelevant",
            "instagram",
        );
        assert!(!result.is_valid);
        assert_eq!(result.issues, vec!["author_prefix", "html_entities"]);
        assert_eq!(result.title, "Slow-roasted tomatoes & burrata");
        assert_eq!(result.confidence, FALLBACK_TITLE_CONFIDENCE);
    }

    #[test]
    fn test_validate_title_regenerates_from_content() {
        let result = validate_title(
            "Instagram Post",
            "chef_ana",
            "chef_ana Summer tomatoes, roasted low and slow for hours. Recipe below.",
            "instagram",
        );
        assert!(!result.is_valid);
        assert_eq!(result.issues, vec!["too_short", "generic_title"]);
        assert_eq!(
            result.title,
            "Summer tomatoes, roasted low and slow for hours. Recipe below."
        );
    }

    #[test]
    fn test_validate_author_only_title_uses_placeholder() {
        let result = validate_title("chef_ana", "chef_ana", "", "instagram");
        assert!(!result.is_valid);
        assert!(result.issues.contains(&"author_prefix".to_string()));
        assert_eq!(result.title, "Untitled instagram post");
    }

    #[test]
    fn test_validate_blank_title_uses_placeholder() {
        let result = validate_title("   ", "", "", "reddit");
        assert_eq!(result.issues, vec!["empty"]);
        assert_eq!(result.title, "Untitled reddit post");

        let result = validate_title("Post", "", "", " ");
        assert_eq!(result.title, "Untitled post");
    }
}
