//! Analytical summary generation with a templated fallback.

use tracing::info;

use crate::extraction::composer::{log_fallback, ContentComposer, FallbackReason};
use crate::extraction::prompts::{platform_guide, ANALYTICAL_SUMMARY};
use crate::models::content::{ContentItem, SummaryResult};
use crate::quality::gate::{gate_summary, AI_SUMMARY_QUALITY, FALLBACK_SUMMARY_QUALITY};
use crate::quality::normalizer::remove_author_prefix;
use crate::quality::truncator::{take_chars, ELLIPSIS};

/// Content chars sent to the LLM.
const SUMMARY_CONTENT_CHARS: usize = 1500;
/// Content chars quoted by the fallback template.
const FALLBACK_SUMMARY_CHARS: usize = 200;
const UNKNOWN_CONTENT_TYPE: &str = "unknown";

pub async fn generate_summary(composer: &ContentComposer, item: &ContentItem) -> SummaryResult {
    match ai_summary(composer, item).await {
        Ok(result) => {
            info!("ai_summary_generated: category={}", result.content_type);
            result
        }
        Err(reason) => {
            log_fallback("summary", &reason);
            fallback_summary(item)
        }
    }
}

async fn ai_summary(
    composer: &ContentComposer,
    item: &ContentItem,
) -> Result<SummaryResult, FallbackReason> {
    let (caption, _) = take_chars(&item.raw_text, SUMMARY_CONTENT_CHARS);
    let prediction = composer
        .attempt(
            &ANALYTICAL_SUMMARY,
            &[
                ("caption", caption.to_string()),
                ("title", item.title.clone().unwrap_or_default()),
                ("platform", item.platform.clone()),
                ("author", item.author.clone()),
                ("image_count", item.image_count.to_string()),
                ("platform_guide", platform_guide(&item.platform).to_string()),
            ],
        )
        .await?;

    let summary = gate_summary(
        &item.raw_text,
        &prediction.text("summary").unwrap_or_default(),
    )?;

    let content_type = prediction
        .text("content_category")
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| UNKNOWN_CONTENT_TYPE.to_string());

    let mut key_topics = dedup_topics(prediction.text_list("key_topics"));
    if key_topics.is_empty() && content_type != UNKNOWN_CONTENT_TYPE {
        key_topics.push(content_type.clone());
    }

    Ok(SummaryResult {
        summary,
        key_topics,
        content_type,
        quality_score: AI_SUMMARY_QUALITY,
        is_analytical: true,
    })
}

fn dedup_topics(raw: Vec<String>) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for topic in raw {
        let topic = topic.trim().to_lowercase();
        if !topic.is_empty() && !topics.contains(&topic) {
            topics.push(topic);
        }
    }
    topics
}

/// "Saved from {platform}: {content}", quoting at most 200 chars of content.
pub fn fallback_summary(item: &ContentItem) -> SummaryResult {
    let clean = remove_author_prefix(&item.raw_text, &item.author).trim_end();
    let (head, was_cut) = take_chars(clean, FALLBACK_SUMMARY_CHARS);

    let summary = if was_cut {
        format!("Saved from {}: {}{ELLIPSIS}", item.platform, head.trim_end())
    } else {
        format!("Saved from {}: {}", item.platform, head)
    };

    SummaryResult {
        summary,
        key_topics: vec![],
        content_type: UNKNOWN_CONTENT_TYPE.to_string(),
        quality_score: FALLBACK_SUMMARY_QUALITY,
        is_analytical: false,
    }
}
