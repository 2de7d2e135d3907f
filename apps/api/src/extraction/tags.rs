//! Hierarchical tag generation: primary (essence), contextual (subject), vibe (mood).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::extraction::composer::{log_fallback, ContentComposer, FallbackReason};
use crate::extraction::prompts::HIERARCHICAL_TAGS;
use crate::models::content::{ContentItem, TagSet, Vibe};
use crate::quality::gate::{Rejection, AI_TAG_CONFIDENCE, FALLBACK_TAG_CONFIDENCE};
use crate::quality::normalizer::remove_author_prefix;
use crate::quality::tags::{clean_tags, fallback_tag_set, parse_vibe, MAX_TAGS_PER_LAYER};
use crate::quality::truncator::take_chars;

/// Content chars sent to the LLM.
const TAG_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagsResult {
    pub tags: TagSet,
    pub confidence: f32,
    pub reasoning: Option<String>,
}

pub async fn generate_tags(composer: &ContentComposer, item: &ContentItem) -> TagsResult {
    let clean = remove_author_prefix(&item.raw_text, &item.author);

    match ai_tags(composer, clean, item).await {
        Ok(result) => {
            info!(
                "Generated tags: primary={:?}, contextual={:?}, vibe={}",
                result.tags.primary, result.tags.contextual, result.tags.vibe
            );
            result
        }
        Err(reason) => {
            log_fallback("tags", &reason);
            TagsResult {
                tags: fallback_tag_set(clean, &item.platform),
                confidence: FALLBACK_TAG_CONFIDENCE,
                reasoning: None,
            }
        }
    }
}

async fn ai_tags(
    composer: &ContentComposer,
    clean: &str,
    item: &ContentItem,
) -> Result<TagsResult, FallbackReason> {
    let (content, _) = take_chars(clean, TAG_CONTENT_CHARS);
    let prediction = composer
        .attempt(
            &HIERARCHICAL_TAGS,
            &[
                ("content", content.to_string()),
                ("platform", item.platform.clone()),
                ("image_url", item.image_url.clone().unwrap_or_default()),
                ("title", item.title.clone().unwrap_or_default()),
            ],
        )
        .await?;

    let primary = clean_tags(&prediction.text_list("primary_tags"), MAX_TAGS_PER_LAYER);
    if primary.is_empty() {
        return Err(Rejection("no usable primary tags".to_string()).into());
    }

    // Contextual tags degrade to the rule-based layer instead of rejecting the set.
    let mut contextual = clean_tags(&prediction.text_list("contextual_tags"), MAX_TAGS_PER_LAYER);
    if contextual.is_empty() {
        contextual = fallback_tag_set(clean, &item.platform).contextual;
    }

    let raw_vibe = prediction.text("vibe_tag");
    let vibe = parse_vibe(raw_vibe.as_deref());
    if let Some(raw) = raw_vibe.filter(|r| vibe.as_str() != r.trim().to_lowercase()) {
        debug!("vibe '{raw}' not in vocabulary ({}), using {vibe}", Vibe::vocabulary());
    }

    Ok(TagsResult {
        tags: TagSet {
            primary,
            contextual,
            vibe,
        },
        confidence: AI_TAG_CONFIDENCE,
        reasoning: prediction.text("reasoning").filter(|r| !r.trim().is_empty()),
    })
}
