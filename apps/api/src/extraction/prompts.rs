// Prompt schemas for every extraction feature.
// Each `Signature` is a fixed list of input and output fields; the LLM client
// renders it into a JSON-only prompt.

use crate::llm_client::signature::{FieldKind, FieldSpec, Signature};

/// Memorable title for a saved post.
pub const MEMORABLE_TITLE: Signature = Signature {
    name: "memorable_title",
    instructions: "Create a memorable, catchy title for saved content. \
        The title should capture what makes this content WORTH SAVING. \
        Be specific and intriguing - not generic like \"Instagram post\" or \"Photo\". \
        5-12 words that tell the reader exactly what this is about. \
        NEVER start the title with the author's username.",
    inputs: &[
        FieldSpec::input("caption", "Original caption/text from the post"),
        FieldSpec::input("author", "Username of the creator"),
        FieldSpec::input("platform", "instagram, twitter, or reddit"),
    ],
    outputs: &[FieldSpec::output(
        "title",
        FieldKind::Text,
        "Memorable 5-12 word title that captures the essence",
    )],
};

/// Analytical (not copied) summary.
pub const ANALYTICAL_SUMMARY: Signature = Signature {
    name: "analytical_summary",
    instructions: "Create an analytical summary explaining WHY this content is valuable. \
        DO NOT just copy the caption. Instead, analyze: \
        1. What is the actual subject/topic? \
        2. What makes it unique or interesting? \
        3. Why would someone want to find this later? \
        Write 2-3 sentences of genuine analysis.",
    inputs: &[
        FieldSpec::input("caption", "Original caption/text"),
        FieldSpec::input("title", "The title we generated"),
        FieldSpec::input("platform", "instagram, twitter, or reddit"),
        FieldSpec::input("author", "Content author for context"),
        FieldSpec::input("image_count", "Number of images (for carousel context)"),
        FieldSpec::input("platform_guide", "What makes content valuable on this platform"),
    ],
    outputs: &[
        FieldSpec::output(
            "summary",
            FieldKind::Text,
            "2-3 sentence analytical summary of what this is and why it matters (50-500 chars)",
        ),
        FieldSpec::output(
            "content_category",
            FieldKind::Text,
            "Category: product, art, tutorial, opinion, lifestyle, tech, fashion, food, etc",
        ),
        FieldSpec::output(
            "key_topics",
            FieldKind::TextList,
            "2-5 key topics/themes identified in the content",
        ),
    ],
};

/// Three-layer tag hierarchy.
pub const HIERARCHICAL_TAGS: Signature = Signature {
    name: "hierarchical_tags",
    instructions: "Generate hierarchical tags for content archival in a visual knowledge system. \
        Tags enable SERENDIPITOUS discovery across disciplines: \
        PRIMARY tags define the ESSENCE (what makes it unique); \
        CONTEXTUAL tags provide broader subject context; \
        the VIBE tag creates cross-disciplinary portals \
        (kinetic connects breakdance to JS animation). \
        Think step by step and put your reasoning in the reasoning field.",
    inputs: &[
        FieldSpec::input("content", "Text content: caption, description, or article text"),
        FieldSpec::input("platform", "Source platform: instagram, twitter, reddit, youtube, etc"),
        FieldSpec::input("image_url", "Optional: URL to content image"),
        FieldSpec::input("title", "Optional: Content title for additional context"),
    ],
    outputs: &[
        FieldSpec::output(
            "reasoning",
            FieldKind::Text,
            "Short step-by-step reasoning behind the chosen tags",
        ),
        FieldSpec::output(
            "primary_tags",
            FieldKind::TextList,
            "1-2 essence tags that define the core identity. Examples: 'bmw', 'terence-tao', \
             'breakdance', 'category-theory'. Lowercase, hyphenated.",
        ),
        FieldSpec::output(
            "contextual_tags",
            FieldKind::TextList,
            "1-2 broader subject/field tags. Examples: 'automotive', 'mathematics', 'dance', \
             'data-viz'. Lowercase, hyphenated.",
        ),
        FieldSpec::output(
            "vibe_tag",
            FieldKind::Text,
            "1 abstract feeling/energy tag from: kinetic, atmospheric, minimalist, raw, \
             nostalgic, elegant, chaotic, ethereal, tactile, visceral, contemplative, playful, \
             precise, organic, geometric",
        ),
    ],
};

/// Image/media asset extraction from scraped markup.
pub const ASSET_EXTRACTION: Signature = Signature {
    name: "asset_extraction",
    instructions: "Extract image/media assets from scraped content. \
        Identify the BEST quality version of each unique image; carousels often list \
        several sizes of the same image. \
        Quality order: display_url > display_resources > img tag > og:image. \
        CDN URLs (cdninstagram, scontent, fbcdn, pbs.twimg.com, i.redd.it) are real images; \
        static URLs are placeholders and must be left out.",
    inputs: &[
        FieldSpec::input("html_content", "Raw HTML or JSON containing image URLs"),
        FieldSpec::input("platform", "Source platform: instagram, twitter, reddit"),
        FieldSpec::input("expected_count", "Expected number of images (from carousel indicator)"),
    ],
    outputs: &[
        FieldSpec::output(
            "images",
            FieldKind::Records,
            "List of {url, width, height, quality_source} for each unique image",
        ),
        FieldSpec::output("primary_image", FieldKind::Text, "URL of the best/primary image"),
        FieldSpec::output("is_carousel", FieldKind::Flag, "True if this is a multi-image post"),
        FieldSpec::output(
            "extraction_confidence",
            FieldKind::Number,
            "Confidence that all images were found",
        ),
    ],
};

const PLATFORM_OUTPUTS_COMMON: [FieldSpec; 5] = [
    FieldSpec::output("title", FieldKind::Text, "Clean title without any username prefix, 20-80 chars"),
    FieldSpec::output("summary", FieldKind::Text, "Analytical summary explaining WHY this is worth saving"),
    FieldSpec::output("images", FieldKind::TextList, "Full-resolution image URLs"),
    FieldSpec::output("video_url", FieldKind::Text, "Video URL if present, else null"),
    FieldSpec::output("thumbnail_url", FieldKind::Text, "Best thumbnail for preview"),
];

pub const INSTAGRAM_CONTENT: Signature = Signature {
    name: "instagram_content",
    instructions: "Complete Instagram content extraction. \
        Captions often start with the username - it must be removed. \
        Carousels have edge_sidecar_to_children in the JSON; display_url is full resolution. \
        Reels have video_url in addition to a thumbnail. \
        Hashtags matter for discovery; @mentions indicate collaborations.",
    inputs: &[
        FieldSpec::input("raw_html", "Raw HTML from Instagram embed or page"),
        FieldSpec::input("raw_caption", "Raw caption text (may contain username prefix)"),
        FieldSpec::input("detected_author", "Username extracted from page (to remove from caption)"),
        FieldSpec::input("url", "Original Instagram URL"),
    ],
    outputs: &[
        PLATFORM_OUTPUTS_COMMON[0],
        PLATFORM_OUTPUTS_COMMON[1],
        PLATFORM_OUTPUTS_COMMON[2],
        PLATFORM_OUTPUTS_COMMON[3],
        PLATFORM_OUTPUTS_COMMON[4],
        FieldSpec::output("author", FieldKind::Text, "Username of the poster"),
        FieldSpec::output("content_type", FieldKind::Text, "photo, carousel, reel, story, or igtv"),
        FieldSpec::output("hashtags", FieldKind::TextList, "Hashtags as written in the caption, without #"),
        FieldSpec::output("mentions", FieldKind::TextList, "Mentioned usernames, without @"),
    ],
};

pub const TWITTER_CONTENT: Signature = Signature {
    name: "twitter_content",
    instructions: "Complete Twitter/X content extraction. \
        Tweet text is the primary content; author format is \"Display Name (@handle)\". \
        Media can be images (use :orig for full quality), GIFs, or video. \
        Focus on extracting the INSIGHT, not just the text.",
    inputs: &[
        FieldSpec::input("tweet_json", "JSON from Twitter syndication API"),
        FieldSpec::input("raw_html", "Fallback: raw HTML if JSON unavailable"),
        FieldSpec::input("url", "Original tweet URL"),
    ],
    outputs: &[
        PLATFORM_OUTPUTS_COMMON[0],
        PLATFORM_OUTPUTS_COMMON[1],
        PLATFORM_OUTPUTS_COMMON[2],
        PLATFORM_OUTPUTS_COMMON[3],
        PLATFORM_OUTPUTS_COMMON[4],
        FieldSpec::output("author_handle", FieldKind::Text, "@handle without @"),
        FieldSpec::output("hashtags", FieldKind::TextList, "Hashtags as written in the tweet, without #"),
        FieldSpec::output("mentions", FieldKind::TextList, "Mentioned usernames, without @"),
    ],
};

pub const REDDIT_CONTENT: Signature = Signature {
    name: "reddit_content",
    instructions: "Complete Reddit content extraction. \
        Posts have a user-provided title and a selftext body; the subreddit gives context. \
        Posts can be text, link, image, video, or gallery. \
        Focus on the INFORMATION or DISCUSSION value.",
    inputs: &[
        FieldSpec::input("json_data", "JSON from Reddit API or scrape"),
        FieldSpec::input("raw_html", "Fallback: raw HTML"),
        FieldSpec::input("url", "Original Reddit URL"),
    ],
    outputs: &[
        PLATFORM_OUTPUTS_COMMON[0],
        PLATFORM_OUTPUTS_COMMON[1],
        PLATFORM_OUTPUTS_COMMON[2],
        PLATFORM_OUTPUTS_COMMON[3],
        PLATFORM_OUTPUTS_COMMON[4],
        FieldSpec::output("author", FieldKind::Text, "u/username"),
        FieldSpec::output("post_type", FieldKind::Text, "text, link, image, video, gallery, or crosspost"),
    ],
};

/// Platform-specific guidance passed to the summary prompt.
pub fn platform_guide(platform: &str) -> &'static str {
    match platform.trim().to_lowercase().as_str() {
        "instagram" => {
            "Instagram content is visual-first. Focus on the visual story, note carousels, \
             aesthetic qualities and mood. For tutorials: what skill is taught. \
             For products: what problem it solves."
        }
        "twitter" | "x" => {
            "Twitter/X content is idea-first. Capture the core argument or insight, \
             the stance being taken, and why the tweet is worth revisiting."
        }
        "reddit" => {
            "Reddit content is community-driven. Note the subreddit context and capture \
             the key information, question, story or discussion point."
        }
        _ => "Capture what the content is about and why it is worth revisiting.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::Vibe;

    #[test]
    fn test_vibe_prompt_lists_full_vocabulary() {
        let vibe = HIERARCHICAL_TAGS
            .outputs
            .iter()
            .find(|f| f.name == "vibe_tag")
            .unwrap();
        for v in Vibe::ALL {
            assert!(vibe.desc.contains(v.as_str()), "missing {v}");
        }
    }

    #[test]
    fn test_platform_signatures_share_core_outputs() {
        for sig in [INSTAGRAM_CONTENT, TWITTER_CONTENT, REDDIT_CONTENT] {
            for name in ["title", "summary", "images", "video_url", "thumbnail_url"] {
                assert!(sig.outputs.iter().any(|f| f.name == name), "{} lacks {name}", sig.name);
            }
        }
    }

    #[test]
    fn test_platform_signatures_do_not_ask_for_confidence() {
        // Unified confidence is computed from the gated fields.
        for sig in [INSTAGRAM_CONTENT, TWITTER_CONTENT, REDDIT_CONTENT] {
            assert!(sig.outputs.iter().all(|f| f.name != "confidence"), "{}", sig.name);
        }
    }

    #[test]
    fn test_platform_guide_aliases() {
        assert_eq!(platform_guide("X"), platform_guide("twitter"));
        assert!(platform_guide("youtube").starts_with("Capture"));
    }
}
