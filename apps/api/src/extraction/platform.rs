//! Unified per-platform extraction (Instagram, Twitter/X, Reddit).
//!
//! A deterministic baseline is always built from the request. The LLM result,
//! when there is one, is gated field by field and any rejected field keeps its
//! baseline value.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::extraction::assets::{assess_image_url, fallback_assets, find_key, unescape};
use crate::extraction::composer::{log_fallback, ContentComposer};
use crate::extraction::prompts::{INSTAGRAM_CONTENT, REDDIT_CONTENT, TWITTER_CONTENT};
use crate::extraction::summary::fallback_summary;
use crate::extraction::title::fallback_title;
use crate::llm_client::signature::{Prediction, Signature};
use crate::models::assets::UnifiedContent;
use crate::models::content::ContentItem;
use crate::quality::gate::{gate_ai_title, gate_summary};
use crate::quality::normalizer::remove_author_prefix;
use crate::quality::tags::{extract_hashtags, extract_mentions};
use crate::quality::truncator::{smart_truncate, take_chars, FALLBACK_TITLE_CHARS};

/// Markup chars sent to the LLM per source field.
const PLATFORM_SOURCE_CHARS: usize = 2000;

const ALL_FIELDS_CONFIDENCE: f32 = 0.9;
const SOME_FIELDS_CONFIDENCE: f32 = 0.6;
const BASELINE_CONFIDENCE: f32 = 0.3;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformRequest {
    pub platform: String,
    pub url: String,
    #[serde(default)]
    pub raw_html: Option<String>,
    #[serde(default)]
    pub raw_caption: Option<String>,
    #[serde(default)]
    pub detected_author: Option<String>,
    #[serde(default, alias = "tweet_json")]
    pub json_data: Option<Value>,
}

impl PlatformRequest {
    /// Embedded JSON, whether it arrived as an object or as a JSON string.
    pub fn json_payload(&self) -> Option<Value> {
        match self.json_data.as_ref()? {
            Value::Null => None,
            Value::String(s) => serde_json::from_str(s).ok(),
            other => Some(other.clone()),
        }
    }

    pub fn has_source(&self) -> bool {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.raw_html)
            || present(&self.raw_caption)
            || self.json_data.as_ref().is_some_and(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedPlatform {
    Instagram,
    Twitter,
    Reddit,
}

impl SupportedPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedPlatform::Instagram => "instagram",
            SupportedPlatform::Twitter => "twitter",
            SupportedPlatform::Reddit => "reddit",
        }
    }

    fn signature(&self) -> &'static Signature {
        match self {
            SupportedPlatform::Instagram => &INSTAGRAM_CONTENT,
            SupportedPlatform::Twitter => &TWITTER_CONTENT,
            SupportedPlatform::Reddit => &REDDIT_CONTENT,
        }
    }
}

impl FromStr for SupportedPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(SupportedPlatform::Instagram),
            "twitter" | "x" => Ok(SupportedPlatform::Twitter),
            "reddit" => Ok(SupportedPlatform::Reddit),
            other => Err(format!("Unsupported platform: {other}")),
        }
    }
}

/// What can be read from the request without the LLM.
#[derive(Debug, Clone, Default)]
struct Baseline {
    text: String,
    title_hint: Option<String>,
    author_handle: String,
    author: String,
    content_type: String,
    images: Vec<String>,
    video_url: Option<String>,
}

fn str_at(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn find_str(json: Option<&Value>, keys: &[&str]) -> Option<String> {
    let json = json?;
    keys.iter().find_map(|key| {
        find_key(json, key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(unescape)
    })
}

/// First object carrying both a title and a selftext (a Reddit post).
fn find_reddit_post(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(map) if map.contains_key("title") && map.contains_key("selftext") => Some(map),
        Value::Object(map) => map.values().find_map(find_reddit_post),
        Value::Array(items) => items.iter().find_map(find_reddit_post),
        _ => None,
    }
}

fn baseline_images(req: &PlatformRequest, json: Option<&Value>, platform: &str) -> Vec<String> {
    let from_json = json
        .map(|j| fallback_assets(&j.to_string(), platform, 1).images)
        .unwrap_or_default();
    let images = if from_json.is_empty() {
        fallback_assets(req.raw_html.as_deref().unwrap_or(""), platform, 1).images
    } else {
        from_json
    };
    images.into_iter().map(|i| i.url).collect()
}

fn build_baseline(platform: SupportedPlatform, req: &PlatformRequest) -> Baseline {
    let json = req.json_payload();
    let caption = req.raw_caption.clone().unwrap_or_default();
    let images = baseline_images(req, json.as_ref(), platform.as_str());
    let video_url = find_str(json.as_ref(), &["video_url", "fallback_url"]);

    match platform {
        SupportedPlatform::Instagram => {
            let handle = req
                .detected_author
                .as_deref()
                .map(|a| a.trim().trim_start_matches('@').to_string())
                .filter(|a| !a.is_empty())
                .or_else(|| find_str(json.as_ref(), &["username"]))
                .unwrap_or_default();
            let text = if caption.trim().is_empty() {
                find_str(json.as_ref(), &["text"]).unwrap_or_default()
            } else {
                caption
            };
            let content_type = if video_url.is_some() {
                "reel"
            } else if images.len() > 1 {
                "carousel"
            } else {
                "photo"
            };
            Baseline {
                text,
                title_hint: None,
                author: at_handle(&handle),
                author_handle: handle,
                content_type: content_type.to_string(),
                images,
                video_url,
            }
        }
        SupportedPlatform::Twitter => {
            let handle = json
                .as_ref()
                .and_then(|j| find_key(j, "user"))
                .and_then(|user| user.as_object())
                .and_then(|user| str_at(user, "screen_name"))
                .or_else(|| req.detected_author.clone())
                .map(|h| h.trim().trim_start_matches('@').to_string())
                .unwrap_or_default();
            let text = find_str(json.as_ref(), &["full_text", "text"]).unwrap_or(caption);
            Baseline {
                text,
                title_hint: None,
                author: at_handle(&handle),
                author_handle: handle,
                content_type: "tweet".to_string(),
                images,
                video_url,
            }
        }
        SupportedPlatform::Reddit => {
            let post = json.as_ref().and_then(find_reddit_post);
            let field = |key: &str| post.and_then(|p| str_at(p, key));
            let handle = field("author").unwrap_or_default();
            let selftext = field("selftext").unwrap_or(caption);
            let is_gallery = post
                .and_then(|p| p.get("is_gallery"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let is_image = field("post_hint").as_deref() == Some("image");
            let content_type = if is_gallery {
                "gallery"
            } else if is_image {
                "image"
            } else if !selftext.trim().is_empty() || post.is_none() {
                "text"
            } else {
                "link"
            };
            Baseline {
                text: selftext,
                title_hint: field("title"),
                author: if handle.is_empty() {
                    String::new()
                } else {
                    format!("u/{handle}")
                },
                author_handle: handle,
                content_type: content_type.to_string(),
                images,
                video_url,
            }
        }
    }
}

fn at_handle(handle: &str) -> String {
    if handle.is_empty() {
        String::new()
    } else {
        format!("@{handle}")
    }
}

fn baseline_title(platform: SupportedPlatform, baseline: &Baseline) -> String {
    if let Some(hint) = &baseline.title_hint {
        return smart_truncate(hint, FALLBACK_TITLE_CHARS);
    }
    let clean = remove_author_prefix(&baseline.text, &baseline.author_handle);
    fallback_title(clean, platform.as_str()).title
}

fn baseline_summary(platform: SupportedPlatform, baseline: &Baseline) -> String {
    let text = if baseline.text.trim().is_empty() {
        baseline.title_hint.clone().unwrap_or_default()
    } else {
        baseline.text.clone()
    };
    fallback_summary(&ContentItem {
        raw_text: text,
        author: baseline.author_handle.clone(),
        platform: platform.as_str().to_string(),
        ..Default::default()
    })
    .summary
}

/// Deterministic result. Used whole in mock mode or when the call fails.
fn baseline_content(platform: SupportedPlatform, baseline: &Baseline) -> UnifiedContent {
    UnifiedContent {
        platform: platform.as_str().to_string(),
        title: baseline_title(platform, baseline),
        author: baseline.author.clone(),
        summary: baseline_summary(platform, baseline),
        content_type: baseline.content_type.clone(),
        images: baseline.images.clone(),
        video_url: baseline.video_url.clone(),
        thumbnail_url: baseline.images.first().cloned(),
        hashtags: extract_hashtags(&baseline.text),
        mentions: extract_mentions(&baseline.text),
        confidence: BASELINE_CONFIDENCE,
        fallback_used: true,
    }
}

fn prompt_inputs(platform: SupportedPlatform, req: &PlatformRequest) -> Vec<(&'static str, String)> {
    let clip = |s: &str| take_chars(s, PLATFORM_SOURCE_CHARS).0.to_string();
    let raw_html = clip(req.raw_html.as_deref().unwrap_or(""));
    let json = clip(&req.json_payload().map(|j| j.to_string()).unwrap_or_default());

    match platform {
        SupportedPlatform::Instagram => vec![
            ("raw_html", raw_html),
            ("raw_caption", clip(req.raw_caption.as_deref().unwrap_or(""))),
            ("detected_author", clip(req.detected_author.as_deref().unwrap_or(""))),
            ("url", req.url.clone()),
        ],
        SupportedPlatform::Twitter => vec![
            ("tweet_json", json),
            ("raw_html", raw_html),
            ("url", req.url.clone()),
        ],
        SupportedPlatform::Reddit => vec![
            ("json_data", json),
            ("raw_html", raw_html),
            ("url", req.url.clone()),
        ],
    }
}

/// Image URLs from the prediction that occur in `source` and pass assessment.
fn gated_images(prediction: &Prediction, source: &str) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    for url in prediction.text_list("images") {
        let url = unescape(url.trim());
        if !source.contains(&url) {
            continue;
        }
        if let Some(asset) = assess_image_url(&url, "llm") {
            if !images.contains(&asset.url) {
                images.push(asset.url);
            }
        }
    }
    images
}

/// LLM author, reformatted like the baseline and kept only if the handle occurs in `evidence`.
fn verified_author(
    platform: SupportedPlatform,
    prediction: &Prediction,
    evidence: &str,
) -> Option<String> {
    let raw = prediction
        .text("author")
        .or_else(|| prediction.text("author_handle"))?;
    let handle = raw.trim().trim_start_matches('@');
    let handle = handle.strip_prefix("u/").unwrap_or(handle).trim();
    if handle.is_empty() || handle.contains(char::is_whitespace) || !evidence.contains(handle) {
        warn!("platform author rejected: {raw:?}");
        return None;
    }
    Some(match platform {
        SupportedPlatform::Reddit => format!("u/{handle}"),
        SupportedPlatform::Instagram | SupportedPlatform::Twitter => at_handle(handle),
    })
}

/// Appends LLM terms that occur in `evidence` with their `marker` and are not already listed.
fn merge_verified_terms(
    found: &mut Vec<String>,
    candidates: Vec<String>,
    marker: char,
    evidence: &str,
) {
    let evidence = evidence.to_lowercase();
    for candidate in candidates {
        let term = candidate.trim().trim_start_matches(marker).trim();
        if term.is_empty() || found.iter().any(|f| f.eq_ignore_ascii_case(term)) {
            continue;
        }
        if evidence.contains(&format!("{marker}{}", term.to_lowercase())) {
            found.push(term.to_string());
        }
    }
}

fn merge_prediction(
    platform: SupportedPlatform,
    req: &PlatformRequest,
    baseline: &Baseline,
    prediction: &Prediction,
) -> UnifiedContent {
    let mut content = baseline_content(platform, baseline);
    let mut accepted = 0;

    match gate_ai_title(
        &prediction.text("title").unwrap_or_default(),
        &baseline.author_handle,
    ) {
        Ok(title) => {
            content.title = title;
            accepted += 1;
        }
        Err(rejection) => warn!("platform title rejected: {rejection}"),
    }

    let original = if baseline.text.trim().is_empty() {
        baseline.title_hint.as_deref().unwrap_or("")
    } else {
        baseline.text.as_str()
    };
    match gate_summary(original, &prediction.text("summary").unwrap_or_default()) {
        Ok(summary) => {
            content.summary = summary;
            accepted += 1;
        }
        Err(rejection) => warn!("platform summary rejected: {rejection}"),
    }

    let source = unescape(&format!(
        "{}\n{}",
        req.raw_html.as_deref().unwrap_or(""),
        req.json_payload().map(|j| j.to_string()).unwrap_or_default()
    ));
    let images = gated_images(prediction, &source);
    if !images.is_empty() {
        content.images = images;
        accepted += 1;
    } else if baseline.images.is_empty() && prediction.text_list("images").is_empty() {
        // Nothing to find on either side.
        accepted += 1;
    } else {
        warn!("platform images rejected: no usable URLs in LLM output");
    }

    let verified = |name: &str| {
        prediction
            .text(name)
            .map(|u| unescape(u.trim()))
            .filter(|u| u.starts_with("http") && source.contains(u.as_str()))
    };
    if let Some(video_url) = verified("video_url") {
        content.video_url = Some(video_url);
    }
    content.thumbnail_url = verified("thumbnail_url")
        .and_then(|u| assess_image_url(&u, "llm"))
        .map(|asset| asset.url)
        .or_else(|| content.images.first().cloned());

    let evidence = format!("{}\n{}", baseline.text, source);
    if content.author.is_empty() {
        if let Some(author) = verified_author(platform, prediction, &evidence) {
            content.author = author;
        }
    }
    merge_verified_terms(&mut content.hashtags, prediction.text_list("hashtags"), '#', &evidence);
    merge_verified_terms(&mut content.mentions, prediction.text_list("mentions"), '@', &evidence);

    let ai_type = prediction
        .text("content_type")
        .or_else(|| prediction.text("post_type"))
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());
    if let Some(content_type) = ai_type {
        content.content_type = content_type;
    }

    const GATED_FIELDS: usize = 3;
    content.confidence = match accepted {
        GATED_FIELDS => ALL_FIELDS_CONFIDENCE,
        0 => BASELINE_CONFIDENCE,
        _ => SOME_FIELDS_CONFIDENCE,
    };
    content.fallback_used = accepted < GATED_FIELDS;
    content
}

pub async fn extract_platform(
    composer: &ContentComposer,
    platform: SupportedPlatform,
    req: &PlatformRequest,
) -> UnifiedContent {
    let baseline = build_baseline(platform, req);
    let inputs = prompt_inputs(platform, req);

    match composer.attempt(platform.signature(), &inputs).await {
        Ok(prediction) => {
            let content = merge_prediction(platform, req, &baseline, &prediction);
            info!(
                "platform_extracted: platform={}, confidence={}, fallback_used={}",
                content.platform, content.confidence, content.fallback_used
            );
            content
        }
        Err(reason) => {
            log_fallback("platform", &reason);
            baseline_content(platform, &baseline)
        }
    }
}
