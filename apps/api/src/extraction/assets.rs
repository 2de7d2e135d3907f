//! Image asset extraction from scraped HTML or embedded JSON.
//!
//! URL assessment is deterministic: placeholders are dropped, thumbnails are
//! upgraded when the CDN allows it, and everything else is tiered by the size
//! marker in the URL.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::info;

use crate::extraction::composer::{log_fallback, ContentComposer, FallbackReason};
use crate::extraction::prompts::ASSET_EXTRACTION;
use crate::models::assets::{AssetResult, ImageAsset, QualityTier};
use crate::quality::gate::Rejection;
use crate::quality::truncator::take_chars;

/// Markup chars sent to the LLM.
const ASSET_CONTENT_CHARS: usize = 2000;
const DEFAULT_AI_ASSET_CONFIDENCE: f32 = 0.85;
const FALLBACK_COMPLETE_CONFIDENCE: f32 = 0.6;
const FALLBACK_PARTIAL_CONFIDENCE: f32 = 0.3;
/// Largest edge still considered a thumbnail.
const THUMBNAIL_MAX_EDGE: u32 = 320;
const FULL_RES_MIN_EDGE: u32 = 1080;

const IMAGE_HOSTS: &[&str] = &[
    "cdninstagram.com",
    "fbcdn.net",
    "pbs.twimg.com",
    "i.redd.it",
    "preview.redd.it",
    "external-preview.redd.it",
    "i.imgur.com",
];
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif", ".heic"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".m3u8", ".mov", ".webm"];
const PLACEHOLDER_MARKERS: &[&str] = &[
    "static.cdninstagram.com",
    "/static/",
    "rsrc.php",
    "/emoji/",
    "/profile_images/",
    "thumbs.redditmedia.com",
];

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>()\\]+"#).expect("valid url regex"));
static SIZE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^0-9A-Za-z])[sp]?(\d{2,4})x(\d{2,4})(?:[^0-9A-Za-z]|$)")
        .expect("valid size marker regex")
});
static SIZE_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[sp]?\d{2,4}x\d{2,4}$").expect("valid size segment regex"));
static TWITTER_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([?&])name=(?:small|thumb|medium|\d{2,4}x\d{2,4})").expect("valid name regex")
});

/// Undoes the escaping found in inline JSON and HTML attributes.
pub fn unescape(text: &str) -> String {
    text.replace("\\u0026", "&")
        .replace("\\/", "/")
        .replace("&amp;", "&")
}

fn path_of(url: &str) -> &str {
    url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url)
}

fn looks_like_image(url: &str) -> bool {
    let path = path_of(url).to_lowercase();
    if VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }
    IMAGE_HOSTS.iter().any(|host| path.contains(host))
        || IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn size_marker(url: &str) -> Option<(u32, u32)> {
    let caps = SIZE_MARKER_RE.captures(url)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Full-resolution variant of a known thumbnail URL.
fn upgrade(url: &str) -> Option<String> {
    if url.contains("pbs.twimg.com") && TWITTER_NAME_RE.is_match(url) {
        return Some(TWITTER_NAME_RE.replace(url, "${1}name=orig").into_owned());
    }
    if url.contains("://preview.redd.it/") {
        return Some(path_of(url).replacen("://preview.redd.it/", "://i.redd.it/", 1));
    }
    None
}

fn size_tier(size: Option<(u32, u32)>) -> QualityTier {
    match size {
        None => QualityTier::Full,
        Some((w, h)) if w.max(h) <= THUMBNAIL_MAX_EDGE => QualityTier::Thumbnail,
        Some((w, h)) if w.max(h) >= FULL_RES_MIN_EDGE => QualityTier::Full,
        Some(_) => QualityTier::Medium,
    }
}

/// Accepts, upgrades or rejects a single image URL.
pub fn assess_image_url(url: &str, source: &str) -> Option<ImageAsset> {
    let url = url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return None;
    }
    let lower = url.to_lowercase();
    if PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m)) {
        return None;
    }

    if let Some(upgraded) = upgrade(url) {
        return Some(ImageAsset {
            url: upgraded,
            width: None,
            height: None,
            quality_tier: QualityTier::Upgraded,
            quality_source: source.to_string(),
        });
    }

    let size = size_marker(url);
    let quality_tier = size_tier(size);
    if quality_tier == QualityTier::Thumbnail {
        return None;
    }

    Some(ImageAsset {
        url: url.to_string(),
        width: size.map(|(w, _)| w),
        height: size.map(|(_, h)| h),
        quality_tier,
        quality_source: source.to_string(),
    })
}

/// Image-looking URLs in order of first appearance.
pub fn scan_image_urls(text: &str) -> Vec<String> {
    let unescaped = unescape(text);
    let mut urls: Vec<String> = Vec::new();
    for m in URL_RE.find_iter(&unescaped) {
        let url = m.as_str().trim_end_matches(|c: char| matches!(c, ',' | ';' | '.' | ']' | '}'));
        if looks_like_image(url) && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Same image at different sizes shares a key: no query, no size segments.
fn dedup_key(url: &str) -> String {
    path_of(url)
        .split('/')
        .filter(|segment| !SIZE_SEGMENT_RE.is_match(segment))
        .collect::<Vec<_>>()
        .join("/")
}

fn resolution_rank(asset: &ImageAsset) -> (u8, u32) {
    let tier = match asset.quality_tier {
        QualityTier::Full | QualityTier::Upgraded => 2,
        QualityTier::Medium => 1,
        QualityTier::Thumbnail => 0,
    };
    (tier, asset.width.unwrap_or(u32::MAX))
}

/// Keeps first-seen order, replacing an entry when a higher-res copy shows up.
fn dedup_assets(assets: Vec<ImageAsset>) -> Vec<ImageAsset> {
    let mut kept: Vec<(String, ImageAsset)> = Vec::new();
    for asset in assets {
        let key = dedup_key(&asset.url);
        match kept.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                if resolution_rank(&asset) > resolution_rank(existing) {
                    *existing = asset;
                }
            }
            None => kept.push((key, asset)),
        }
    }
    kept.into_iter().map(|(_, asset)| asset).collect()
}

/// Depth-first search for the first non-null value under `key`.
pub fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .filter(|v| !v.is_null())
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarouselSlide {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub is_video: bool,
}

fn as_u32(value: Option<&Value>) -> Option<u32> {
    value?.as_u64().and_then(|n| u32::try_from(n).ok())
}

/// Slides of an Instagram sidecar (`edge_sidecar_to_children.edges[].node`).
pub fn parse_carousel(json: &Value) -> Vec<CarouselSlide> {
    let Some(edges) = find_key(json, "edge_sidecar_to_children")
        .and_then(|sidecar| sidecar.get("edges"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    edges
        .iter()
        .filter_map(|edge| {
            let node = edge.get("node")?;
            let url = node.get("display_url")?.as_str()?;
            let dimensions = node.get("dimensions");
            Some(CarouselSlide {
                url: unescape(url),
                width: as_u32(dimensions.and_then(|d| d.get("width"))),
                height: as_u32(dimensions.and_then(|d| d.get("height"))),
                is_video: node.get("is_video").and_then(Value::as_bool).unwrap_or(false),
            })
        })
        .collect()
}

fn carousel_assets(slides: Vec<CarouselSlide>) -> Vec<ImageAsset> {
    slides
        .into_iter()
        .filter_map(|slide| {
            let mut asset = assess_image_url(&slide.url, "carousel")?;
            if slide.width.is_some() {
                asset.width = slide.width;
                asset.height = slide.height;
            }
            Some(asset)
        })
        .collect()
}

fn build_result(
    images: Vec<ImageAsset>,
    primary_image: Option<String>,
    is_carousel: bool,
    extraction_confidence: f32,
    fallback_used: bool,
) -> AssetResult {
    let primary_image = primary_image.or_else(|| images.first().map(|i| i.url.clone()));
    AssetResult {
        total_images: images.len(),
        images,
        primary_image,
        is_carousel,
        extraction_confidence,
        fallback_used,
    }
}

/// Regex/JSON extraction without the LLM.
pub fn fallback_assets(html: &str, platform: &str, expected_count: u32) -> AssetResult {
    let slides = serde_json::from_str::<Value>(html.trim())
        .map(|json| parse_carousel(&json))
        .unwrap_or_default();
    let video_slides = slides.iter().filter(|s| s.is_video).count();
    let from_carousel = carousel_assets(slides);

    let assets = if from_carousel.is_empty() {
        scan_image_urls(html)
            .iter()
            .filter_map(|url| assess_image_url(url, "scan"))
            .collect()
    } else {
        from_carousel
    };
    let images = dedup_assets(assets);

    let expected = expected_count.max(1) as usize;
    let confidence = if images.len() >= expected {
        FALLBACK_COMPLETE_CONFIDENCE
    } else {
        FALLBACK_PARTIAL_CONFIDENCE
    };
    info!(
        "fallback_assets: platform={}, found={}, expected={}, video_slides={}",
        platform,
        images.len(),
        expected,
        video_slides
    );

    let is_carousel = images.len() > 1 || expected_count > 1;
    build_result(images, None, is_carousel, confidence, true)
}

pub async fn extract_assets(
    composer: &ContentComposer,
    html: &str,
    platform: &str,
    expected_count: u32,
) -> AssetResult {
    match ai_assets(composer, html, platform, expected_count).await {
        Ok(result) => {
            info!("ai_assets_extracted: {} images", result.total_images);
            result
        }
        Err(reason) => {
            log_fallback("assets", &reason);
            fallback_assets(html, platform, expected_count)
        }
    }
}

fn record_dimension(record: &Map<String, Value>, key: &str) -> Option<u32> {
    match record.get(key)? {
        Value::String(s) => s.trim().parse().ok(),
        other => as_u32(Some(other)),
    }
}

async fn ai_assets(
    composer: &ContentComposer,
    html: &str,
    platform: &str,
    expected_count: u32,
) -> Result<AssetResult, FallbackReason> {
    let (content, _) = take_chars(html, ASSET_CONTENT_CHARS);
    let prediction = composer
        .attempt(
            &ASSET_EXTRACTION,
            &[
                ("html_content", content.to_string()),
                ("platform", platform.to_string()),
                ("expected_count", expected_count.to_string()),
            ],
        )
        .await?;

    // Only URLs that literally occur in the input are trusted.
    let source = unescape(html);
    let assets = prediction
        .records("images")
        .iter()
        .filter_map(|record| {
            let url = unescape(record.get("url")?.as_str()?.trim());
            if !source.contains(&url) {
                return None;
            }
            let mut asset = assess_image_url(&url, "llm")?;
            if let Some(width) = record_dimension(record, "width") {
                asset.width = Some(width);
                asset.height = record_dimension(record, "height");
            }
            Some(asset)
        })
        .collect();
    let images = dedup_assets(assets);

    if images.is_empty() {
        return Err(Rejection("no valid image URLs in LLM output".to_string()).into());
    }

    let primary_image = prediction
        .text("primary_image")
        .map(|p| unescape(p.trim()))
        .and_then(|p| assess_image_url(&p, "llm"))
        .map(|asset| asset.url)
        .filter(|url| images.iter().any(|i| i.url == *url));

    let is_carousel = prediction.flag("is_carousel").unwrap_or(false)
        || images.len() > 1
        || expected_count > 1;

    let confidence = prediction
        .number("extraction_confidence")
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0) as f32)
        .unwrap_or(DEFAULT_AI_ASSET_CONFIDENCE);

    Ok(build_result(images, primary_image, is_carousel, confidence, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::llm_client::testing::{Script, ScriptedGenerator};
    use crate::llm_client::Generator;

    const IG_FULL: &str = "https://scontent-lax3-1.cdninstagram.com/v/t51/123_n.jpg?stp=dst-jpg_e35&_nc_ht=x";
    const IG_MEDIUM: &str = "https://scontent-lax3-1.cdninstagram.com/v/t51/s640x640/123_n.jpg";

    fn composer(script: Script) -> ContentComposer {
        let generator: Arc<dyn Generator> = Arc::new(ScriptedGenerator::new(script));
        ContentComposer::new(Some(generator), Duration::from_secs(5))
    }

    fn recording_composer(script: Script) -> (ContentComposer, Arc<ScriptedGenerator>) {
        let generator = Arc::new(ScriptedGenerator::new(script));
        let dyn_generator: Arc<dyn Generator> = generator.clone();
        (
            ContentComposer::new(Some(dyn_generator), Duration::from_secs(5)),
            generator,
        )
    }

    #[test]
    fn test_placeholders_rejected() {
        assert!(assess_image_url("https://static.cdninstagram.com/rsrc.php/v3/logo.png", "scan").is_none());
        assert!(assess_image_url("https://example.com/static/img/blank.gif", "scan").is_none());
        assert!(assess_image_url("not a url", "scan").is_none());
    }

    #[test]
    fn test_twitter_thumbnail_upgraded() {
        let asset =
            assess_image_url("https://pbs.twimg.com/media/FxAbc?format=jpg&name=small", "scan").unwrap();
        assert_eq!(asset.url, "https://pbs.twimg.com/media/FxAbc?format=jpg&name=orig");
        assert_eq!(asset.quality_tier, QualityTier::Upgraded);
    }

    #[test]
    fn test_reddit_preview_upgraded() {
        let asset = assess_image_url(
            "https://preview.redd.it/abc123.jpg?width=640&crop=smart&auto=webp&s=xyz",
            "scan",
        )
        .unwrap();
        assert_eq!(asset.url, "https://i.redd.it/abc123.jpg");
        assert_eq!(asset.quality_tier, QualityTier::Upgraded);
    }

    #[test]
    fn test_size_tiers() {
        assert!(assess_image_url("https://scontent.cdninstagram.com/v/t51/s150x150/1_n.jpg", "scan").is_none());

        let full = assess_image_url("https://scontent.cdninstagram.com/v/t51/p1080x1080/1_n.jpg", "scan").unwrap();
        assert_eq!(full.quality_tier, QualityTier::Full);
        assert_eq!((full.width, full.height), (Some(1080), Some(1080)));

        let medium = assess_image_url(IG_MEDIUM, "scan").unwrap();
        assert_eq!(medium.quality_tier, QualityTier::Medium);
        assert_eq!(medium.width, Some(640));

        let plain = assess_image_url("https://i.redd.it/xyz.png", "scan").unwrap();
        assert_eq!(plain.quality_tier, QualityTier::Full);
        assert_eq!(plain.width, None);
    }

    #[test]
    fn test_scan_unescapes_and_filters() {
        let html = r#"{"display_url":"https:\/\/scontent-lax3-1.cdninstagram.com\/v\/t51\/123_n.jpg?stp=dst-jpg_e35&_nc_ht=x","video":"https:\/\/video.cdninstagram.com\/v.mp4","link":"https:\/\/example.com\/about"}"#;
        assert_eq!(scan_image_urls(html), vec![IG_FULL]);
    }

    #[test]
    fn test_dedup_keeps_higher_resolution() {
        let assets = vec![
            assess_image_url(IG_MEDIUM, "scan").unwrap(),
            assess_image_url(IG_FULL, "scan").unwrap(),
            assess_image_url("https://i.redd.it/other.jpg", "scan").unwrap(),
        ];
        let kept = dedup_assets(assets);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].url, IG_FULL);
        assert_eq!(kept[1].url, "https://i.redd.it/other.jpg");
    }

    #[test]
    fn test_find_key_depth_first() {
        let json = json!({"graphql": {"shortcode_media": {"owner": {"username": "ana"}}}, "username": null});
        assert_eq!(find_key(&json, "username"), Some(&json!("ana")));
        assert_eq!(find_key(&json, "missing"), None);
    }

    #[test]
    fn test_parse_carousel() {
        let json = json!({"shortcode_media": {"edge_sidecar_to_children": {"edges": [
            {"node": {"display_url": "https://scontent.cdninstagram.com/v/a_n.jpg", "dimensions": {"width": 1080, "height": 1350}, "is_video": false}},
            {"node": {"display_url": "https://scontent.cdninstagram.com/v/b_n.jpg", "is_video": true}},
            {"node": {"id": "3"}}
        ]}}});
        let slides = parse_carousel(&json);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].width, Some(1080));
        assert_eq!(slides[0].height, Some(1350));
        assert!(slides[1].is_video);
    }

    #[test]
    fn test_fallback_from_carousel_json() {
        let html = json!({"edge_sidecar_to_children": {"edges": [
            {"node": {"display_url": "https://scontent.cdninstagram.com/v/a_n.jpg"}},
            {"node": {"display_url": "https://scontent.cdninstagram.com/v/b_n.jpg"}}
        ]}})
        .to_string();
        let result = fallback_assets(&html, "instagram", 2);
        assert_eq!(result.total_images, 2);
        assert!(result.is_carousel);
        assert!(result.fallback_used);
        assert_eq!(result.extraction_confidence, FALLBACK_COMPLETE_CONFIDENCE);
        assert_eq!(result.primary_image.as_deref(), Some("https://scontent.cdninstagram.com/v/a_n.jpg"));
        assert!(result.images.iter().all(|i| i.quality_source == "carousel"));
    }

    #[test]
    fn test_fallback_with_missing_images() {
        let result = fallback_assets("<html><p>nothing here</p></html>", "instagram", 3);
        assert_eq!(result.total_images, 0);
        assert!(result.is_carousel);
        assert_eq!(result.primary_image, None);
        assert_eq!(result.extraction_confidence, FALLBACK_PARTIAL_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_ai_assets_only_trust_urls_in_source() {
        let html = format!(r#"<img src="{IG_FULL}"><img src="https://i.redd.it/two.jpg">"#);
        let composer = composer(Script::Reply(json!({
            "images": [
                {"url": IG_FULL, "width": "1080", "height": 1080},
                "https://i.redd.it/two.jpg",
                "https://made.up/hallucinated.jpg"
            ],
            "primary_image": "https://i.redd.it/two.jpg",
            "is_carousel": "false",
            "extraction_confidence": 1.7
        })));

        let result = extract_assets(&composer, &html, "instagram", 1).await;

        assert!(!result.fallback_used);
        assert_eq!(result.total_images, 2);
        assert_eq!(result.images[0].width, Some(1080));
        assert_eq!(result.images[0].quality_source, "llm");
        assert_eq!(result.primary_image.as_deref(), Some("https://i.redd.it/two.jpg"));
        assert!(result.is_carousel);
        assert_eq!(result.extraction_confidence, 1.0);
    }

    #[tokio::test]
    async fn test_ai_assets_without_valid_urls_fall_back() {
        let html = format!(r#"<img src="{IG_FULL}">"#);
        let composer = composer(Script::Reply(json!({"images": ["https://made.up/x.jpg"]})));
        let result = extract_assets(&composer, &html, "instagram", 1).await;
        assert!(result.fallback_used);
        assert_eq!(result.images.len(), 1);
        assert_eq!(result.images[0].url, IG_FULL);
    }

    #[tokio::test]
    async fn test_ai_confidence_defaults() {
        let html = "https://i.redd.it/one.jpg";
        let composer = composer(Script::Reply(json!({"images": ["https://i.redd.it/one.jpg"]})));
        let result = extract_assets(&composer, html, "reddit", 1).await;
        assert_eq!(result.extraction_confidence, DEFAULT_AI_ASSET_CONFIDENCE);
        assert!(!result.is_carousel);
    }

    #[tokio::test]
    async fn test_html_is_truncated_for_llm() {
        let (composer, generator) = recording_composer(Script::Reply(json!({"images": []})));
        let html = format!("{}<img src=\"https://i.redd.it/late.jpg\">", "<div></div>".repeat(500));
        let result = extract_assets(&composer, &html, "reddit", 1).await;

        assert_eq!(
            generator.input("html_content").unwrap().chars().count(),
            ASSET_CONTENT_CHARS
        );
        assert_eq!(generator.input("expected_count").as_deref(), Some("1"));
        // The scan still sees the whole document.
        assert_eq!(result.images[0].url, "https://i.redd.it/late.jpg");
    }
}
