use serde::{Deserialize, Serialize};

/// Quality tier assigned to an accepted image URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Full,
    Medium,
    Thumbnail,
    Upgraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality_tier: QualityTier,
    /// Where the URL came from: "carousel", "scan", "llm".
    pub quality_source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetResult {
    pub images: Vec<ImageAsset>,
    pub primary_image: Option<String>,
    pub is_carousel: bool,
    pub total_images: usize,
    pub extraction_confidence: f32,
    pub fallback_used: bool,
}

/// Cross-platform result of the unified extraction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedContent {
    pub platform: String,
    pub title: String,
    pub author: String,
    pub summary: String,
    pub content_type: String,
    pub images: Vec<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub confidence: f32,
    pub fallback_used: bool,
}
