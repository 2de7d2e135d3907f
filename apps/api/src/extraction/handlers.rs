//! Axum route handlers for the extraction API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::extraction::assets::extract_assets;
use crate::extraction::platform::{extract_platform, PlatformRequest, SupportedPlatform};
use crate::extraction::summary::generate_summary;
use crate::extraction::tags::{generate_tags, TagsResult};
use crate::extraction::title::{extract_title, validate_title};
use crate::models::assets::{AssetResult, UnifiedContent};
use crate::models::content::{ContentItem, SummaryResult, TitleResult};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

fn default_image_count() -> u32 {
    1
}

fn default_expected_count() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    pub raw_content: String,
    pub author: String,
    pub platform: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateTitleRequest {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub original_content: String,
    #[serde(default)]
    pub platform: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub content: String,
    pub platform: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_image_count")]
    pub image_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub content: String,
    pub platform: String,
    #[serde(default)]
    pub author: String,
    pub image_url: Option<String>,
    pub title: Option<String>,
    #[serde(default = "default_image_count")]
    pub image_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct AssetsRequest {
    pub html_content: String,
    pub platform: String,
    #[serde(default = "default_expected_count")]
    pub expected_count: u32,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /extract/title
pub async fn handle_extract_title(
    State(state): State<AppState>,
    Json(request): Json<TitleRequest>,
) -> Result<Json<TitleResult>, AppError> {
    AppError::require("raw_content", &request.raw_content)?;
    AppError::require("platform", &request.platform)?;

    let item = ContentItem {
        raw_text: request.raw_content,
        author: request.author,
        platform: request.platform,
        ..Default::default()
    };

    Ok(Json(extract_title(&state.composer, &item).await))
}

/// POST /validate/title
///
/// A blank title is not rejected: it is reported as the `empty` issue and repaired.
pub async fn handle_validate_title(
    Json(request): Json<ValidateTitleRequest>,
) -> Result<Json<TitleResult>, AppError> {
    Ok(Json(validate_title(
        &request.title,
        &request.author,
        &request.original_content,
        &request.platform,
    )))
}

/// POST /generate/summary
pub async fn handle_generate_summary(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResult>, AppError> {
    AppError::require("content", &request.content)?;
    AppError::require("platform", &request.platform)?;

    let item = ContentItem {
        raw_text: request.content,
        author: request.author,
        platform: request.platform,
        title: non_blank(&request.title),
        image_count: request.image_count,
        image_url: None,
    };

    Ok(Json(generate_summary(&state.composer, &item).await))
}

/// POST /generate/tags
pub async fn handle_generate_tags(
    State(state): State<AppState>,
    Json(request): Json<TagsRequest>,
) -> Result<Json<TagsResult>, AppError> {
    AppError::require("content", &request.content)?;
    AppError::require("platform", &request.platform)?;

    let item = ContentItem {
        raw_text: request.content,
        author: request.author,
        platform: request.platform,
        title: request.title.as_deref().and_then(non_blank),
        image_count: request.image_count,
        image_url: request.image_url.as_deref().and_then(non_blank),
    };

    Ok(Json(generate_tags(&state.composer, &item).await))
}

/// POST /extract/assets
pub async fn handle_extract_assets(
    State(state): State<AppState>,
    Json(request): Json<AssetsRequest>,
) -> Result<Json<AssetResult>, AppError> {
    AppError::require("html_content", &request.html_content)?;
    AppError::require("platform", &request.platform)?;

    Ok(Json(
        extract_assets(
            &state.composer,
            &request.html_content,
            request.platform.trim(),
            request.expected_count,
        )
        .await,
    ))
}

/// POST /extract/platform
pub async fn handle_extract_platform(
    State(state): State<AppState>,
    Json(request): Json<PlatformRequest>,
) -> Result<Json<UnifiedContent>, AppError> {
    AppError::require("platform", &request.platform)?;
    AppError::require("url", &request.url)?;

    let platform: SupportedPlatform = request.platform.parse().map_err(AppError::Validation)?;
    if !request.has_source() {
        return Err(AppError::Validation(
            "one of raw_html, raw_caption or json_data is required".to_string(),
        ));
    }

    Ok(Json(extract_platform(&state.composer, platform, &request).await))
}
