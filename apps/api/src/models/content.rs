use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A scraped post as received by one request. Never stored.
#[derive(Debug, Clone, Default)]
pub struct ContentItem {
    pub raw_text: String,
    pub author: String,
    pub platform: String,
    pub title: Option<String>,
    pub image_count: u32,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleResult {
    pub title: String,
    pub is_valid: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub key_topics: Vec<String>,
    pub content_type: String,
    pub quality_score: f32,
    pub is_analytical: bool,
}

/// Abstract mood tag. The vocabulary is closed; anything else maps to the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Kinetic,
    Atmospheric,
    Minimalist,
    Raw,
    Nostalgic,
    Elegant,
    Chaotic,
    Ethereal,
    Tactile,
    Visceral,
    #[default]
    Contemplative,
    Playful,
    Precise,
    Organic,
    Geometric,
}

impl Vibe {
    pub const ALL: [Vibe; 15] = [
        Vibe::Kinetic,
        Vibe::Atmospheric,
        Vibe::Minimalist,
        Vibe::Raw,
        Vibe::Nostalgic,
        Vibe::Elegant,
        Vibe::Chaotic,
        Vibe::Ethereal,
        Vibe::Tactile,
        Vibe::Visceral,
        Vibe::Contemplative,
        Vibe::Playful,
        Vibe::Precise,
        Vibe::Organic,
        Vibe::Geometric,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vibe::Kinetic => "kinetic",
            Vibe::Atmospheric => "atmospheric",
            Vibe::Minimalist => "minimalist",
            Vibe::Raw => "raw",
            Vibe::Nostalgic => "nostalgic",
            Vibe::Elegant => "elegant",
            Vibe::Chaotic => "chaotic",
            Vibe::Ethereal => "ethereal",
            Vibe::Tactile => "tactile",
            Vibe::Visceral => "visceral",
            Vibe::Contemplative => "contemplative",
            Vibe::Playful => "playful",
            Vibe::Precise => "precise",
            Vibe::Organic => "organic",
            Vibe::Geometric => "geometric",
        }
    }

    /// Comma-separated vocabulary, for log and prompt text.
    pub fn vocabulary() -> String {
        Vibe::ALL
            .iter()
            .map(Vibe::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vibe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Vibe::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == needle)
            .ok_or_else(|| format!("'{s}' is not a known vibe"))
    }
}

/// Three-layer tag hierarchy: essence, subject, mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSet {
    pub primary: Vec<String>,
    pub contextual: Vec<String>,
    pub vibe: Vibe,
}
