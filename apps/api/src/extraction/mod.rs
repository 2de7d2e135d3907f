// Extraction features: title, summary, tags, assets, unified platform content.
// Every feature makes one bounded LLM attempt through the composer and falls
// back to the deterministic rules in `quality` on any failure.

pub mod assets;
pub mod composer;
pub mod handlers;
pub mod platform;
pub mod prompts;
pub mod summary;
pub mod tags;
pub mod title;
