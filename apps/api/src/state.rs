use std::sync::Arc;

use crate::config::Config;
use crate::extraction::composer::ContentComposer;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub composer: Arc<ContentComposer>,
}
