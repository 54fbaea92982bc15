use std::sync::Arc;

use crate::config::Config;
use crate::session::SessionController;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the live candidates, their timers and both providers.
    pub controller: Arc<SessionController>,
    pub config: Config,
}
