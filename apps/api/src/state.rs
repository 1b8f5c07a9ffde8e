use std::sync::Arc;

use crate::config::Config;
use crate::storage::ImageAttachments;
use crate::store::PortfolioStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Entity persistence. `PgStore` in production.
    pub store: Arc<dyn PortfolioStore>,
    pub attachments: ImageAttachments,
    pub config: Config,
}
