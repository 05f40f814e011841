use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::search::SearchIndex;
use crate::storage::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Revoked-token store backing logout.
    pub redis: RedisClient,
    pub resumes: Arc<dyn ResumeStore>,
    pub search: SearchIndex,
    pub config: Config,
}
