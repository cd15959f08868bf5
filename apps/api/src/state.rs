use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::screening::similarity::SimilarityScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Process-wide similarity scorer, chosen once at startup by `select_scorer`.
    pub scorer: Arc<dyn SimilarityScorer>,
}
