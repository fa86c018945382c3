use std::sync::Arc;

use sqlx::PgPool;

use crate::matching::scorer::MatchEngine;
use crate::planning::report::ReportGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// The deterministic matching engine: weights + classifier tables.
    pub engine: Arc<MatchEngine>,
    /// Pluggable narrative backend. LLM when an API key is configured,
    /// template otherwise.
    pub report_generator: Arc<dyn ReportGenerator>,
}
