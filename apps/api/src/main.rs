mod config;
mod db;
mod errors;
mod etl;
mod llm_client;
mod matching;
mod models;
mod planning;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::etl::pipeline::run_rebuild;
use crate::llm_client::LlmClient;
use crate::matching::classifier::ClassifierTables;
use crate::matching::scorer::{MatchEngine, MatchWeights, DEFAULT_MAX_RESULTS};
use crate::planning::report::{LlmReportGenerator, ReportGenerator, TemplateReportGenerator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting school-planning API v{}", env!("CARGO_PKG_VERSION"));

    let tables = load_classifier_tables(&config)?;

    // `api etl` rebuilds the corpus and exits; anything else serves.
    if std::env::args().nth(1).as_deref() == Some("etl") {
        return run_etl(&config, &tables).await;
    }

    // Initialize PostgreSQL and apply migrations
    let db = create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&db).await?;

    // Matching engine: default weights over the loaded classifier tables
    let engine = Arc::new(MatchEngine::new(
        MatchWeights::default(),
        tables,
        DEFAULT_MAX_RESULTS,
    ));

    // Report generator: LLM when an API key is configured, template otherwise
    let report_generator: Arc<dyn ReportGenerator> = match &config.llm_api_key {
        Some(api_key) => {
            let llm = LlmClient::new(
                config.llm_base_url.clone(),
                config.llm_model.clone(),
                api_key.clone(),
            );
            info!("LLM report generator initialized (model: {})", llm.model());
            Arc::new(LlmReportGenerator::new(llm))
        }
        None => {
            info!("No LLM_API_KEY set, using template report generator");
            Arc::new(TemplateReportGenerator)
        }
    };

    // Build app state
    let state = AppState {
        db,
        engine,
        report_generator,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Runs the batched corpus rebuild from the raw source store.
async fn run_etl(config: &Config, tables: &ClassifierTables) -> Result<()> {
    let source_url = config
        .source_database_url
        .as_deref()
        .context("SOURCE_DATABASE_URL is required for the etl subcommand")?;

    let source = create_pool(source_url).await?;
    let target = create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&target).await?;

    let report = run_rebuild(&source, &target, tables, config.etl_batch_size).await?;
    info!(
        processed = report.processed,
        rejected = report.rejected,
        failed = report.failed,
        "ETL run complete"
    );
    Ok(())
}

fn load_classifier_tables(config: &Config) -> Result<ClassifierTables> {
    match &config.classifier_tables_path {
        Some(path) => {
            info!("Loading classifier tables from {path}");
            ClassifierTables::from_json_file(path)
        }
        None => Ok(ClassifierTables::default()),
    }
}
