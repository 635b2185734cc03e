mod app;
mod chunker;
mod config;
mod database;
mod embedding;
mod error;
mod matching;
mod models;
mod routes;
mod vector_store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::AppState;
use config::{config_path, load_settings_from_path};
use database::postgres::{connect_pool, PostgresDatabase};
use embedding::build_embedding_model;
use matching::pipeline::MatchPipeline;
use vector_store::pgvector::PGVectorStore;
use vector_store::VectorStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting jobmatch-fast server...");

    // Load configuration.
    let path = config_path();
    let settings = load_settings_from_path(&path)
        .with_context(|| format!("failed to load configuration from {path}"))?;
    info!(
        "Configuration loaded: environment={}, host={}, port={}, provider={}",
        settings.environment, settings.host, settings.port, settings.embedding_provider
    );

    // Shared pool for owner rows and embeddings.
    let pool = connect_pool(
        &settings.postgres_uri,
        settings.db_pool_size,
        settings.db_acquire_timeout_secs,
    )
    .await
    .context("failed to connect to PostgreSQL")?;

    let vector_store = Arc::new(PGVectorStore::new(pool.clone()));
    vector_store.initialize().await?;
    info!("PGVector store initialized");

    let database = Arc::new(PostgresDatabase::new(pool));

    // Initialize embedding model.
    let embedding_model = build_embedding_model(&settings)?;
    info!(
        "Embedding model initialized: provider={}, dimensions={:?}",
        embedding_model.provider_name(),
        embedding_model.expected_dimensions()
    );

    let pipeline = MatchPipeline::new(embedding_model, vector_store, &settings);

    // Build application state.
    let state = Arc::new(AppState {
        settings: settings.clone(),
        pipeline,
        database,
    });

    // Build router.
    let app = routes::build_router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    // Start server.
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
