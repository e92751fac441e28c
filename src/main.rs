use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use pantry_api::{
    config::Config,
    db,
    routes::{create_router, AppState},
    services::{
        clock::SystemClock,
        lists::ListService,
        sources::{
            postgres::{SqlEventStore, SqlMembershipView},
            snapshot::{self, MiningIndex},
        },
        suggestions::SuggestionEngine,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pantry_api=debug,info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::MIGRATOR.run(&pool).await?;

    // Load the mined statistics once at startup, then keep them fresh in
    // the background. A failed initial load starts the engine on the
    // popularity-less empty snapshot rather than refusing to boot.
    let mining = Arc::new(MiningIndex::new());
    if let Err(error) = mining.refresh(&pool).await {
        tracing::warn!(%error, "Initial mining snapshot load failed; starting empty");
    }
    snapshot::spawn_refresher(
        mining.clone(),
        pool.clone(),
        Duration::from_secs(config.mining_refresh_secs),
    );

    let engine = SuggestionEngine::new(
        Arc::new(SqlEventStore::new(pool.clone())),
        Arc::new(SqlMembershipView::new(pool.clone())),
        mining.clone(),
        mining,
        Arc::new(SystemClock),
    );

    let state = AppState {
        lists: ListService::new(pool),
        suggestions: Arc::new(engine),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
