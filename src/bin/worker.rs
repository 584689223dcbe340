use anyhow::Result;
use furwatch::{
    app_state::AppState,
    config::Config,
    fetcher::HttpFetcher,
    health,
    jobs::{PassStatus, UpdateSupervisor, Updater},
    notify::LogNotifier,
    repositories::{PgKnownEntryStore, UserRepository},
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database_url())
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let status = Arc::new(PassStatus::new());

    // Health endpoint runs beside the supervisor
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Health endpoint listening on {}", config.bind_addr());
    let app = health::router(AppState::new(pool.clone(), status.clone()));
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Health server stopped: {}", e);
        }
    });

    let updater = Updater::new(
        Arc::new(HttpFetcher),
        Arc::new(PgKnownEntryStore::new(pool.clone())),
        Arc::new(UserRepository::new(pool)),
        Arc::new(LogNotifier),
        &config,
    );

    let supervisor = UpdateSupervisor::new(updater, config.update_interval(), status);
    supervisor.run().await
}
