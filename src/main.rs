use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use linktrail::analytics::{ClickRecorder, InMemoryClickGuard, SystemClock};
use linktrail::api::{create_api_router, AppState};
use linktrail::config::{Config, DatabaseBackend};
use linktrail::links::LinkService;
use linktrail::redirect::{create_redirect_router, RedirectState};
use linktrail::shortener::ShortenerClient;
use linktrail::storage::{PostgresStorage, SqliteStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(
                SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(
                PostgresStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
    };

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    let shortener = config.shortener.as_ref().map(|s| {
        info!("URL shortener enabled: {}", s.endpoint);
        Arc::new(ShortenerClient::new(s.endpoint.clone()))
    });

    let links = Arc::new(LinkService::new(
        Arc::clone(&storage),
        shortener,
        config.public_base_url.clone(),
        config.api_base_url.clone(),
    ));

    let guard = Arc::new(InMemoryClickGuard::new(
        config.dedup.window_ms,
        config.dedup.max_age_ms,
        Box::new(SystemClock),
    ));
    let recorder = Arc::new(ClickRecorder::new(Arc::clone(&storage), guard));

    let api_router = create_api_router(Arc::new(AppState {
        links,
        storage: Arc::clone(&storage),
    }));
    let redirect_router = create_redirect_router(Arc::new(RedirectState { recorder }));

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("API server listening on http://{}", api_addr);

    let redirect_addr = format!(
        "{}:{}",
        config.redirect_server.host, config.redirect_server.port
    );
    let redirect_listener = tokio::net::TcpListener::bind(&redirect_addr).await?;
    info!("Redirect server listening on http://{}", redirect_addr);

    tokio::try_join!(
        axum::serve(api_listener, api_router),
        axum::serve(redirect_listener, redirect_router),
    )?;

    Ok(())
}
