use std::sync::Arc;

use tracing::info;

use indicator_upload::application::CatalogService;
use indicator_upload::infrastructure::config::AppConfig;
use indicator_upload::infrastructure::db::{registry, YearRegistry};
use indicator_upload::infrastructure::storage::FileStore;
use indicator_upload::interfaces::http::{start_server, AppState};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let config = AppConfig::load().map_err(|e| std::io::Error::other(e.to_string()))?;

    let state = Arc::new(AppState {
        store: FileStore::new(),
        catalog: CatalogService::new(registry::catalog_pool(&config.catalog)),
        registry: YearRegistry::from_config(&config),
    });

    info!(
        "Listening on {}:{} ({} year database(s) configured)",
        config.server.bind,
        config.server.port,
        state.registry.len()
    );

    start_server(state, &config.server)?.await
}
