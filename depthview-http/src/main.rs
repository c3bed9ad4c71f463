use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use depthview_config::Settings;
use depthview_core::FrameService;
use depthview_store::{FrameStore, SqliteFrameStore};

mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    let sqlite = Arc::new(
        SqliteFrameStore::connect(&settings.database_url, settings.max_connections).await?,
    );
    sqlite.init_schema().await?;
    let store: Arc<dyn FrameStore> = sqlite.clone();

    let service = Arc::new(FrameService::new(store));
    let app = routes::app(service);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    info!("depthview HTTP server listening on {}", settings.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sqlite.close().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
}
