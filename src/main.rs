use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vroid_rss::app::AppState;
use vroid_rss::config::ConfigStore;
use vroid_rss::ui;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vroid_rss=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; any failure here ends the process
    let store = ConfigStore::from_env()?;
    let config = store.load()?;
    info!("Loaded {} feeds from {}", config.rss.len(), store.file().display());

    // The window owns the main thread; play cycles run on this runtime
    let runtime = tokio::runtime::Runtime::new()?;
    let state = AppState::new(store, config, runtime.handle().clone())?;

    ui::run(state).map_err(|e| anyhow::anyhow!("window failed: {}", e))?;

    Ok(())
}
