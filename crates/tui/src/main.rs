mod app;

use std::fs::{self, OpenOptions};

use anyhow::Result;
use tracing_subscriber::{prelude::*, EnvFilter};

use peloton_core::{
    config::{self, AppConfig},
    feed::DataFeed,
    store::StateStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let feed = DataFeed::new(config.clone());
    let outcome = feed.refresh().await;

    let store = StateStore::new(config.data_dir.clone());
    let mut registry = store.load_or_default();
    registry.reconcile(&outcome.catalog);

    let mut app = app::PelotonApp::new(config, feed, store, registry, outcome);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = dirs::state_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("peloton")
        .join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("peloton.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
