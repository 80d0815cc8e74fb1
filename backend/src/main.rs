// Gesture broadcast server: classifies streamed hand poses and fans gesture codes
// out over websockets.

use std::fs::File;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use gesture_broadcast::app::AppState;
use gesture_broadcast::config::Config;
use gesture_broadcast::http;
use gesture_broadcast::hub::Hub;
use gesture_broadcast::net::{advertised_urls, bind_listener};
use gesture_broadcast::source::ConfiguredSource;
use gesture_broadcast::tasks;
use gesture_core::CodeTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let codes = Arc::new(load_codes(&config)?);

    let listener = bind_listener(config.ws_addr)?;
    let local_addr = listener.local_addr().context("websocket listener has no address")?;
    for url in advertised_urls(local_addr) {
        info!(%url, "accepting subscribers");
    }

    let source = ConfiguredSource::open(&config.source).await?;
    info!(source = %source.describe(), "pose source ready");

    let hub = Arc::new(Hub::new(config.send_timeout, config.subscriber_buffer));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        tasks::shutdown_on_signal(tokio::signal::ctrl_c(), &signal_tx).await;
    });

    let app_state = AppState::new(hub.clone(), codes.clone(), shutdown_rx.clone());
    let server_shutdown = shutdown_tx.clone();
    let server = tokio::spawn(async move {
        let result = http::serve(listener, app_state, server_shutdown.subscribe()).await;
        server_shutdown.send_replace(true);
        result
    });

    let stats = tasks::run_stream(source, hub.clone(), codes, shutdown_rx).await;
    shutdown_tx.send_replace(true);
    info!(
        frames = stats.frames,
        skipped_frames = stats.skipped_frames,
        dropped_hands = stats.dropped_hands,
        messages = stats.messages,
        "stream stopped"
    );

    server.await.context("websocket server task panicked")??;
    let subscribers = hub.len().await;
    info!(subscribers, "server stopped");
    Ok(())
}

fn load_codes(config: &Config) -> anyhow::Result<CodeTable> {
    let Some(path) = config.codes_path.as_ref() else {
        return Ok(CodeTable::default());
    };
    let file = File::open(path)
        .with_context(|| format!("failed to open code table {}", path.display()))?;
    let table = CodeTable::from_csv_reader(file)
        .with_context(|| format!("invalid code table {}", path.display()))?;
    info!(path = %path.display(), "loaded gesture code overrides");
    Ok(table)
}
