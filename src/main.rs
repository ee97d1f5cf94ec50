//! Podium Timer - A presentation timer that drives a PDF slide viewer
//!
//! This is the main entry point for the podium-timer application.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use podium_timer::{
    api::create_router,
    config::Config,
    document::PdfOutlineBackend,
    state::AppState,
    tasks::Presenter,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("podium_timer={},tower_http=info", config.log_level()))
        .init();

    let timer_config = config.timer_config().context("invalid timer configuration")?;
    let bindings = config.key_bindings()?;
    let container = config.container().context("invalid viewport size")?;

    info!("Starting podium-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, total={}s, countdown={}",
        config.host,
        config.port,
        timer_config.total_duration_seconds,
        if timer_config.countdown_enabled {
            format!("{}s", timer_config.countdown_seconds)
        } else {
            "off".to_string()
        }
    );

    // Start the presenter task that owns all presentation state
    let (presenter, handle) = Presenter::new(
        timer_config,
        bindings,
        Arc::new(PdfOutlineBackend),
        container,
    );
    let presenter_task = tokio::spawn(presenter.run());

    // Create application state and HTTP router
    let state = Arc::new(AppState::new(handle, config.host.clone(), config.port));
    let app = create_router(state, config.max_upload_bytes());

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /document         - Load a PDF (Content-Type: application/pdf)");
    info!("  POST /key              - Route a key press");
    info!("  POST /page/:page       - Jump to a page");
    info!("  POST /timer/:action    - start | pause | resume | reset | toggle");
    info!("  GET  /config, PUT /config - Timer settings");
    info!("  GET  /events           - Projection and notification stream");
    info!("  GET  /status           - Check current status");
    info!("  GET  /health           - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // open connections may still hold command senders
    presenter_task.abort();

    info!("Server shutdown complete");
    Ok(())
}
