//! bytemeter gateway
//!
//! - Metered demo routes: GET /v1/echo/:n, POST /v1/echo
//! - Key: configured request header (default `x-client-id`)
//! - Records drained into an in-process tally, exposed on /metrics and /v1/traffic

use tracing_subscriber::{fmt, EnvFilter};

use bytemeter_core::error::Result;
use bytemeter_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = config::path_from_env();
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.gateway.listen_addr()?;

    let state = app_state::AppState::new(cfg);
    let (app, records) = router::build_router(state.clone())?;
    tokio::spawn(state.tally().drain(records, state.metrics()));

    tracing::info!(%listen, config = %path, key_header = %state.cfg().key.header, "bytemeter-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("bytemeter-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed; shutting down");
        return;
    }
    tracing::info!("shutdown requested");
}
