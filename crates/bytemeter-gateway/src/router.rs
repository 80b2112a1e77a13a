//! Axum router wiring.
//!
//! Demo routes sit behind the traffic layer; ops routes are merged in after it
//! so they are never metered.

use axum::{
    routing::{get, post},
    Router,
};

use bytemeter_core::error::Result;

use crate::meter::{TrafficLayer, TrafficReceiver};
use crate::{app_state::AppState, ops, services};

/// Build the app and the receiver its traffic records arrive on.
pub fn build_router(state: AppState) -> Result<(Router, TrafficReceiver<String>)> {
    let extractor = state.cfg().key.extractor()?;
    let (traffic, records) = TrafficLayer::from_config(extractor, &state.cfg().meter);

    let metered = Router::new()
        .route("/v1/echo", post(services::echo::echo_body))
        .route("/v1/echo/:n", get(services::echo::stream_bytes))
        .layer(traffic);

    let ops = Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .route("/v1/traffic", get(ops::traffic));

    Ok((metered.merge(ops).with_state(state), records))
}
