//! Operational HTTP endpoints (never metered).
//!
//! - `/healthz`     : liveness
//! - `/metrics`     : Prometheus text format
//! - `/v1/traffic`  : per-key totals as JSON

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::app_state::AppState;
use crate::obs::TallyEntry;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let extra = state.metrics_extra();
    let body = state.metrics().render(&extra);

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub async fn traffic(State(state): State<AppState>) -> Json<Vec<TallyEntry>> {
    Json(state.tally().snapshot())
}
