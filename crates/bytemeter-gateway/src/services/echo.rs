use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::stream;

/// Upper bound for `GET /v1/echo/:n`.
pub const MAX_ECHO_BYTES: usize = 16 << 20;
const CHUNK_BYTES: usize = 4096;

/// Stream `n` bytes of filler in fixed-size chunks (one write per chunk).
pub async fn stream_bytes(Path(n): Path<usize>) -> Response {
    if n > MAX_ECHO_BYTES {
        return (StatusCode::PAYLOAD_TOO_LARGE, "n too large").into_response();
    }

    let chunks = (0..n)
        .step_by(CHUNK_BYTES)
        .map(move |off| Ok::<_, Infallible>(Bytes::from(vec![b'x'; CHUNK_BYTES.min(n - off)])));

    Body::from_stream(stream::iter(chunks)).into_response()
}

/// Echo the request body back.
pub async fn echo_body(body: Bytes) -> Bytes {
    body
}
