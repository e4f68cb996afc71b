//! Middleware for modifying requests and responses.

use super::error::{ApiError, ClientError, InternalError};
use axum::{body::Body, middleware::Next, response::Response};
use bytes::Bytes;
use http::Request;
use http_body_util::BodyExt;
use hyper::body::Body as _;
use tower_http::trace::MakeSpan;

static X_REQUEST_ID: &str = "x-request-id";

/// Creates a span for each request, tagged with its request id.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MakeRequestIdSpan;

impl<B> MakeSpan<B> for MakeRequestIdSpan {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|id| id.to_str().ok())
            .unwrap_or("unknown");
        tracing::info_span!(
            "request",
            request_id = request_id,
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
        )
    }
}

/// The maximum size of a body to log.
const MAX_BODY_SIZE: u64 = 8192;

/// Traces small request and response bodies.
pub(crate) async fn log_request_response(
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();
    let req = if fits_in_log(&body) {
        let bytes = buffer_and_print("Request", body)
            .await
            .map_err(|e| ClientError::BadRequest(format!("failed to read request body: {e}")))?;
        Request::from_parts(parts, Body::from(bytes))
    } else {
        Request::from_parts(parts, body)
    };

    let res = next.run(req).await;

    let (parts, body) = res.into_parts();
    let res = if fits_in_log(&body) {
        let bytes = buffer_and_print("Response", body)
            .await
            .map_err(|e| InternalError::Other(format!("failed to read response body: {e}")))?;
        Response::from_parts(parts, Body::from(bytes))
    } else {
        Response::from_parts(parts, body)
    };

    Ok(res)
}

fn fits_in_log(body: &Body) -> bool {
    body.size_hint()
        .upper()
        .is_some_and(|n| n <= MAX_BODY_SIZE)
}

/// Read the entire body stream and store it in memory.
async fn buffer_and_print(direction: &str, body: Body) -> Result<Bytes, axum::Error> {
    let bytes = body.collect().await?.to_bytes();

    if let Ok(body) = std::str::from_utf8(&bytes) {
        tracing::trace!("{} body = {:?}", direction, body);
    }

    Ok(bytes)
}
