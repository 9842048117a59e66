use axum::{body::Body, extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

/// Header carrying the correlation id, in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied id that is echoed back as-is
const MAX_FORWARDED_LEN: usize = 64;

/// Correlation id of one HTTP exchange, stored in the request extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuses an id set by an upstream proxy when it is short printable ASCII
    pub fn forwarded(value: &str) -> Option<Self> {
        let value = value.trim();
        let acceptable = !value.is_empty()
            && value.len() <= MAX_FORWARDED_LEN
            && value.bytes().all(|b| b.is_ascii_graphic());
        acceptable.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tags every request with a [`RequestId`] and echoes it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(RequestId::forwarded)
        .unwrap_or_else(RequestId::generate);

    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Span for `TraceLayer`, carrying the request id set by [`request_id_middleware`]
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(RequestId::as_str)
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
