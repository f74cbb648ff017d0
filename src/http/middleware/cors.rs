//! CORS headers for browser callers.
//!
//! Every response, including errors and preflights, carries the same three
//! headers. Preflight requests themselves are answered by the router.

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue, Request,
    },
    middleware::Next,
    response::Response,
};

pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";

/// Header values computed once at startup.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    origin: HeaderValue,
}

impl CorsHeaders {
    /// Use `origin` for `Access-Control-Allow-Origin`, falling back to `*`
    /// when it is not a valid header value.
    pub fn new(origin: &str) -> Self {
        let origin = HeaderValue::from_str(origin).unwrap_or_else(|_| {
            tracing::warn!(origin = %origin, "Invalid allowed origin, using '*'");
            HeaderValue::from_static("*")
        });
        Self { origin }
    }
}

pub async fn cors_middleware(
    State(cors): State<CorsHeaders>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, cors.origin.clone());
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    response
}
