//! Response handling and transformation.
//!
//! # Responsibilities
//! - Put a `RelayResponse` on the wire
//! - Decode base64 bodies back to raw bytes
//! - Let the server frame the body itself
//!
//! # Design Decisions
//! - Upstream's `content-length` describes the original body, which the
//!   rewriter may have changed, so it is never copied
//! - A base64 body that fails to decode is a bug, reported as 500

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::pipeline::{ProxyError, RelayBody, RelayResponse};

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            RelayBody::Text(text) => Body::from(text),
            RelayBody::Base64(encoded) => match STANDARD.decode(encoded) {
                Ok(bytes) => Body::from(bytes),
                Err(e) => {
                    return ProxyError::Upstream(format!("base64 decode: {}", e)).into_response();
                }
            },
        };

        let mut headers = self.headers;
        headers.remove(header::CONTENT_LENGTH);

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

/// Plain-text response for the health route.
pub fn healthy() -> Response {
    (StatusCode::OK, "ok").into_response()
}
