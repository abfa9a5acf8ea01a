//! Pipeline error definitions.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors that terminate a single pipeline execution.
///
/// Every variant maps to exactly one status code and a JSON body. No variant
/// is retried.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Neither `url` nor `target` carried a non-empty value.
    #[error("missing 'url'")]
    MissingTarget,

    /// The target did not parse as an absolute URL.
    #[error("invalid URL")]
    InvalidUrl,

    /// The target parsed but its scheme is not http or https.
    #[error("only http(s) URLs allowed")]
    DisallowedScheme,

    /// The buffered upstream body exceeded the configured ceiling.
    #[error("too large")]
    BodyTooLarge { size: usize },

    /// Network, DNS, TLS or timeout failure talking to upstream.
    #[error("proxy error: {0}")]
    Upstream(String),
}

pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget
            | ProxyError::InvalidUrl
            | ProxyError::DisallowedScheme => StatusCode::BAD_REQUEST,
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON error body returned to the caller.
    pub fn body(&self) -> serde_json::Value {
        match self {
            ProxyError::MissingTarget => json!({ "error": "missing 'url'" }),
            ProxyError::InvalidUrl => json!({ "error": "invalid URL" }),
            ProxyError::DisallowedScheme => json!({ "error": "only http(s) URLs allowed" }),
            ProxyError::BodyTooLarge { size } => json!({ "error": "too large", "size": size }),
            ProxyError::Upstream(message) => {
                json!({ "error": "proxy error", "message": message })
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.body().to_string()).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}
