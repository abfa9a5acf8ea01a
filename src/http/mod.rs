//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → pipeline (validate, fetch, classify, rewrite, sanitize)
//!     → response.rs (decode base64, re-frame body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ProxyRequestId, RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer, HEALTH_PATH};
