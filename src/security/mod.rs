//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request:
//!     → headers.rs (allow-list user-agent and accept)
//!
//! Upstream response:
//!     → limits.rs (reject bodies over the ceiling)
//!     → headers.rs (strip hop-by-hop and set-cookie)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any limit violation
//! - No trust in client input; only two request headers leave the proxy

pub mod headers;
pub mod limits;

pub use headers::{forward_headers, sanitize_response_headers};
pub use limits::enforce_body_limit;
