//! Upstream body size ceiling.
//!
//! The whole body is buffered before the check runs; this bounds what is
//! relayed, not what is read.

use crate::pipeline::error::{ProxyError, ProxyResult};

/// Reject bodies strictly larger than `max_bytes`.
pub fn enforce_body_limit(size: usize, max_bytes: usize) -> ProxyResult<()> {
    if size > max_bytes {
        return Err(ProxyError::BodyTooLarge { size });
    }
    Ok(())
}
