//! The fetch-rewrite-relay pipeline.
//!
//! # Data Flow
//! ```text
//! query params + inbound headers
//!     → target.rs (validate url / target, http(s) only)
//!     → fetch.rs (GET with allow-listed headers, buffer body)
//!     → security::limits (reject bodies over the ceiling)
//!     → classify.rs (html | text | binary)
//!     → rewrite.rs (html only)
//!     → security::headers (strip hop-by-hop and set-cookie)
//!     → RelayResponse
//! ```
//!
//! # Design Decisions
//! - No state outlives a single execution; `Pipeline` only holds immutable
//!   settings and the injected fetcher
//! - HTML always relays as 200 while text and binary keep upstream's status.
//!   This asymmetry is deliberate and observable by callers
//! - Links resolve against the requested URL, not the post-redirect one

pub mod classify;
pub mod error;
pub mod fetch;
pub mod relay;
pub mod rewrite;
pub mod target;

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::ProxyConfig;
use crate::observability::metrics;
use crate::security::{enforce_body_limit, forward_headers, sanitize_response_headers};

pub use classify::ResponseMode;
pub use error::{ProxyError, ProxyResult};
pub use fetch::{Fetch, FetchError, HttpFetcher, UpstreamResponse};
pub use relay::{RelayBody, RelayResponse};
pub use rewrite::LinkRewriter;
pub use target::{TargetParams, TargetRequest};

/// Content type used for binary bodies when upstream sends none.
const DEFAULT_BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// One configured pipeline, shared by every request.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn Fetch>,
    rewriter: LinkRewriter,
    max_body_bytes: usize,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn Fetch>, rewriter: LinkRewriter, max_body_bytes: usize) -> Self {
        Self {
            fetcher,
            rewriter,
            max_body_bytes,
        }
    }

    /// Build a pipeline from configuration with the given fetcher.
    pub fn from_config(config: &ProxyConfig, fetcher: Arc<dyn Fetch>) -> Self {
        Self::new(
            fetcher,
            LinkRewriter::new(config.rewrite.proxy_path.clone()),
            config.upstream.max_body_bytes,
        )
    }

    pub fn rewriter(&self) -> &LinkRewriter {
        &self.rewriter
    }

    /// Run the whole pipeline for one inbound call.
    pub async fn execute(
        &self,
        params: &TargetParams,
        inbound: &HeaderMap,
    ) -> ProxyResult<RelayResponse> {
        let target = TargetRequest::from_params(params)?;

        tracing::debug!(url = %target.url, "Fetching upstream");

        let upstream = self
            .fetcher
            .get(&target.url, forward_headers(inbound))
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        metrics::record_upstream_bytes(upstream.body.len());
        enforce_body_limit(upstream.body.len(), self.max_body_bytes)?;

        Ok(self.relay(&target, upstream))
    }

    /// Turn a buffered upstream response into the relayed one.
    pub fn relay(&self, target: &TargetRequest, upstream: UpstreamResponse) -> RelayResponse {
        let mode = ResponseMode::classify(upstream.content_type());
        let mut headers = sanitize_response_headers(&upstream.headers);

        tracing::debug!(
            url = %target.url,
            status = upstream.status.as_u16(),
            size = upstream.body.len(),
            mode = %mode,
            "Classified upstream response"
        );

        match mode {
            ResponseMode::Html => {
                let text = String::from_utf8_lossy(&upstream.body);
                let body = self.rewriter.rewrite(&text, &target.url);
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
                RelayResponse {
                    status: StatusCode::OK,
                    headers,
                    body: RelayBody::Text(body),
                    mode,
                }
            }
            ResponseMode::Text => RelayResponse {
                status: upstream.status,
                headers,
                body: RelayBody::Text(String::from_utf8_lossy(&upstream.body).into_owned()),
                mode,
            },
            ResponseMode::Binary => {
                if !headers.contains_key(header::CONTENT_TYPE) {
                    headers.insert(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static(DEFAULT_BINARY_CONTENT_TYPE),
                    );
                }
                RelayResponse {
                    status: upstream.status,
                    headers,
                    body: RelayBody::Base64(STANDARD.encode(&upstream.body)),
                    mode,
                }
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("rewriter", &self.rewriter)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}
