//! Same-origin forwarding proxy with HTML link rewriting.
//!
//! A caller asks for `/proxy?url=<target>`; the proxy fetches the target,
//! rewrites `src`/`href` links in HTML so further navigation comes back
//! through it, and relays the result with hop-by-hop and cookie headers
//! removed.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Fetch, HttpFetcher, LinkRewriter, Pipeline, ProxyError, RelayResponse};
