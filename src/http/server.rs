//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy and health handlers
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Hand each call to the pipeline and relay its result
//! - Record per-request metrics

use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::healthy;
use crate::observability::metrics;
use crate::pipeline::{Fetch, FetchError, HttpFetcher, Pipeline, ProxyError, TargetParams};

/// Liveness route, always answered locally.
pub const HEALTH_PATH: &str = "/healthz";

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// HTTP server for the rewriting proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that fetches upstream over the network.
    pub fn new(config: ProxyConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(&config.upstream)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Create a server around any fetch implementation.
    pub fn with_fetcher(config: ProxyConfig, fetcher: Arc<dyn Fetch>) -> Self {
        let state = AppState {
            pipeline: Arc::new(Pipeline::from_config(&config, fetcher)),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.rewrite.proxy_path, get(proxy_handler))
            .route(HEALTH_PATH, get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %req.method(),
                            uri = %req.uri(),
                            request_id = %req.headers().request_id(),
                        )
                    }))
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            proxy_path = %self.config.rewrite.proxy_path,
            "HTTP server starting"
        );

        let stop = async move {
            // a closed channel also means stop
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown requested, draining connections");
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(stop)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler: one pipeline execution per call.
async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let request_id = headers.request_id().to_string();

    // axum's `get` also routes HEAD; the proxy route is GET-only.
    if method != Method::GET {
        tracing::debug!(request_id = %request_id, method = %method, "Method not allowed");
        return method_not_allowed();
    }

    let params = TargetParams::from_query(query.as_deref());

    match state.pipeline.execute(&params, &headers).await {
        Ok(relay) => {
            tracing::info!(
                request_id = %request_id,
                mode = %relay.mode,
                status = relay.status.as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Relayed upstream response"
            );
            metrics::record_request(relay.mode.as_str(), relay.status.as_u16(), start_time);
            relay.into_response()
        }
        Err(err) => {
            match &err {
                ProxyError::Upstream(message) => {
                    tracing::error!(request_id = %request_id, error = %message, "Upstream error");
                }
                ProxyError::BodyTooLarge { size } => {
                    tracing::warn!(request_id = %request_id, size, "Upstream body too large");
                }
                _ => {
                    tracing::debug!(request_id = %request_id, error = %err, "Rejected request");
                }
            }
            metrics::record_request("error", err.status().as_u16(), start_time);
            err.into_response()
        }
    }
}

fn method_not_allowed() -> Response {
    let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET"));
    response
}

async fn health_handler() -> Response {
    healthy()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::UpstreamResponse;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;
    use url::Url;

    #[derive(Default)]
    struct HtmlFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetch for HtmlFetcher {
        async fn get(&self, _url: &Url, _headers: HeaderMap) -> Result<UpstreamResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
            headers.insert(header::SET_COOKIE, HeaderValue::from_static("sid=1"));
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("14"));
            Ok(UpstreamResponse {
                status: StatusCode::OK,
                headers,
                body: Bytes::from_static(b"<a href=\"/x\">"),
            })
        }
    }

    fn server(config: ProxyConfig) -> HttpServer {
        HttpServer::with_fetcher(config, Arc::new(HtmlFetcher::default()))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_proxy_route_relays_rewritten_html() {
        let request = Request::builder()
            .uri("/proxy?url=https%3A%2F%2Fexample.com%2F")
            .body(Body::empty())
            .unwrap();
        let response = server(ProxyConfig::default()).router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(response.headers().get("x-request-id").is_some());
        assert_eq!(
            body_string(response).await,
            "<a href=\"/proxy?url=https%3A%2F%2Fexample.com%2Fx\">"
        );
    }

    #[tokio::test]
    async fn test_missing_url_is_400_json() {
        let request = Request::builder().uri("/proxy").body(Body::empty()).unwrap();
        let response = server(ProxyConfig::default()).router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, r#"{"error":"missing 'url'"}"#);
    }

    #[tokio::test]
    async fn test_post_is_not_allowed() {
        let request = Request::builder()
            .method("POST")
            .uri("/proxy?url=https%3A%2F%2Fexample.com%2F")
            .body(Body::empty())
            .unwrap();
        let response = server(ProxyConfig::default()).router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_head_is_not_allowed() {
        let fetcher = Arc::new(HtmlFetcher::default());
        let server = HttpServer::with_fetcher(ProxyConfig::default(), fetcher.clone());

        let request = Request::builder()
            .method("HEAD")
            .uri("/proxy?url=https%3A%2F%2Fexample.com%2F")
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_proxy_path() {
        let mut config = ProxyConfig::default();
        config.rewrite.proxy_path = "/relay".into();

        let request = Request::builder()
            .uri("/relay?target=https%3A%2F%2Fexample.com%2F")
            .body(Body::empty())
            .unwrap();
        let response = server(config).router().oneshot(request).await.unwrap();
        assert_eq!(
            body_string(response).await,
            "<a href=\"/relay?url=https%3A%2F%2Fexample.com%2Fx\">"
        );
    }

    #[tokio::test]
    async fn test_health_route() {
        let request = Request::builder().uri(HEALTH_PATH).body(Body::empty()).unwrap();
        let response = server(ProxyConfig::default()).router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_caller_request_id_is_echoed() {
        let request = Request::builder()
            .uri(HEALTH_PATH)
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = server(ProxyConfig::default()).router().oneshot(request).await.unwrap();
        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
    }
}
