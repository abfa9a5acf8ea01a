//! Upstream retrieval.
//!
//! # Responsibilities
//! - Issue the outbound GET with the allow-listed headers
//! - Follow redirects and buffer the complete body
//! - Surface network, DNS, TLS and timeout failures as one error kind
//!
//! # Design Decisions
//! - The fetch capability sits behind the `Fetch` trait so the pipeline can be
//!   driven by an in-memory double in tests
//! - The size ceiling is checked by the pipeline after buffering, not here

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode};
use bytes::Bytes;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Raw `content-type` value, if present and printable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Failure of the outbound call itself.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FetchError(pub String);

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's Display omits the underlying cause (refused, dns, tls)
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        FetchError(message)
    }
}

/// Perform an HTTP GET and return status, headers and the whole body.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<UpstreamResponse, FetchError>;
}

/// `Fetch` backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));

        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        if config.connect_timeout_secs > 0 {
            builder = builder.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<UpstreamResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        if response.url() != url {
            tracing::debug!(
                requested = %url,
                final_url = %response.url(),
                "Upstream redirected"
            );
        }

        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
