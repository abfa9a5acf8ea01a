//! The relayed result of one pipeline run.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, StatusCode};
use serde::{Serialize, Serializer};

use crate::pipeline::classify::ResponseMode;

/// Body of a relayed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayBody {
    /// Upstream bytes decoded as UTF-8 (lossy).
    Text(String),
    /// Upstream bytes, standard base64 with padding.
    Base64(String),
}

impl RelayBody {
    pub fn as_str(&self) -> &str {
        match self {
            RelayBody::Text(s) | RelayBody::Base64(s) => s,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: StatusCode,
    /// Sanitized upstream headers.
    pub headers: HeaderMap,
    pub body: RelayBody,
    pub mode: ResponseMode,
}

impl RelayResponse {
    pub fn is_base64_encoded(&self) -> bool {
        matches!(self.body, RelayBody::Base64(_))
    }
}

/// Gateway-style JSON envelope, as printed by `proxy-cli fetch`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    status_code: u16,
    headers: BTreeMap<&'a str, String>,
    body: &'a str,
    is_base64_encoded: bool,
}

impl Serialize for RelayResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut headers: BTreeMap<&str, String> = BTreeMap::new();
        for (name, value) in self.headers.iter() {
            let value = String::from_utf8_lossy(value.as_bytes());
            headers
                .entry(name.as_str())
                .and_modify(|joined| {
                    joined.push_str(", ");
                    joined.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }

        Envelope {
            status_code: self.status.as_u16(),
            headers,
            body: self.body.as_str(),
            is_base64_encoded: self.is_base64_encoded(),
        }
        .serialize(serializer)
    }
}
