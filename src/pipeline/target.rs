//! Target URL extraction and validation.
//!
//! # Responsibilities
//! - Pick the target from the `url` query parameter, falling back to `target`
//! - Require a well-formed absolute URL
//! - Allow only http and https
//!
//! # Design Decisions
//! - `url::Url` lowercases the scheme while parsing, so `HTTP://host/` is
//!   accepted as plain http rather than rejected
//! - The validated URL is both the fetch target and the rewrite base

use url::{form_urlencoded, Url};

use crate::pipeline::error::{ProxyError, ProxyResult};

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Query parameters accepted on the proxy route.
#[derive(Debug, Clone, Default)]
pub struct TargetParams {
    pub url: Option<String>,
    pub target: Option<String>,
}

impl TargetParams {
    /// Parse a raw query string. The first occurrence of each key wins and
    /// unknown keys are ignored.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "url" => &mut params.url,
                "target" => &mut params.target,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// The raw target string, `url` winning over `target` when non-empty.
    pub fn raw_target(&self) -> Option<&str> {
        [self.url.as_deref(), self.target.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
    }
}

/// A caller-supplied target that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRequest {
    pub raw: String,
    pub url: Url,
}

impl TargetRequest {
    pub fn from_params(params: &TargetParams) -> ProxyResult<Self> {
        let raw = params.raw_target().ok_or(ProxyError::MissingTarget)?;
        Self::parse(raw)
    }

    pub fn parse(raw: &str) -> ProxyResult<Self> {
        let url = Url::parse(raw).map_err(|_| ProxyError::InvalidUrl)?;

        if !ALLOWED_SCHEMES.contains(&url.scheme()) {
            return Err(ProxyError::DisallowedScheme);
        }

        Ok(Self {
            raw: raw.to_string(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(url: Option<&str>, target: Option<&str>) -> TargetParams {
        TargetParams {
            url: url.map(String::from),
            target: target.map(String::from),
        }
    }

    #[test]
    fn test_missing_both_params() {
        let err = TargetRequest::from_params(&params(None, None)).unwrap_err();
        assert!(matches!(err, ProxyError::MissingTarget));
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let err = TargetRequest::from_params(&params(Some(""), Some(""))).unwrap_err();
        assert!(matches!(err, ProxyError::MissingTarget));
    }

    #[test]
    fn test_url_wins_over_target() {
        let req = TargetRequest::from_params(&params(
            Some("https://a.example/"),
            Some("https://b.example/"),
        ))
        .unwrap();
        assert_eq!(req.url.host_str(), Some("a.example"));
    }

    #[test]
    fn test_target_used_when_url_empty() {
        let req = TargetRequest::from_params(&params(Some(""), Some("http://b.example/x")))
            .unwrap();
        assert_eq!(req.url.as_str(), "http://b.example/x");
        assert_eq!(req.raw, "http://b.example/x");
    }

    #[test]
    fn test_from_query_decodes_values() {
        let params = TargetParams::from_query(Some(
            "url=https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc&url=https://second.example/&x=1",
        ));
        assert_eq!(params.url.as_deref(), Some("https://example.com/a?b=c"));
        assert_eq!(params.target, None);
    }

    #[test]
    fn test_from_query_target_fallback() {
        let params = TargetParams::from_query(Some("url=&target=http%3A%2F%2Fb.example%2F"));
        let req = TargetRequest::from_params(&params).unwrap();
        assert_eq!(req.url.as_str(), "http://b.example/");
    }

    #[test]
    fn test_from_query_absent() {
        let params = TargetParams::from_query(None);
        assert!(matches!(
            TargetRequest::from_params(&params),
            Err(ProxyError::MissingTarget)
        ));
    }

    #[test]
    fn test_invalid_urls() {
        for raw in ["not a url", "/relative/path", "http://", "://missing-scheme"] {
            let err = TargetRequest::parse(raw).unwrap_err();
            assert!(matches!(err, ProxyError::InvalidUrl), "{raw} should be invalid");
        }
    }

    #[test]
    fn test_disallowed_schemes() {
        for raw in [
            "ftp://example.com/file",
            "file:///etc/passwd",
            "javascript:alert(1)",
            "data:text/plain,hi",
        ] {
            let err = TargetRequest::parse(raw).unwrap_err();
            assert!(matches!(err, ProxyError::DisallowedScheme), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_uppercase_scheme_is_normalized() {
        let req = TargetRequest::parse("HTTPS://Example.COM/Path").unwrap();
        assert_eq!(req.url.scheme(), "https");
        assert_eq!(req.url.as_str(), "https://example.com/Path");
    }
}
