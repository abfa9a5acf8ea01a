//! Response classification by content type.
//!
//! Substring matching on the lower-cased `content-type`; parameters such as
//! `charset` are not parsed. HTML is checked first, so the three modes never
//! overlap.

use std::fmt;

/// How an upstream body is relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Links rewritten, always 200, `content-type: text/html`.
    Html,
    /// UTF-8 text passthrough with upstream's status.
    Text,
    /// Base64 passthrough with upstream's status.
    Binary,
}

impl ResponseMode {
    pub fn classify(content_type: Option<&str>) -> Self {
        let content_type = content_type.unwrap_or_default().to_lowercase();

        if content_type.contains("text/html") {
            ResponseMode::Html
        } else if content_type.starts_with("text/")
            || content_type.contains("json")
            || content_type.contains("xml")
        {
            ResponseMode::Text
        } else {
            ResponseMode::Binary
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Html => "html",
            ResponseMode::Text => "text",
            ResponseMode::Binary => "binary",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
