//! HTML link rewriting.
//!
//! # Responsibilities
//! - Find quoted `src=` and `href=` attribute values
//! - Resolve each value against the page's base URL
//! - Point the value back at the proxy endpoint
//!
//! # Design Decisions
//! - A byte scanner over the raw text, not an HTML parser. Whitespace around
//!   `=` is not recognised and attribute names are not required to start at a
//!   word boundary (`data-src="…"` is rewritten too)
//! - A value is matched only when it is non-empty, free of `"`, `'` and `>`,
//!   and closed by the quote that opened it
//! - Values that already target the proxy endpoint are left alone so running
//!   the rewriter twice yields the same document

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters escaped in the `url` query value. Matches `encodeURIComponent`:
/// everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const ATTRIBUTES: [&str; 2] = ["src", "href"];

/// Values with these prefixes (case-insensitive) are never rewritten.
const SKIPPED_PREFIXES: [&str; 4] = ["data:", "javascript:", "mailto:", "#"];

/// Rewrites links in HTML so they route through the proxy.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    proxy_path: String,
}

impl Default for LinkRewriter {
    fn default() -> Self {
        Self::new("/proxy")
    }
}

/// One matched `name=<q>value<q>` occurrence.
struct AttributeMatch<'a> {
    name: &'a str,
    quote: char,
    value: &'a str,
    /// Byte offset just past the closing quote.
    end: usize,
}

impl LinkRewriter {
    pub fn new(proxy_path: impl Into<String>) -> Self {
        Self {
            proxy_path: proxy_path.into(),
        }
    }

    pub fn proxy_path(&self) -> &str {
        &self.proxy_path
    }

    /// The proxy link for an absolute URL.
    pub fn proxy_link(&self, resolved: &str) -> String {
        format!(
            "{}?url={}",
            self.proxy_path,
            utf8_percent_encode(resolved, URI_COMPONENT)
        )
    }

    /// Rewrite every eligible attribute in `html` against `base`.
    pub fn rewrite(&self, html: &str, base: &Url) -> String {
        let bytes = html.as_bytes();
        let mut out = String::with_capacity(html.len() + html.len() / 8);
        let mut copied = 0;
        let mut pos = 0;
        let mut rewritten = 0usize;

        while pos < bytes.len() {
            let Some(found) = match_attribute(html, pos) else {
                pos += 1;
                continue;
            };

            if let Some(link) = self.rewrite_value(found.value, base) {
                out.push_str(&html[copied..pos]);
                out.push_str(found.name);
                out.push('=');
                out.push(found.quote);
                out.push_str(&link);
                out.push(found.quote);
                copied = found.end;
                rewritten += 1;
            }
            pos = found.end;
        }
        out.push_str(&html[copied..]);

        tracing::trace!(base = %base, rewritten, "Rewrote HTML links");
        out
    }

    /// The replacement for one attribute value, or `None` to keep it.
    fn rewrite_value(&self, value: &str, base: &Url) -> Option<String> {
        if SKIPPED_PREFIXES
            .iter()
            .any(|prefix| starts_with_ignore_case(value.as_bytes(), prefix))
        {
            return None;
        }
        if self.is_proxied(value) {
            return None;
        }

        let resolved = base.join(value).ok()?;
        Some(self.proxy_link(resolved.as_str()))
    }

    fn is_proxied(&self, value: &str) -> bool {
        value
            .strip_prefix(self.proxy_path.as_str())
            .is_some_and(|rest| rest.starts_with("?url="))
    }
}

/// Try to match an attribute at byte offset `pos`, which need not be a char
/// boundary. Every delimiter is ASCII, so a match always is.
fn match_attribute(html: &str, pos: usize) -> Option<AttributeMatch<'_>> {
    let bytes = html.as_bytes();

    let name_len = ATTRIBUTES
        .iter()
        .find(|attr| starts_with_ignore_case(&bytes[pos..], attr))
        .map(|attr| attr.len())?;

    let mut cursor = pos + name_len;
    if bytes.get(cursor) != Some(&b'=') {
        return None;
    }
    cursor += 1;

    let quote = match bytes.get(cursor) {
        Some(b'"') => '"',
        Some(b'\'') => '\'',
        _ => return None,
    };
    cursor += 1;

    let value_start = cursor;
    while cursor < bytes.len() && !matches!(bytes[cursor], b'"' | b'\'' | b'>') {
        cursor += 1;
    }
    if cursor == value_start || bytes.get(cursor) != Some(&(quote as u8)) {
        return None;
    }

    Some(AttributeMatch {
        name: &html[pos..pos + name_len],
        quote,
        value: &html[value_start..cursor],
        end: cursor + 1,
    })
}

fn starts_with_ignore_case(haystack: &[u8], prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}
