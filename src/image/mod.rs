//! Image URL resolution for listing rows.
//!
//! A record may reference its picture in several places and in several
//! shapes (absolute, protocol-relative, root-relative or a bare host/path).
//! [`resolve_image_url`] picks the first usable reference and turns it into
//! something a browser can load. When loading still fails, [`ImageAttempt`]
//! walks a short fallback chain that always ends at [`PLACEHOLDER`].

use std::sync::OnceLock;

use regex::Regex;

use crate::record::Record;

/// Inline SVG shown when no image can be loaded.
pub const PLACEHOLDER: &str = "data:image/svg+xml;utf8,<svg xmlns='http://www.w3.org/2000/svg' width='160' height='100'><rect fill='%23ffdfe8' width='100%25' height='100%25'/><text x='50%25' y='50%25' dominant-baseline='middle' text-anchor='middle' fill='%23663' font-size='12'>No Image</text></svg>";

pub const PROXY_PREFIX: &str = "https://images.weserv.nl/?url=";

pub const DEFAULT_ORIGIN: &str = "https://localhost";

/// Protocol and origin of the page the listing is displayed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageContext {
    /// Scheme with its trailing colon, e.g. `https:`.
    pub protocol: String,
    /// Scheme, host and port without a trailing slash.
    pub origin: String,
}

impl Default for PageContext {
    fn default() -> Self {
        Self {
            protocol: "https:".to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl PageContext {
    pub fn from_origin(value: &str) -> Result<Self, String> {
        let parsed = reqwest::Url::parse(value.trim())
            .map_err(|e| format!("invalid origin '{}': {e}", value.trim()))?;
        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(format!("origin '{}' has no host", value.trim()));
        }
        Ok(Self {
            protocol: format!("{}:", parsed.scheme()),
            origin: origin.ascii_serialization(),
        })
    }
}

struct UrlPatterns {
    absolute: Regex,
    host_with_path: Regex,
    dotted_host: Regex,
}

fn patterns() -> &'static UrlPatterns {
    static PATTERNS: OnceLock<UrlPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| UrlPatterns {
        absolute: Regex::new(r"(?i)^https?://").expect("absolute url pattern"),
        host_with_path: Regex::new(r"^[A-Za-z0-9_.-]+/").expect("host/path pattern"),
        dotted_host: Regex::new(r"(?i)^[A-Za-z0-9_.-]+\.[a-z]{2,}").expect("dotted host pattern"),
    })
}

/// Raw image references of a record in lookup order: every `images` entry,
/// then `image`, then `thumbnail`.
pub fn image_candidates(record: &Record) -> Vec<&str> {
    record
        .images
        .iter()
        .map(|i| i.url())
        .chain(record.image.as_deref())
        .chain(record.thumbnail.as_deref())
        .collect()
}

/// Turns a raw reference into a loadable URL, or `None` when it does not
/// look like a URL at all.
pub fn normalize_url(raw: &str, page: &PageContext) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let p = patterns();
    if raw.starts_with("//") {
        return Some(format!("{}{raw}", page.protocol));
    }
    if p.absolute.is_match(raw) {
        return Some(raw.to_string());
    }
    if raw.starts_with('/') {
        return Some(format!("{}{raw}", page.origin));
    }
    if p.host_with_path.is_match(raw) || p.dotted_host.is_match(raw) {
        return Some(format!("https://{raw}"));
    }
    None
}

/// Initial image URL for a record; the placeholder when nothing usable is
/// referenced.
pub fn resolve_image_url(record: &Record, page: &PageContext) -> String {
    image_candidates(record)
        .into_iter()
        .map(str::trim)
        .find(|c| !c.is_empty())
        .and_then(|c| normalize_url(c, page))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn alt_text(record: &Record) -> &str {
    match record.title_or_empty() {
        "" => "No Image",
        t => t,
    }
}

/// URL to try after `current_url` failed to load for the `attempt`-th time
/// (counting from 1).
///
/// The first failure of a plain `http:` URL retries over `https:`, the second
/// failure goes through the image proxy and anything else lands on the
/// placeholder. Returns `None` once the placeholder itself has failed.
pub fn next_fallback(current_url: &str, attempt: u32) -> Option<String> {
    if current_url == PLACEHOLDER {
        return None;
    }
    match attempt {
        1 if has_prefix_ignore_case(current_url, "http:") => {
            Some(format!("https:{}", &current_url["http:".len()..]))
        }
        2 => Some(proxy_url(current_url)),
        _ => Some(PLACEHOLDER.to_string()),
    }
}

pub fn proxy_url(url: &str) -> String {
    let stripped = strip_scheme(url);
    format!("{PROXY_PREFIX}{}", encode_uri_component(stripped))
}

fn strip_scheme(url: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if has_prefix_ignore_case(url, scheme) {
            return &url[scheme.len()..];
        }
    }
    url
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

/// Percent-encodes everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.as_bytes() {
        match *b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(*b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Every URL the fallback chain would try after `url`, in order.
pub fn fallback_chain(url: &str) -> Vec<String> {
    let mut attempt = ImageAttempt::new(url);
    let mut chain = Vec::new();
    while let Some(next) = attempt.fail() {
        chain.push(next.to_string());
    }
    chain
}

/// Image load state for one rendered row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAttempt {
    url: String,
    attempts: u32,
    exhausted: bool,
}

impl ImageAttempt {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            attempts: 0,
            exhausted: false,
        }
    }

    pub fn for_record(record: &Record, page: &PageContext) -> Self {
        Self::new(resolve_image_url(record, page))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Records a load failure of the current URL and returns the next URL
    /// to try, or `None` when there is nothing left.
    pub fn fail(&mut self) -> Option<&str> {
        if self.exhausted {
            return None;
        }
        self.attempts = self.attempts.saturating_add(1);
        match next_fallback(&self.url, self.attempts) {
            Some(next) => {
                tracing::debug!(
                    attempt = self.attempts,
                    failed = %self.url,
                    next = %next,
                    "image load failed, trying fallback"
                );
                self.exhausted = next == PLACEHOLDER;
                self.url = next;
                Some(self.url.as_str())
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }
}
