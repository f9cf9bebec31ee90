//! Common utilities and helper functions
//!
//! URL host helpers shared by the acceptability filter and the selector, plus
//! small text helpers used by the line parsers.

pub mod error;

use regex::Regex;
use std::sync::OnceLock;
use url::{Host, Url};

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Check whether the URL's host is an IPv6 literal
///
/// Anything that does not parse as a URL, or has a domain or IPv4 host,
/// is not IPv6.
pub fn is_ipv6(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| matches!(parsed.host(), Some(Host::Ipv6(_))))
        .unwrap_or(false)
}

/// Network location of a URL: host plus explicit port
///
/// IPv6 hosts keep their brackets (`[::1]:8080`). Returns an empty string for
/// URLs without a host so that comparisons against a blacklist never match.
pub fn netloc(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };

    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Normalize a blacklist entry to a network location
///
/// Entries written as full URLs are reduced to their host; bare hosts are
/// kept as-is.
pub fn blacklist_host(entry: &str) -> String {
    let entry = entry.trim();
    if entry.contains("://") {
        let host = netloc(entry);
        if !host.is_empty() {
            return host;
        }
    }
    entry.to_string()
}
