//! Mirror-list resolver
//!
//! Mirror lists are plaintext `name,url` listings published by third parties.
//! Channel names in them are decorated (`CCTV-1_(1920x1080)`, `湖南卫视频道`),
//! so both sides of the lookup are reduced to a normalized key first:
//!
//! 1. a `_(...)` or `_[...]` tag is removed, and read as the resolution when
//!    it contains `WxH`
//! 2. the `频道` ("channel") marker is removed
//! 3. the result is trimmed and lower-cased
//! 4. known aliases are folded onto their canonical key (`cctv-1` → `cctv1`)
//!
//! Mirrors are fetched one after another, in configured order. A mirror that
//! fails is logged and skipped.

use regex::Regex;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use crate::models::{Candidate, Origin, Resolution};
use crate::utils::error::{FetchError, ParseError};

/// User agent the mirror hosts expect from player apps
const MIRROR_USER_AGENT: &str = "okhttp/3.15";

/// Aliases folded onto canonical lookup keys
const KEY_ALIASES: &[(&str, &str)] = &[
    ("cctv-1", "cctv1"),
    ("cctv-2", "cctv2"),
    ("cctv-3", "cctv3"),
    ("cctv-4", "cctv4"),
    ("cctv-5", "cctv5"),
    ("cctv-5+", "cctv5+"),
    ("cctv-6", "cctv6"),
    ("cctv-7", "cctv7"),
    ("cctv-8", "cctv8"),
    ("cctv-9", "cctv9"),
    ("cctv-10", "cctv10"),
    ("cctv-11", "cctv11"),
    ("cctv-12", "cctv12"),
    ("cctv-13", "cctv13"),
    ("cctv-14", "cctv14"),
    ("cctv-15", "cctv15"),
    ("cctv-16", "cctv16"),
    ("cctv-17", "cctv17"),
    ("cctv-4k", "cctv4k"),
    ("cctv-8k", "cctv8k"),
];

/// Lookup table built from one mirror listing
pub type MirrorIndex = HashMap<String, Vec<Candidate>>;

fn decoration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_\((.*?)\)|_\[(.*?)\]|频道").expect("Invalid regex pattern"))
}

/// Reduce a channel name to its lookup key
///
/// # Examples
///
/// ```
/// use streamsift::crawler::mirror::normalize_key;
///
/// assert_eq!(normalize_key("CCTV-1_(1920x1080)"), "cctv1");
/// assert_eq!(normalize_key("湖南卫视频道"), "湖南卫视");
/// ```
pub fn normalize_key(name: &str) -> String {
    let stripped = decoration_re().replace_all(name, "");
    let key = stripped.trim().to_lowercase();

    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(key)
}

/// Resolution carried in a `_(...)` or `_[...]` name tag, if it parses
pub fn resolution_tag(name: &str) -> Option<Resolution> {
    decoration_re()
        .captures_iter(name)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .find_map(|tag| Resolution::parse(tag.as_str()).ok())
}

/// Split a listing line into `(name, url)`
///
/// # Errors
///
/// Returns `ParseError::MalformedLine` for lines without a comma and for
/// `NAME,#genre#` category headers.
pub fn parse_line(line: &str) -> Result<(&str, &str), ParseError> {
    let line = line.trim();
    let (name, url) = line
        .split_once(',')
        .ok_or_else(|| ParseError::MalformedLine(line.to_string()))?;

    if url.starts_with("#genre#") {
        return Err(ParseError::MalformedLine(line.to_string()));
    }

    Ok((name.trim(), url.trim()))
}

/// Build the lookup table of one mirror listing
///
/// Candidates are tagged [`Origin::Mirror`] with `mirror_index`; malformed
/// lines and lines without a URL are skipped.
pub fn parse_listing(text: &str, mirror_index: usize) -> MirrorIndex {
    let mut index: MirrorIndex = HashMap::new();

    for line in text.lines() {
        let Ok((name, url)) = parse_line(line) else {
            continue;
        };

        let Ok(candidate) = Candidate::new(url, Origin::Mirror(mirror_index)) else {
            continue;
        };

        let candidate = candidate.with_resolution(resolution_tag(name));
        index.entry(normalize_key(name)).or_default().push(candidate);
    }

    index
}

/// Resolves extra candidates for channel names from the configured mirrors
pub struct MirrorResolver {
    client: Client,
    base_urls: Vec<String>,
}

impl MirrorResolver {
    /// Create a resolver for the given mirror URLs
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(base_urls: Vec<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(MIRROR_USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self { client, base_urls })
    }

    pub fn base_urls(&self) -> &[String] {
        &self.base_urls
    }

    /// Look up every channel name in every mirror
    ///
    /// Matches from all mirrors are concatenated in mirror order. Channels
    /// with no match are absent from the result.
    pub async fn resolve(&self, channel_names: &[String]) -> HashMap<String, Vec<Candidate>> {
        let mut channels: HashMap<String, Vec<Candidate>> = HashMap::new();

        for (mirror_index, base_url) in self.base_urls.iter().enumerate() {
            tracing::info!(mirror = %base_url, "Processing mirror list");

            let text = match self.fetch_listing(base_url).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(mirror = %base_url, error = %e, "Mirror list unavailable, skipping");
                    continue;
                }
            };

            let index = parse_listing(&text, mirror_index);
            let mut found = Vec::new();

            for name in channel_names {
                if let Some(values) = index.get(&normalize_key(name)) {
                    channels
                        .entry(name.clone())
                        .or_default()
                        .extend(values.iter().cloned());
                    found.push(name.as_str());
                }
            }

            if !found.is_empty() {
                tracing::info!(
                    mirror = %base_url,
                    found = found.len(),
                    channels = %found.join(","),
                    "Mirror matched channels"
                );
            }
        }

        tracing::info!(channels = channels.len(), "Finished processing mirror lists");
        channels
    }

    async fn fetch_listing(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("CCTV1"), "cctv1");
        assert_eq!(normalize_key("CCTV-1"), "cctv1");
        assert_eq!(normalize_key("CCTV-5+_[1280x720]"), "cctv5+");
        assert_eq!(normalize_key(" News "), "news");
        assert_eq!(normalize_key("东方卫视频道"), "东方卫视");
    }

    #[test]
    fn test_resolution_tag() {
        assert_eq!(
            resolution_tag("CCTV1_(1920x1080)"),
            Some(Resolution::new(1920, 1080))
        );
        assert_eq!(
            resolution_tag("CCTV1_[1280x720]"),
            Some(Resolution::new(1280, 720))
        );
        assert_eq!(resolution_tag("CCTV1_(HD)"), None);
        assert_eq!(resolution_tag("CCTV1"), None);
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("CCTV1,http://a.test/1.m3u8\r").unwrap(),
            ("CCTV1", "http://a.test/1.m3u8")
        );
        assert!(parse_line("央视频道,#genre#").is_err());
        assert!(parse_line("no comma here").is_err());
        // the url part may itself contain commas
        assert_eq!(
            parse_line("A,http://a.test/?x=1,2").unwrap(),
            ("A", "http://a.test/?x=1,2")
        );
    }

    #[test]
    fn test_parse_listing() {
        let text = "央视,#genre#\n\
                    CCTV-1_(1920x1080),http://a.test/1\n\
                    cctv1,http://b.test/1\n\
                    CCTV2,\n\
                    garbage\n";

        let index = parse_listing(text, 3);
        let cctv1 = index.get("cctv1").unwrap();
        assert_eq!(cctv1.len(), 2);
        assert_eq!(cctv1[0].url(), "http://a.test/1");
        assert_eq!(cctv1[0].resolution, Some(Resolution::new(1920, 1080)));
        assert_eq!(cctv1[0].origin, Origin::Mirror(3));
        assert!(cctv1[0].observed_date.is_none());
        assert_eq!(cctv1[1].resolution, None);
        assert!(!index.contains_key("cctv2"));
    }
}
