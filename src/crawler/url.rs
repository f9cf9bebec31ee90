//! URL acceptability filter
//!
//! A candidate URL is accepted only if it passes all three predicates:
//! - IP-version policy (`ipv4`, `ipv6` or `any`)
//! - domain blacklist, compared on the URL's network location
//! - keyword blacklist, matched as plain substrings of the whole URL
//!
//! The filter is built once from [`FilterConfig`] and is `Send + Sync`, so
//! it can be shared by reference across concurrent probes.

use crate::config::{FilterConfig, IpvType};
use crate::utils::{blacklist_host, is_ipv6, netloc};

/// Pure URL predicate built from the filter configuration
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    ipv_type: IpvType,
    /// Blacklist entries already reduced to network locations
    domain_blacklist: Vec<String>,
    keywords: Vec<String>,
}

impl UrlFilter {
    #[must_use]
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            ipv_type: config.ipv_type,
            domain_blacklist: config
                .domain_blacklist
                .iter()
                .map(|entry| blacklist_host(entry))
                .filter(|entry| !entry.is_empty())
                .collect(),
            keywords: config
                .url_keywords_blacklist
                .iter()
                .filter(|k| !k.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// Check the URL against all three predicates
    ///
    /// # Examples
    ///
    /// ```
    /// use streamsift::config::FilterConfig;
    /// use streamsift::crawler::url::UrlFilter;
    ///
    /// let filter = UrlFilter::new(&FilterConfig {
    ///     url_keywords_blacklist: vec!["/ad/".into()],
    ///     ..Default::default()
    /// });
    /// assert!(filter.accept("http://a.test/live.m3u8"));
    /// assert!(!filter.accept("http://a.test/ad/live.m3u8"));
    /// assert!(!filter.accept("http://[::1]/live.m3u8"));
    /// ```
    pub fn accept(&self, url: &str) -> bool {
        self.matches_ipv_type(url) && self.passes_domain_blacklist(url) && self.passes_keywords(url)
    }

    /// Keep only accepted URLs, preserving order
    pub fn filter_urls<'a, I>(&self, urls: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        urls.into_iter()
            .filter(|url| self.accept(url))
            .cloned()
            .collect()
    }

    fn matches_ipv_type(&self, url: &str) -> bool {
        match self.ipv_type {
            IpvType::Ipv4 => !is_ipv6(url),
            IpvType::Ipv6 => is_ipv6(url),
            IpvType::Any => true,
        }
    }

    fn passes_domain_blacklist(&self, url: &str) -> bool {
        if self.domain_blacklist.is_empty() {
            return true;
        }
        let host = netloc(url);
        !self.domain_blacklist.iter().any(|blocked| *blocked == host)
    }

    fn passes_keywords(&self, url: &str) -> bool {
        !self.keywords.iter().any(|keyword| url.contains(keyword.as_str()))
    }
}
