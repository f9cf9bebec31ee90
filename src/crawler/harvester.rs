//! Search-result harvester boundary
//!
//! A harvester turns a channel name into raw hits scraped from a search UI.
//! The pipeline only depends on the [`Harvester`] trait and validates what
//! comes back: hits without a URL or without a matching channel name are
//! dropped, and unparseable dates or resolutions become absent fields.
//!
//! [`SearchPageHarvester`] is a plain-HTTP implementation for search sites
//! that render results as `div.<result_class>` rows and paginate with
//! `?page=N&s=NAME` links.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use std::time::Duration;
use url::form_urlencoded;

use crate::config::SearchEndpoint;
use crate::error::SiftErrorTrait;
use crate::crawler::prober::probe;
use crate::models::{parse_observed_date, Candidate, Origin, Resolution};
use crate::utils::error::{FetchError, ParseError};
use crate::utils::normalize_whitespace;

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// One scraped search result, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHit {
    pub url: Option<String>,
    /// `MM-DD-YYYY`
    pub date: Option<String>,
    /// `WxH`, possibly decorated
    pub resolution: Option<String>,
    /// Channel name as shown by the search result
    pub channel_name: Option<String>,
}

/// Producer of raw search hits for a channel name
#[async_trait]
pub trait Harvester: Send + Sync {
    /// Harvest up to `pages` result pages for `channel_name`
    ///
    /// Implementations absorb their own failures and return whatever they
    /// collected.
    async fn harvest(&self, channel_name: &str, pages: u32) -> Vec<RawHit>;
}

/// Harvester that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHarvester;

#[async_trait]
impl Harvester for NoopHarvester {
    async fn harvest(&self, _channel_name: &str, _pages: u32) -> Vec<RawHit> {
        Vec::new()
    }
}

/// Check that a hit's channel name refers to the requested channel
///
/// The hit name must start with the requested name (ignoring case) and must
/// not continue with a digit or `+`, so `CCTV1` does not match `CCTV10` or
/// `CCTV1+`.
pub fn name_matches(requested: &str, matched: &str) -> bool {
    let requested = requested.to_lowercase();
    let matched = matched.to_lowercase();

    match matched.strip_prefix(requested.as_str()) {
        Some(rest) => !rest.starts_with(|c: char| c.is_ascii_digit() || c == '+'),
        None => false,
    }
}

/// Validate one hit and turn it into a harvester candidate
///
/// # Errors
///
/// - `ParseError::MissingUrl` if the hit has no URL
/// - `ParseError::MissingChannelName` if the hit has no channel name or it
///   names another channel
pub fn hit_to_candidate(hit: &RawHit, requested: &str) -> Result<Candidate, ParseError> {
    let channel_name = hit
        .channel_name
        .as_deref()
        .filter(|name| name_matches(requested, name))
        .ok_or(ParseError::MissingChannelName)?;

    let url = hit.url.as_deref().ok_or(ParseError::MissingUrl)?;

    let date = hit.date.as_deref().and_then(|d| parse_observed_date(d).ok());
    let resolution = hit
        .resolution
        .as_deref()
        .and_then(|r| Resolution::parse(r).ok());

    Ok(Candidate::new(url, Origin::Harvester)?
        .with_date(date)
        .with_resolution(resolution)
        .with_channel_name(Some(channel_name.to_string())))
}

/// Validate a batch of hits, skipping the ones that fail
pub fn candidates_from_hits(hits: &[RawHit], requested: &str) -> Vec<Candidate> {
    hits.iter()
        .filter_map(|hit| match hit_to_candidate(hit, requested) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                tracing::trace!(
                    channel = %requested,
                    error = %e,
                    category = e.category().as_str(),
                    "Skipping search hit"
                );
                None
            }
        })
        .collect()
}

/// Pick the fastest reachable search endpoint
///
/// Endpoints are checked one after another with `timeout`. Ties go to the
/// later endpoint. Returns `None` when none is reachable.
pub async fn select_endpoint(
    endpoints: &[SearchEndpoint],
    timeout: Duration,
) -> Option<SearchEndpoint> {
    let mut best: Option<(f64, &SearchEndpoint)> = None;

    for endpoint in endpoints {
        let cost = probe(&endpoint.url, timeout).await;
        tracing::info!(endpoint = %endpoint.url, cost_ms = cost, "Search endpoint checked");

        if !cost.is_finite() {
            continue;
        }
        if best.map_or(true, |(best_cost, _)| cost <= best_cost) {
            best = Some((cost, endpoint));
        }
    }

    best.map(|(_, endpoint)| endpoint.clone())
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("Invalid regex pattern"))
}

/// Text of an element with each text node trimmed, joined by single spaces
fn element_text(element: &ElementRef<'_>) -> String {
    let joined = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&joined)
}

/// Extract one hit from a result row
///
/// Rows are `div` elements whose child divs are, in order: channel name,
/// stream URL, ..., and an info line `MM-DD-YYYY •WxH` last.
pub fn parse_result_row(row: &ElementRef<'_>) -> RawHit {
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "div")
        .collect();

    let mut hit = RawHit::default();
    if cells.len() < 2 {
        return hit;
    }

    let name = element_text(&cells[0]);
    hit.channel_name = (!name.is_empty()).then_some(name);

    hit.url = url_re()
        .find(&element_text(&cells[1]))
        .map(|m| m.as_str().to_string());

    let info = element_text(&cells[cells.len() - 1]);
    if let Some((date, rest)) = info.split_once(' ') {
        hit.date = (!date.is_empty()).then(|| date.to_string());
        hit.resolution = rest
            .split_once('•')
            .map(|(_, res)| res.trim().to_string())
            .filter(|res| !res.is_empty());
    } else if !info.is_empty() {
        hit.date = Some(info);
    }

    hit
}

/// Extract all hits of a search result page
pub fn parse_results(html: &str, result_class: &str) -> Vec<RawHit> {
    let Ok(selector) = Selector::parse(&format!("div.{result_class}")) else {
        tracing::warn!(result_class = %result_class, "Invalid result class selector");
        return Vec::new();
    };

    let document = Html::parse_document(html);
    document
        .select(&selector)
        .map(|row| parse_result_row(&row))
        .collect()
}

/// Whether the page links to page `page + 1` of the same query
///
/// Query values are percent-decoded before comparing, so non-ASCII channel
/// names match their encoded links.
pub fn has_next_page(html: &str, page: u32, channel_name: &str) -> bool {
    let Ok(selector) = Selector::parse("a[href]") else {
        return false;
    };
    let next = (page + 1).to_string();

    Html::parse_document(html)
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .any(|href| links_to_page(href, &next, channel_name))
}

fn links_to_page(href: &str, page: &str, channel_name: &str) -> bool {
    let query = href.split_once('?').map_or(href, |(_, query)| query);

    let mut on_page = false;
    let mut same_query = href.contains(channel_name);
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        on_page |= key == "page" && value == page;
        same_query |= value.contains(channel_name);
    }

    on_page && same_query
}

/// Harvester for search sites answering `GET <endpoint>?page=N&s=NAME`
pub struct SearchPageHarvester {
    client: Client,
    endpoint: SearchEndpoint,
}

impl SearchPageHarvester {
    /// Create a harvester for one endpoint
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(endpoint: SearchEndpoint, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &SearchEndpoint {
        &self.endpoint
    }

    async fn fetch_page(&self, channel_name: &str, page: u32) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.endpoint.url)
            .headers(self.build_headers())
            .query(&[("page", page.to_string()), ("s", channel_name.to_string())])
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers
    }
}

#[async_trait]
impl Harvester for SearchPageHarvester {
    async fn harvest(&self, channel_name: &str, pages: u32) -> Vec<RawHit> {
        let mut hits = Vec::new();

        for page in 1..=pages {
            let html = match self.fetch_page(channel_name, page).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(channel = %channel_name, page, error = %e, "Search page failed");
                    break;
                }
            };

            let page_hits = parse_results(&html, &self.endpoint.result_class);
            tracing::debug!(channel = %channel_name, page, hits = page_hits.len(), "Search page parsed");
            hits.extend(page_hits);

            if !has_next_page(&html, page, channel_name) {
                break;
            }
        }

        hits
    }
}

fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0])
}
