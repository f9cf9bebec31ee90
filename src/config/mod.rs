//! Configuration management for streamsift
//!
//! Configuration is resolved once at start-up from a TOML file
//! (`user_config.toml` wins over `config.toml`), then environment overrides,
//! then [`Config::sanitize`], which replaces every invalid value with its
//! documented default. The resulting value is immutable and passed by
//! reference to every component.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Config file consulted first when present
pub const USER_CONFIG_FILE: &str = "user_config.toml";

/// Config file consulted when no user config exists
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_URLS_LIMIT: i64 = 10;
pub const DEFAULT_RECENT_DAYS: i64 = 60;
pub const DEFAULT_RESPONSE_TIME_WEIGHT: f64 = 0.5;
pub const DEFAULT_RESOLUTION_WEIGHT: f64 = 0.5;

/// Probing cap applied when running under GitHub Actions
const CI_MAX_PROBED_CHANNELS: usize = 200;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ranking and selection
    pub selection: SelectionConfig,

    /// URL acceptability filter
    pub filter: FilterConfig,

    /// Input and output locations
    pub sources: SourcesConfig,

    /// Probe timeouts and caps
    pub prober: ProberConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Ranking and recency/cardinality selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Maximum URLs kept per channel
    pub urls_limit: i64,

    /// Candidates observed within this many days count as recent (1..=365)
    pub recent_days: i64,

    /// Weight of latency in the score; must sum to 1 with `resolution_weight`
    pub response_time_weight: f64,

    /// Weight of pixel count in the score
    pub resolution_weight: f64,
}

impl SelectionConfig {
    /// `urls_limit` as a count. Only meaningful after [`Config::sanitize`].
    pub fn limit(&self) -> usize {
        usize::try_from(self.urls_limit).unwrap_or(DEFAULT_URLS_LIMIT as usize)
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            urls_limit: DEFAULT_URLS_LIMIT,
            recent_days: DEFAULT_RECENT_DAYS,
            response_time_weight: DEFAULT_RESPONSE_TIME_WEIGHT,
            resolution_weight: DEFAULT_RESOLUTION_WEIGHT,
        }
    }
}

/// IP-version policy for candidate URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpvType {
    #[default]
    Ipv4,
    Ipv6,
    Any,
}

impl IpvType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for IpvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpvType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ipv4" => Ok(Self::Ipv4),
            "ipv6" => Ok(Self::Ipv6),
            "any" | "all" => Ok(Self::Any),
            other => Err(format!("unknown ipv_type `{other}`")),
        }
    }
}

impl Serialize for IpvType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Unknown values fall back to the default instead of failing the whole file.
// `Config::load` reports them.
impl<'de> Deserialize<'de> for IpvType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse::<Self>().unwrap_or_default())
    }
}

/// URL acceptability filter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub ipv_type: IpvType,

    /// Hosts (or full URLs, reduced to their host) to reject
    pub domain_blacklist: Vec<String>,

    /// Substrings that reject a URL anywhere they appear
    pub url_keywords_blacklist: Vec<String>,
}

/// A search endpoint for the harvester and the CSS class of its result rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEndpoint {
    pub url: String,
    pub result_class: String,
}

/// Input/output locations and harvester sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Seed channel-list file; `user_<name>` next to it takes precedence
    pub source_file: PathBuf,

    /// Final result file
    pub final_file: PathBuf,

    /// Mirror lists, fetched in order
    pub extend_base_urls: Vec<String>,

    /// Channels harvested with `favorite_page_num` pages
    pub favorite_list: Vec<String>,

    pub favorite_page_num: u32,

    pub default_page_num: u32,

    /// Candidate search endpoints; the fastest reachable one is used
    pub search_endpoints: Vec<SearchEndpoint>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            source_file: PathBuf::from("demo.txt"),
            final_file: PathBuf::from("result.txt"),
            extend_base_urls: Vec::new(),
            favorite_list: Vec::new(),
            favorite_page_num: 6,
            default_page_num: 3,
            search_endpoints: vec![
                SearchEndpoint {
                    url: String::from("https://www.foodieguide.com/iptvsearch/"),
                    result_class: String::from("result"),
                },
                SearchEndpoint {
                    url: String::from("http://tonkiang.us/"),
                    result_class: String::from("result"),
                },
            ],
        }
    }
}

impl SourcesConfig {
    /// Seed file actually read: `user_<source_file>` when it exists
    pub fn effective_source_file(&self) -> PathBuf {
        let user_file = self.source_file.file_name().map(|name| {
            self.source_file
                .with_file_name(format!("user_{}", name.to_string_lossy()))
        });

        match user_file {
            Some(path) if path.exists() => path,
            _ => self.source_file.clone(),
        }
    }

    /// Number of search pages to harvest for a channel
    pub fn page_num_for(&self, channel_name: &str) -> u32 {
        if self.favorite_list.iter().any(|f| f == channel_name) {
            self.favorite_page_num
        } else {
            self.default_page_num
        }
    }
}

/// Probe timeouts and caps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProberConfig {
    /// Per-candidate probe timeout in milliseconds
    pub timeout_ms: u64,

    /// Reachability check timeout for search endpoints
    pub endpoint_timeout_ms: u64,

    /// Mirror list download timeout
    pub mirror_timeout_ms: u64,

    /// Number of channels probed; later channels emit their filtered seed
    /// list. `Some(200)` probes exactly 200 channels
    pub max_probed_channels: Option<usize>,

    /// Pause after each category block
    pub category_pause_ms: u64,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            endpoint_timeout_ms: 30_000,
            mirror_timeout_ms: 30_000,
            max_probed_channels: None,
            category_pause_ms: 1_000,
        }
    }
}

impl ProberConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn endpoint_timeout(&self) -> Duration {
        Duration::from_millis(self.endpoint_timeout_ms)
    }

    #[must_use]
    pub fn mirror_timeout(&self) -> Duration {
        Duration::from_millis(self.mirror_timeout_ms)
    }

    #[must_use]
    pub fn category_pause(&self) -> Duration {
        Duration::from_millis(self.category_pause_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Where the resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `user_config.toml`
    User(PathBuf),
    /// `config.toml` or an explicit `--config` path
    File(PathBuf),
    /// No file found
    Defaults,
}

impl ConfigSource {
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

/// Outcome of [`Config::load`]
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,

    /// Problems met while loading; the affected values were replaced by
    /// defaults
    pub issues: Vec<String>,
}

impl LoadedConfig {
    /// Log every loading problem as a warning
    pub fn report(&self) {
        for issue in &self.issues {
            tracing::warn!(issue = %issue, "Configuration problem");
        }
    }
}

impl Config {
    /// Resolve the configuration for this run
    ///
    /// [`Config::load`] followed by [`Config::sanitize`]. Loading problems
    /// are logged.
    pub fn resolve(explicit: Option<&Path>) -> (Self, ConfigSource) {
        let loaded = Self::load(explicit);
        loaded.report();

        let LoadedConfig {
            mut config, source, ..
        } = loaded;
        config.sanitize();
        (config, source)
    }

    /// Locate and load the configuration, with environment overrides
    ///
    /// An explicit path is used as-is; otherwise `user_config.toml` then
    /// `config.toml` in the working directory. An unreadable or unparsable
    /// file is replaced by defaults and recorded in
    /// [`LoadedConfig::issues`], as are unknown `ipv_type` values. Nothing
    /// is logged here, so the caller can report after logging is set up.
    /// Values are not sanitized.
    pub fn load(explicit: Option<&Path>) -> LoadedConfig {
        let source = match explicit {
            Some(path) => ConfigSource::File(path.to_path_buf()),
            None if Path::new(USER_CONFIG_FILE).exists() => {
                ConfigSource::User(PathBuf::from(USER_CONFIG_FILE))
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                ConfigSource::File(PathBuf::from(DEFAULT_CONFIG_FILE))
            }
            None => ConfigSource::Defaults,
        };

        let mut issues = Vec::new();
        let mut config = match &source {
            ConfigSource::User(path) | ConfigSource::File(path) => match Self::read_file(path) {
                Ok((config, file_issues)) => {
                    issues.extend(file_issues);
                    config
                }
                Err(e) => {
                    issues.push(format!("{e:#}; using default configuration"));
                    Self::default()
                }
            },
            ConfigSource::Defaults => Self::default(),
        };

        issues.extend(config.apply_env_overrides());
        LoadedConfig {
            config,
            source,
            issues,
        }
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::read_file(path).map(|(config, _)| config)
    }

    /// Load a file along with the values it set that were replaced by
    /// defaults
    fn read_file(path: &Path) -> Result<(Self, Vec<String>)> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let table: toml::Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;
        let issues = lenient_value_issues(&table);

        let config: Self = toml::Value::Table(table)
            .try_into()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok((config, issues))
    }

    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for issue in config.apply_env_overrides() {
            tracing::warn!(issue = %issue, "Configuration problem");
        }
        config
    }

    /// Apply `STREAMSIFT_*` overrides and the CI probing cap
    ///
    /// Returns the overrides that were ignored.
    pub fn apply_env_overrides(&mut self) -> Vec<String> {
        let mut issues = Vec::new();

        if let Some(limit) = env_parse::<i64>("STREAMSIFT_URLS_LIMIT") {
            self.selection.urls_limit = limit;
        }

        if let Some(days) = env_parse::<i64>("STREAMSIFT_RECENT_DAYS") {
            self.selection.recent_days = days;
        }

        if let Ok(raw) = std::env::var("STREAMSIFT_IPV_TYPE") {
            match raw.parse::<IpvType>() {
                Ok(ipv_type) => self.filter.ipv_type = ipv_type,
                Err(e) => issues.push(format!("Ignoring STREAMSIFT_IPV_TYPE: {e}")),
            }
        }

        if let Some(timeout_ms) = env_parse::<u64>("STREAMSIFT_PROBE_TIMEOUT_MS") {
            self.prober.timeout_ms = timeout_ms;
        }

        if let Ok(level) = std::env::var("STREAMSIFT_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("STREAMSIFT_LOG_FORMAT") {
            self.logging.format = format;
        }

        if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
            && self.prober.max_probed_channels.is_none()
        {
            self.prober.max_probed_channels = Some(CI_MAX_PROBED_CHANNELS);
        }

        issues
    }

    /// Replace invalid values with their defaults
    ///
    /// Never fails; every replacement is logged.
    pub fn sanitize(&mut self) {
        let selection = &mut self.selection;

        if selection.urls_limit <= 0 {
            tracing::warn!(urls_limit = selection.urls_limit, "urls_limit must be positive, using default");
            selection.urls_limit = DEFAULT_URLS_LIMIT;
        }

        if !(1..=365).contains(&selection.recent_days) {
            tracing::warn!(recent_days = selection.recent_days, "recent_days out of 1..=365, using default");
            selection.recent_days = DEFAULT_RECENT_DAYS;
        }

        if !weights_valid(selection.response_time_weight, selection.resolution_weight) {
            tracing::warn!(
                response_time_weight = selection.response_time_weight,
                resolution_weight = selection.resolution_weight,
                "Weights must lie in [0, 1] and sum to 1, using 0.5/0.5"
            );
            selection.response_time_weight = DEFAULT_RESPONSE_TIME_WEIGHT;
            selection.resolution_weight = DEFAULT_RESOLUTION_WEIGHT;
        }

        if self.prober.timeout_ms == 0 {
            tracing::warn!("prober.timeout_ms must be positive, using default");
            self.prober.timeout_ms = ProberConfig::default().timeout_ms;
        }
    }

    /// Validate configuration values
    ///
    /// Reports the same problems [`Config::sanitize`] would silently fix.
    pub fn validate(&self) -> Result<()> {
        let selection = &self.selection;

        if selection.urls_limit <= 0 {
            anyhow::bail!("urls_limit must be greater than 0");
        }

        if !(1..=365).contains(&selection.recent_days) {
            anyhow::bail!("recent_days must be between 1 and 365");
        }

        if !weights_valid(selection.response_time_weight, selection.resolution_weight) {
            anyhow::bail!("response_time_weight and resolution_weight must lie in [0, 1] and sum to 1");
        }

        if self.prober.timeout_ms == 0 {
            anyhow::bail!("prober.timeout_ms must be greater than 0");
        }

        Ok(())
    }
}

/// Both weights in `[0, 1]` and summing to 1
pub fn weights_valid(response_time_weight: f64, resolution_weight: f64) -> bool {
    (0.0..=1.0).contains(&response_time_weight)
        && (0.0..=1.0).contains(&resolution_weight)
        && ((response_time_weight + resolution_weight) - 1.0).abs() < 1e-9
}

/// Values the file sets that deserialize to a default instead of failing
fn lenient_value_issues(table: &toml::Table) -> Vec<String> {
    table
        .get("filter")
        .and_then(|filter| filter.get("ipv_type"))
        .and_then(toml::Value::as_str)
        .and_then(|raw| raw.parse::<IpvType>().err())
        .map(|e| format!("filter.ipv_type: {e}, using ipv4"))
        .into_iter()
        .collect()
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sanitize_replaces_invalid_values() {
        let mut config = Config::default();
        config.selection.urls_limit = 0;
        config.selection.recent_days = 400;
        config.selection.response_time_weight = 0.7;
        config.selection.resolution_weight = 0.7;
        assert!(config.validate().is_err());

        config.sanitize();
        assert_eq!(config.selection.urls_limit, DEFAULT_URLS_LIMIT);
        assert_eq!(config.selection.recent_days, DEFAULT_RECENT_DAYS);
        assert_eq!(config.selection.response_time_weight, 0.5);
        assert_eq!(config.selection.resolution_weight, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sanitize_keeps_valid_weights() {
        let mut config = Config::default();
        config.selection.response_time_weight = 0.3;
        config.selection.resolution_weight = 0.7;
        config.sanitize();
        assert_eq!(config.selection.response_time_weight, 0.3);
        assert_eq!(config.selection.resolution_weight, 0.7);
    }

    #[test]
    fn test_weights_valid() {
        assert!(weights_valid(0.5, 0.5));
        assert!(weights_valid(1.0, 0.0));
        assert!(weights_valid(0.1, 0.9));
        assert!(!weights_valid(-0.5, 1.5));
        assert!(!weights_valid(0.5, 0.6));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [selection]
            urls_limit = 5

            [filter]
            ipv_type = "IPv6"
            domain_blacklist = ["epg.pw"]
            "#,
        )
        .unwrap();

        assert_eq!(config.selection.urls_limit, 5);
        assert_eq!(config.selection.recent_days, DEFAULT_RECENT_DAYS);
        assert_eq!(config.filter.ipv_type, IpvType::Ipv6);
        assert_eq!(config.filter.domain_blacklist, vec!["epg.pw"]);
        assert_eq!(config.prober.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_ipv_type_falls_back() {
        let config: Config = toml::from_str("[filter]\nipv_type = \"ipv5\"\n").unwrap();
        assert_eq!(config.filter.ipv_type, IpvType::Ipv4);
    }

    #[test]
    fn test_lenient_value_issues() {
        let table: toml::Table = toml::from_str("[filter]\nipv_type = \"ipv5\"\n").unwrap();
        let issues = lenient_value_issues(&table);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("ipv5"));

        let table: toml::Table = toml::from_str("[filter]\nipv_type = \"any\"\n").unwrap();
        assert!(lenient_value_issues(&table).is_empty());
    }

    #[test]
    fn test_page_num_for_favorites() {
        let sources = SourcesConfig {
            favorite_list: vec!["CCTV1".into()],
            ..Default::default()
        };
        assert_eq!(sources.page_num_for("CCTV1"), 6);
        assert_eq!(sources.page_num_for("CCTV2"), 3);
    }

    #[test]
    fn test_limit_conversion() {
        let selection = SelectionConfig {
            urls_limit: 7,
            ..Default::default()
        };
        assert_eq!(selection.limit(), 7);
    }
}
