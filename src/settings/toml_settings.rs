use serde::{Deserialize, Serialize};

// Default value helpers for serde
fn default_dash() -> String {
    "-".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_clash_user_agent() -> String {
    "ClashforWindows/0.20.19".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_factor() -> f64 {
    1.0
}

fn default_retry_statuses() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

fn default_cache_dir() -> String {
    ".cache".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_output_dir() -> String {
    "public".to_string()
}

fn default_json_name() -> String {
    "data.json".to_string()
}

fn default_subscription_name() -> String {
    "good.txt".to_string()
}

fn default_flow() -> String {
    "xtls-rprx-vision".to_string()
}

fn default_sni() -> String {
    "www.microsoft.com".to_string()
}

fn default_public_key() -> String {
    "0XqnX5cXAa6isFhTW4eIM_CaAHTXJJ8tbMs9XabxJ1A".to_string()
}

fn default_fingerprint() -> String {
    "chrome".to_string()
}

fn default_markers() -> Vec<String> {
    ["🇨🇳", "_CN_", "中国", "China"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_date_format() -> String {
    "%m-%d".to_string()
}

fn default_region_rules() -> Vec<RegionRule> {
    vec![
        RegionRule::new("hk", "🇭🇰 香港"),
        RegionRule::new("jp", "🇯🇵 日本"),
        RegionRule::new("all", "🇺🇸 美国(@未来专属线路)"),
    ]
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// User agent sent when downloading Clash YAML subscriptions
    pub clash_user_agent: String,
    pub max_retries: u32,
    /// Retry n sleeps `backoff_factor * 2^(n-1)` seconds
    pub backoff_factor: f64,
    pub retry_statuses: Vec<u16>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            clash_user_agent: default_clash_user_agent(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            retry_statuses: default_retry_statuses(),
        }
    }
}

/// On-disk response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub dir: String,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            enabled: false,
            dir: default_cache_dir(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Output artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: String,
    /// May contain `{date}`, expanded to YYYYMMDD
    pub json_name: String,
    /// May contain `{date}`, expanded to YYYYMMDD
    pub subscription_name: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            dir: default_output_dir(),
            json_name: default_json_name(),
            subscription_name: default_subscription_name(),
        }
    }
}

/// Defaults used when parsing and re-encoding vless reality links
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeSettings {
    pub default_flow: String,
    pub default_sni: String,
    pub default_public_key: String,
    pub default_fingerprint: String,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        NormalizeSettings {
            default_flow: default_flow(),
            default_sni: default_sni(),
            default_public_key: default_public_key(),
            default_fingerprint: default_fingerprint(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterPolicy {
    /// Discard nodes whose name contains a marker
    #[default]
    Drop,
    /// Keep every node
    Keep,
}

/// Region blacklist settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub policy: FilterPolicy,
    pub markers: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        FilterSettings {
            policy: FilterPolicy::default(),
            markers: default_markers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchTarget {
    Name,
    #[default]
    Server,
    Both,
}

/// One region rule: a case-insensitive substring and the label it maps to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRule {
    #[serde(rename = "match")]
    pub pattern: String,
    pub label: String,
}

impl RegionRule {
    pub fn new(pattern: &str, label: &str) -> Self {
        RegionRule {
            pattern: pattern.to_string(),
            label: label.to_string(),
        }
    }
}

/// Rename pass settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameSettings {
    pub enabled: bool,
    pub match_on: MatchTarget,
    pub rules: Vec<RegionRule>,
    /// Label for nodes no rule matches; `None` keeps their name
    pub fallback: Option<String>,
    pub date_suffix: bool,
    pub date_separator: String,
    /// chrono format string
    pub date_format: String,
}

impl Default for RenameSettings {
    fn default() -> Self {
        RenameSettings {
            enabled: false,
            match_on: MatchTarget::default(),
            rules: default_region_rules(),
            fallback: None,
            date_suffix: true,
            date_separator: default_dash(),
            date_format: default_date_format(),
        }
    }
}
