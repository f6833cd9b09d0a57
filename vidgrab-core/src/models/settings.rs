use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::media::{Format, Quality, DEFAULT_OUTPUT_DIR};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default = "RetryPolicy::cli_default")]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub proxy: ProxySettings,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub format: Format,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            quality: Quality::default(),
            format: Format::default(),
        }
    }
}

pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    DEFAULT_BATCH_CONCURRENCY
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    #[serde(default = "default_stall_timeout_secs")]
    pub stall_timeout_secs: u64,
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36".into()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".into()
}

fn default_stall_timeout_secs() -> u64 {
    45
}

impl NetworkSettings {
    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stall_timeout_secs.max(1))
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            stall_timeout_secs: default_stall_timeout_secs(),
            ytdlp_path: None,
        }
    }
}

/// Retry policy for transient download failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default)]
    pub use_jitter: bool,
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self::default()
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn cli_default() -> Self {
        Self {
            use_jitter: true,
            ..Self::with_max_retries(2)
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = base.min(self.max_delay_ms as f64) as u64;

        if self.use_jitter {
            // up to 25%
            let jitter = (delay_ms as f64 * 0.25 * rand::random::<f64>()) as u64;
            Duration::from_millis(delay_ms + jitter)
        } else {
            Duration::from_millis(delay_ms)
        }
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            use_jitter: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_proxy_type")]
    pub proxy_type: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_proxy_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_proxy_type() -> String {
    "http".into()
}

fn default_proxy_port() -> u16 {
    8080
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            proxy_type: default_proxy_type(),
            host: String::new(),
            port: default_proxy_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl ProxySettings {
    pub fn url(&self) -> Option<String> {
        if !self.enabled || self.host.is_empty() {
            return None;
        }
        let scheme = match self.proxy_type.as_str() {
            "socks5" => "socks5",
            "https" => "https",
            _ => "http",
        };
        if !self.username.is_empty() {
            Some(format!(
                "{}://{}:{}@{}:{}",
                scheme, self.username, self.password, self.host, self.port
            ))
        } else {
            Some(format!("{}://{}:{}", scheme, self.host, self.port))
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            download: DownloadSettings::default(),
            batch: BatchSettings::default(),
            network: NetworkSettings::default(),
            retry: RetryPolicy::cli_default(),
            proxy: ProxySettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{"schema_version":1}"#).unwrap();
        assert_eq!(settings.batch.concurrency, 3);
        assert_eq!(settings.download.output_dir, PathBuf::from("./downloads"));
        assert_eq!(settings.network.stall_timeout_secs, 45);
        assert_eq!(settings.retry.max_retries, 2);
        assert!(settings.proxy.url().is_none());
    }

    #[test]
    fn partial_file_keeps_given_sections() {
        let settings: AppSettings = serde_json::from_str(r#"{"batch":{"concurrency":5}}"#).unwrap();
        assert_eq!(settings.schema_version, 1);
        assert_eq!(settings.batch.concurrency, 5);
        assert_eq!(settings.network.stall_timeout_secs, 45);
    }

    #[test]
    fn proxy_default_matches_missing_fields() {
        let parsed: ProxySettings = serde_json::from_str("{}").unwrap();
        let built = ProxySettings::default();
        assert_eq!(built.proxy_type, parsed.proxy_type);
        assert_eq!(built.port, parsed.port);
        assert_eq!(built.proxy_type, "http");
        assert_eq!(built.port, 8080);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 3000,
            backoff_multiplier: 2.0,
            use_jitter: false,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(3000));
        assert!(policy.should_retry(4));
        assert!(!policy.should_retry(5));
    }

    #[test]
    fn jitter_stays_within_quarter() {
        let policy = RetryPolicy {
            use_jitter: true,
            ..RetryPolicy::with_max_retries(1)
        };
        let d = policy.delay_for_attempt(0);
        assert!(d >= Duration::from_millis(1000) && d <= Duration::from_millis(1250));
    }

    #[test]
    fn no_retry_never_retries() {
        assert!(!RetryPolicy::no_retry().should_retry(0));
    }

    #[test]
    fn proxy_url_with_credentials() {
        let proxy = ProxySettings {
            enabled: true,
            proxy_type: "socks5".into(),
            host: "127.0.0.1".into(),
            port: 1080,
            username: "u".into(),
            password: "p".into(),
        };
        assert_eq!(proxy.url().as_deref(), Some("socks5://u:p@127.0.0.1:1080"));
    }
}
