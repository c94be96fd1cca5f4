//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the workbook holding the item sheets.
    #[serde(default = "default_store")]
    pub store: PathBuf,

    /// Column carrying the raw item names.
    #[serde(default = "default_item_column")]
    pub item_column: String,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay between requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Hard timeout for a single page load, in milliseconds.
    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,

    /// Interval between readiness re-polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Attempts per row resolution (transient failures only).
    #[serde(default = "default_resolve_attempts")]
    pub resolve_attempts: u32,

    /// Delay between resolution attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub resolve_retry_delay_ms: u64,

    /// Attempts for the final atomic replace when the store is locked.
    #[serde(default = "default_replace_attempts")]
    pub replace_attempts: u32,

    /// Delay between replace attempts, in milliseconds.
    #[serde(default = "default_replace_delay_ms")]
    pub replace_retry_delay_ms: u64,
}

fn default_store() -> PathBuf {
    PathBuf::from("withdrawals.workbook")
}

fn default_item_column() -> String {
    "steam_market_hash_name".to_string()
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_delay_jitter_ms() -> u64 {
    3000
}

fn default_page_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_resolve_attempts() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_replace_attempts() -> u32 {
    5
}

fn default_replace_delay_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: default_store(),
            item_column: default_item_column(),
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            page_timeout_ms: default_page_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            resolve_attempts: default_resolve_attempts(),
            resolve_retry_delay_ms: default_retry_delay_ms(),
            replace_attempts: default_replace_attempts(),
            replace_retry_delay_ms: default_replace_delay_ms(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("skinsweep.toml");
        if local_config.exists() {
            debug!("Found skinsweep.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("skinsweep").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(store) = std::env::var("SKINSWEEP_STORE") {
            self.store = PathBuf::from(store);
        }

        if let Ok(proxy) = std::env::var("SKINSWEEP_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("SKINSWEEP_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store, PathBuf::from("withdrawals.workbook"));
        assert_eq!(config.item_column, "steam_market_hash_name");
        assert_eq!(config.delay_ms, 2000);
        assert_eq!(config.delay_jitter_ms, 3000);
        assert_eq!(config.page_timeout_ms, 30_000);
        assert_eq!(config.resolve_attempts, 2);
        assert_eq!(config.replace_attempts, 5);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            store = "prices.workbook"
            delay_ms = 3000
            replace_attempts = 8
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.store, PathBuf::from("prices.workbook"));
        assert_eq!(config.delay_ms, 3000);
        assert_eq!(config.replace_attempts, 8);
        // Unspecified fields keep their defaults.
        assert_eq!(config.item_column, "steam_market_hash_name");
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            item_column = "market_name"
            delay_ms = 4000
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.item_column, "market_name");
        assert_eq!(config.delay_ms, 4000);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let result = Config::from_file(file.path());
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            store = "other.workbook"
            "#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.store, PathBuf::from("other.workbook"));
    }

    #[test]
    fn test_config_with_env() {
        let orig_store = std::env::var("SKINSWEEP_STORE").ok();
        let orig_delay = std::env::var("SKINSWEEP_DELAY").ok();

        std::env::set_var("SKINSWEEP_STORE", "env.workbook");
        std::env::set_var("SKINSWEEP_DELAY", "5000");

        let config = Config::new().with_env();
        assert_eq!(config.store, PathBuf::from("env.workbook"));
        assert_eq!(config.delay_ms, 5000);

        match orig_store {
            Some(v) => std::env::set_var("SKINSWEEP_STORE", v),
            None => std::env::remove_var("SKINSWEEP_STORE"),
        }
        match orig_delay {
            Some(v) => std::env::set_var("SKINSWEEP_DELAY", v),
            None => std::env::remove_var("SKINSWEEP_DELAY"),
        }
    }

    #[test]
    fn test_config_with_env_invalid_delay() {
        let orig_delay = std::env::var("SKINSWEEP_DELAY").ok();
        std::env::set_var("SKINSWEEP_DELAY", "not_a_number");

        let config = Config::new().with_env();
        assert_eq!(config.delay_ms, 2000);

        match orig_delay {
            Some(v) => std::env::set_var("SKINSWEEP_DELAY", v),
            None => std::env::remove_var("SKINSWEEP_DELAY"),
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config { delay_ms: 123, resolve_attempts: 4, ..Config::default() };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.delay_ms, 123);
        assert_eq!(parsed.resolve_attempts, 4);
    }
}
