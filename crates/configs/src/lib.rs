use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

pub const CONFIG_PATH_ENV: &str = "APISHAPE_CONFIG";
pub const CACHE_DIR_ENV: &str = "APISHAPE_CACHE_DIR";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true, dir: default_cache_dir(), namespace: default_namespace() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: default_timeout(), user_agent: default_user_agent() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ValidationConfig {
    /// 未声明的参数直接报错，而不是警告
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_true() -> bool { true }
fn default_cache_dir() -> PathBuf { PathBuf::from("data/cache") }
fn default_namespace() -> String { "default".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_user_agent() -> String { format!("apishape/{}", env!("CARGO_PKG_VERSION")) }

/// Load from `APISHAPE_CONFIG` (default `apishape.toml`); a missing file means defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "apishape.toml".to_string());
    if std::fs::metadata(&path).is_err() {
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 允许通过环境变量覆盖缓存目录
        self.cache.normalize_from_env();
        self.cache.validate()?;
        self.http.normalize()?;
        Ok(())
    }
}

impl CacheConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.dir = PathBuf::from(dir);
            }
        }
        if self.dir.as_os_str().is_empty() {
            self.dir = default_cache_dir();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ns = self.namespace.trim();
        if ns.is_empty() {
            return Err(anyhow!("cache.namespace must not be empty"));
        }
        if ns.contains(['/', '\\']) || ns == "." || ns == ".." {
            return Err(anyhow!("cache.namespace must be a plain file name"));
        }
        Ok(())
    }
}

impl HttpConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("http.timeout_secs must be a positive number of seconds"));
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = default_user_agent();
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let mut cfg = parse("").unwrap();
        cfg.normalize_and_validate().unwrap();
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.cache.namespace, "default");
        assert_eq!(cfg.http.timeout(), Duration::from_secs(30));
        assert!(!cfg.validation.strict);
        assert_eq!(cfg.logging.format, LogFormat::Compact);
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = parse(
            r#"
            [cache]
            enabled = false
            dir = "/tmp/apishape"
            namespace = "work"

            [http]
            timeout_secs = 5

            [validation]
            strict = true

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert!(!cfg.cache.enabled);
        assert_eq!(cfg.cache.dir, PathBuf::from("/tmp/apishape"));
        assert_eq!(cfg.http.timeout_secs, 5);
        assert!(cfg.http.user_agent.starts_with("apishape/"));
        assert!(cfg.validation.strict);
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = parse("[http]\ntimeout_secs = 0").unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = parse("[cache]\nnamespace = \"../escape\"").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }
}
