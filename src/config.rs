use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding `general.base_url`.
pub const ENV_BASE: &str = "SCRUTINY_BASE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Scrutiny web root, e.g. "http://nas:8080"
    pub base_url: String,
    /// Connect and total timeout per request, in seconds
    pub timeout_sec: u64,
    /// Extra attempts after a failed request
    pub retry: u32,
    /// Fixed pause between attempts, in milliseconds
    pub retry_backoff_ms: u64,
    /// Wear rule file; `$WEAR_INVERT_CONFIG` takes precedence when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<PathBuf>,
}

/// Temperature gauge range and alarm point, in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub temp_min:  f64,
    pub temp_max:  f64,
    /// At or above this the device is flagged hot (NVMe throttling range)
    pub temp_crit: f64,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_url:         "http://192.168.1.2:6090".to_string(),
            timeout_sec:      6,
            retry:            1,
            retry_backoff_ms: 200,
            rules_path:       default_rules_path(),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { temp_min: 20.0, temp_max: 70.0, temp_crit: 65.0 }
    }
}

impl GeneralConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_sec.max(1))
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn default_rules_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("drivelife").join("wear_invert.cfg"))
}

/// Strip trailing slashes and a trailing "/api/summary" so either the web
/// root or the summary endpoint can be configured.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    let lower = url.to_lowercase();
    let url = if lower.ends_with("/api/summary") {
        &url[..url.len() - "/api/summary".len()]
    } else {
        url
    };
    url.trim_end_matches('/').to_string()
}

// ── Load / Save ──────────────────────────────────────────────────────

impl Config {
    /// Read the config file (writing defaults on first run), then apply
    /// environment overrides.
    pub fn load() -> Self {
        let mut cfg = match try_load() {
            Ok(c)  => c,
            Err(e) => {
                log::debug!("using default config: {}", e);
                if let Err(e) = try_write_defaults() {
                    log::debug!("could not write default config: {}", e);
                }
                Config::default()
            }
        };
        cfg.apply_env(std::env::var(ENV_BASE).ok().as_deref());
        cfg
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("drivelife").join("drivelife.toml"))
    }

    pub fn apply_env(&mut self, base: Option<&str>) {
        if let Some(b) = base.filter(|b| !b.trim().is_empty()) {
            self.general.base_url = b.to_string();
        }
        self.general.base_url = normalize_base_url(&self.general.base_url);
    }
}

fn try_load() -> Result<Config> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    let text = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&text)?;
    Ok(cfg)
}

fn try_write_defaults() -> Result<()> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# drivelife configuration\n# Generated on first run, edit freely\n\n{}", text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_normalization() {
        assert_eq!(normalize_base_url("http://nas:6090/"), "http://nas:6090");
        assert_eq!(normalize_base_url("http://nas:6090/api/summary"), "http://nas:6090");
        assert_eq!(normalize_base_url("http://nas:6090/API/Summary/"), "http://nas:6090");
        assert_eq!(normalize_base_url("http://nas:6090/scrutiny//api/summary"), "http://nas:6090/scrutiny");
    }

    #[test]
    fn env_overrides_base() {
        let mut cfg = Config::default();
        cfg.apply_env(Some("http://other:8080/api/summary"));
        assert_eq!(cfg.general.base_url, "http://other:8080");

        let mut cfg = Config::default();
        cfg.apply_env(Some("  "));
        assert_eq!(cfg.general.base_url, "http://192.168.1.2:6090");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: Config = toml::from_str("[thresholds]\ntemp_max = 80.0\n").unwrap();
        assert_eq!(cfg.thresholds.temp_max, 80.0);
        assert_eq!(cfg.thresholds.temp_min, 20.0);
        assert_eq!(cfg.general.timeout_sec, 6);
        assert_eq!(cfg.general.retry, 1);
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.thresholds, Thresholds::default());
        assert_eq!(back.general.base_url, GeneralConfig::default().base_url);
    }
}
