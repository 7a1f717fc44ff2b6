use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::offline::DEFAULT_FAIL_THRESHOLD;

const ENV_PREFIX: &str = "PINGBOARD_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http_addr: String,
    pub log_level: String,
    /// Consecutive failures after which a server counts as offline.
    pub fail_threshold: u32,
    /// How long a fetched table is served before it is read again.
    pub cache_ttl_secs: u64,
    /// Offset used for every timestamp shown to users. 330 is IST.
    pub display_utc_offset_minutes: i32,
    pub fetch_timeout_secs: u64,
    /// Sessions idle for longer than this are dropped.
    pub session_idle_secs: u64,
    /// How often idle sessions are swept while serving. 0 disables the sweep.
    pub session_sweep_secs: u64,
    pub sources: SourcesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8501".to_string(),
            log_level: "info".to_string(),
            fail_threshold: DEFAULT_FAIL_THRESHOLD,
            cache_ttl_secs: 30,
            display_utc_offset_minutes: 330,
            fetch_timeout_secs: 10,
            session_idle_secs: 1800,
            session_sweep_secs: 60,
            sources: SourcesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub users: SourceConfig,
    pub status: SourceConfig,
    /// Separate observation log. When unset the status table doubles as
    /// the history.
    pub history: Option<SourceConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            users: SourceConfig::File {
                path: PathBuf::from("users.csv"),
            },
            status: SourceConfig::File {
                path: PathBuf::from("status.csv"),
            },
            history: None,
        }
    }
}

/// Where a table is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// CSV file on local disk.
    File { path: PathBuf },
    /// CSV served over HTTP(S), e.g. a published spreadsheet export.
    Url { url: String },
}

impl SourceConfig {
    pub fn describe(&self) -> String {
        match self {
            SourceConfig::File { path } => path.display().to_string(),
            SourceConfig::Url { url } => url.clone(),
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("pingboard").join("config.yaml"))
    }
}

/// Layer defaults, the YAML file (custom path or the default location) and
/// `PINGBOARD_*` environment variables, in that order.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::path()?,
    };
    figment_for(&path)
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .with_context(|| format!("loading configuration from {}", path.display()))
}

fn figment_for(path: &Path) -> Figment {
    Figment::from(Serialized::defaults(Config::default())).merge(Yaml::file(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg: Config = figment_for(&dir.path().join("absent.yaml"))
            .extract()
            .unwrap();
        assert_eq!(cfg.fail_threshold, 5);
        assert_eq!(cfg.cache_ttl_secs, 30);
        assert_eq!(cfg.display_utc_offset_minutes, 330);
        assert!(cfg.sources.history.is_none());
    }

    #[test]
    fn yaml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "fail_threshold: 3\n\
             sources:\n  \
               users:\n    kind: url\n    url: https://example.test/users.csv\n  \
               status:\n    kind: file\n    path: /srv/status.csv\n  \
               history:\n    kind: file\n    path: /srv/history.csv\n",
        )
        .unwrap();

        let cfg: Config = figment_for(&path).extract().unwrap();
        assert_eq!(cfg.fail_threshold, 3);
        assert_eq!(cfg.http_addr, "127.0.0.1:8501");
        assert_eq!(
            cfg.sources.users,
            SourceConfig::Url {
                url: "https://example.test/users.csv".into()
            }
        );
        assert_eq!(
            cfg.sources.history,
            Some(SourceConfig::File {
                path: PathBuf::from("/srv/history.csv")
            })
        );
    }
}
