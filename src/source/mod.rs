//! Read-only table sources: local CSV files and CSV over HTTP.

pub mod cache;
pub mod table;

use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::SourceConfig;

use self::table::Table;

pub struct TableLoader {
    http: reqwest::Client,
}

impl TableLoader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { http })
    }

    pub async fn fetch(&self, source: &SourceConfig) -> Result<Table> {
        let text = match source {
            SourceConfig::File { path } => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
            SourceConfig::Url { url } => self
                .http
                .get(url)
                .send()
                .await
                .with_context(|| format!("GET {}", url))?
                .error_for_status()
                .with_context(|| format!("{} returned error status", url))?
                .text()
                .await
                .with_context(|| format!("reading body from {}", url))?,
        };
        Table::from_csv(&text).with_context(|| format!("parsing {}", source.describe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        std::fs::write(&path, "Username,Password,Centres\nalice,pw,ALL\n").unwrap();

        let loader = TableLoader::new(Duration::from_secs(1)).unwrap();
        let table = loader.fetch(&SourceConfig::File { path }).await.unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = TableLoader::new(Duration::from_secs(1)).unwrap();
        let err = loader
            .fetch(&SourceConfig::File {
                path: dir.path().join("nope.csv"),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }
}
