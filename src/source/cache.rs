//! TTL cache for fetched tables.
//!
//! Each entry is a `Snapshot` carrying the table, the time it was fetched
//! and a SHA-256 checksum of its content. Readers get the cached snapshot
//! while it is younger than the TTL; otherwise the loader runs and the
//! result replaces the entry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use super::table::Table;

#[derive(Debug, Clone)]
pub struct Snapshot {
    /// "sha256:<hex>" over the serialized table.
    pub checksum: String,
    pub fetched_at: DateTime<Utc>,
    pub table: Table,
}

impl Snapshot {
    pub fn new(table: Table) -> Self {
        Self {
            checksum: checksum(&table),
            fetched_at: Utc::now(),
            table,
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or_default()
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }

    pub fn verify(&self) -> bool {
        self.checksum == checksum(&self.table)
    }
}

fn checksum(table: &Table) -> String {
    let serialized = serde_json::to_string(table).unwrap_or_default();
    format!("sha256:{:x}", Sha256::digest(serialized.as_bytes()))
}

#[derive(Default)]
pub struct TableCache {
    entries: RwLock<HashMap<String, Arc<Snapshot>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached snapshot for `key` if fresher than `ttl`, else load and store.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        load: F,
    ) -> Result<Arc<Snapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Table>>,
    {
        if let Some(snapshot) = self.entries.read().await.get(key) {
            if !snapshot.is_stale(ttl) && snapshot.verify() {
                debug!(key, checksum = %snapshot.checksum, "table served from cache");
                return Ok(snapshot.clone());
            }
        }
        self.refresh(key, load).await
    }

    /// Load `key` unconditionally and replace the cached entry.
    pub async fn refresh<F, Fut>(&self, key: &str, load: F) -> Result<Arc<Snapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Table>>,
    {
        let snapshot = Arc::new(Snapshot::new(load().await?));
        debug!(
            key,
            rows = snapshot.table.rows.len(),
            checksum = %snapshot.checksum,
            "table fetched"
        );
        self.entries
            .write()
            .await
            .insert(key.to_string(), snapshot.clone());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn table(cell: &str) -> Table {
        Table {
            headers: vec!["a".into()],
            rows: vec![vec![cell.into()]],
        }
    }

    #[tokio::test]
    async fn fresh_entry_is_reused() {
        let cache = TableCache::new();
        let counter = AtomicUsize::new(0);
        let loads = &counter;
        let ttl = Duration::from_secs(60);

        for _ in 0..3 {
            let snap = cache
                .get_or_refresh("users", ttl, || async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(table("x"))
                })
                .await
                .unwrap();
            assert_eq!(snap.table, table("x"));
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_ttl_always_reloads() {
        let cache = TableCache::new();
        let counter = AtomicUsize::new(0);
        let loads = &counter;
        for _ in 0..2 {
            cache
                .get_or_refresh("status", Duration::ZERO, || async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(table("y"))
                })
                .await
                .unwrap();
        }
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_replaces_entry() {
        let cache = TableCache::new();
        let ttl = Duration::from_secs(60);
        cache
            .get_or_refresh("k", ttl, || async { Ok(table("old")) })
            .await
            .unwrap();
        cache.refresh("k", || async { Ok(table("new")) }).await.unwrap();

        let snap = cache
            .get_or_refresh("k", ttl, || async { Ok(table("unused")) })
            .await
            .unwrap();
        assert_eq!(snap.table, table("new"));
        assert!(snap.verify());
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_entry() {
        let cache = TableCache::new();
        cache.refresh("k", || async { Ok(table("kept")) }).await.unwrap();
        let err = cache
            .refresh("k", || async { Err(anyhow::anyhow!("offline")) })
            .await;
        assert!(err.is_err());
        let snap = cache
            .get_or_refresh("k", Duration::from_secs(60), || async {
                Err(anyhow::anyhow!("offline"))
            })
            .await
            .unwrap();
        assert_eq!(snap.table, table("kept"));
    }

    #[test]
    fn checksum_tracks_content() {
        let a = Snapshot::new(table("a"));
        let b = Snapshot::new(table("b"));
        assert!(a.checksum.starts_with("sha256:"));
        assert_ne!(a.checksum, b.checksum);
        let mut tampered = a.clone();
        tampered.table = table("z");
        assert!(!tampered.verify());
    }
}
