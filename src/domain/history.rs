//! Grouping and ordering of check observations.
//!
//! Sources make no ordering promise, so every per-server history is sorted
//! by timestamp here before it reaches the detector.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::offline::{self, Detection};
use super::record::{series_key, CheckStatus, StatusRecord};

type Key = (String, String);

/// Sorted observation history for every (centre, server) pair.
#[derive(Debug, Clone, Default)]
pub struct HistoryIndex {
    series: HashMap<Key, Vec<(DateTime<Utc>, CheckStatus)>>,
}

impl HistoryIndex {
    pub fn from_records(records: &[StatusRecord]) -> Self {
        let mut series: HashMap<Key, Vec<(DateTime<Utc>, CheckStatus)>> = HashMap::new();
        for record in records {
            series
                .entry(record.key())
                .or_default()
                .push((record.timestamp, record.status));
        }
        // Stable: equal timestamps keep table order.
        for points in series.values_mut() {
            points.sort_by_key(|(ts, _)| *ts);
        }
        Self { series }
    }

    pub fn series(&self, record: &StatusRecord) -> &[(DateTime<Utc>, CheckStatus)] {
        self.series_for(&record.centre, &record.server)
    }

    pub fn series_for(&self, centre: &str, server: &str) -> &[(DateTime<Utc>, CheckStatus)] {
        self.series
            .get(&series_key(centre, server))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn detect(&self, record: &StatusRecord, fail_threshold: u32) -> Detection {
        offline::detect(self.series(record), fail_threshold)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Reduce observations to the newest one per (centre, server), listed in
/// the order each pair first appears. Ties on timestamp go to the later row.
pub fn latest_per_key(records: &[StatusRecord]) -> Vec<StatusRecord> {
    let mut order: Vec<Key> = Vec::new();
    let mut newest: HashMap<Key, &StatusRecord> = HashMap::new();

    for record in records {
        let key = record.key();
        let replace = match newest.get(&key) {
            Some(current) => current.timestamp <= record.timestamp,
            None => {
                order.push(key.clone());
                true
            }
        };
        if replace {
            newest.insert(key, record);
        }
    }

    order
        .iter()
        .filter_map(|key| newest.get(key).map(|r| (*r).clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rec(centre: &str, server: &str, status: &str, minute: u32) -> StatusRecord {
        StatusRecord {
            centre: centre.to_string(),
            server: server.to_string(),
            status: CheckStatus::parse(status),
            raw_status: status.to_string(),
            response_ms: None,
            ip: String::new(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap(),
        }
    }

    #[test]
    fn latest_keeps_first_appearance_order() {
        let rows = vec![
            rec("B", "Main Server", "success", 3),
            rec("A", "Main Server", "failed", 1),
            rec("B", "Main Server", "failed", 1),
            rec("A", "Main Server", "success", 2),
        ];
        let latest = latest_per_key(&rows);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].centre, "B");
        assert_eq!(latest[0].status, CheckStatus::Success);
        assert_eq!(latest[1].centre, "A");
        assert_eq!(latest[1].status, CheckStatus::Success);
    }

    #[test]
    fn keys_ignore_case_and_padding() {
        let rows = vec![
            rec("pune", "Main Server", "success", 1),
            rec(" PUNE ", "main server", "failed", 2),
        ];
        assert_eq!(latest_per_key(&rows).len(), 1);
        let index = HistoryIndex::from_records(&rows);
        assert_eq!(index.len(), 1);
        assert_eq!(index.series_for("Pune", "MAIN SERVER").len(), 2);
    }

    #[test]
    fn unsorted_history_is_sorted_before_detection() {
        let mut rows: Vec<StatusRecord> = (1..=5)
            .map(|m| rec("A", "Main Server", "failed", m))
            .collect();
        rows.push(rec("A", "Main Server", "success", 0));
        rows.reverse();

        let index = HistoryIndex::from_records(&rows);
        let d = index.detect(&rows[0], 5);
        assert_eq!(d.last_offline, Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 0).unwrap()));
        assert_eq!(d.last_success, Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));
    }

    #[test]
    fn unseen_key_has_empty_series() {
        let index = HistoryIndex::from_records(&[]);
        let missing = rec("Z", "Main Server", "success", 1);
        assert!(index.series(&missing).is_empty());
        assert_eq!(index.detect(&missing, 5), Detection::default());
    }
}
