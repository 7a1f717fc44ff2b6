//! Offline detection over a time-ordered check history.
//!
//! A server is considered to have gone offline at the observation where a
//! run of consecutive failures first reaches the configured threshold. Only
//! that crossing point is recorded; a later run that crosses again replaces
//! it.

use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::CheckStatus;

pub const DEFAULT_FAIL_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct Detection {
    pub last_status: CheckStatus,
    pub last_success: Option<DateTime<Utc>>,
    pub last_offline: Option<DateTime<Utc>>,
    /// Length of the failure run at the end of the history.
    pub consecutive_failures: u32,
}

impl Default for Detection {
    fn default() -> Self {
        Self {
            last_status: CheckStatus::Unknown,
            last_success: None,
            last_offline: None,
            consecutive_failures: 0,
        }
    }
}

/// Scan `history`, which must already be sorted ascending by timestamp.
pub fn detect(history: &[(DateTime<Utc>, CheckStatus)], fail_threshold: u32) -> Detection {
    let threshold = fail_threshold.max(1);
    let mut detection = Detection::default();
    let mut streak = 0u32;

    for &(ts, status) in history {
        if status.is_down() {
            streak = streak.saturating_add(1);
            if streak == threshold {
                detection.last_offline = Some(ts);
            }
        } else {
            streak = 0;
            detection.last_success = Some(ts);
        }
        detection.last_status = status;
    }

    detection.consecutive_failures = streak;
    detection
}
