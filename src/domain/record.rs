//! Typed rows read from the user and status tables.

use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::BoardError;
use crate::source::table::{cell, Table};

use super::timestamp;

/// Server roles shown on the board, in display order. Anything else is
/// never displayed.
pub const ROLE_ORDER: [&str; 4] = [
    "Main Server",
    "Backup Server",
    "Bitvoice Gateway",
    "Bitvoice Server",
];

const USERNAME_COLUMN: &[&str] = &["username", "user", "user name"];
const PASSWORD_COLUMN: &[&str] = &["password", "pass"];
const CENTRES_COLUMN: &[&str] = &[
    "centres",
    "centre",
    "centers",
    "center",
    "allowed centres",
    "allowed centers",
];

const CENTRE_COLUMN: &[&str] = &["centre", "center", "site"];
const SERVER_COLUMN: &[&str] = &["server name", "server", "servername"];
const STATUS_COLUMN: &[&str] = &["status"];
const TIMESTAMP_COLUMN: &[&str] = &["timestamp", "time", "checked at"];
const RESPONSE_COLUMN: &[&str] = &[
    "responsetime(ms)",
    "response time",
    "response time (ms)",
    "responsetime",
    "ping (ms)",
    "latency",
];
const IP_COLUMN: &[&str] = &["server ip", "ip address", "ip"];

/// Result of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Success,
    Failed,
    Unknown,
}

impl Default for CheckStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl CheckStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "failed" | "fail" | "down" | "offline" => Self::Failed,
            "success" | "ok" | "up" | "online" | "reachable" => Self::Success,
            _ => Self::Unknown,
        }
    }

    /// Only failures count towards a streak; unknown reads as up.
    pub fn is_down(self) -> bool {
        self == Self::Failed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

/// Trim and upper-case a centre name for comparisons.
pub fn normalize_centre(centre: &str) -> String {
    centre.trim().to_uppercase()
}

/// Canonical role label for a raw server name, if it is a displayed role.
pub fn canonical_role(server: &str) -> Option<&'static str> {
    let server = server.trim();
    ROLE_ORDER
        .iter()
        .copied()
        .find(|role| role.eq_ignore_ascii_case(server))
}

/// Identity of a (centre, server) series, insensitive to case and padding.
pub fn series_key(centre: &str, server: &str) -> (String, String) {
    (normalize_centre(centre), server.trim().to_lowercase())
}

pub fn role_rank(server: &str) -> Option<usize> {
    let server = server.trim();
    ROLE_ORDER
        .iter()
        .position(|role| role.eq_ignore_ascii_case(server))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    pub centres: String,
}

impl UserRecord {
    /// Read user rows. Blank usernames are skipped; the first row for a
    /// username wins.
    pub fn from_table(table: &Table) -> Result<Vec<UserRecord>, BoardError> {
        if table.headers.is_empty() {
            return Ok(Vec::new());
        }
        let username = table.require_column("username", USERNAME_COLUMN)?;
        let password = table.require_column("password", PASSWORD_COLUMN)?;
        let centres = table.require_column("centres", CENTRES_COLUMN)?;

        let mut users: Vec<UserRecord> = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let name = cell(row, Some(username)).trim();
            if name.is_empty() || users.iter().any(|u| u.username == name) {
                continue;
            }
            users.push(UserRecord {
                username: name.to_string(),
                password: cell(row, Some(password)).to_string(),
                centres: cell(row, Some(centres)).to_string(),
            });
        }
        Ok(users)
    }
}

/// One observation of one server at one centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct StatusRecord {
    pub centre: String,
    pub server: String,
    pub status: CheckStatus,
    /// Status text as it appeared in the table.
    pub raw_status: String,
    pub response_ms: Option<f64>,
    pub ip: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusRecord {
    /// Read status rows in table order. Rows whose timestamp cannot be
    /// parsed are dropped.
    pub fn from_table(table: &Table) -> Result<Vec<StatusRecord>, BoardError> {
        if table.headers.is_empty() {
            return Ok(Vec::new());
        }
        let centre = table.require_column("centre", CENTRE_COLUMN)?;
        let server = table.require_column("server name", SERVER_COLUMN)?;
        let status = table.require_column("status", STATUS_COLUMN)?;
        let ts = table.require_column("timestamp", TIMESTAMP_COLUMN)?;
        let response = table.column(RESPONSE_COLUMN);
        let ip = table.column(IP_COLUMN);

        let mut records = Vec::with_capacity(table.rows.len());
        let mut dropped = 0usize;
        for row in &table.rows {
            let Some(timestamp) = timestamp::parse(cell(row, Some(ts))) else {
                dropped += 1;
                continue;
            };
            let raw_status = cell(row, Some(status)).trim().to_string();
            records.push(StatusRecord {
                centre: cell(row, Some(centre)).trim().to_string(),
                server: cell(row, Some(server)).trim().to_string(),
                status: CheckStatus::parse(&raw_status),
                raw_status,
                response_ms: cell(row, response).trim().parse().ok(),
                ip: cell(row, ip).trim().to_string(),
                timestamp,
            });
        }
        if dropped > 0 {
            tracing::debug!(dropped, "skipped rows with unreadable timestamps");
        }
        Ok(records)
    }

    pub fn key(&self) -> (String, String) {
        series_key(&self.centre, &self.server)
    }
}
