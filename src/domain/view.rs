//! Rendering a session against board data.
//!
//! `render` is pure: the host calls it after every interaction and serves
//! whatever it returns.

use async_graphql::{Enum, SimpleObject};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use super::board::{self, BoardData};
use super::offline::DEFAULT_FAIL_THRESHOLD;
use super::record::{canonical_role, normalize_centre, CheckStatus, StatusRecord};
use super::session::{DisplayMode, Session};
use super::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    SignedOut,
    /// Signed in, but nothing in scope has any rows.
    NoData,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum RowColour {
    Green,
    Red,
    Neutral,
}

impl From<CheckStatus> for RowColour {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Success => RowColour::Green,
            CheckStatus::Failed => RowColour::Red,
            CheckStatus::Unknown => RowColour::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct BoardRow {
    pub centre: String,
    pub server: String,
    pub status: CheckStatus,
    pub raw_status: String,
    pub colour: RowColour,
    pub response_ms: Option<f64>,
    pub ip: String,
    pub last_check: String,
    pub last_success: Option<String>,
    pub last_offline: Option<String>,
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct BoardView {
    pub state: ViewState,
    pub username: Option<String>,
    pub mode: DisplayMode,
    pub centres: Vec<String>,
    pub selected_index: Option<u32>,
    pub selected_centre: Option<String>,
    pub fail_threshold: u32,
    pub rows: Vec<BoardRow>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub fail_threshold: u32,
    pub display_offset: FixedOffset,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            fail_threshold: DEFAULT_FAIL_THRESHOLD,
            display_offset: timestamp::display_offset(330),
        }
    }
}

pub fn render(session: &Session, data: &BoardData, options: &RenderOptions) -> BoardView {
    let scope = match (&session.scope, session.logged_in) {
        (Some(scope), true) => scope,
        _ => {
            return BoardView {
                state: ViewState::SignedOut,
                username: None,
                mode: session.mode,
                centres: Vec::new(),
                selected_index: None,
                selected_centre: None,
                fail_threshold: options.fail_threshold,
                rows: Vec::new(),
                message: Some("sign in with your user table credentials".to_string()),
            }
        }
    };

    let centres = data.centres(scope);
    let visible = data.visible(scope);

    let (selected_index, selected_centre) = if centres.is_empty() {
        (None, None)
    } else {
        let index = session.selected_index(centres.len());
        (Some(index as u32), Some(centres[index].clone()))
    };

    let records = match (session.mode, &selected_centre) {
        (DisplayMode::Tiles, Some(centre)) => board::rows_for_centre(&visible, centre),
        (DisplayMode::Tiles, None) => Vec::new(),
        (DisplayMode::Consolidated, _) => visible,
    };

    let rows: Vec<BoardRow> = records
        .iter()
        .map(|record| board_row(record, data, options))
        .collect();

    let (state, message) = if rows.is_empty() {
        let message = match (session.mode, &selected_centre) {
            (DisplayMode::Tiles, Some(centre)) => format!("no data for {}", centre),
            _ => "no data for your centres".to_string(),
        };
        (ViewState::NoData, Some(message))
    } else {
        (ViewState::Ready, None)
    };

    BoardView {
        state,
        username: Some(session.username.clone()),
        mode: session.mode,
        centres,
        selected_index,
        selected_centre,
        fail_threshold: options.fail_threshold,
        rows,
        message,
    }
}

fn board_row(record: &StatusRecord, data: &BoardData, options: &RenderOptions) -> BoardRow {
    let detection = data.history.detect(record, options.fail_threshold);
    let fmt = |ts: &chrono::DateTime<chrono::Utc>| timestamp::format(ts, &options.display_offset);

    BoardRow {
        centre: normalize_centre(&record.centre),
        server: canonical_role(&record.server)
            .map(str::to_string)
            .unwrap_or_else(|| record.server.clone()),
        status: record.status,
        raw_status: record.raw_status.clone(),
        colour: record.status.into(),
        response_ms: record.response_ms,
        ip: record.ip.clone(),
        last_check: fmt(&record.timestamp),
        last_success: detection.last_success.as_ref().map(fmt),
        last_offline: detection.last_offline.as_ref().map(fmt),
        consecutive_failures: detection.consecutive_failures,
    }
}
