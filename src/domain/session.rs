//! Per-user session state.
//!
//! Sessions are plain values: every interaction takes the current session
//! and returns the next one. Nothing here touches the data sources.

use async_graphql::Enum;
use serde::{Deserialize, Serialize};

use crate::errors::BoardError;

use super::access::{self, CentreScope};
use super::record::UserRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// One centre at a time, one tile per server.
    #[default]
    Tiles,
    /// Every visible centre in a single table.
    Consolidated,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Tiles => DisplayMode::Consolidated,
            DisplayMode::Consolidated => DisplayMode::Tiles,
        }
    }
}

impl std::str::FromStr for DisplayMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tiles" => Ok(DisplayMode::Tiles),
            "consolidated" | "table" => Ok(DisplayMode::Consolidated),
            other => anyhow::bail!(
                "unknown display mode '{}' (expected 'tiles' or 'consolidated')",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum Action {
    Next,
    Previous,
    Select(usize),
    ToggleMode,
    SetMode(DisplayMode),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub logged_in: bool,
    pub username: String,
    /// `None` while signed out.
    pub scope: Option<CentreScope>,
    pub selected: usize,
    pub mode: DisplayMode,
}

impl Session {
    /// Start a fresh session for a successful login.
    pub fn login(username: &str, password: &str, users: &[UserRecord]) -> Result<Self, BoardError> {
        let scope = access::resolve(username, password, users)?;
        Ok(Session {
            logged_in: true,
            username: username.to_string(),
            scope: Some(scope),
            selected: 0,
            mode: DisplayMode::default(),
        })
    }

    pub fn logout(self) -> Self {
        Session::default()
    }

    /// Apply one user action. `centre_count` is the number of centres the
    /// session can currently see; navigation wraps around.
    pub fn apply(mut self, action: Action, centre_count: usize) -> Self {
        if !self.logged_in {
            return self;
        }
        let current = self.selected_index(centre_count);
        match action {
            Action::Next if centre_count > 0 => {
                self.selected = (current + 1) % centre_count;
            }
            Action::Previous if centre_count > 0 => {
                self.selected = (current + centre_count - 1) % centre_count;
            }
            Action::Select(index) if centre_count > 0 => {
                self.selected = index.min(centre_count - 1);
            }
            Action::Next | Action::Previous | Action::Select(_) => {
                self.selected = 0;
            }
            Action::ToggleMode => self.mode = self.mode.toggled(),
            Action::SetMode(mode) => self.mode = mode,
        }
        self
    }

    /// Selected index clamped into `[0, centre_count)`, or 0 when empty.
    pub fn selected_index(&self, centre_count: usize) -> usize {
        if centre_count == 0 {
            0
        } else {
            self.selected.min(centre_count - 1)
        }
    }
}
