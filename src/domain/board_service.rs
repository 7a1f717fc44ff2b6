//! Board service: ties table sources, the TTL cache and user sessions
//! together.
//!
//! Every interaction runs one synchronous pass:
//!   load (through cache) → resolve/filter → detect → render
//!
//! A load failure aborts the pass with `DataSourceUnavailable`; no partial
//! view is produced.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{Config, SourceConfig};
use crate::errors::BoardError;
use crate::source::cache::TableCache;
use crate::source::table::Table;
use crate::source::TableLoader;

use super::board::BoardData;
use super::record::{StatusRecord, UserRecord};
use super::session::{Action, Session};
use super::timestamp;
use super::view::{self, BoardView, RenderOptions};

const USERS_KEY: &str = "users";
const STATUS_KEY: &str = "status";
const HISTORY_KEY: &str = "history";

struct SessionEntry {
    session: Session,
    last_seen: Instant,
}

pub struct BoardService {
    loader: TableLoader,
    cache: TableCache,
    sessions: RwLock<HashMap<String, SessionEntry>>,
    config: Config,
}

impl BoardService {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let loader = TableLoader::new(Duration::from_secs(config.fetch_timeout_secs))?;
        Ok(Self {
            loader,
            cache: TableCache::new(),
            sessions: RwLock::new(HashMap::new()),
            config,
        })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            fail_threshold: self.config.fail_threshold,
            display_offset: timestamp::display_offset(self.config.display_utc_offset_minutes),
        }
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl_secs)
    }

    fn idle_limit(&self) -> Duration {
        Duration::from_secs(self.config.session_idle_secs)
    }

    fn is_idle(&self, entry: &SessionEntry) -> bool {
        entry.last_seen.elapsed() >= self.idle_limit()
    }

    async fn table(&self, key: &str, source: &SourceConfig, force: bool) -> Result<Table, BoardError> {
        let load = || self.loader.fetch(source);
        let result = if force {
            self.cache.refresh(key, load).await
        } else {
            self.cache.get_or_refresh(key, self.ttl(), load).await
        };
        match result {
            Ok(snapshot) => Ok(snapshot.table.clone()),
            Err(e) => {
                warn!(source = %source.describe(), error = %format!("{:#}", e), "table load failed");
                Err(BoardError::unavailable(format!("{:#}", e)))
            }
        }
    }

    pub async fn users(&self, force: bool) -> Result<Vec<UserRecord>, BoardError> {
        let table = self.table(USERS_KEY, &self.config.sources.users, force).await?;
        UserRecord::from_table(&table)
    }

    pub async fn data(&self, force: bool) -> Result<BoardData, BoardError> {
        let status = self.table(STATUS_KEY, &self.config.sources.status, force).await?;
        let status = StatusRecord::from_table(&status)?;

        let history = match &self.config.sources.history {
            Some(source) => {
                let table = self.table(HISTORY_KEY, source, force).await?;
                Some(StatusRecord::from_table(&table)?)
            }
            None => None,
        };

        Ok(BoardData::new(status, history))
    }

    /// Check credentials, open a session and return its token with the
    /// first view.
    pub async fn login(&self, username: &str, password: &str) -> Result<(String, BoardView), BoardError> {
        let users = self.users(false).await?;
        let session = Session::login(username, password, &users)?;
        let data = self.data(false).await?;
        let view = view::render(&session, &data, &self.render_options());

        self.sweep_idle().await;
        let token = new_token();
        self.sessions.write().await.insert(
            token.clone(),
            SessionEntry {
                session,
                last_seen: Instant::now(),
            },
        );
        info!(username, "user signed in");
        Ok((token, view))
    }

    pub async fn logout(&self, token: &str) -> Result<BoardView, BoardError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(token)
            .filter(|entry| !self.is_idle(entry))
            .map(|entry| entry.session)
            .ok_or(BoardError::NotSignedIn)?;
        info!(username = %session.username, "user signed out");
        Ok(view::render(
            &session.logout(),
            &BoardData::default(),
            &self.render_options(),
        ))
    }

    /// Look up a live session and mark it as seen. An idle session is
    /// dropped and reported as signed out.
    pub async fn session(&self, token: &str) -> Result<Session, BoardError> {
        let mut sessions = self.sessions.write().await;
        let idle = match sessions.get(token) {
            Some(entry) => self.is_idle(entry),
            None => return Err(BoardError::NotSignedIn),
        };
        if idle {
            sessions.remove(token);
            debug!("session expired");
            return Err(BoardError::NotSignedIn);
        }
        let entry = sessions.get_mut(token).ok_or(BoardError::NotSignedIn)?;
        entry.last_seen = Instant::now();
        Ok(entry.session.clone())
    }

    /// Drop every idle session, returning how many were removed.
    pub async fn sweep_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_idle(entry));
        before - sessions.len()
    }

    pub async fn view(&self, token: &str) -> Result<BoardView, BoardError> {
        let session = self.session(token).await?;
        let data = self.data(false).await?;
        Ok(view::render(&session, &data, &self.render_options()))
    }

    /// Apply a navigation or mode action and render the result.
    pub async fn act(&self, token: &str, action: Action) -> Result<BoardView, BoardError> {
        let session = self.session(token).await?;
        let data = self.data(false).await?;
        let centre_count = session
            .scope
            .as_ref()
            .map(|scope| data.centres(scope).len())
            .unwrap_or(0);

        let next = session.apply(action, centre_count);
        let view = view::render(&next, &data, &self.render_options());
        if let Some(entry) = self.sessions.write().await.get_mut(token) {
            entry.session = next;
            entry.last_seen = Instant::now();
        }
        Ok(view)
    }

    /// Re-read every source, ignoring the cache, and render.
    pub async fn refresh(&self, token: &str) -> Result<BoardView, BoardError> {
        let session = self.session(token).await?;
        self.users(true).await?;
        let data = self.data(true).await?;
        info!(username = %session.username, "manual refresh");
        Ok(view::render(&session, &data, &self.render_options()))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn new_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}
