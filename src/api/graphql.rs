use async_graphql::{Context, EmptySubscription, Object, Schema, SimpleObject};
use std::sync::Arc;

use crate::domain::access::ScopeInfo;
use crate::domain::board_service::BoardService;
use crate::domain::session::{Action, DisplayMode};
use crate::domain::view::BoardView;
use crate::errors::BoardError;

pub type BoardSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(SimpleObject)]
pub struct LoginResult {
    pub token: String,
    pub view: BoardView,
}

#[derive(SimpleObject)]
pub struct SessionInfo {
    pub username: String,
    pub scope: ScopeInfo,
    pub selected: u32,
    pub mode: DisplayMode,
}

fn gql_error(err: BoardError) -> async_graphql::Error {
    if err.is_auth_failure() {
        async_graphql::Error::new("invalid username or password")
    } else {
        async_graphql::Error::new(err.to_string())
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Render the board for a session token.
    async fn view(&self, ctx: &Context<'_>, token: String) -> async_graphql::Result<BoardView> {
        let board = ctx.data::<Arc<BoardService>>()?;
        board.view(&token).await.map_err(gql_error)
    }

    async fn session(&self, ctx: &Context<'_>, token: String) -> async_graphql::Result<SessionInfo> {
        let board = ctx.data::<Arc<BoardService>>()?;
        let session = board.session(&token).await.map_err(gql_error)?;
        let scope = session
            .scope
            .as_ref()
            .map(ScopeInfo::from)
            .ok_or_else(|| gql_error(BoardError::NotSignedIn))?;
        Ok(SessionInfo {
            username: session.username,
            scope,
            selected: session.selected as u32,
            mode: session.mode,
        })
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn login(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> async_graphql::Result<LoginResult> {
        let board = ctx.data::<Arc<BoardService>>()?;
        let (token, view) = board.login(&username, &password).await.map_err(gql_error)?;
        Ok(LoginResult { token, view })
    }

    async fn logout(&self, ctx: &Context<'_>, token: String) -> async_graphql::Result<BoardView> {
        let board = ctx.data::<Arc<BoardService>>()?;
        board.logout(&token).await.map_err(gql_error)
    }

    async fn next_centre(&self, ctx: &Context<'_>, token: String) -> async_graphql::Result<BoardView> {
        let board = ctx.data::<Arc<BoardService>>()?;
        board.act(&token, Action::Next).await.map_err(gql_error)
    }

    async fn previous_centre(
        &self,
        ctx: &Context<'_>,
        token: String,
    ) -> async_graphql::Result<BoardView> {
        let board = ctx.data::<Arc<BoardService>>()?;
        board.act(&token, Action::Previous).await.map_err(gql_error)
    }

    async fn select_centre(
        &self,
        ctx: &Context<'_>,
        token: String,
        index: u32,
    ) -> async_graphql::Result<BoardView> {
        let board = ctx.data::<Arc<BoardService>>()?;
        board
            .act(&token, Action::Select(index as usize))
            .await
            .map_err(gql_error)
    }

    /// Set the display mode, or toggle it when `mode` is omitted.
    async fn set_mode(
        &self,
        ctx: &Context<'_>,
        token: String,
        mode: Option<DisplayMode>,
    ) -> async_graphql::Result<BoardView> {
        let board = ctx.data::<Arc<BoardService>>()?;
        let action = mode.map(Action::SetMode).unwrap_or(Action::ToggleMode);
        board.act(&token, action).await.map_err(gql_error)
    }

    /// Re-read every source, ignoring the cache.
    async fn refresh(&self, ctx: &Context<'_>, token: String) -> async_graphql::Result<BoardView> {
        let board = ctx.data::<Arc<BoardService>>()?;
        board.refresh(&token).await.map_err(gql_error)
    }
}

pub fn build_schema(board: Arc<BoardService>) -> BoardSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(board)
        .finish()
}
