use anyhow::{Context, Result};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::graphql::{self, BoardSchema};
use crate::api::rest::{self, AppState};
use crate::config::Config;
use crate::domain::board_service::BoardService;

pub fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();
}

/// REST and GraphQL routes over one board service.
pub fn app(board: Arc<BoardService>) -> Router {
    let schema = graphql::build_schema(board.clone());

    let graphql_router = Router::new()
        .route("/graphql", get(graphql_playground).post(graphql_handler))
        .with_state(schema);

    rest::router(AppState { board })
        .merge(graphql_router)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config) -> Result<()> {
    init_tracing(&config.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "pingboard starting");
    info!(
        users = %config.sources.users.describe(),
        status = %config.sources.status.describe(),
        history = %config
            .sources
            .history
            .as_ref()
            .map(|s| s.describe())
            .unwrap_or_else(|| "(status table)".to_string()),
        fail_threshold = config.fail_threshold,
        cache_ttl_secs = config.cache_ttl_secs,
        session_idle_secs = config.session_idle_secs,
        "table sources"
    );

    let http_addr = config.http_addr.clone();
    let sweep_secs = config.session_sweep_secs;
    let board = Arc::new(BoardService::new(config)?);

    // Warm the cache so the first login does not pay for the fetch.
    match board.data(true).await {
        Ok(data) => info!(
            rows = data.current.len(),
            series = data.history.len(),
            "status table loaded"
        ),
        Err(e) => warn!(error = %e, "initial status load failed, will retry on demand"),
    }

    if sweep_secs > 0 {
        let sweep_board = board.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(sweep_secs));
            loop {
                interval.tick().await;
                let expired = sweep_board.sweep_idle().await;
                if expired > 0 {
                    info!(expired, "dropped idle sessions");
                }
            }
        });
    }

    let app = app(board);

    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("binding to {}", http_addr))?;

    info!(addr = %http_addr, "HTTP server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("pingboard stopped");
    Ok(())
}

async fn graphql_playground() -> Html<String> {
    Html(
        async_graphql::http::playground_source(
            async_graphql::http::GraphQLPlaygroundConfig::new("/graphql"),
        ),
    )
}

async fn graphql_handler(
    State(schema): State<BoardSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("Received Ctrl+C, shutting down"); },
        _ = terminate => { info!("Received SIGTERM, shutting down"); },
    }
}
