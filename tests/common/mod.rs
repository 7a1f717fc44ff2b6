#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pingboard::config::{Config, SourceConfig, SourcesConfig};
use pingboard::domain::board_service::BoardService;
use pingboard::server;

pub const USERS_CSV: &str = "\
Username,Password,Centres
alice,secret,Pune;Delhi
root, toor ,All
nobody,x,
";

/// Pune's Main Server succeeds at 04:00 UTC, then fails five times in a row.
/// Rows are deliberately out of order.
pub const STATUS_CSV: &str = "\
Centre,Server Name,Status,ResponseTime(ms),Server IP,Timestamp
Pune,Main Server,Failed,,10.0.0.1,2024-05-01 04:03:00
Delhi,Backup Server,Failed,,10.0.1.2,2024-05-01 04:02:00
Pune,Main Server,Failed,,10.0.0.1,2024-05-01 04:05:00
Pune,Main Server,Success,18.2,10.0.0.1,2024-05-01 04:00:00
Delhi,Main Server,Success,9.5,10.0.1.1,2024-05-01 04:02:00
Pune,Main Server,Failed,,10.0.0.1,2024-05-01 04:01:00
Mumbai,Main Server,Success,30,10.0.2.1,2024-05-01 04:02:00
Pune,Print Server,Success,1,10.0.0.9,2024-05-01 04:02:00
Pune,Main Server,Failed,,10.0.0.1,2024-05-01 04:04:00
Pune,Bitvoice Gateway,Success,4,10.0.0.5,2024-05-01 04:02:00
Pune,Main Server,Failed,,10.0.0.1,2024-05-01 04:02:00
Pune,Main Server,Failed,,10.0.0.1,garbage
";

pub fn write(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).expect("Failed to write fixture");
}

pub fn setup() -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "users.csv", USERS_CSV);
    write(dir.path(), "status.csv", STATUS_CSV);

    let config = Config {
        sources: SourcesConfig {
            users: SourceConfig::File {
                path: dir.path().join("users.csv"),
            },
            status: SourceConfig::File {
                path: dir.path().join("status.csv"),
            },
            history: None,
        },
        ..Config::default()
    };

    let board = Arc::new(BoardService::new(config).expect("Failed to build board service"));
    (server::app(board), dir)
}

/// Send a request and return (status, body_json).
pub async fn request(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (u16, Value) {
    let body = match body {
        Some(json) => Body::from(serde_json::to_string(&json).unwrap()),
        None => Body::empty(),
    };

    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {}", token));
    }

    let response = router
        .clone()
        .oneshot(req.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn login(router: &Router, username: &str, password: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": password });
    let (status, json) = request(router, "POST", "/api/v1/session", None, Some(body)).await;
    assert_eq!(status, 200, "login for {} should succeed: {}", username, json);
    json["token"].as_str().unwrap().to_string()
}
