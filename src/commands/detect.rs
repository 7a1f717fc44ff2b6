//! `pingboard detect`: offline detection for one server's history.

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;

use crate::config;
use crate::domain::board_service::BoardService;
use crate::domain::offline::{self, Detection};
use crate::domain::record::{canonical_role, normalize_centre, CheckStatus};
use crate::domain::timestamp;

#[derive(Debug, Serialize)]
struct DetectReport {
    centre: String,
    server: String,
    fail_threshold: u32,
    observations: usize,
    last_status: CheckStatus,
    last_success: Option<String>,
    last_offline: Option<String>,
    consecutive_failures: u32,
}

pub fn run(
    centre: &str,
    server: &str,
    threshold: Option<u32>,
    format: &str,
    config_path: Option<&str>,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(centre, server, threshold, format, config_path))
}

async fn run_async(
    centre: &str,
    server: &str,
    threshold: Option<u32>,
    format: &str,
    config_path: Option<&str>,
) -> Result<()> {
    let cfg = config::load(config_path.map(Path::new))?;
    let fail_threshold = threshold.unwrap_or(cfg.fail_threshold);
    let offset = timestamp::display_offset(cfg.display_utc_offset_minutes);

    let board = BoardService::new(cfg)?;
    let data = board.data(false).await?;

    if data.history.is_empty() {
        bail!("history table has no usable rows");
    }
    let series = data.history.series_for(centre, server);
    if series.is_empty() {
        bail!("no history for '{}' at centre '{}'", server.trim(), centre.trim());
    }
    let detection: Detection = offline::detect(series, fail_threshold);

    let fmt = |ts: &chrono::DateTime<chrono::Utc>| timestamp::format(ts, &offset);
    let report = DetectReport {
        centre: normalize_centre(centre),
        server: canonical_role(server)
            .map(str::to_string)
            .unwrap_or_else(|| server.trim().to_string()),
        fail_threshold,
        observations: series.len(),
        last_status: detection.last_status,
        last_success: detection.last_success.as_ref().map(fmt),
        last_offline: detection.last_offline.as_ref().map(fmt),
        consecutive_failures: detection.consecutive_failures,
    };

    if format == "json" {
        return super::print_json(&report);
    }

    let status = match report.last_status {
        CheckStatus::Success => report.last_status.as_str().green(),
        CheckStatus::Failed => report.last_status.as_str().red(),
        CheckStatus::Unknown => report.last_status.as_str().normal(),
    };
    println!("{}", format!("{} / {}", report.centre, report.server).bold());
    println!("  observations: {}", report.observations);
    println!("  last status:  {}", status);
    println!(
        "  last success: {}",
        report.last_success.as_deref().unwrap_or("None")
    );
    println!(
        "  last offline: {} (threshold {})",
        report.last_offline.as_deref().unwrap_or("None"),
        report.fail_threshold
    );
    println!("  down streak:  {}", report.consecutive_failures);
    Ok(())
}
