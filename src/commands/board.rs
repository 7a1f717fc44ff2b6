//! `pingboard board`: sign in and print the board once.

use std::path::Path;

use anyhow::{bail, Result};
use colored::{ColoredString, Colorize};

use crate::config;
use crate::domain::board_service::BoardService;
use crate::domain::record::normalize_centre;
use crate::domain::session::{Action, DisplayMode, Session};
use crate::domain::view::{self, BoardRow, BoardView, RowColour, ViewState};

pub struct BoardArgs {
    pub username: String,
    pub password: String,
    pub centre: Option<String>,
    pub mode: DisplayMode,
    pub format: String,
    pub config: Option<String>,
}

pub fn run(args: BoardArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

async fn run_async(args: BoardArgs) -> Result<()> {
    let cfg = config::load(args.config.as_deref().map(Path::new))?;
    let board = BoardService::new(cfg)?;

    let users = board.users(false).await?;
    let session = match Session::login(&args.username, &args.password, &users) {
        Ok(session) => session,
        Err(e) if e.is_auth_failure() => bail!("invalid username or password"),
        Err(e) => return Err(e.into()),
    };
    let data = board.data(false).await?;

    let centres = session
        .scope
        .as_ref()
        .map(|scope| data.centres(scope))
        .unwrap_or_default();

    let mut session = session.apply(Action::SetMode(args.mode), centres.len());
    if let Some(wanted) = &args.centre {
        let wanted = normalize_centre(wanted);
        match centres.iter().position(|c| *c == wanted) {
            Some(index) => session = session.apply(Action::Select(index), centres.len()),
            None => bail!(
                "centre '{}' is not visible to {}. Available: {}",
                wanted,
                args.username,
                if centres.is_empty() {
                    "(none)".to_string()
                } else {
                    centres.join(", ")
                }
            ),
        }
    }

    let view = view::render(&session, &data, &board.render_options());

    match args.format.as_str() {
        "json" => super::print_json(&view),
        _ => {
            print_view(&view);
            Ok(())
        }
    }
}

fn print_view(view: &BoardView) {
    println!("{}", "pingboard".bold());
    if let Some(user) = &view.username {
        println!("  user:      {}", user);
    }
    println!("  centres:   {}", view.centres.join(", "));
    println!("  threshold: {} consecutive failures", view.fail_threshold);

    if let (Some(index), Some(centre)) = (view.selected_index, &view.selected_centre) {
        if view.mode == DisplayMode::Tiles {
            println!(
                "  centre:    {} ({}/{})",
                centre.bold(),
                index + 1,
                view.centres.len()
            );
        }
    }
    println!();

    if view.state != ViewState::Ready {
        let message = view.message.as_deref().unwrap_or("no data");
        println!("  {}", message.yellow());
        return;
    }

    match view.mode {
        DisplayMode::Tiles => view.rows.iter().for_each(print_tile),
        DisplayMode::Consolidated => print_table(&view.rows),
    }
}

fn paint(row: &BoardRow, text: &str) -> ColoredString {
    match row.colour {
        RowColour::Green => text.green(),
        RowColour::Red => text.red(),
        RowColour::Neutral => text.normal(),
    }
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

fn response(row: &BoardRow) -> String {
    row.response_ms
        .map(|ms| format!("{ms}"))
        .unwrap_or_else(|| "N/A".to_string())
}

fn print_tile(row: &BoardRow) {
    println!("  {} / {}", row.centre.bold(), row.server.bold());
    println!("    status:       {}", paint(row, row.status.as_str()));
    println!("    ip:           {}", if row.ip.is_empty() { "N/A" } else { row.ip.as_str() });
    println!("    ping (ms):    {}", response(row));
    println!("    last check:   {}", row.last_check);
    println!("    last success: {}", or_na(row.last_success.as_deref()));
    println!(
        "    last offline: {}",
        row.last_offline.as_deref().unwrap_or("None")
    );
    if row.consecutive_failures > 0 {
        println!("    down streak:  {}", row.consecutive_failures);
    }
    println!();
}

fn print_table(rows: &[BoardRow]) {
    println!(
        "  {:<14} {:<18} {:<8} {:>9} {:<16} {:<19} {:<19}",
        "CENTRE", "SERVER", "STATUS", "PING(MS)", "IP", "LAST CHECK", "LAST OFFLINE"
    );
    for row in rows {
        let line = format!(
            "  {:<14} {:<18} {:<8} {:>9} {:<16} {:<19} {:<19}",
            row.centre,
            row.server,
            row.status.as_str(),
            response(row),
            row.ip,
            row.last_check,
            row.last_offline.as_deref().unwrap_or("None"),
        );
        println!("{}", paint(row, &line));
    }
}
