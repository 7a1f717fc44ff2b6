use clap::{Parser, Subcommand};

use pingboard::commands;
use pingboard::domain::session::DisplayMode;

#[derive(Parser)]
#[command(name = "pingboard", version, about = "Per-centre server ping dashboard")]
struct Cli {
    /// Path to config file (default: ~/.config/pingboard/config.yaml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard server (REST + GraphQL)
    Serve {
        /// HTTP listen address (overrides config)
        #[arg(long)]
        http_addr: Option<String>,

        /// Log level (overrides config)
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Sign in and print the board once
    Board {
        /// Username from the user table
        #[arg(long, env = "PINGBOARD_USER")]
        user: String,

        /// Password from the user table
        #[arg(long, env = "PINGBOARD_PASSWORD", hide_env_values = true)]
        password: String,

        /// Centre to show in tiles mode (defaults to the first one)
        #[arg(long)]
        centre: Option<String>,

        /// Display mode (tiles or consolidated)
        #[arg(long, default_value = "tiles")]
        mode: DisplayMode,

        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Run offline detection over one server's history
    Detect {
        /// Centre name
        #[arg(long)]
        centre: String,

        /// Server role, e.g. "Main Server"
        #[arg(long, default_value = "Main Server")]
        server: String,

        /// Consecutive failures that count as offline (overrides config)
        #[arg(long)]
        threshold: Option<u32>,

        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            http_addr,
            log_level,
        } => commands::serve::run(http_addr, log_level, cli.config),
        Commands::Board {
            user,
            password,
            centre,
            mode,
            format,
        } => commands::board::run(commands::board::BoardArgs {
            username: user,
            password,
            centre,
            mode,
            format,
            config: cli.config,
        }),
        Commands::Detect {
            centre,
            server,
            threshold,
            format,
        } => commands::detect::run(
            &centre,
            &server,
            threshold,
            &format,
            cli.config.as_deref(),
        ),
    }
}
