use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use forksync::remote::{ApiClient, ClientConfig, DEFAULT_BASE_URL};

mod cli_exec;

#[derive(Parser)]
#[command(name = "forksync")]
#[command(about = "Inspect forks and reset them to their parent", long_about = None)]
struct Cli {
    /// Base URL of the forksync server
    #[arg(long, env = "FORKSYNC_URL", default_value = DEFAULT_BASE_URL, global = true)]
    url: String,

    /// Token accepted by the server's /login endpoint
    #[arg(long, env = "FORKSYNC_LOGIN_TOKEN", global = true)]
    login_token: Option<String>,

    /// Write logs to this file when running the TUI
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the terminal UI (default)
    Tui,

    /// List forks you can reset
    Repos {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a fork's branches differ from its parent
    Status {
        /// Repository as OWNER/NAME
        repo: String,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Reset a fork's branches to match its parent
    Reset {
        /// Repository as OWNER/NAME
        repo: String,
        /// Retype OWNER/NAME to confirm
        #[arg(long)]
        confirm: String,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Tui);
    match &command {
        Commands::Tui => {
            if let Some(path) = &cli.log_file {
                forksync::logging::init_to_file("forksync", tracing::Level::DEBUG, path)?;
            }
        }
        _ => forksync::logging::init("forksync", tracing::Level::INFO)?,
    }

    let config = ClientConfig::new(cli.url).with_login_token(cli.login_token);
    let client = ApiClient::new(config)?;
    if client.config().login_token.is_some() {
        client.login()?;
    }

    cli_exec::handle_command(&client, command)
}
