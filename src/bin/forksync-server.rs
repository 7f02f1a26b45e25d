use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router, extract::Path};
use clap::Parser;
use tokio::sync::RwLock;

use forksync::model::{ForkStatus, Repo};

#[path = "forksync_server/http_error.rs"]
mod http_error;
use self::http_error::*;
#[path = "forksync_server/forge.rs"]
mod forge;
use self::forge::*;
#[path = "forksync_server/reconcile.rs"]
mod reconcile;
use self::reconcile::*;
#[path = "forksync_server/sessions.rs"]
mod sessions;
use self::sessions::*;
#[path = "forksync_server/handlers_repo.rs"]
mod handlers_repo;
use self::handlers_repo::*;
#[path = "forksync_server/routes.rs"]
mod routes;
use self::routes::*;

#[derive(Clone)]
struct AppState {
    data_dir: PathBuf,
    app_url: String,
    max_branch_count: usize,

    // Hash of the token `/login` accepts.
    login_token_hash: String,

    sessions: Arc<RwLock<SessionStore>>,

    forge: Arc<RwLock<ForgeState>>,
}

#[derive(Parser)]
#[command(name = "forksync-server")]
#[command(about = "Fork status and reset API (development)", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Write bound address to this file (dev/test convenience)
    #[arg(long)]
    addr_file: Option<PathBuf>,

    /// Data directory holding forks.json
    #[arg(long, default_value = "./forksync-data")]
    data_dir: PathBuf,

    /// Token that `GET /login?token=...` must present
    #[arg(long, default_value = "dev")]
    login_token: String,

    /// Where `/login` and `/logout` redirect to
    #[arg(long, default_value = "/")]
    app_url: String,

    /// Refuse to reset repositories with more branches than this (fork and parent combined)
    #[arg(long, default_value_t = DEFAULT_MAX_BRANCH_COUNT)]
    max_branch_count: usize,

    /// Seconds a session stays valid after login
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL_SECS)]
    session_ttl_secs: u64,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    forksync::logging::init("forksync_server", tracing::Level::INFO)?;

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("create data dir {}", args.data_dir.display()))?;
    let forge = load_forge(&args.data_dir).context("load forge state")?;
    tracing::info!(repos = forge.repos.len(), "loaded forge state");

    let state = Arc::new(AppState {
        data_dir: args.data_dir,
        app_url: args.app_url,
        max_branch_count: args.max_branch_count,
        login_token_hash: hash_token(&args.login_token),
        sessions: Arc::new(RwLock::new(SessionStore::new(
            Duration::from_secs(args.session_ttl_secs),
            MAX_SESSIONS,
        ))),
        forge: Arc::new(RwLock::new(forge)),
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/login", get(login))
        .route("/logout", get(logout))
        .nest("/secure", secure_router(state.clone()))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;

    let local_addr = listener.local_addr().context("read listener local addr")?;
    tracing::info!(%local_addr, "forksync-server listening");

    if let Some(addr_file) = &args.addr_file {
        std::fs::write(addr_file, local_addr.to_string())
            .with_context(|| format!("write addr file {}", addr_file.display()))?;
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn healthz() -> &'static str {
    "ok"
}
