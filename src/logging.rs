//! Tracing subscriber setup shared by the client and the server.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn filter(component: &str, default_level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},{}={}",
            Level::WARN,
            component,
            default_level
        ))
    })
}

/// Logs to stderr. `RUST_LOG` overrides the default level.
pub fn init(component: &str, default_level: Level) -> Result<()> {
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(filter(component, default_level))
        .with(layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}

/// Logs to a file; used by the terminal UI, which owns the screen.
pub fn init_to_file(component: &str, default_level: Level, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false);
    tracing_subscriber::registry()
        .with(filter(component, default_level))
        .with(layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}
