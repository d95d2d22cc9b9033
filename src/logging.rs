//! Logging setup.
//!
//! The terminal belongs to the dashboard, so log lines go to a file.
//! `RUST_LOG` overrides the configured level.

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// HTTP plumbing crates that are capped at `warn`.
pub const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

fn default_directives(level: &str) -> String {
    let mut directives = String::from(level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }
    directives
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

pub fn init_logging(config: &LogConfig) -> Result<()> {
    if let Some(parent) = config.file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)
        .with_context(|| format!("opening log file {}", config.file.display()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file));

    let installed = tracing_subscriber::registry()
        .with(build_filter(&config.level))
        .with(fmt_layer)
        .try_init();
    if let Err(err) = installed {
        // Records keep flowing to whichever subscriber got there first
        tracing::debug!(error = %err, file = %config.file.display(), "Global subscriber already set, keeping it");
        return Ok(());
    }

    tracing::info!(
        level = %config.level,
        file = %config.file.display(),
        "Logging initialized"
    );
    Ok(())
}
