//! Real-time compute path tracer

// Hide console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Context;
use pt_engine::{PathTracerApp, PathTracerConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let default_level = if cfg!(debug_assertions) {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    let config = PathTracerConfig::default();

    let app = PathTracerApp::new(config).context("failed to create the event loop")?;
    app.run().context("path tracer stopped with an error")?;

    Ok(())
}
