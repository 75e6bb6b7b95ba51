use crate::constants::RUNNER_DEBUG_ENV_VAR;
use anyhow::{Context, Result};
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    prelude::*,
    EnvFilter,
};

pub fn setup_logging() -> Result<()> {
    let runner_debug = std::env::var(RUNNER_DEBUG_ENV_VAR).is_ok_and(|v| v == "1");

    // RUST_LOG wins; otherwise follow the runner's debug switch
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(runner_debug)));

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(SystemTime)
        .with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    tracing::debug!(runner_debug, "logging initialized");
    Ok(())
}

fn default_directive(runner_debug: bool) -> &'static str {
    if runner_debug {
        "debug"
    } else {
        "warn"
    }
}
