use crate::Result;
use anyhow::anyhow;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

const FILTER_ENV_VAR: &str = "REBIND_LOG";

/// Initialize the diagnostic tracing subscriber for the embedding process.
///
/// Filtering follows `REBIND_LOG`, falling back to `RUST_LOG`, falling back
/// to `info`. Errors when invoked more than once per process so embedders
/// that install their own subscriber notice the clash instead of silently
/// double-logging.
pub fn init() -> Result<()> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let filter = env::var(FILTER_ENV_VAR)
        .map(EnvFilter::new)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;
    Ok(())
}

/// Whether `init` has already run in this process.
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.load(Ordering::SeqCst)
}
