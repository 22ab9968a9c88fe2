use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,tcw_core=debug";

/// Install the global subscriber. Logs go to stderr; stdout carries command output.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| Error::Custom(format!("failed to install logger: {e}")))?;

    Ok(())
}
