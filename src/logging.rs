//! Logging init: structured events to stderr, filtered by `RUST_LOG`.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Default filter for a verbosity level: 0 normal, 1 quiet, 2+ quieter.
pub fn default_filter(quiet: u8) -> &'static str {
    match quiet {
        0 => "imgzip=info",
        1 => "imgzip=warn",
        _ => "imgzip=error",
    }
}

/// Initialize logging to stderr. `RUST_LOG` takes precedence over `quiet`.
///
/// Stdout stays free for the archive in pipe mode.
pub fn init_logging(quiet: u8) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quieter_levels_raise_the_threshold() {
        assert_eq!(default_filter(0), "imgzip=info");
        assert_eq!(default_filter(1), "imgzip=warn");
        assert_eq!(default_filter(5), "imgzip=error");
    }
}
