//! Logging initialisation via tracing-subscriber.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Default filter for a given `-v` count.
#[must_use]
pub const fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set unless `-v` was given.
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init(verbosity: u8) -> Result<()> {
    let level = level_for(verbosity);
    let filter = if verbosity > 0 {
        EnvFilter::try_new(level)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))
    }
    .with_context(|| format!("Invalid log filter '{level}'"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), "info");
        assert_eq!(level_for(1), "debug");
        assert_eq!(level_for(2), "trace");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn test_init_once() {
        // Another test may have installed a subscriber first.
        match init(1) {
            Ok(()) => assert!(init(1).is_err()),
            Err(e) => assert!(e.to_string().contains("subscriber")),
        }
    }
}
