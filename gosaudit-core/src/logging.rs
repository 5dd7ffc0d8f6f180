//! Shared logging setup for the GOS Audit binaries.

use crate::Result;

/// Maps CLI verbosity flags to a tracing level.
///
/// `quiet` wins over any verbosity: only errors are shown.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Installs the stderr fmt subscriber at the level chosen by [`level_for`].
///
/// Fails if a global subscriber is already set.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level_for(verbose, quiet))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| {
            crate::error::GosAuditError::configuration(format!("logging already initialized: {e}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_quiet_overrides_verbosity() {
        assert_eq!(level_for(0, true), Level::ERROR);
        assert_eq!(level_for(5, true), Level::ERROR);
    }

    #[test]
    fn test_verbosity_steps() {
        assert_eq!(level_for(0, false), Level::INFO);
        assert_eq!(level_for(1, false), Level::DEBUG);
        assert_eq!(level_for(2, false), Level::TRACE);
        assert_eq!(level_for(10, false), Level::TRACE);
    }

    #[test]
    fn test_second_init_is_rejected() {
        let _ = init_logging(0, true);
        assert!(init_logging(0, true).is_err());
    }
}
