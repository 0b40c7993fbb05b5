//! Logging setup shared by the collector and the post-processor.
//!
//! Log lines go to stderr so stdout stays free for the audit summary and
//! rendered analyses.

use crate::Result;
use tracing_subscriber::EnvFilter;

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

/// Filter directives derived from the CLI flags.
///
/// Driver chatter (per-statement logs, pool events) stays at WARN unless
/// tracing everything.
pub fn default_directives(verbose: u8, quiet: bool) -> String {
    let level = level_for(verbose, quiet);
    if level == tracing::Level::TRACE {
        level.to_string().to_lowercase()
    } else {
        format!("{},sqlx=warn", level.to_string().to_lowercase())
    }
}

/// Initializes structured logging based on verbosity level.
///
/// `RUST_LOG` replaces the flag-derived filter unless `quiet` is set.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
///
/// # Example
/// ```rust,no_run
/// use dbaudit_core::logging::init_logging;
///
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let directives = default_directives(verbose, quiet);
    let filter = if quiet {
        EnvFilter::new(directives)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            crate::error::DbAuditError::configuration(format!(
                "Failed to initialize logging: {}",
                e
            ))
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // A subscriber can only be installed once per process; only the flag
    // mapping is tested here.
    #[test]
    fn test_verbosity_levels() {
        let cases = [
            ((true, 0), tracing::Level::ERROR),
            ((true, 5), tracing::Level::ERROR),
            ((false, 0), tracing::Level::INFO),
            ((false, 1), tracing::Level::DEBUG),
            ((false, 2), tracing::Level::TRACE),
            ((false, 10), tracing::Level::TRACE),
        ];

        for ((quiet, verbose), expected) in cases {
            assert_eq!(level_for(verbose, quiet), expected, "quiet={quiet}, verbose={verbose}");
        }
    }

    #[test]
    fn test_driver_logs_held_back() {
        assert_eq!(default_directives(0, false), "info,sqlx=warn");
        assert_eq!(default_directives(1, false), "debug,sqlx=warn");
        assert_eq!(default_directives(3, true), "error,sqlx=warn");
        assert_eq!(default_directives(2, false), "trace");
    }

    #[test]
    fn test_directives_parse() {
        for verbose in 0..3 {
            assert!(EnvFilter::try_new(default_directives(verbose, false)).is_ok());
        }
    }
}
