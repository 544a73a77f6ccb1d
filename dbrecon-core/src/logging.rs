//! Logging setup for reconciliation runs.
//!
//! The default INFO level shows run milestones (database started, report
//! written, batch failures); DEBUG adds per-category extraction and
//! comparison detail; quiet keeps only errors so the report files stay the
//! only output.

use crate::Result;

/// Maps CLI verbosity flags to a tracing level.
///
/// Quiet wins over any number of `-v` flags.
fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initializes structured logging for a reconciliation run.
///
/// # Example
/// ```rust,no_run
/// use dbrecon_core::logging::init_logging;
///
/// // -v on the command line: per-category progress becomes visible.
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level_for(verbose, quiet))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            crate::error::DbReconError::configuration(format!(
                "Failed to initialize logging: {}",
                e
            ))
        })?;

    Ok(())
}
