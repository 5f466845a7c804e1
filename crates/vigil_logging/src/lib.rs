//! Shared logging utilities for Vigil binaries.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "vigil=info,vigil_analyzer=info,vigil_highlight=info";

/// Logging configuration shared by Vigil binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
}

/// Initialize tracing with stderr output.
///
/// Honors `RUST_LOG` when set; otherwise uses the crate-level default
/// filter, widened to debug when `verbose` is requested. Output goes to
/// stderr so stdout stays clean for machine-readable reports.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(DEFAULT_LOG_FILTER)
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.verbose),
        )
        .try_init()?;

    Ok(())
}
