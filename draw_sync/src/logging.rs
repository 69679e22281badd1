//! Process-wide `tracing` subscriber.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a stderr subscriber. `RUST_LOG` overrides `level`; `verbose` forces debug.
///
/// Calling it twice is harmless: the second install is ignored.
pub fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
