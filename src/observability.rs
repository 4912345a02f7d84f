//! Observability utilities.
//!
//! Logs always go to stderr; stdout belongs to the host channel.

use crate::cli::{LogFormat, Verbosity};
use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Initialize tracing subscriber once for the process.
///
/// `RUST_LOG` wins unless `-v`/`-q` picked a level explicitly; with neither
/// the filter is `info`.
pub fn init_tracing(verbosity: Verbosity, format: LogFormat) {
    TRACING_INIT.get_or_init(|| {
        let env_filter = if verbosity.is_explicit() {
            EnvFilter::new(verbosity.as_filter())
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.as_filter()))
        };

        let result = match format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init(),
            LogFormat::Text => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init(),
        };

        if let Err(err) = result {
            eprintln!("tracing init skipped: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing(Verbosity::Normal, LogFormat::Text);
        init_tracing(Verbosity::Verbose, LogFormat::Json);
    }
}
