//! Logging and tracing initialization.

use crate::foundation::config::LoggingConfig;

/// Install a global `tracing` subscriber according to `config`.
///
/// `RUST_LOG` takes precedence over `config.level` when set. Calling this more than once is
/// harmless: later calls leave the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}
