//! Logging integration for dbal-rs.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-connection
//! spans, so that executed queries, cache hits, and degraded values can be
//! attributed to the connection that produced them.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level` (e.g. "debug", "info",
/// "warn", "error"). In debug mode a pretty, human-readable format is used;
/// otherwise a structured JSON format is used. Installing a subscriber when
/// one is already set is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for work done on behalf of one connection.
///
/// # Examples
///
/// ```
/// use dbal_rs_core::logging::connection_span;
///
/// let span = connection_span("default", "mysql");
/// let _guard = span.enter();
/// tracing::debug!("running query");
/// ```
pub fn connection_span(alias: &str, engine: &str) -> tracing::Span {
    tracing::debug_span!("connection", alias = alias, engine = engine)
}
