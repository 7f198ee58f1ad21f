//! Logging integration.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-statement spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level` and accepts any
/// `EnvFilter` directive (e.g. `"info"` or `"asyncorm_db=debug"`). In debug
/// mode a pretty, human-readable format is used; otherwise structured JSON.
///
/// Installing a second subscriber is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
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

/// Creates a tracing span for one executed statement.
///
/// # Examples
///
/// ```
/// use asyncorm_core::logging::statement_span;
///
/// let span = statement_span("select");
/// let _guard = span.enter();
/// tracing::debug!("running query");
/// ```
pub fn statement_span(action: &str) -> tracing::Span {
    tracing::debug_span!("statement", action = action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let settings = Settings {
            log_level: "not a [valid filter".to_string(),
            ..Settings::default()
        };
        setup_logging(&settings);
        setup_logging(&settings);
    }

    #[test]
    fn test_statement_span_enters() {
        let span = statement_span("count");
        let _guard = span.enter();
    }
}
