//! Logging integration for formwork.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating the span every
//! form validation runs in.

use crate::settings::{LogFormat, Settings};

/// Sets up the global tracing subscriber based on the given settings.
///
/// In debug mode a pretty, human-readable format is used; otherwise the
/// configured [`LogFormat`] decides. Installing a subscriber twice is a
/// no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug || settings.log_format == LogFormat::Pretty {
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

/// Creates the tracing span a schema validation runs in.
///
/// # Examples
///
/// ```
/// use formwork_core::logging::validation_span;
///
/// let span = validation_span("ArticleForm");
/// let _guard = span.enter();
/// tracing::debug!("validating");
/// ```
pub fn validation_span(schema: &str) -> tracing::Span {
    tracing::debug_span!("validate", schema = schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let settings = Settings::default();
        setup_logging(&settings);
        setup_logging(&settings);
    }

    #[test]
    fn test_validation_span_enters() {
        let span = validation_span("TestForm");
        let _guard = span.enter();
        tracing::debug!("inside");
    }
}
