//! Tracing subscriber setup for Sextant.
//!
//! Sextant's crates only emit `tracing` events and spans; installing a
//! subscriber is left to the application. [`TracingConfig`] is the one-call
//! way to do it:
//!
//! ```
//! use sextant_tracing::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! // Development: pretty output with span enter/exit
//! TracingConfig::new()
//!     .with_level(Level::DEBUG)
//!     .with_span_events(true)
//!     .init();
//!
//! // Production: JSON output for log aggregation
//! let production = TracingConfig::new()
//!     .with_format(TracingFormat::Json)
//!     .with_env_filter("sextant_pipeline=info,sextant_action=warn");
//! # let _ = production;
//! ```
//!
//! Every execution runs inside an `action` span carrying `action` and
//! `execution_id` fields, so span events make per-execution traces easy to
//! follow.

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Subscriber configuration.
///
/// | Option | Default |
/// |--------|---------|
/// | level | `INFO` |
/// | format | [`TracingFormat::Pretty`] |
/// | env filter | none (the level applies to every target) |
/// | span events | off |
#[derive(Debug, Clone)]
pub struct TracingConfig {
    level: Level,
    format: TracingFormat,
    /// Environment filter, e.g. `sextant_pipeline=debug`.
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`. An unparsable filter falls
    /// back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configured level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the configured format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    fn env_filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        }
    }

    /// Installs the global subscriber.
    ///
    /// Returns `false` if a subscriber was already installed, in which case
    /// the existing one is kept.
    pub fn init(&self) -> bool {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let span_events = self.span_events();

        let installed = match self.format {
            TracingFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
        };

        if installed {
            tracing::info!(
                level = %self.level,
                format = ?self.format,
                "tracing initialized"
            );
        }
        installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_default_is_pretty() {
        assert_eq!(TracingFormat::default(), TracingFormat::Pretty);
    }

    #[test]
    fn default_level_is_info() {
        let config = TracingConfig::default();
        assert_eq!(config.level(), Level::INFO);
        assert!(!config.span_events);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn builder_sets_options() {
        let config = TracingConfig::new()
            .with_level(Level::DEBUG)
            .with_format(TracingFormat::Json)
            .with_env_filter("sextant_pipeline=debug")
            .with_span_events(true);

        assert_eq!(config.level(), Level::DEBUG);
        assert_eq!(config.format(), TracingFormat::Json);
        assert_eq!(config.env_filter.as_deref(), Some("sextant_pipeline=debug"));
        assert_eq!(config.span_events(), FmtSpan::ENTER | FmtSpan::EXIT);
    }

    #[test]
    fn span_events_off_by_default() {
        assert_eq!(TracingConfig::new().span_events(), FmtSpan::NONE);
    }

    #[test]
    fn second_init_keeps_existing_subscriber() {
        TracingConfig::new().with_format(TracingFormat::Compact).init();

        assert!(!TracingConfig::new().init());
    }
}
