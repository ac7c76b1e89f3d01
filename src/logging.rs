//! Structured logging setup
//!
//! Installs a `tracing-subscriber` registry with:
//! - an `EnvFilter` (`RUST_LOG` wins over `RESTD_LOG_LEVEL`)
//! - a [`SamplingLayer`] (all, error-only, sampled)
//! - a JSON or pretty `fmt` layer, optionally behind a `tracing-appender`
//!   non-blocking writer
//!
//! Access-log records (target [`ACCESS_LOG_TARGET`]) pass every sampling mode:
//! one line per request is the contract of the access log.

use crate::dispatcher::ACCESS_LOG_TARGET;
use anyhow::{Context, Result};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::subscriber::Interest;
use tracing::{warn, Level, Metadata, Subscriber};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Sampling mode: how to decide which logs to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Log everything
    All,
    /// Log only WARN and ERROR levels (plus access records)
    ErrorOnly,
    /// Sample INFO and below at `sampling_rate`, log all warnings and errors
    Sampled,
}

impl SamplingMode {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error-only" | "error_only" => SamplingMode::ErrorOnly,
            "sampled" => SamplingMode::Sampled,
            _ => SamplingMode::All,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    /// Log format: json/pretty
    pub format: LogFormat,
    /// Sampling mode: all/error-only/sampled
    pub sampling_mode: SamplingMode,
    /// Sampling rate (0.0-1.0) for Sampled mode
    pub sampling_rate: f64,
    /// Write through a `tracing-appender` non-blocking worker
    pub async_logging: bool,
    /// Extra filter directives (comma-separated, `target=level`)
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
}

impl LogConfig {
    /// Parse configuration from `RESTD_LOG_*` environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("RESTD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("RESTD_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            sampling_mode: SamplingMode::parse(
                &env::var("RESTD_LOG_SAMPLING_MODE").unwrap_or_else(|_| "all".to_string()),
            ),
            sampling_rate: env::var("RESTD_LOG_SAMPLING_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
            async_logging: env::var("RESTD_LOG_ASYNC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            target_filter: env::var("RESTD_LOG_TARGET_FILTER").ok(),
            include_location: env::var("RESTD_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Verbose, synchronous, human-readable
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            sampling_mode: SamplingMode::All,
            sampling_rate: 1.0,
            async_logging: false,
            target_filter: None,
            include_location: true,
        }
    }

    #[must_use]
    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            sampling_mode: SamplingMode::Sampled,
            sampling_rate: 0.1,
            async_logging: true,
            target_filter: None,
            include_location: false,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Sampling layer: decides whether to emit a log based on sampling rules
pub struct SamplingLayer {
    mode: SamplingMode,
    sampling_rate: f64,
    counter: AtomicU64,
}

impl SamplingLayer {
    #[must_use]
    pub fn new(mode: SamplingMode, sampling_rate: f64) -> Self {
        Self {
            mode,
            sampling_rate: sampling_rate.clamp(0.0, 1.0),
            counter: AtomicU64::new(0),
        }
    }

    fn should_sample(&self, metadata: &Metadata<'_>) -> bool {
        if metadata.target() == ACCESS_LOG_TARGET {
            return true;
        }
        let severe = matches!(*metadata.level(), Level::WARN | Level::ERROR);
        match self.mode {
            SamplingMode::All => true,
            SamplingMode::ErrorOnly => severe,
            SamplingMode::Sampled => {
                if severe {
                    return true;
                }
                let count = self.counter.fetch_add(1, Ordering::Relaxed);
                let sample_interval = (1.0 / self.sampling_rate) as u64;
                sample_interval > 0 && count % sample_interval == 0
            }
        }
    }
}

impl<S> Layer<S> for SamplingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn register_callsite(&self, metadata: &'static Metadata<'static>) -> Interest {
        match self.mode {
            // Per-event decision; must not be cached per callsite.
            SamplingMode::Sampled => Interest::sometimes(),
            _ if self.should_sample(metadata) => Interest::always(),
            _ => Interest::never(),
        }
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: LayerContext<'_, S>) -> bool {
        self.should_sample(metadata)
    }
}

/// Initialize logging from the environment, overriding the level.
///
/// # Example
///
/// ```no_run
/// restdispatch::logging::init_logging("info").expect("Failed to initialize logging");
/// ```
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(log_level: &str) -> Result<()> {
    let mut config = LogConfig::from_env();
    config.log_level = log_level.to_string();
    init_logging_with_config(&config)
}

/// Initialize logging with an explicit configuration
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let mut env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));

    // Client disconnects are logged by the transport at debug/info.
    if let Ok(directive) = "may_minihttp=warn".parse::<Directive>() {
        env_filter = env_filter.add_directive(directive);
    }

    let mut rejected = Vec::new();
    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match filter.parse::<Directive>() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => rejected.push(filter.to_string()),
            }
        }
    }

    let sampling_layer = SamplingLayer::new(config.sampling_mode, config.sampling_rate);
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sampling_layer);

    if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        let fmt_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_writer(non_blocking)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_writer(non_blocking)
                .boxed(),
        };
        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize async logging")?;

        // The worker flushes until the guard drops; keep it for the process lifetime.
        std::mem::forget(guard);
    } else {
        let fmt_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .boxed(),
        };
        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize sync logging")?;
    }

    for filter in rejected {
        warn!(directive = %filter, "Ignoring invalid log filter directive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::callsite::{Callsite, Identifier};
    use tracing::field::FieldSet;
    use tracing::metadata::Kind;

    struct TestCallsite;
    impl Callsite for TestCallsite {
        fn set_interest(&self, _interest: Interest) {}
        fn metadata(&self) -> &Metadata<'_> {
            panic!("not used in tests")
        }
    }
    static CALLSITE: TestCallsite = TestCallsite;

    fn metadata(target: &'static str, level: Level) -> Metadata<'static> {
        Metadata::new(
            "test",
            target,
            level,
            None,
            None,
            None,
            FieldSet::new(&[], Identifier(&CALLSITE)),
            Kind::EVENT,
        )
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("invalid"), LogFormat::Json);
    }

    #[test]
    fn test_sampling_mode_parse() {
        assert_eq!(SamplingMode::parse("all"), SamplingMode::All);
        assert_eq!(SamplingMode::parse("error-only"), SamplingMode::ErrorOnly);
        assert_eq!(SamplingMode::parse("error_only"), SamplingMode::ErrorOnly);
        assert_eq!(SamplingMode::parse("sampled"), SamplingMode::Sampled);
        assert_eq!(SamplingMode::parse("invalid"), SamplingMode::All);
    }

    #[test]
    fn test_level_parse_defaults_to_info() {
        let mut config = LogConfig::default_prod();
        assert_eq!(config.level(), Level::INFO);
        config.log_level = "TRACE".into();
        assert_eq!(config.level(), Level::TRACE);
        config.log_level = "loud".into();
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn test_error_only_mode() {
        let layer = SamplingLayer::new(SamplingMode::ErrorOnly, 1.0);
        assert!(!layer.should_sample(&metadata("restdispatch::registry", Level::INFO)));
        assert!(layer.should_sample(&metadata("restdispatch::registry", Level::WARN)));
        assert!(layer.should_sample(&metadata("restdispatch::registry", Level::ERROR)));
    }

    #[test]
    fn test_access_records_are_never_sampled_out() {
        let error_only = SamplingLayer::new(SamplingMode::ErrorOnly, 1.0);
        let sampled = SamplingLayer::new(SamplingMode::Sampled, 0.0);
        let access = metadata(ACCESS_LOG_TARGET, Level::INFO);
        for _ in 0..10 {
            assert!(error_only.should_sample(&access));
            assert!(sampled.should_sample(&access));
        }
    }

    #[test]
    fn test_sampled_mode_respects_rate() {
        let layer = SamplingLayer::new(SamplingMode::Sampled, 0.5);
        let info = metadata("restdispatch::dispatcher", Level::INFO);
        let sampled = (0..100).filter(|_| layer.should_sample(&info)).count();
        assert_eq!(sampled, 50);
    }

    #[test]
    fn test_sampling_rate_clamping() {
        assert_eq!(SamplingLayer::new(SamplingMode::Sampled, -0.5).sampling_rate, 0.0);
        assert_eq!(SamplingLayer::new(SamplingMode::Sampled, 1.5).sampling_rate, 1.0);
    }
}
