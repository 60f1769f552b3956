//! Structured logging setup
//!
//! Two sinks: a rolling log file (always) and stdout (text mode only).
//! The default filter is composed from the configured level plus directives
//! that keep dependency noise out of payout traffic: sqlx logs every
//! statement below warn, hyper/h2 every connection event. Setting RUST_LOG
//! replaces the whole composed filter.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;

/// Dependency targets that flood the log during normal batch processing,
/// capped regardless of the configured engine level.
const QUIET_TARGETS: &[(&str, &str)] = &[
    ("sqlx", "warn"),
    ("hyper", "warn"),
    ("h2", "warn"),
    ("tower_http", "info"),
];

/// Compose the default filter directives.
///
/// `enable_tracing: false` silences this crate's own spans on top of the
/// caps, leaving only dependency warnings in the output.
fn default_filter(config: &AppConfig) -> String {
    let mut directives = vec![config.log_level.clone()];
    directives.extend(
        QUIET_TARGETS
            .iter()
            .map(|(target, level)| format!("{}={}", target, level)),
    );
    if !config.enable_tracing {
        directives.push("payout_engine=off".to_string());
    }
    directives.join(",")
}

fn file_appender(config: &AppConfig) -> RollingFileAppender {
    match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    }
}

/// Install the global subscriber. The returned guard must be held for the
/// life of the process or buffered file output is lost on exit.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(config));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        registry
            .with(fmt::layer().json().with_writer(file_writer).with_ansi(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .with(fmt::layer().with_target(false).with_ansi(true))
            .init();
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GatewayConfig, WorkerSettings};

    fn config(log_level: &str, enable_tracing: bool) -> AppConfig {
        AppConfig {
            log_level: log_level.to_string(),
            log_dir: "./logs".to_string(),
            log_file: "payout-engine.log".to_string(),
            use_json: false,
            rotation: "never".to_string(),
            enable_tracing,
            gateway: GatewayConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            postgres_url: "postgres://localhost/payouts".to_string(),
            worker: WorkerSettings::default(),
        }
    }

    #[test]
    fn test_default_filter_caps_noisy_dependencies() {
        let filter = default_filter(&config("debug", true));
        assert!(filter.starts_with("debug,"));
        assert!(filter.contains("sqlx=warn"));
        assert!(filter.contains("hyper=warn"));
        assert!(!filter.contains("payout_engine=off"));
    }

    #[test]
    fn test_default_filter_can_silence_engine_spans() {
        let filter = default_filter(&config("info", false));
        assert!(filter.ends_with("payout_engine=off"));
    }
}
