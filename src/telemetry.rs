//! Logging and error-reporting setup.

use sentry::types::Dsn;
use sentry::ClientInitGuard;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::error::ConfigError;

/// Install the global tracing subscriber.
///
/// `verbose` overrides the configured filter with crate-level debug output.
/// The Sentry layer is always attached; it is inert until a client is bound.
pub fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("github_cicd_demo=debug,info")
    } else {
        EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // JSON lines are what Cloud Logging parses into structured entries
    let (json, plain) = if config.log_json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(json)
        .with(plain)
        .with(filter)
        .with(sentry::integrations::tracing::layer())
        .init();
}

/// Initialize the Sentry client if a DSN is configured.
///
/// The returned guard flushes pending events on drop and has to outlive the
/// tokio runtime.
pub fn init_sentry(config: &Config) -> Result<Option<ClientInitGuard>, ConfigError> {
    let Some(dsn) = parse_dsn(config)? else {
        return Ok(None);
    };

    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Into::into),
        traces_sample_rate: checked_sample_rate(config.sentry_traces_sample_rate),
        ..Default::default()
    });

    Ok(Some(guard))
}

/// Parse the configured DSN, if any.
pub fn parse_dsn(config: &Config) -> Result<Option<Dsn>, ConfigError> {
    Ok(config.dsn().map(str::parse::<Dsn>).transpose()?)
}

/// Out-of-range rates disable tracing.
fn checked_sample_rate(rate: f32) -> f32 {
    if (0.0..=1.0).contains(&rate) {
        rate
    } else {
        warn!(
            "SENTRY_TRACES_SAMPLE_RATE {} out of range, tracing disabled",
            rate
        );
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_dsn_means_no_client() {
        let config = Config::default();
        assert!(init_sentry(&config).unwrap().is_none());
    }

    #[test]
    fn malformed_dsn_is_rejected() {
        let config = Config {
            sentry_dsn: Some("definitely not a dsn".to_string()),
            ..Config::default()
        };
        assert!(matches!(init_sentry(&config), Err(ConfigError::InvalidDsn(_))));
    }

    #[test]
    fn parses_valid_dsn() {
        let config = Config {
            sentry_dsn: Some("https://public@o0.ingest.sentry.io/42".to_string()),
            ..Config::default()
        };
        let dsn = parse_dsn(&config).unwrap().unwrap();
        assert_eq!(dsn.host(), "o0.ingest.sentry.io");
        assert_eq!(dsn.project_id().to_string(), "42");
    }

    #[test]
    fn out_of_range_sample_rate_disables_tracing() {
        assert_eq!(checked_sample_rate(0.5), 0.5);
        assert_eq!(checked_sample_rate(0.0), 0.0);
        assert_eq!(checked_sample_rate(1.0), 1.0);
        assert_eq!(checked_sample_rate(3.0), 0.0);
        assert_eq!(checked_sample_rate(-1.0), 0.0);
        assert_eq!(checked_sample_rate(f32::NAN), 0.0);
    }
}
