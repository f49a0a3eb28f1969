//! Unified error types for the demo service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors surfaced by request handlers.
#[derive(Error, Debug)]
pub enum AppError {
    /// Page template failed to compile or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Startup configuration errors. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable could not be deserialized (e.g. a non-numeric
    /// `SENTRY_TRACES_SAMPLE_RATE`).
    #[error("invalid environment: {0}")]
    Env(#[from] envy::Error),

    /// The local env file exists but could not be parsed.
    #[error("failed to load env file {path}: {source}")]
    EnvFile {
        /// Path of the env file.
        path: String,
        /// Underlying parse error.
        source: dotenvy::Error,
    },

    /// `SENTRY_DSN` is set but is not a valid DSN.
    #[error("invalid SENTRY_DSN: {0}")]
    InvalidDsn(#[from] sentry::types::ParseDsnError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_maps_to_500() {
        let err = AppError::from(minijinja::Error::new(
            minijinja::ErrorKind::TemplateNotFound,
            "index.html",
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_dsn_is_reported() {
        let parse_err = "not a dsn".parse::<sentry::types::Dsn>().unwrap_err();
        let err = ConfigError::from(parse_err);
        assert!(err.to_string().starts_with("invalid SENTRY_DSN"));
    }
}
