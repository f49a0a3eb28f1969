//! Demo web service for a GitHub Actions → Cloud Run pipeline.
//!
//! Serves a page and a JSON endpoint describing which build is running:
//! branch, commit, CI run and deploy time, all read from environment variables
//! injected at build or deploy time.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment and env file
//! - [`error`]: Unified error types
//! - [`build_info`]: Build/deploy metadata collection
//! - [`api`]: HTTP routes (`/`, `/health`, `/api/info`)
//! - [`telemetry`]: Logging and Sentry setup
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod build_info;
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;
pub mod utils;

pub use build_info::BuildInfo;
pub use config::Config;
pub use error::{AppError, Result};
