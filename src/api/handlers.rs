//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Json,
};
use minijinja::{context, Environment};
use serde::Serialize;
use tracing::debug;

use crate::build_info::BuildInfo;
use crate::config::{EnvSource, ProcessEnv};
use crate::error::Result;
use crate::metrics;

/// Name reported by the health endpoint.
pub const SERVICE_NAME: &str = "github-cicd-demo";

const INDEX_TEMPLATE: &str = "index.html";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Where build metadata is read from on every request.
    pub env: Arc<dyn EnvSource>,
    /// Whether Sentry was initialized at startup.
    pub sentry_enabled: bool,
    /// Compiled page templates.
    pub templates: Arc<Environment<'static>>,
}

impl AppState {
    /// Create state reading from the process environment.
    pub fn new(sentry_enabled: bool) -> Result<Self> {
        Self::with_env(Arc::new(ProcessEnv), sentry_enabled)
    }

    /// Create state reading from an arbitrary environment source.
    pub fn with_env(env: Arc<dyn EnvSource>, sentry_enabled: bool) -> Result<Self> {
        Ok(Self {
            env,
            sentry_enabled,
            templates: Arc::new(templates()?),
        })
    }

    /// Build info for the current request.
    pub fn build_info(&self) -> BuildInfo {
        BuildInfo::current(self.env.as_ref(), self.sentry_enabled)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sentry_enabled", &self.sentry_enabled)
            .finish_non_exhaustive()
    }
}

fn templates() -> std::result::Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    // `.html` turns on auto-escaping
    env.add_template(INDEX_TEMPLATE, include_str!("../../templates/index.html"))?;
    Ok(env)
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
}

/// Index page - logo plus build info.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    metrics::inc_http_requests("/");
    let build_info = state.build_info();

    let _timer = metrics::RenderTimer::start();
    let page = state
        .templates
        .get_template(INDEX_TEMPLATE)?
        .render(context! { build_info })?;

    Ok(Html(page))
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    metrics::inc_http_requests("/health");
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
    })
}

/// Build info as JSON.
pub async fn api_info(State(state): State<AppState>) -> Json<BuildInfo> {
    metrics::inc_http_requests("/api/info");
    let build_info = state.build_info();
    debug!(commit = %build_info.git_commit_short, "Serving build info");
    Json(build_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn bundled_template_compiles() {
        let env = templates().unwrap();
        assert!(env.get_template(INDEX_TEMPLATE).is_ok());
    }

    #[test]
    fn build_info_uses_state_flag() {
        let state = AppState::with_env(Arc::new(HashMap::<String, String>::new()), true).unwrap();
        assert!(state.build_info().sentry_enabled);

        let state = AppState::with_env(Arc::new(HashMap::<String, String>::new()), false).unwrap();
        assert!(!state.build_info().sentry_enabled);
    }

    #[tokio::test]
    async fn index_escapes_html() {
        let vars: HashMap<String, String> =
            [("GIT_BRANCH".to_string(), "<script>".to_string())].into();
        let state = AppState::with_env(Arc::new(vars), false).unwrap();

        let Html(page) = index(State(state)).await.unwrap();

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
