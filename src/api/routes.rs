//! HTTP API route definitions.

use std::path::Path;

use axum::{extract::Request, routing::get, Router};
use sentry::integrations::tower::{NewSentryLayer, SentryHttpLayer};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::handlers::{api_info, health, index, AppState};

/// Create the app router.
///
/// Sentry request instrumentation is attached only when error reporting was
/// enabled at startup.
pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    let sentry_enabled = state.sentry_enabled;

    let router = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/info", get(api_info))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if sentry_enabled {
        router.layer(
            ServiceBuilder::new()
                .layer(NewSentryLayer::<Request>::new_from_top())
                .layer(SentryHttpLayer::with_transaction()),
        )
    } else {
        router
    }
}
