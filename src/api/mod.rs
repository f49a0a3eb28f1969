//! HTTP API module for the index page, build info and health endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, SERVICE_NAME};
pub use routes::create_router;
