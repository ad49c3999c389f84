//! Route definitions for the users API

mod pattern;
mod table;
mod user;

use axum::{http::Uri, routing::get, Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::request_tracing;
use crate::state::AppState;

pub use pattern::{PathParams, PathPattern};
pub use table::{
    from_fn, Handler, Middleware, Next, RequestContext, Route, RouteError, RouteTable,
    SharedMiddleware,
};
pub use user::user_routes;

/// Mount point of the user routes
pub const USERS_PATH: &str = "/users";

/// Build the application router
pub fn app(state: AppState) -> Result<Router, RouteError> {
    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest_service(USERS_PATH, user_routes(state)?)
        .fallback(fallback)
        .layer(axum::middleware::from_fn(request_tracing)))
}

async fn root() -> &'static str {
    "Users API Server"
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn fallback(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
