//! User route definitions

use axum::http::Method;

use super::table::{from_fn, RouteError, RouteTable};
use crate::handlers::user::{create_user, delete_user, get_user, get_users, update_user};
use crate::middleware::authorize;
use crate::state::AppState;

/// Routes for the user resource, relative to wherever the table is mounted
pub fn user_routes(state: AppState) -> Result<RouteTable<AppState>, RouteError> {
    RouteTable::new(state)
        .route(Method::GET, "/", get_users)?
        .route_with(Method::GET, "/:id", [from_fn(authorize)], get_user)?
        .route(Method::POST, "/", create_user)?
        .route(Method::PUT, "/:id", update_user)?
        .route(Method::DELETE, "/:id", delete_user)
}
