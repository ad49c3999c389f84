//! User-related API handlers

use axum::Json;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthenticatedUser;
use crate::models::{Acknowledgement, ApiResponse, User};
use crate::routes::RequestContext;
use crate::state::AppState;

/// List all users
pub async fn get_users(ctx: RequestContext<AppState>) -> ApiResult<Json<ApiResponse<Vec<User>>>> {
    let store = ctx.state().user_store.clone();
    let users = store.list().await?;

    Ok(Json(ApiResponse::ok(users)))
}

/// Get a user by ID
pub async fn get_user(ctx: RequestContext<AppState>) -> ApiResult<Json<ApiResponse<User>>> {
    let not_found = || ApiError::NotFound("User not found".to_string());

    let id = ctx
        .param("id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(not_found)?;

    if let Some(caller) = ctx.extensions().get::<AuthenticatedUser>() {
        tracing::debug!(user_id = %id, caller = %caller.user_id, "Fetching user");
    }

    let store = ctx.state().user_store.clone();
    let user = store.find_by_id(id).await?.ok_or_else(not_found)?;

    Ok(Json(ApiResponse::ok(user)))
}

// Create/update/delete are placeholders: they acknowledge the request and
// ignore both the body and the id.

pub async fn create_user(_ctx: RequestContext<AppState>) -> Json<Acknowledgement> {
    Json(Acknowledgement {
        title: "CREATE a new user",
    })
}

pub async fn update_user(_ctx: RequestContext<AppState>) -> Json<Acknowledgement> {
    Json(Acknowledgement {
        title: "UPDATE user ",
    })
}

pub async fn delete_user(_ctx: RequestContext<AppState>) -> Json<Acknowledgement> {
    Json(Acknowledgement {
        title: "DELETE user",
    })
}
