//! Bearer token authorization for user routes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use crate::auth::{get_user_id_from_claims, verify_token, JwtError};
use crate::error::ErrorResponse;
use crate::routes::{Next, RequestContext};
use crate::state::AppState;

/// The user a request was authorized as, available to downstream handlers
/// through the request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

fn reject(code: &str, message: &str) -> Response {
    tracing::debug!(code, message, "Authorization rejected");
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(code, message))).into_response()
}

/// Require a valid bearer token for an existing user before continuing
pub async fn authorize(mut ctx: RequestContext<AppState>, next: Next<AppState>) -> Response {
    let Some(Authorization(bearer)) = ctx.headers().typed_get::<Authorization<Bearer>>() else {
        return reject(
            "MISSING_TOKEN",
            "Authorization header with Bearer token required",
        );
    };

    let state = ctx.state().clone();

    let user_id = match verify_token(bearer.token(), &state.jwt_secret)
        .and_then(|claims| get_user_id_from_claims(&claims))
    {
        Ok(user_id) => user_id,
        Err(JwtError::TokenExpired) => return reject("TOKEN_EXPIRED", "Token has expired"),
        Err(_) => return reject("INVALID_TOKEN", "Invalid token"),
    };

    match state.user_store.find_by_id(user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return reject("UNAUTHORIZED", "Unauthorized"),
        Err(e) => return e.into_response(),
    }

    ctx.extensions_mut().insert(AuthenticatedUser { user_id });
    next.run(ctx).await
}
