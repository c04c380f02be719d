use axum::{
    Extension, Json, Router,
    extract::State,
    routing::post,
};
use db::models::user::User;
use serde::Deserialize;
use serde_json::{Value, json};
use services::services::auth::{self, AuthError};
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    http::auth::{CurrentUser, require_admin},
};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/api/auth/login", post(login))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/update-credentials", post(update_credentials))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let (user, hash) = User::find_credentials_by_username(&state.db.conn, &payload.username)
        .await?
        .ok_or(ApiError::Auth(AuthError::InvalidCredentials))?;
    if !auth::verify_password(&payload.password, &hash)? {
        return Err(ApiError::Auth(AuthError::InvalidCredentials));
    }
    let token = state.auth.issue_token(user.id)?;
    tracing::info!(user_id = user.id, "login");
    Ok(Json(ApiResponse::success(json!({
        "token": token,
        "user": user,
    }))))
}

#[derive(Debug, Deserialize)]
struct UpdateCredentialsRequest {
    username: String,
    password: String,
}

/// Admin rotates their own username and password.
async fn update_credentials(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdateCredentialsRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    require_admin(&user)?;
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }
    let hash = auth::hash_password(&payload.password)?;
    let updated = User::update_credentials(&state.db.conn, user.id, username, &hash).await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "Credentials updated",
    )))
}
