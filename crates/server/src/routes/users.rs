use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};
use db::models::user::{CreateUser, User};
use db::types::Role;
use serde::Deserialize;
use services::services::auth;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    http::auth::{CurrentUser, require_admin},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create_user).get(list_users))
        .route("/api/admin/roles", get(list_roles).post(add_role))
}

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    name: String,
    username: String,
    password: String,
    role: Role,
}

async fn create_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    require_admin(&user)?;
    let name = payload.name.trim();
    let username = payload.username.trim();
    if name.is_empty() || username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Name, username and password are required".to_string(),
        ));
    }
    let password_hash = auth::hash_password(&payload.password)?;
    let created = User::create(
        &state.db.conn,
        &CreateUser {
            name: name.to_string(),
            username: username.to_string(),
            password_hash,
            role: payload.role,
        },
    )
    .await?;
    tracing::info!(user_id = created.id, role = %created.role, "user created");
    Ok(Json(ApiResponse::success(created)))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    require_admin(&user)?;
    let users = User::find_all(&state.db.conn).await?;
    Ok(Json(ApiResponse::success(users)))
}

async fn list_roles(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    require_admin(&user)?;
    let roles = User::distinct_roles(&state.db.conn).await?;
    Ok(Json(ApiResponse::success(roles)))
}

#[derive(Debug, Deserialize)]
struct AddRoleRequest {
    role: String,
}

/// Reserves a role name. Roles only materialize once a user carries them, so
/// this just validates the name is new.
async fn add_role(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<AddRoleRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    require_admin(&user)?;
    let role = payload.role.trim().to_lowercase();
    if role.is_empty() {
        return Err(ApiError::BadRequest("Role name is required".to_string()));
    }
    if User::role_exists(&state.db.conn, &role).await? {
        return Err(ApiError::Conflict("Role already exists".to_string()));
    }
    Ok(Json(ApiResponse::success_with_message(role, "Role available")))
}
