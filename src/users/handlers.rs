use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::{AdminUser, CurrentUser},
    error::ApiError,
    state::AppState,
    users::dto::{ListQuery, UpdateMeRequest, UserData, UserListData, UserListResponse, UserResponse},
    users::repo_types::User,
    users::validate::{is_valid_phone, validate_name},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/update-me", patch(update_me))
        .route("/users/delete-me", delete(delete_me))
        .route("/users", get(list_users))
}

#[instrument(skip(current))]
pub async fn get_me(current: CurrentUser) -> Json<UserResponse> {
    let CurrentUser(user) = current;
    Json(UserResponse {
        status: "success",
        data: UserData { user },
    })
}

#[instrument(skip(state, current, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let CurrentUser(user) = current;

    if payload.password.is_some() {
        return Err(ApiError::Validation(
            "This route is not for password updates. Please use /update-password.".into(),
        ));
    }

    if let Some(name) = payload.name.as_deref() {
        validate_name(name)?;
    }
    if let Some(phone) = payload.phone.as_deref() {
        if !phone.is_empty() && !is_valid_phone(phone) {
            return Err(ApiError::Validation(format!(
                "{phone} is not a valid phone number!"
            )));
        }
    }

    let user = User::update_profile(
        &state.db,
        user.id,
        payload.name.as_deref().map(str::trim),
        payload.phone.as_deref(),
        payload.photo.as_deref(),
    )
    .await?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(UserResponse {
        status: "success",
        data: UserData { user },
    }))
}

#[instrument(skip(state, current))]
pub async fn delete_me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<StatusCode, ApiError> {
    let CurrentUser(user) = current;
    User::deactivate(&state.db, user.id).await?;
    info!(user_id = %user.id, "account deactivated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, admin))]
pub async fn list_users(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let AdminUser(_admin) = admin;
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);
    let users = User::list(&state.db, limit, offset).await?;
    Ok(Json(UserListResponse {
        status: "success",
        results: users.len(),
        data: UserListData { users },
    }))
}
