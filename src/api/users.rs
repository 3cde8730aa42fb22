use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{ListQuery, PageDto, PermissionDto, RoleDto, UserDto};
use super::validation::resolve_list_params;
use super::{ApiError, ApiResponse, AppState};
use crate::services::{CreateUser, UpdateUser};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub active: Option<bool>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncUserRolesRequest {
    pub role_ids: Vec<Uuid>,
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state
        .user_service()
        .create_user(CreateUser {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user.into())),
    ))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PageDto<UserDto>>>, ApiError> {
    let params = {
        let config = state.config().read().await;
        resolve_list_params(query, &config.pagination)?
    };

    let page = state.user_service().list_users(&params).await?;

    Ok(Json(ApiResponse::success(PageDto::from_page(page))))
}

/// GET /users/{id}
///
/// Resolves soft-deleted users too; listings are where the deletion marker
/// filters.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service().get_user(id).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .user_service()
        .update_user(
            id,
            UpdateUser {
                email: payload.email,
                full_name: payload.full_name,
                active: payload.active,
                password: payload.password,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// DELETE /users/{id}
///
/// Soft delete. The row keeps its username and email reserved; deleting
/// the same user twice is a 404 the second time.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.user_service().delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{id}/roles
pub async fn get_user_roles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RoleDto>>>, ApiError> {
    // Listing roles for a missing user should 404, not return an empty set.
    state.user_service().get_user(id).await?;

    let roles = state.role_service().roles_for_user(id).await?;

    Ok(Json(ApiResponse::success(
        roles.into_iter().map(Into::into).collect(),
    )))
}

/// PUT /users/{id}/roles
///
/// Replace the user's role set with exactly the ids given. Unknown role ids
/// fail the whole request before anything is written.
pub async fn sync_user_roles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SyncUserRolesRequest>,
) -> Result<Json<ApiResponse<Vec<RoleDto>>>, ApiError> {
    let roles = state
        .role_service()
        .sync_user_roles(id, &payload.role_ids, None)
        .await?;

    Ok(Json(ApiResponse::success(
        roles.into_iter().map(Into::into).collect(),
    )))
}

/// GET /users/{id}/permissions
///
/// Effective permissions, deduplicated across the user's roles.
pub async fn get_user_permissions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PermissionDto>>>, ApiError> {
    state.user_service().get_user(id).await?;

    let permissions = state.role_service().permissions_for_user(id).await?;

    Ok(Json(ApiResponse::success(
        permissions.into_iter().map(Into::into).collect(),
    )))
}
