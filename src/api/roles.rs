use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{ListQuery, PageDto, PermissionDto, RoleDto};
use super::validation::resolve_list_params;
use super::{ApiError, ApiResponse, AppState};
use crate::services::{CreateRole, UpdateRole};

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRolePermissionsRequest {
    pub permission_ids: Vec<Uuid>,
}

/// POST /roles
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoleDto>>), ApiError> {
    let role = state
        .role_service()
        .create_role(CreateRole {
            name: payload.name,
            description: payload.description,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(role.into())),
    ))
}

/// GET /roles
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PageDto<RoleDto>>>, ApiError> {
    let params = {
        let config = state.config().read().await;
        resolve_list_params(query, &config.pagination)?
    };

    let page = state.role_service().list_roles(&params).await?;

    Ok(Json(ApiResponse::success(PageDto::from_page(page))))
}

/// GET /roles/{id}
pub async fn get_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RoleDto>>, ApiError> {
    let role = state.role_service().get_role(id).await?;
    Ok(Json(ApiResponse::success(role.into())))
}

/// PUT /roles/{id}
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<ApiResponse<RoleDto>>, ApiError> {
    let role = state
        .role_service()
        .update_role(
            id,
            UpdateRole {
                name: payload.name,
                description: payload.description,
                active: payload.active,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(role.into())))
}

/// DELETE /roles/{id}
///
/// Hard delete; memberships and grants referencing the role are removed
/// with it.
pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.role_service().delete_role(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /roles/{id}/permissions
pub async fn get_role_permissions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PermissionDto>>>, ApiError> {
    state.role_service().get_role(id).await?;

    let permissions = state.role_service().permissions_for_role(id).await?;

    Ok(Json(ApiResponse::success(
        permissions.into_iter().map(Into::into).collect(),
    )))
}

/// PUT /roles/{id}/permissions
///
/// Replace the role's grants with exactly the ids given. Unknown permission
/// ids fail the whole request before anything is written.
pub async fn sync_role_permissions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SyncRolePermissionsRequest>,
) -> Result<Json<ApiResponse<Vec<PermissionDto>>>, ApiError> {
    let permissions = state
        .role_service()
        .sync_role_permissions(id, &payload.permission_ids, None)
        .await?;

    Ok(Json(ApiResponse::success(
        permissions.into_iter().map(Into::into).collect(),
    )))
}
