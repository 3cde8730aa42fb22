use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{ListQuery, PageDto, PermissionDto};
use super::validation::resolve_list_params;
use super::{ApiError, ApiResponse, AppState};
use crate::services::{CreatePermission, UpdatePermission};

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

/// Only the description is mutable; a permission's resource and action are
/// its identity.
#[derive(Debug, Deserialize)]
pub struct UpdatePermissionRequest {
    pub description: Option<String>,
}

/// POST /permissions
pub async fn create_permission(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePermissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PermissionDto>>), ApiError> {
    let permission = state
        .permission_service()
        .create_permission(CreatePermission {
            resource: payload.resource,
            action: payload.action,
            description: payload.description,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(permission.into())),
    ))
}

/// GET /permissions
pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PageDto<PermissionDto>>>, ApiError> {
    let params = {
        let config = state.config().read().await;
        resolve_list_params(query, &config.pagination)?
    };

    let page = state.permission_service().list_permissions(&params).await?;

    Ok(Json(ApiResponse::success(PageDto::from_page(page))))
}

/// GET /permissions/{id}
pub async fn get_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PermissionDto>>, ApiError> {
    let permission = state.permission_service().get_permission(id).await?;
    Ok(Json(ApiResponse::success(permission.into())))
}

/// PUT /permissions/{id}
pub async fn update_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> Result<Json<ApiResponse<PermissionDto>>, ApiError> {
    let permission = state
        .permission_service()
        .update_permission(
            id,
            UpdatePermission {
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(permission.into())))
}

/// DELETE /permissions/{id}
pub async fn delete_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.permission_service().delete_permission(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
