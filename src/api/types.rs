use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repositories::Page;
use crate::entities::{permissions, roles, users};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// User as exposed over the API. The password hash never leaves the server.
#[derive(Debug, Serialize, Clone)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl From<users::Model> for UserDto {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct RoleDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<roles::Model> for RoleDto {
    fn from(role: roles::Model) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            active: role.active,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct PermissionDto {
    pub id: Uuid,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<permissions::Model> for PermissionDto {
    fn from(permission: permissions::Model) -> Self {
        Self {
            id: permission.id,
            resource: permission.resource,
            action: permission.action,
            description: permission.description,
            created_at: permission.created_at,
            updated_at: permission.updated_at,
        }
    }
}

/// One page of a listing, with enough bookkeeping for clients to render
/// pagination controls.
#[derive(Debug, Serialize)]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub pages: u64,
}

impl<T> PageDto<T> {
    pub fn from_page<M: Into<T>>(page: Page<M>) -> Self {
        let pages = if page.size == 0 {
            0
        } else {
            page.total.div_ceil(page.size)
        };
        Self {
            items: page.items.into_iter().map(Into::into).collect(),
            total: page.total,
            page: page.page,
            size: page.size,
            pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Common query parameters accepted by every listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}
