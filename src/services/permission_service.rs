//! Domain service for permissions.
//!
//! A permission is a resource/action pair ("users:write"); which roles hold
//! it is managed by the role service's grant sync.

use uuid::Uuid;

use crate::db::Page;
use crate::entities::permissions;
use crate::services::entity_service::{ListParams, ServiceError};

#[derive(Debug, Clone)]
pub struct CreatePermission {
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

/// The resource/action pair is a permission's identity and never changes;
/// only the description is editable.
#[derive(Debug, Clone, Default)]
pub struct UpdatePermission {
    pub description: Option<String>,
}

/// Domain service trait for permissions.
#[async_trait::async_trait]
pub trait PermissionService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ServiceError::Conflict`] when the resource/action pair
    /// already exists.
    async fn create_permission(
        &self,
        input: CreatePermission,
    ) -> Result<permissions::Model, ServiceError>;

    async fn get_permission(&self, id: Uuid) -> Result<permissions::Model, ServiceError>;

    async fn list_permissions(
        &self,
        params: &ListParams,
    ) -> Result<Page<permissions::Model>, ServiceError>;

    async fn update_permission(
        &self,
        id: Uuid,
        input: UpdatePermission,
    ) -> Result<permissions::Model, ServiceError>;

    /// Hard-deletes a permission; grants referencing it go with it.
    async fn delete_permission(&self, id: Uuid) -> Result<(), ServiceError>;
}
