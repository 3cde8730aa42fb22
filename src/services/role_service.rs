//! Domain service for roles and their relations.
//!
//! Owns both join tables: user-role memberships and role-permission grants.
//! Membership changes go exclusively through the sync operations, which
//! reconcile the stored set to a desired one instead of toggling single
//! rows.

use sea_orm::DatabaseTransaction;
use uuid::Uuid;

use crate::db::Page;
use crate::entities::{permissions, roles};
use crate::services::entity_service::{ListParams, ServiceError};

#[derive(Debug, Clone)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; `None` fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Domain service trait for roles, memberships, and grants.
#[async_trait::async_trait]
pub trait RoleService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ServiceError::Conflict`] when the role name is taken.
    async fn create_role(&self, input: CreateRole) -> Result<roles::Model, ServiceError>;

    async fn get_role(&self, id: Uuid) -> Result<roles::Model, ServiceError>;

    async fn list_roles(&self, params: &ListParams) -> Result<Page<roles::Model>, ServiceError>;

    async fn update_role(&self, id: Uuid, input: UpdateRole)
    -> Result<roles::Model, ServiceError>;

    /// Hard-deletes a role; memberships and grants referencing it go with
    /// it.
    async fn delete_role(&self, id: Uuid) -> Result<(), ServiceError>;

    async fn get_role_by_name(&self, name: &str) -> Result<Option<roles::Model>, ServiceError>;

    /// Roles currently attached to a user, name-ordered.
    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<roles::Model>, ServiceError>;

    /// Reconciles a user's memberships to exactly `role_ids` and returns
    /// the refreshed, name-ordered membership.
    ///
    /// Every named role is validated before any row is touched; a missing
    /// id fails the whole call with the offending ids listed and the stored
    /// memberships unchanged. Rows already in the desired set are left
    /// alone, so their attachment timestamps survive.
    ///
    /// When `session` is given the work joins that open transaction and
    /// commits or rolls back with it; otherwise the call runs in its own.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an unknown or soft-deleted
    /// user and for unknown role ids.
    async fn sync_user_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
        session: Option<&DatabaseTransaction>,
    ) -> Result<Vec<roles::Model>, ServiceError>;

    /// Permissions currently granted to a role, ordered by resource then
    /// action.
    async fn permissions_for_role(
        &self,
        role_id: Uuid,
    ) -> Result<Vec<permissions::Model>, ServiceError>;

    /// Reconciles a role's grants to exactly `permission_ids`. Same
    /// contract as [`RoleService::sync_user_roles`].
    async fn sync_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
        session: Option<&DatabaseTransaction>,
    ) -> Result<Vec<permissions::Model>, ServiceError>;

    /// Distinct permissions a user holds through any of their roles,
    /// ordered by resource then action.
    async fn permissions_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<permissions::Model>, ServiceError>;
}
