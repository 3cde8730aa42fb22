//! `SeaORM` implementation of the `RoleService` trait, including the
//! membership reconciliation behind both sync endpoints.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, DatabaseTransaction, IntoActiveModel, Order, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::db::{
    BaseRepository, Page, PermissionRepository, RolePermissionRepository, RoleRepository, Store,
    UserRoleRepository,
};
use crate::entities::{permissions, roles, users};
use crate::services::entity_service::{EntityHooks, EntityService, ListParams, ServiceError};
use crate::services::role_service::{CreateRole, RoleService, UpdateRole};
use crate::services::sync::membership_diff;

fn validate_role_name(name: &str) -> Result<(), ServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 64 {
        return Err(ServiceError::Validation(
            "Role name must be 1-64 characters".to_string(),
        ));
    }
    Ok(())
}

fn missing_ids_message(kind: &str, desired: &HashSet<Uuid>, found: &HashSet<Uuid>) -> String {
    let mut missing: Vec<Uuid> = desired.difference(found).copied().collect();
    missing.sort_unstable();
    let listed = missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{kind} not found: {listed}")
}

struct RoleHooks {
    repo: BaseRepository<roles::Entity>,
}

#[async_trait::async_trait]
impl EntityHooks for RoleHooks {
    type Entity = roles::Entity;
    type CreateInput = CreateRole;
    type UpdateInput = UpdateRole;

    fn entity_name() -> &'static str {
        "Role"
    }

    fn build_create(&self, input: &CreateRole) -> roles::ActiveModel {
        let now = Utc::now().to_rfc3339();
        roles::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description.clone()),
            active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        }
    }

    fn build_update(&self, current: roles::Model, input: &UpdateRole) -> roles::ActiveModel {
        let mut model = current.into_active_model();
        if let Some(name) = &input.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(description) = &input.description {
            model.description = Set(Some(description.clone()));
        }
        if let Some(active) = input.active {
            model.active = Set(active);
        }
        model.updated_at = Set(Utc::now().to_rfc3339());
        model
    }

    fn default_order() -> (roles::Column, Order) {
        (roles::Column::Name, Order::Asc)
    }

    fn searchable_columns() -> Vec<roles::Column> {
        vec![roles::Column::Name, roles::Column::Description]
    }

    fn sortable_column(name: &str) -> Option<roles::Column> {
        match name {
            "name" => Some(roles::Column::Name),
            "created_at" => Some(roles::Column::CreatedAt),
            "updated_at" => Some(roles::Column::UpdatedAt),
            _ => None,
        }
    }

    async fn before_create(
        &self,
        txn: &DatabaseTransaction,
        input: &CreateRole,
    ) -> Result<(), ServiceError> {
        let taken = self
            .repo
            .exists(
                txn,
                Condition::all().add(roles::Column::Name.eq(input.name.trim())),
            )
            .await?;
        if taken {
            return Err(ServiceError::Conflict("Role already exists".to_string()));
        }
        Ok(())
    }

    async fn before_update(
        &self,
        txn: &DatabaseTransaction,
        current: &roles::Model,
        input: &UpdateRole,
    ) -> Result<(), ServiceError> {
        if let Some(name) = &input.name {
            let taken = self
                .repo
                .exists_excluding(
                    txn,
                    current.id,
                    Condition::all().add(roles::Column::Name.eq(name.trim())),
                )
                .await?;
            if taken {
                return Err(ServiceError::Conflict("Role already exists".to_string()));
            }
        }
        Ok(())
    }
}

pub struct SeaOrmRoleService {
    store: Store,
    entities: EntityService<RoleHooks>,
    roles: BaseRepository<roles::Entity>,
    users: BaseRepository<users::Entity>,
}

impl SeaOrmRoleService {
    #[must_use]
    pub fn new(store: Store) -> Self {
        let hooks = RoleHooks {
            repo: BaseRepository::new(),
        };
        Self {
            entities: EntityService::new(store.clone(), hooks),
            store,
            roles: BaseRepository::new(),
            users: BaseRepository::new(),
        }
    }

    /// A user is a valid sync target only while live; soft-deleted rows are
    /// treated as absent.
    async fn require_live_user(
        &self,
        txn: &DatabaseTransaction,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        let user = self
            .users
            .get(txn, user_id)
            .await?
            .filter(|user| user.deleted_at.is_none());
        if user.is_none() {
            return Err(ServiceError::not_found("User"));
        }
        Ok(())
    }

    async fn sync_user_roles_in(
        &self,
        txn: &DatabaseTransaction,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<Vec<roles::Model>, ServiceError> {
        self.require_live_user(txn, user_id).await?;

        let desired: HashSet<Uuid> = role_ids.iter().copied().collect();
        let desired_list: Vec<Uuid> = desired.iter().copied().collect();
        let found: HashSet<Uuid> = RoleRepository::get_by_ids(txn, &desired_list)
            .await?
            .into_iter()
            .map(|role| role.id)
            .collect();
        if found.len() != desired.len() {
            return Err(ServiceError::NotFound(missing_ids_message(
                "Roles", &desired, &found,
            )));
        }

        let existing: HashSet<Uuid> = UserRoleRepository::role_ids_for_user(txn, user_id)
            .await?
            .into_iter()
            .collect();

        let diff = membership_diff(&existing, &desired);
        if !diff.is_empty() {
            UserRoleRepository::delete_for_user(txn, user_id, &diff.to_remove).await?;
            UserRoleRepository::insert_pairs(txn, user_id, &diff.to_add).await?;
        }

        let refreshed = UserRoleRepository::role_ids_for_user(txn, user_id).await?;
        let mut roles = RoleRepository::get_by_ids(txn, &refreshed).await?;
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn sync_role_permissions_in(
        &self,
        txn: &DatabaseTransaction,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<permissions::Model>, ServiceError> {
        if self.roles.get(txn, role_id).await?.is_none() {
            return Err(ServiceError::not_found("Role"));
        }

        let desired: HashSet<Uuid> = permission_ids.iter().copied().collect();
        let desired_list: Vec<Uuid> = desired.iter().copied().collect();
        let found: HashSet<Uuid> = PermissionRepository::get_by_ids(txn, &desired_list)
            .await?
            .into_iter()
            .map(|permission| permission.id)
            .collect();
        if found.len() != desired.len() {
            return Err(ServiceError::NotFound(missing_ids_message(
                "Permissions",
                &desired,
                &found,
            )));
        }

        let existing: HashSet<Uuid> = RolePermissionRepository::permission_ids_for_role(txn, role_id)
            .await?
            .into_iter()
            .collect();

        let diff = membership_diff(&existing, &desired);
        if !diff.is_empty() {
            RolePermissionRepository::delete_for_role(txn, role_id, &diff.to_remove).await?;
            RolePermissionRepository::insert_pairs(txn, role_id, &diff.to_add).await?;
        }

        let refreshed = RolePermissionRepository::permission_ids_for_role(txn, role_id).await?;
        let mut permissions = PermissionRepository::get_by_ids(txn, &refreshed).await?;
        permissions.sort_by(|a, b| {
            a.resource
                .cmp(&b.resource)
                .then_with(|| a.action.cmp(&b.action))
        });
        Ok(permissions)
    }
}

#[async_trait::async_trait]
impl RoleService for SeaOrmRoleService {
    async fn create_role(&self, input: CreateRole) -> Result<roles::Model, ServiceError> {
        validate_role_name(&input.name)?;
        self.entities.create(input).await
    }

    async fn get_role(&self, id: Uuid) -> Result<roles::Model, ServiceError> {
        self.entities.get(id).await
    }

    async fn list_roles(&self, params: &ListParams) -> Result<Page<roles::Model>, ServiceError> {
        self.entities.list(params).await
    }

    async fn update_role(
        &self,
        id: Uuid,
        input: UpdateRole,
    ) -> Result<roles::Model, ServiceError> {
        if let Some(name) = &input.name {
            validate_role_name(name)?;
        }
        self.entities.update(id, input).await
    }

    async fn delete_role(&self, id: Uuid) -> Result<(), ServiceError> {
        self.entities.delete(id).await
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<roles::Model>, ServiceError> {
        let role = RoleRepository::get_by_name(&self.store.conn, name).await?;
        Ok(role)
    }

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<roles::Model>, ServiceError> {
        let ids = UserRoleRepository::role_ids_for_user(&self.store.conn, user_id).await?;
        let mut roles = RoleRepository::get_by_ids(&self.store.conn, &ids).await?;
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn sync_user_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
        session: Option<&DatabaseTransaction>,
    ) -> Result<Vec<roles::Model>, ServiceError> {
        match session {
            Some(txn) => self.sync_user_roles_in(txn, user_id, role_ids).await,
            None => {
                let txn = self.store.conn.begin().await?;
                let roles = self.sync_user_roles_in(&txn, user_id, role_ids).await?;
                txn.commit().await?;
                Ok(roles)
            }
        }
    }

    async fn permissions_for_role(
        &self,
        role_id: Uuid,
    ) -> Result<Vec<permissions::Model>, ServiceError> {
        let ids = RolePermissionRepository::permission_ids_for_role(&self.store.conn, role_id)
            .await?;
        let mut permissions = PermissionRepository::get_by_ids(&self.store.conn, &ids).await?;
        permissions.sort_by(|a, b| {
            a.resource
                .cmp(&b.resource)
                .then_with(|| a.action.cmp(&b.action))
        });
        Ok(permissions)
    }

    async fn sync_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
        session: Option<&DatabaseTransaction>,
    ) -> Result<Vec<permissions::Model>, ServiceError> {
        match session {
            Some(txn) => {
                self.sync_role_permissions_in(txn, role_id, permission_ids)
                    .await
            }
            None => {
                let txn = self.store.conn.begin().await?;
                let permissions = self
                    .sync_role_permissions_in(&txn, role_id, permission_ids)
                    .await?;
                txn.commit().await?;
                Ok(permissions)
            }
        }
    }

    async fn permissions_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<permissions::Model>, ServiceError> {
        let role_ids = UserRoleRepository::role_ids_for_user(&self.store.conn, user_id).await?;
        let ids =
            RolePermissionRepository::permission_ids_for_roles(&self.store.conn, &role_ids).await?;
        let mut permissions = PermissionRepository::get_by_ids(&self.store.conn, &ids).await?;
        permissions.sort_by(|a, b| {
            a.resource
                .cmp(&b.resource)
                .then_with(|| a.action.cmp(&b.action))
        });
        Ok(permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_name_rules() {
        assert!(validate_role_name("editor").is_ok());
        assert!(validate_role_name("  padded  ").is_ok());

        assert!(validate_role_name("").is_err());
        assert!(validate_role_name("   ").is_err());
        assert!(validate_role_name(&"r".repeat(65)).is_err());
    }

    #[test]
    fn missing_ids_are_listed_sorted() {
        let a = Uuid::from_u128(2);
        let b = Uuid::from_u128(1);
        let desired: HashSet<Uuid> = [a, b].into_iter().collect();
        let found = HashSet::new();

        let message = missing_ids_message("Roles", &desired, &found);
        assert_eq!(message, format!("Roles not found: {b}, {a}"));
    }
}
