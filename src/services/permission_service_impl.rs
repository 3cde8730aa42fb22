//! `SeaORM` implementation of the `PermissionService` trait.

use chrono::Utc;
use sea_orm::{DatabaseTransaction, IntoActiveModel, Order, Set};
use uuid::Uuid;

use crate::db::{Page, PermissionRepository, Store};
use crate::entities::permissions;
use crate::services::entity_service::{EntityHooks, EntityService, ListParams, ServiceError};
use crate::services::permission_service::{CreatePermission, PermissionService, UpdatePermission};

fn validate_identifier(value: &str, field: &str) -> Result<(), ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 64 {
        return Err(ServiceError::Validation(format!(
            "Permission {field} must be 1-64 characters"
        )));
    }
    Ok(())
}

struct PermissionHooks;

#[async_trait::async_trait]
impl EntityHooks for PermissionHooks {
    type Entity = permissions::Entity;
    type CreateInput = CreatePermission;
    type UpdateInput = UpdatePermission;

    fn entity_name() -> &'static str {
        "Permission"
    }

    fn build_create(&self, input: &CreatePermission) -> permissions::ActiveModel {
        let now = Utc::now().to_rfc3339();
        permissions::ActiveModel {
            id: Set(Uuid::new_v4()),
            resource: Set(input.resource.trim().to_string()),
            action: Set(input.action.trim().to_string()),
            description: Set(input.description.clone()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        }
    }

    fn build_update(
        &self,
        current: permissions::Model,
        input: &UpdatePermission,
    ) -> permissions::ActiveModel {
        let mut model = current.into_active_model();
        if let Some(description) = &input.description {
            model.description = Set(Some(description.clone()));
        }
        model.updated_at = Set(Utc::now().to_rfc3339());
        model
    }

    fn default_order() -> (permissions::Column, Order) {
        (permissions::Column::Resource, Order::Asc)
    }

    fn searchable_columns() -> Vec<permissions::Column> {
        vec![
            permissions::Column::Resource,
            permissions::Column::Action,
            permissions::Column::Description,
        ]
    }

    fn sortable_column(name: &str) -> Option<permissions::Column> {
        match name {
            "resource" => Some(permissions::Column::Resource),
            "action" => Some(permissions::Column::Action),
            "created_at" => Some(permissions::Column::CreatedAt),
            _ => None,
        }
    }

    async fn before_create(
        &self,
        txn: &DatabaseTransaction,
        input: &CreatePermission,
    ) -> Result<(), ServiceError> {
        let taken = PermissionRepository::get_by_resource_action(
            txn,
            input.resource.trim(),
            input.action.trim(),
        )
        .await?
        .is_some();
        if taken {
            return Err(ServiceError::Conflict(
                "Permission already exists".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct SeaOrmPermissionService {
    entities: EntityService<PermissionHooks>,
}

impl SeaOrmPermissionService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self {
            entities: EntityService::new(store, PermissionHooks),
        }
    }
}

#[async_trait::async_trait]
impl PermissionService for SeaOrmPermissionService {
    async fn create_permission(
        &self,
        input: CreatePermission,
    ) -> Result<permissions::Model, ServiceError> {
        validate_identifier(&input.resource, "resource")?;
        validate_identifier(&input.action, "action")?;
        self.entities.create(input).await
    }

    async fn get_permission(&self, id: Uuid) -> Result<permissions::Model, ServiceError> {
        self.entities.get(id).await
    }

    async fn list_permissions(
        &self,
        params: &ListParams,
    ) -> Result<Page<permissions::Model>, ServiceError> {
        self.entities.list(params).await
    }

    async fn update_permission(
        &self,
        id: Uuid,
        input: UpdatePermission,
    ) -> Result<permissions::Model, ServiceError> {
        self.entities.update(id, input).await
    }

    async fn delete_permission(&self, id: Uuid) -> Result<(), ServiceError> {
        self.entities.delete(id).await
    }
}
