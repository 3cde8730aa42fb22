//! Generic entity service and its hook protocol.
//!
//! [`EntityService`] owns the transaction lifecycle for every mutation;
//! per-entity behaviour (validation, mapping, defaults) is injected through
//! an [`EntityHooks`] implementation rather than inherited.

use sea_orm::{
    ColumnTrait, Condition, DatabaseTransaction, DbErr, EntityTrait, Order, SqlErr,
    TransactionTrait,
};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{BaseRepository, Page, RepositoryEntity, Store};

/// Error taxonomy shared by every domain service. The API layer maps each
/// variant onto exactly one status code.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Standard not-found message for an entity kind.
    #[must_use]
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }
}

/// Per-entity strategy plugged into [`EntityService`].
///
/// `build_create` and `build_update` are the explicit mapping functions from
/// inputs to active models; the before/after methods default to no-ops and
/// always run inside the service's open transaction.
#[async_trait::async_trait]
pub trait EntityHooks: Send + Sync {
    type Entity: RepositoryEntity;
    type CreateInput: Send + Sync;
    type UpdateInput: Send + Sync;

    /// Entity kind as it appears in error messages ("User", "Role").
    fn entity_name() -> &'static str;

    fn build_create(&self, input: &Self::CreateInput)
    -> <Self::Entity as EntityTrait>::ActiveModel;

    fn build_update(
        &self,
        current: <Self::Entity as EntityTrait>::Model,
        input: &Self::UpdateInput,
    ) -> <Self::Entity as EntityTrait>::ActiveModel;

    /// Ordering applied when a listing names no `order_by`.
    fn default_order() -> (<Self::Entity as EntityTrait>::Column, Order);

    /// Columns searched by the listing's substring filter. Empty means the
    /// entity is not searchable.
    fn searchable_columns() -> Vec<<Self::Entity as EntityTrait>::Column> {
        Vec::new()
    }

    /// Map a client-supplied `order_by` field to a column. `None` rejects
    /// the field.
    fn sortable_column(name: &str) -> Option<<Self::Entity as EntityTrait>::Column> {
        let _ = name;
        None
    }

    async fn before_create(
        &self,
        _txn: &DatabaseTransaction,
        _input: &Self::CreateInput,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn after_create(
        &self,
        _txn: &DatabaseTransaction,
        _created: &<Self::Entity as EntityTrait>::Model,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn before_update(
        &self,
        _txn: &DatabaseTransaction,
        _current: &<Self::Entity as EntityTrait>::Model,
        _input: &Self::UpdateInput,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn after_update(
        &self,
        _txn: &DatabaseTransaction,
        _updated: &<Self::Entity as EntityTrait>::Model,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn before_delete(
        &self,
        _txn: &DatabaseTransaction,
        _current: &<Self::Entity as EntityTrait>::Model,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn after_delete(&self, _txn: &DatabaseTransaction, _id: Uuid) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Listing parameters as they arrive from the outer surface. Bounds on
/// `page` and `size` are enforced there; `order_by` is validated here
/// against the entity's sortable columns.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub page: u64,
    pub size: u64,
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub order: Option<Order>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            size: 50,
            search: None,
            order_by: None,
            order: None,
        }
    }
}

/// Transactional CRUD over one entity, parameterized by its hooks.
///
/// Every mutation runs as begin, before hook, persist, after hook, commit;
/// an error anywhere rolls the whole transaction back, hook writes included.
pub struct EntityService<H: EntityHooks> {
    store: Store,
    hooks: H,
    repo: BaseRepository<H::Entity>,
}

impl<H: EntityHooks> EntityService<H> {
    pub const fn new(store: Store, hooks: H) -> Self {
        Self {
            store,
            hooks,
            repo: BaseRepository::new(),
        }
    }

    /// Fetch one row. Soft-deleted rows resolve too; listings are where
    /// deletion hides rows.
    pub async fn get(&self, id: Uuid) -> Result<<H::Entity as EntityTrait>::Model, ServiceError> {
        self.repo
            .get(&self.store.conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(H::entity_name()))
    }

    /// Offset/limit listing without pagination metadata, ordered by the
    /// hooks' default unless the caller names an order. Soft-deleted rows
    /// are included, as at the repository level.
    pub async fn get_multi(
        &self,
        skip: u64,
        limit: u64,
        order: Option<(<H::Entity as EntityTrait>::Column, Order)>,
    ) -> Result<Vec<<H::Entity as EntityTrait>::Model>, ServiceError> {
        let order = order.unwrap_or_else(H::default_order);
        let items = self
            .repo
            .get_multi(&self.store.conn, skip, limit, order)
            .await?;
        Ok(items)
    }

    /// Paginated listing. Soft-deleted rows are excluded when the entity
    /// carries a marker; an unknown `order_by` fails validation.
    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<Page<<H::Entity as EntityTrait>::Model>, ServiceError> {
        let (column, direction) = match params.order_by.as_deref() {
            Some(name) => {
                let column = H::sortable_column(name).ok_or_else(|| {
                    ServiceError::Validation(format!("Cannot order by unknown field: {name}"))
                })?;
                (column, params.order.clone().unwrap_or(Order::Asc))
            }
            None => {
                let (column, default_direction) = H::default_order();
                (column, params.order.clone().unwrap_or(default_direction))
            }
        };

        let filter = H::Entity::deleted_at_column()
            .map(|marker| Condition::all().add(marker.is_null()));

        let columns = H::searchable_columns();
        let search = params
            .search
            .as_deref()
            .map(|term| (columns.as_slice(), term));

        let result = self
            .repo
            .get_multi_paginated(
                &self.store.conn,
                params.page,
                params.size,
                (column, direction),
                filter,
                search,
            )
            .await?;
        Ok(result)
    }

    pub async fn create(
        &self,
        input: H::CreateInput,
    ) -> Result<<H::Entity as EntityTrait>::Model, ServiceError> {
        let txn = self.store.conn.begin().await?;

        self.hooks.before_create(&txn, &input).await?;
        let created = self
            .repo
            .create(&txn, self.hooks.build_create(&input))
            .await
            .map_err(Self::remap_unique_violation)?;
        self.hooks.after_create(&txn, &created).await?;

        txn.commit().await?;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: H::UpdateInput,
    ) -> Result<<H::Entity as EntityTrait>::Model, ServiceError> {
        let txn = self.store.conn.begin().await?;

        let current = self
            .repo
            .get(&txn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(H::entity_name()))?;
        self.hooks.before_update(&txn, &current, &input).await?;

        let updated = self
            .repo
            .update(&txn, id, |current| {
                self.hooks.build_update(current, &input)
            })
            .await
            .map_err(Self::remap_unique_violation)?
            .ok_or_else(|| ServiceError::not_found(H::entity_name()))?;
        self.hooks.after_update(&txn, &updated).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Soft-delete when the entity has a deletion marker, hard-delete
    /// otherwise. A second delete of the same row reports not found.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.store.conn.begin().await?;

        let current = self
            .repo
            .get(&txn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(H::entity_name()))?;
        self.hooks.before_delete(&txn, &current).await?;

        let removed = if H::Entity::deleted_at_column().is_some() {
            self.repo.soft_delete(&txn, id).await?
        } else {
            self.repo.force_delete(&txn, id).await?
        };
        if !removed {
            return Err(ServiceError::not_found(H::entity_name()));
        }
        self.hooks.after_delete(&txn, id).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Remove the row outright regardless of any soft-delete marker.
    pub async fn force_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.store.conn.begin().await?;

        let current = self
            .repo
            .get(&txn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(H::entity_name()))?;
        self.hooks.before_delete(&txn, &current).await?;

        if !self.repo.force_delete(&txn, id).await? {
            return Err(ServiceError::not_found(H::entity_name()));
        }
        self.hooks.after_delete(&txn, id).await?;

        txn.commit().await?;
        Ok(())
    }

    /// The unique indexes stay authoritative under races that slip past the
    /// hook-level pre-checks; surface them as conflicts, not server errors.
    fn remap_unique_violation(err: DbErr) -> ServiceError {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            ServiceError::Conflict(format!("{} already exists", H::entity_name()))
        } else {
            ServiceError::Database(err)
        }
    }
}
