use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::role_permissions;

pub struct RolePermissionRepository;

impl RolePermissionRepository {
    pub async fn permission_ids_for_role<C: ConnectionTrait>(
        conn: &C,
        role_id: Uuid,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = role_permissions::Entity::find()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .all(conn)
            .await?;

        Ok(rows.into_iter().map(|row| row.permission_id).collect())
    }

    /// Distinct permission ids granted through any of the given roles.
    pub async fn permission_ids_for_roles<C: ConnectionTrait>(
        conn: &C,
        role_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, DbErr> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = role_permissions::Entity::find()
            .filter(role_permissions::Column::RoleId.is_in(role_ids.iter().copied()))
            .all(conn)
            .await?;

        let mut ids: Vec<Uuid> = rows.into_iter().map(|row| row.permission_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    pub async fn delete_for_role<C: ConnectionTrait>(
        conn: &C,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<u64, DbErr> {
        if permission_ids.is_empty() {
            return Ok(0);
        }

        let result = role_permissions::Entity::delete_many()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .filter(role_permissions::Column::PermissionId.is_in(permission_ids.iter().copied()))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn insert_pairs<C: ConnectionTrait>(
        conn: &C,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), DbErr> {
        if permission_ids.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let rows: Vec<role_permissions::ActiveModel> = permission_ids
            .iter()
            .map(|permission_id| role_permissions::ActiveModel {
                id: Set(Uuid::new_v4()),
                role_id: Set(role_id),
                permission_id: Set(*permission_id),
                created_at: Set(now.clone()),
            })
            .collect();

        role_permissions::Entity::insert_many(rows).exec(conn).await?;
        Ok(())
    }
}
