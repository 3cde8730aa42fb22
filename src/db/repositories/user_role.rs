use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::user_roles;

pub struct UserRoleRepository;

impl UserRoleRepository {
    pub async fn role_ids_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .all(conn)
            .await?;

        Ok(rows.into_iter().map(|row| row.role_id).collect())
    }

    /// Remove the listed memberships for one user. Roles not named stay
    /// attached.
    pub async fn delete_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<u64, DbErr> {
        if role_ids.is_empty() {
            return Ok(0);
        }

        let result = user_roles::Entity::delete_many()
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(user_roles::Column::RoleId.is_in(role_ids.iter().copied()))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn insert_pairs<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), DbErr> {
        if role_ids.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let rows: Vec<user_roles::ActiveModel> = role_ids
            .iter()
            .map(|role_id| user_roles::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                role_id: Set(*role_id),
                created_at: Set(now.clone()),
            })
            .collect();

        user_roles::Entity::insert_many(rows).exec(conn).await?;
        Ok(())
    }
}
