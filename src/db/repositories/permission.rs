use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::base::RepositoryEntity;
use crate::entities::permissions;

impl RepositoryEntity for permissions::Entity {
    fn id_column() -> permissions::Column {
        permissions::Column::Id
    }
}

pub struct PermissionRepository;

impl PermissionRepository {
    pub async fn get_by_ids<C: ConnectionTrait>(
        conn: &C,
        ids: &[Uuid],
    ) -> Result<Vec<permissions::Model>, DbErr> {
        permissions::Entity::find()
            .filter(permissions::Column::Id.is_in(ids.iter().copied()))
            .all(conn)
            .await
    }

    pub async fn get_by_resource_action<C: ConnectionTrait>(
        conn: &C,
        resource: &str,
        action: &str,
    ) -> Result<Option<permissions::Model>, DbErr> {
        permissions::Entity::find()
            .filter(permissions::Column::Resource.eq(resource))
            .filter(permissions::Column::Action.eq(action))
            .one(conn)
            .await
    }
}
