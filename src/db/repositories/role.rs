use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::base::RepositoryEntity;
use crate::entities::roles;

impl RepositoryEntity for roles::Entity {
    fn id_column() -> roles::Column {
        roles::Column::Id
    }
}

pub struct RoleRepository;

impl RoleRepository {
    pub async fn get_by_name<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> Result<Option<roles::Model>, DbErr> {
        roles::Entity::find()
            .filter(roles::Column::Name.eq(name))
            .one(conn)
            .await
    }

    pub async fn get_by_ids<C: ConnectionTrait>(
        conn: &C,
        ids: &[Uuid],
    ) -> Result<Vec<roles::Model>, DbErr> {
        roles::Entity::find()
            .filter(roles::Column::Id.is_in(ids.iter().copied()))
            .all(conn)
            .await
    }
}
