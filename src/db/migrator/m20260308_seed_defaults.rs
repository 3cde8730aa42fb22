use crate::entities::prelude::*;
use crate::entities::{permissions, role_permissions, roles, user_roles, users};
use sea_orm_migration::prelude::*;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Seeded admin credentials; operators rotate the password after first login.
const DEFAULT_ADMIN_PASSWORD: &[u8] = b"changeme";

/// Hash the default password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(DEFAULT_ADMIN_PASSWORD, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = chrono::Utc::now().to_rfc3339();

        // Baseline roles. Registration relies on "user" existing; the other
        // two are for operators.
        let superadmin_id = Uuid::new_v4();
        let admin_role_id = Uuid::new_v4();
        let user_role_id = Uuid::new_v4();

        let roles_insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Roles)
            .columns([
                roles::Column::Id,
                roles::Column::Name,
                roles::Column::Description,
                roles::Column::Active,
                roles::Column::CreatedAt,
                roles::Column::UpdatedAt,
            ])
            .values_panic([
                superadmin_id.into(),
                "superadmin".into(),
                "Unrestricted access".into(),
                true.into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .values_panic([
                admin_role_id.into(),
                "admin".into(),
                "Administrative access".into(),
                true.into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .values_panic([
                user_role_id.into(),
                "user".into(),
                "Default role for registered users".into(),
                true.into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();

        manager.exec_stmt(roles_insert).await?;

        let seed_permissions = [
            (Uuid::new_v4(), "users", "read", "List and inspect users"),
            (Uuid::new_v4(), "users", "write", "Create and modify users"),
            (Uuid::new_v4(), "roles", "read", "List and inspect roles"),
            (Uuid::new_v4(), "roles", "write", "Create and modify roles"),
        ];

        let mut permissions_insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Permissions)
            .columns([
                permissions::Column::Id,
                permissions::Column::Resource,
                permissions::Column::Action,
                permissions::Column::Description,
                permissions::Column::CreatedAt,
                permissions::Column::UpdatedAt,
            ])
            .to_owned();
        for (id, resource, action, description) in &seed_permissions {
            permissions_insert.values_panic([
                (*id).into(),
                (*resource).into(),
                (*action).into(),
                (*description).into(),
                now.clone().into(),
                now.clone().into(),
            ]);
        }

        manager.exec_stmt(permissions_insert).await?;

        // Seed default admin user with hashed password
        let admin_user_id = Uuid::new_v4();
        let password_hash = hash_default_password();

        let user_insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Id,
                users::Column::Username,
                users::Column::Email,
                users::Column::PasswordHash,
                users::Column::FullName,
                users::Column::Active,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ])
            .values_panic([
                admin_user_id.into(),
                "admin".into(),
                "admin@example.com".into(),
                password_hash.into(),
                "Administrator".into(),
                true.into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();

        manager.exec_stmt(user_insert).await?;

        let membership_insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(UserRoles)
            .columns([
                user_roles::Column::Id,
                user_roles::Column::UserId,
                user_roles::Column::RoleId,
                user_roles::Column::CreatedAt,
            ])
            .values_panic([
                Uuid::new_v4().into(),
                admin_user_id.into(),
                superadmin_id.into(),
                now.clone().into(),
            ])
            .to_owned();

        manager.exec_stmt(membership_insert).await?;

        let mut grants_insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(RolePermissions)
            .columns([
                role_permissions::Column::Id,
                role_permissions::Column::RoleId,
                role_permissions::Column::PermissionId,
                role_permissions::Column::CreatedAt,
            ])
            .to_owned();
        for (id, _, _, _) in &seed_permissions {
            grants_insert.values_panic([
                Uuid::new_v4().into(),
                superadmin_id.into(),
                (*id).into(),
                now.clone().into(),
            ]);
        }

        manager.exec_stmt(grants_insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            "DELETE FROM user_roles WHERE role_id IN (SELECT id FROM roles WHERE name IN ('superadmin', 'admin', 'user'))",
        )
        .await?;
        conn.execute_unprepared(
            "DELETE FROM role_permissions WHERE role_id IN (SELECT id FROM roles WHERE name IN ('superadmin', 'admin', 'user'))",
        )
        .await?;
        conn.execute_unprepared("DELETE FROM users WHERE username = 'admin'")
            .await?;
        conn.execute_unprepared("DELETE FROM roles WHERE name IN ('superadmin', 'admin', 'user')")
            .await?;
        conn.execute_unprepared("DELETE FROM permissions WHERE resource IN ('users', 'roles')")
            .await?;

        Ok(())
    }
}
