//! `SeaORM` implementation of the `UserService` trait.

use std::sync::{Arc, OnceLock};

use anyhow::Context;
use chrono::Utc;
use regex::Regex;
use sea_orm::{ColumnTrait, Condition, DatabaseTransaction, IntoActiveModel, Order, Set};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::db::{BaseRepository, Page, Store, UserRepository, hash_password, verify_password};
use crate::domain::{EventBus, UserSaved, UserSavedIntegrationEvent};
use crate::entities::users;
use crate::services::entity_service::{EntityHooks, EntityService, ListParams, ServiceError};
use crate::services::user_service::{CreateUser, UpdateUser, UserService};

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const USER_INACTIVE: &str = "User is inactive";

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.-]{3,30}$").expect("Invalid regex pattern defined in code")
    })
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex pattern defined in code")
    })
}

fn validate_username(username: &str) -> Result<(), ServiceError> {
    if username_regex().is_match(username) {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            "Username must be 3-30 characters of letters, digits, '.', '_' or '-'".to_string(),
        ))
    }
}

fn validate_email(email: &str) -> Result<(), ServiceError> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            "Invalid email address".to_string(),
        ))
    }
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.len() >= 8 {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            "Password must be at least 8 characters".to_string(),
        ))
    }
}

/// Fully validated create payload; the password is hashed before hooks see
/// it, so no hook ever runs argon2 inside an open transaction.
struct NewUser {
    username: String,
    email: String,
    password_hash: String,
    full_name: Option<String>,
}

struct UserPatch {
    email: Option<String>,
    full_name: Option<String>,
    active: Option<bool>,
    password_hash: Option<String>,
}

/// Hook set for the user aggregate: uniqueness pre-checks before writes,
/// event publication after the insert.
struct UserHooks {
    repo: BaseRepository<users::Entity>,
    bus: Arc<EventBus>,
}

#[async_trait::async_trait]
impl EntityHooks for UserHooks {
    type Entity = users::Entity;
    type CreateInput = NewUser;
    type UpdateInput = UserPatch;

    fn entity_name() -> &'static str {
        "User"
    }

    fn build_create(&self, input: &NewUser) -> users::ActiveModel {
        let now = Utc::now().to_rfc3339();
        users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(input.username.clone()),
            email: Set(input.email.clone()),
            password_hash: Set(input.password_hash.clone()),
            full_name: Set(input.full_name.clone()),
            active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
    }

    fn build_update(&self, current: users::Model, input: &UserPatch) -> users::ActiveModel {
        let mut model = current.into_active_model();
        if let Some(email) = &input.email {
            model.email = Set(email.clone());
        }
        if let Some(full_name) = &input.full_name {
            model.full_name = Set(Some(full_name.clone()));
        }
        if let Some(active) = input.active {
            model.active = Set(active);
        }
        if let Some(hash) = &input.password_hash {
            model.password_hash = Set(hash.clone());
        }
        model.updated_at = Set(Utc::now().to_rfc3339());
        model
    }

    fn default_order() -> (users::Column, Order) {
        (users::Column::Username, Order::Asc)
    }

    fn searchable_columns() -> Vec<users::Column> {
        vec![
            users::Column::Username,
            users::Column::Email,
            users::Column::FullName,
        ]
    }

    fn sortable_column(name: &str) -> Option<users::Column> {
        match name {
            "username" => Some(users::Column::Username),
            "email" => Some(users::Column::Email),
            "created_at" => Some(users::Column::CreatedAt),
            "updated_at" => Some(users::Column::UpdatedAt),
            _ => None,
        }
    }

    /// Soft-deleted holders still count as taken; their usernames and
    /// emails stay reserved.
    async fn before_create(
        &self,
        txn: &DatabaseTransaction,
        input: &NewUser,
    ) -> Result<(), ServiceError> {
        let username_taken = self
            .repo
            .exists(
                txn,
                Condition::all().add(users::Column::Username.eq(&input.username)),
            )
            .await?;
        if username_taken {
            return Err(ServiceError::Conflict(
                "Username already registered".to_string(),
            ));
        }

        let email_taken = self
            .repo
            .exists(
                txn,
                Condition::all().add(users::Column::Email.eq(&input.email)),
            )
            .await?;
        if email_taken {
            return Err(ServiceError::Conflict(
                "Email already registered".to_string(),
            ));
        }

        Ok(())
    }

    async fn after_create(
        &self,
        txn: &DatabaseTransaction,
        created: &users::Model,
    ) -> Result<(), ServiceError> {
        let event = UserSaved::new(created.clone());
        self.bus.publish(&event, Some(txn)).await?;

        let integration = UserSavedIntegrationEvent::from(&event);
        self.bus.publish(&integration, Some(txn)).await?;

        Ok(())
    }

    async fn before_update(
        &self,
        txn: &DatabaseTransaction,
        current: &users::Model,
        input: &UserPatch,
    ) -> Result<(), ServiceError> {
        if let Some(email) = &input.email {
            let taken = self
                .repo
                .exists_excluding(
                    txn,
                    current.id,
                    Condition::all().add(users::Column::Email.eq(email)),
                )
                .await?;
            if taken {
                return Err(ServiceError::Conflict(
                    "Email already registered".to_string(),
                ));
            }
        }
        Ok(())
    }
}

pub struct SeaOrmUserService {
    store: Store,
    entities: EntityService<UserHooks>,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub fn new(store: Store, bus: Arc<EventBus>, security: SecurityConfig) -> Self {
        let hooks = UserHooks {
            repo: BaseRepository::new(),
            bus,
        };
        Self {
            entities: EntityService::new(store.clone(), hooks),
            store,
            security,
        }
    }

    async fn hash_blocking(&self, password: String) -> Result<String, ServiceError> {
        let security = self.security.clone();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;
        Ok(hash)
    }
}

#[async_trait::async_trait]
impl UserService for SeaOrmUserService {
    async fn create_user(&self, input: CreateUser) -> Result<users::Model, ServiceError> {
        let CreateUser {
            username,
            email,
            password,
            full_name,
        } = input;

        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&password)?;

        let password_hash = self.hash_blocking(password).await?;
        self.entities
            .create(NewUser {
                username,
                email,
                password_hash,
                full_name,
            })
            .await
    }

    async fn get_user(&self, id: Uuid) -> Result<users::Model, ServiceError> {
        self.entities.get(id).await
    }

    async fn list_users(&self, params: &ListParams) -> Result<Page<users::Model>, ServiceError> {
        self.entities.list(params).await
    }

    async fn update_user(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> Result<users::Model, ServiceError> {
        if let Some(email) = &input.email {
            validate_email(email)?;
        }
        if let Some(password) = &input.password {
            validate_password(password)?;
        }

        let password_hash = match input.password {
            Some(password) => Some(self.hash_blocking(password).await?),
            None => None,
        };

        self.entities
            .update(
                id,
                UserPatch {
                    email: input.email,
                    full_name: input.full_name,
                    active: input.active,
                    password_hash,
                },
            )
            .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), ServiceError> {
        self.entities.delete(id).await
    }

    async fn force_delete_user(&self, id: Uuid) -> Result<(), ServiceError> {
        self.entities.force_delete(id).await
    }

    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<users::Model, ServiceError> {
        let Some(user) = UserRepository::get_by_username(&self.store.conn, username).await? else {
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        let candidate = password.to_string();
        let stored_hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&candidate, &stored_hash))
            .await
            .context("Password verification task panicked")??;
        if !valid {
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if user.deleted_at.is_some() || !user.active {
            return Err(ServiceError::Forbidden(USER_INACTIVE.to_string()));
        }

        Ok(user)
    }

    async fn get_active_user(&self, id: Uuid) -> Result<users::Model, ServiceError> {
        let user = self.entities.get(id).await?;
        if user.deleted_at.is_some() || !user.active {
            return Err(ServiceError::Forbidden(USER_INACTIVE.to_string()));
        }
        Ok(user)
    }
}
