//! Domain service for user accounts.
//!
//! Registration, credential verification, and account lifecycle. Role
//! membership is owned by the authorization domain; creating a user here
//! only publishes the events that domain subscribes to.

use uuid::Uuid;

use crate::db::Page;
use crate::entities::users;
use crate::services::entity_service::{ListParams, ServiceError};

/// Input for creating a user, whether by self-registration or by an
/// administrator. The password arrives in plaintext and never leaves the
/// service unhashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Partial update; `None` fields stay untouched. Usernames are immutable.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub active: Option<bool>,
    pub password: Option<String>,
}

/// Domain service trait for user accounts.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates a user and publishes the user-saved events inside the same
    /// transaction, so subscribers (default role assignment) commit or roll
    /// back together with the registration.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for malformed input and
    /// [`ServiceError::Conflict`] when the username or email is taken,
    /// soft-deleted holders included.
    async fn create_user(&self, input: CreateUser) -> Result<users::Model, ServiceError>;

    /// Fetches a user by id, soft-deleted rows included.
    async fn get_user(&self, id: Uuid) -> Result<users::Model, ServiceError>;

    /// Lists users, excluding soft-deleted rows.
    async fn list_users(&self, params: &ListParams) -> Result<Page<users::Model>, ServiceError>;

    async fn update_user(&self, id: Uuid, input: UpdateUser)
    -> Result<users::Model, ServiceError>;

    /// Soft-deletes a user. The row stays behind its deletion marker, so the
    /// username and email remain reserved.
    async fn delete_user(&self, id: Uuid) -> Result<(), ServiceError>;

    /// Removes the row outright, soft-deleted or not, freeing its username
    /// and email for reuse.
    async fn force_delete_user(&self, id: Uuid) -> Result<(), ServiceError>;

    /// Checks a username/password pair for login.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthorized`] with one shared message for an
    /// unknown username and for a wrong password, and
    /// [`ServiceError::Forbidden`] when the password is correct but the
    /// account is inactive or soft-deleted.
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<users::Model, ServiceError>;

    /// Resolves a user that may still act: present, active, not
    /// soft-deleted. Token verification paths go through this.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for a missing row and
    /// [`ServiceError::Forbidden`] for an inactive or soft-deleted one.
    async fn get_active_user(&self, id: Uuid) -> Result<users::Model, ServiceError>;
}
