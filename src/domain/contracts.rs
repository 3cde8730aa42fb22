//! Integration event contracts.
//!
//! Stable, reduced projections that other domains may subscribe to. They
//! deliberately omit sensitive and incidental fields; a consumer needing
//! more state loads it through a service.

use uuid::Uuid;

use super::events::{DomainEvent, EventMetadata, UserSaved};

/// Published whenever a user is saved. Carries only the identity fields a
/// consumer needs to react (e.g. default role assignment on registration).
#[derive(Debug, Clone)]
pub struct UserSavedIntegrationEvent {
    pub metadata: EventMetadata,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&UserSaved> for UserSavedIntegrationEvent {
    fn from(event: &UserSaved) -> Self {
        Self {
            metadata: event.metadata.clone(),
            user_id: event.user.id,
            username: event.user.username.clone(),
            email: event.user.email.clone(),
        }
    }
}

impl DomainEvent for UserSavedIntegrationEvent {
    fn name(&self) -> &'static str {
        "user.saved.integration"
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
