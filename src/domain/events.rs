//! Internal domain events.
//!
//! Internal events carry full entity state and stay inside their owning
//! domain. Consumers in other domains subscribe to the reduced projections
//! in [`super::contracts`] instead.

use std::any::Any;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::users;

/// Marker for types that travel over the [`super::EventBus`].
///
/// `Any` backs the bus's type-keyed dispatch; the metadata identifies one
/// emission in logs.
pub trait DomainEvent: Any + Send + Sync {
    /// Stable name used in dispatch logs.
    fn name(&self) -> &'static str;

    fn metadata(&self) -> &EventMetadata;
}

/// Identity and provenance for one event emission.
#[derive(Debug, Clone)]
pub struct EventMetadata {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A user row was created or updated in the authentication domain.
#[derive(Debug, Clone)]
pub struct UserSaved {
    pub metadata: EventMetadata,
    pub user: users::Model,
}

impl UserSaved {
    #[must_use]
    pub fn new(user: users::Model) -> Self {
        Self {
            metadata: EventMetadata::new(),
            user,
        }
    }
}

impl DomainEvent for UserSaved {
    fn name(&self) -> &'static str {
        "user.saved"
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
