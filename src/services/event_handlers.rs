//! Event subscribers wired at startup.

use std::sync::Arc;

use sea_orm::DatabaseTransaction;
use tracing::{info, warn};

use crate::domain::{EventHandler, UserSavedIntegrationEvent};
use crate::services::entity_service::ServiceError;
use crate::services::role_service::RoleService;

/// Role granted to every newly created user.
pub const DEFAULT_ROLE: &str = "user";

/// Grants [`DEFAULT_ROLE`] when the authentication domain reports a saved
/// user. Subscribes to the integration event, so this side never sees that
/// domain's internal types.
///
/// Runs under strict publishing: an error here rolls the registration back.
/// A missing default role is only logged, since a freshly bootstrapped
/// store may not have seeded roles yet.
pub struct DefaultRoleAssigner {
    roles: Arc<dyn RoleService>,
}

impl DefaultRoleAssigner {
    #[must_use]
    pub fn new(roles: Arc<dyn RoleService>) -> Self {
        Self { roles }
    }
}

#[async_trait::async_trait]
impl EventHandler<UserSavedIntegrationEvent> for DefaultRoleAssigner {
    async fn handle(
        &self,
        event: &UserSavedIntegrationEvent,
        session: Option<&DatabaseTransaction>,
    ) -> Result<(), ServiceError> {
        let Some(txn) = session else {
            warn!(
                user = %event.username,
                "User saved without a session, skipping default role"
            );
            return Ok(());
        };

        let Some(role) = self.roles.get_role_by_name(DEFAULT_ROLE).await? else {
            warn!(
                role = DEFAULT_ROLE,
                "Default role not found, skipping assignment"
            );
            return Ok(());
        };

        self.roles
            .sync_user_roles(event.user_id, &[role.id], Some(txn))
            .await?;
        info!(user = %event.username, role = DEFAULT_ROLE, "Assigned default role");
        Ok(())
    }
}
