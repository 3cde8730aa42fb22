use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::domain::{EventBus, UserSavedIntegrationEvent};
use crate::services::{
    DefaultRoleAssigner, JwtTokenService, PermissionService, RoleService,
    SeaOrmPermissionService, SeaOrmRoleService, SeaOrmUserService, TokenService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub event_bus: Arc<EventBus>,

    pub user_service: Arc<dyn UserService>,

    pub role_service: Arc<dyn RoleService>,

    pub permission_service: Arc<dyn PermissionService>,

    pub token_service: Arc<dyn TokenService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(&config.auth));

        let role_service: Arc<dyn RoleService> =
            Arc::new(SeaOrmRoleService::new(store.clone()));
        let permission_service: Arc<dyn PermissionService> =
            Arc::new(SeaOrmPermissionService::new(store.clone()));

        // Handlers register while the bus is still exclusively owned; once it
        // goes behind an Arc the registry is read-only.
        let mut event_bus = EventBus::new();
        event_bus.subscribe::<UserSavedIntegrationEvent, _>(DefaultRoleAssigner::new(
            role_service.clone(),
        ));
        let event_bus = Arc::new(event_bus);

        let user_service: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
            store.clone(),
            event_bus.clone(),
            config.security.clone(),
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            event_bus,
            user_service,
            role_service,
            permission_service,
            token_service,
        })
    }

    /// Get a clone of the current configuration.
    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
