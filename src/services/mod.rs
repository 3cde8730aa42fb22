pub mod entity_service;
pub use entity_service::{EntityHooks, EntityService, ListParams, ServiceError};

pub mod sync;
pub use sync::{MembershipDiff, membership_diff};

pub mod user_service;
pub use user_service::{CreateUser, UpdateUser, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;

pub mod role_service;
pub use role_service::{CreateRole, RoleService, UpdateRole};

pub mod role_service_impl;
pub use role_service_impl::SeaOrmRoleService;

pub mod permission_service;
pub use permission_service::{CreatePermission, PermissionService, UpdatePermission};

pub mod permission_service_impl;
pub use permission_service_impl::SeaOrmPermissionService;

pub mod token_service;
pub use token_service::{
    TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH, TokenClaims, TokenError, TokenService,
};

pub mod token_service_impl;
pub use token_service_impl::JwtTokenService;

pub mod event_handlers;
pub use event_handlers::{DEFAULT_ROLE, DefaultRoleAssigner};
