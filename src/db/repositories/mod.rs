pub mod base;
pub use base::{BaseRepository, Page, RepositoryEntity};

pub mod user;
pub use user::{UserRepository, hash_password, verify_password};

pub mod role;
pub use role::RoleRepository;

pub mod permission;
pub use permission::PermissionRepository;

pub mod user_role;
pub use user_role::UserRoleRepository;

pub mod role_permission;
pub use role_permission::RolePermissionRepository;
