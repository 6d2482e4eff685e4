//! Typed clients for the HarborArk endpoints. Each holds the shared
//! pipeline; none of them caches, retries, or touches session state.

pub mod auth;
pub mod user_groups;
pub mod users;

pub use auth::AuthApi;
pub use user_groups::UserGroupsApi;
pub use users::UsersApi;
