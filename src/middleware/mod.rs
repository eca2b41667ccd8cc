mod auth;
mod branch;

// Re-export auth extractors for use by route handlers
#[allow(unused_imports)]
pub use auth::{CurrentUser, OptionalUser};
pub use branch::{BranchCookieConfig, BranchCookieLayer, BRANCH_COOKIE};
