pub mod auth;
pub mod response;

pub use auth::{require_auth, require_staff, AuthUser, StaffUser};
pub use response::{ApiResponse, ApiResult};
