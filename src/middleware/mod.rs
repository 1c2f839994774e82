pub mod auth;
pub mod csrf;
pub mod lockout;
pub mod response;

pub use auth::{auth_gate_middleware, AuthUser, SYNTHETIC_SUBJECT};
pub use csrf::csrf_middleware;
pub use lockout::{lockout_middleware, ClientMeta};
pub use response::{ApiResponse, ApiResult};
