pub mod dev_login;
pub mod login;
pub mod register;
pub mod utils;
pub mod whoami;

pub use dev_login::dev_login_post;
pub use login::login_post;
pub use register::register_post;
pub use whoami::whoami_get;

use serde::Serialize;

use crate::store::PublicUser;

/// Body returned by every token-issuing endpoint.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub token: String,
    pub expires_in: i64,
}
