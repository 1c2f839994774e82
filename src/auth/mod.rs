pub mod csrf;
pub mod events;
pub mod lockout;
pub mod token;

pub use csrf::CsrfGuard;
pub use events::{EventLevel, RequestContext, SecurityEventLog};
pub use lockout::BruteForceGuard;
pub use token::{Claims, TokenService, VerifyError};
