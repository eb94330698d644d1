pub mod auth;
pub mod security_headers;

pub use auth::{AuthMiddleware, UserDirectory};
pub use security_headers::SecurityHeaders;
