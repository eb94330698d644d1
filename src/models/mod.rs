pub mod activity;
pub mod auth;
pub mod dashboard;
pub mod roadmap;
pub mod roadmap_request;
pub mod user;

pub use activity::*;
pub use auth::*;
pub use dashboard::*;
pub use roadmap::*;
pub use roadmap_request::*;
pub use user::*;
