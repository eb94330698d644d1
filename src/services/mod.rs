pub mod activity_service;
pub mod auth_service;
pub mod completion_service;
pub mod dashboard_service;
pub mod generation_service;
pub mod roadmap_service;
pub mod validation;

pub use completion_service::{CompletionClient, CompletionError};
