//! PrepWise: AI-assisted study roadmaps for competitive exams.
//!
//! The crate holds both halves of the system. The actix-web backend lives in
//! [`api`], [`services`], [`models`], [`middleware`] and [`database`]; the
//! client that talks to it (session handling, forms, exports) lives in
//! [`client`] and is driven by the `prepwise` binary.

pub mod api;
pub mod client;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;
