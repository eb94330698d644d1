//! Client side of PrepWise: session gate, API gateway and the two form flows.

pub mod auth_flow;
pub mod export;
pub mod gateway;
pub mod roadmap_flow;
pub mod session;
pub mod storage;

pub use auth_flow::{AuthForm, AuthMode};
pub use gateway::{ApiGateway, GatewayError};
pub use roadmap_flow::{RequestState, RoadmapFlow, RoadmapGenerator, FALLBACK_MESSAGE};
pub use session::{Access, Session, View};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
