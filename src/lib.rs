// ============================================================================
// twemauth Library
// ============================================================================
//
// Password rotation for Redis instances behind twemproxy: index the pool file,
// keep a credential store in step with it, and rotate passwords live.

pub mod config;
pub mod core;
pub mod reconcile;
pub mod result;
pub mod rotation;
pub mod session;
pub mod storage;
pub mod topology;

// Re-export main types for convenience
pub use config::AppConfig;
pub use crate::core::{AdminError, Instance, PoolConfig, Result, ShardGroup};
pub use reconcile::reconcile;
pub use result::Listing;
pub use rotation::{AdminLink, BatchReport, InstanceConnector, RedisConnector, RotationOutcome, Rotator};
pub use session::{Command, Flow, Selector, Session};
pub use storage::CredentialStore;
pub use topology::Topology;
