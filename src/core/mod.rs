pub mod error;
pub mod types;

pub use error::{AdminError, Result};
pub use types::{Instance, PoolConfig, ShardGroup};
