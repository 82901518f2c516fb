//! Prelude module for convenient imports.
//!
//! ```rust
//! use swapsweep_execution::prelude::*;
//! ```

pub use crate::config::{FeeSide, KeeperConfig};
pub use crate::error::KeeperError;
pub use crate::keeper::{Keeper, KeeperOutcome, KeeperReport};
pub use crate::resolver::{KeeperAction, KeeperResolver, RecenterReason};
