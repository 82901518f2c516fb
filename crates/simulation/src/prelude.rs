//! Prelude module for convenient imports.
//!
//! ```rust
//! use swapsweep_simulation::prelude::*;
//! ```

pub use crate::ledger::InMemoryLedger;
pub use crate::observation::{Observation, ObservationRing};
pub use crate::oracle::FeeVolatilityOracle;
pub use crate::pool::{InMemoryPool, PoolConfig, SwapResult};
pub use crate::trade_flow::{
    AlternatingTradeFlow, RandomTradeFlow, SwapOrder, TradeFlow, TradeSummary, run_trades,
};
