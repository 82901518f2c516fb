//! Prelude module for convenient imports.
//!
//! ```rust
//! use swapsweep_vault::prelude::*;
//! ```

pub use crate::config::VaultConfig;
pub use crate::engine::{
    ManagerWithdrawal, RebalanceEngine, RecenterConfig, RecenterOutcome, ReinvestArgs,
    ReinvestOutcome,
};
pub use crate::error::{StaleReason, VaultError};
pub use crate::events::{VaultEvent, VaultEventKind};
pub use crate::params::{
    ManagerParameters, ManagerParamsStore, ParamsUpdate, PendingParameters, RecipientUpdate,
};
pub use crate::position::{PositionManager, TokenAmounts};
pub use crate::roles::{Role, RoleConfig};
pub use crate::shared::SharedVault;
pub use crate::shares::{BurnOutcome, MintOutcome, MintQuote, ShareLedger};
pub use crate::vault::{Collaborators, Vault};
