use swapsweep_vault::error::VaultError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeeperError {
    #[error("invalid keeper configuration: {0}")]
    InvalidConfig(String),
    #[error("keeper stopped after {0} consecutive failures")]
    TooManyFailures(u32),
    #[error(transparent)]
    Vault(#[from] VaultError),
}
