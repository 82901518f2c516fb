use primitive_types::H160;
use serde::{Deserialize, Serialize};

/// 20-byte account identity used for depositors, roles, tokens and pools.
pub type Address = H160;

/// An underlying asset of the vault.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
        }
    }
}
