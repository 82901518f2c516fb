use crate::error::TokenError;
use primitive_types::U256;
use std::fmt::Debug;
use swapsweep_domain::token::Address;

/// Balances of fungible tokens.
///
/// `transfer` moves funds on behalf of `from`; callers are trusted to have
/// the holder's approval.
pub trait TokenLedger: Send + Sync + Debug {
    fn balance_of(&self, token: Address, owner: Address) -> Result<U256, TokenError>;

    fn transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    fn symbol(&self, token: Address) -> Result<String, TokenError>;
}
