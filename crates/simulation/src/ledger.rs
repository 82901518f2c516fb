use primitive_types::U256;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use swapsweep_domain::token::Address;
use swapsweep_protocols::error::TokenError;
use swapsweep_protocols::token::TokenLedger;

#[derive(Debug, Default)]
struct LedgerState {
    symbols: HashMap<Address, String>,
    balances: HashMap<(Address, Address), U256>,
}

/// Token balances kept in memory. Clones share the same balances.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `token` known to the ledger.
    pub fn register(&self, token: Address, symbol: impl Into<String>) {
        self.write().symbols.insert(token, symbol.into());
    }

    /// Creates `amount` of `token` out of thin air for `to`.
    pub fn mint(&self, token: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        let mut state = self.write();
        if !state.symbols.contains_key(&token) {
            return Err(TokenError::UnknownToken(token));
        }
        let balance = state.balances.entry((token, to)).or_default();
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, token: Address, owner: Address) -> Result<U256, TokenError> {
        let state = self.read();
        if !state.symbols.contains_key(&token) {
            return Err(TokenError::UnknownToken(token));
        }
        Ok(state
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    fn transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let mut state = self.write();
        if !state.symbols.contains_key(&token) {
            return Err(TokenError::UnknownToken(token));
        }
        let available = state
            .balances
            .get(&(token, from))
            .copied()
            .unwrap_or_default();
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                token,
                owner: from,
                needed: amount,
                available,
            });
        }
        if from == to || amount.is_zero() {
            return Ok(());
        }
        state.balances.insert((token, from), available - amount);
        let receiver = state.balances.entry((token, to)).or_default();
        *receiver = receiver.saturating_add(amount);
        Ok(())
    }

    fn symbol(&self, token: Address) -> Result<String, TokenError> {
        self.read()
            .symbols
            .get(&token)
            .cloned()
            .ok_or(TokenError::UnknownToken(token))
    }
}
