use crate::error::VaultError;
use serde::{Deserialize, Serialize};
use std::fmt;
use swapsweep_domain::token::Address;

/// Capability names used in authorization errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Manager,
    PendingManager,
    Keeper,
    FeeRecipient,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Manager => "manager",
            Role::PendingManager => "pending manager",
            Role::Keeper => "keeper",
            Role::FeeRecipient => "fee recipient",
        };
        f.write_str(name)
    }
}

/// The privileged identities of a vault.
///
/// Manager ownership moves in two steps: the current manager nominates a
/// successor, who must accept. Renouncing leaves the vault without a
/// manager for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    manager: Option<Address>,
    pending_manager: Option<Address>,
    keeper: Address,
}

impl RoleConfig {
    #[must_use]
    pub fn new(manager: Address, keeper: Address) -> Self {
        Self {
            manager: Some(manager),
            pending_manager: None,
            keeper,
        }
    }

    pub fn manager(&self) -> Option<Address> {
        self.manager
    }

    pub fn pending_manager(&self) -> Option<Address> {
        self.pending_manager
    }

    pub fn keeper(&self) -> Address {
        self.keeper
    }

    pub fn is_manager(&self, caller: Address) -> bool {
        self.manager == Some(caller)
    }

    pub fn ensure_manager(&self, caller: Address) -> Result<(), VaultError> {
        if self.is_manager(caller) {
            Ok(())
        } else {
            Err(VaultError::Unauthorized {
                role: Role::Manager,
                caller,
            })
        }
    }

    pub fn ensure_keeper(&self, caller: Address) -> Result<(), VaultError> {
        if caller == self.keeper {
            Ok(())
        } else {
            Err(VaultError::Unauthorized {
                role: Role::Keeper,
                caller,
            })
        }
    }

    /// Nominates `new_manager`; replaces any earlier nomination.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_manager: Address,
    ) -> Result<(), VaultError> {
        self.ensure_manager(caller)?;
        if new_manager.is_zero() {
            return Err(VaultError::InvalidParameter(
                "new manager is the zero address".to_string(),
            ));
        }
        self.pending_manager = Some(new_manager);
        Ok(())
    }

    /// Completes a nomination. Returns the previous manager.
    pub fn accept_ownership(&mut self, caller: Address) -> Result<Option<Address>, VaultError> {
        if self.pending_manager != Some(caller) {
            return Err(VaultError::Unauthorized {
                role: Role::PendingManager,
                caller,
            });
        }
        let previous = self.manager.replace(caller);
        self.pending_manager = None;
        Ok(previous)
    }

    pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), VaultError> {
        self.ensure_manager(caller)?;
        self.manager = None;
        self.pending_manager = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn test_capability_checks() {
        let roles = RoleConfig::new(addr(1), addr(2));
        assert!(roles.ensure_manager(addr(1)).is_ok());
        assert!(roles.ensure_keeper(addr(2)).is_ok());
        assert_eq!(
            roles.ensure_keeper(addr(1)),
            Err(VaultError::Unauthorized {
                role: Role::Keeper,
                caller: addr(1)
            })
        );
        assert!(roles.ensure_manager(addr(2)).is_err());
    }

    #[test]
    fn test_two_step_transfer() {
        let mut roles = RoleConfig::new(addr(1), addr(2));
        assert!(roles.transfer_ownership(addr(2), addr(3)).is_err());

        roles.transfer_ownership(addr(1), addr(3)).unwrap();
        assert_eq!(roles.manager(), Some(addr(1)));
        assert!(roles.accept_ownership(addr(4)).is_err());

        assert_eq!(roles.accept_ownership(addr(3)).unwrap(), Some(addr(1)));
        assert_eq!(roles.manager(), Some(addr(3)));
        assert_eq!(roles.pending_manager(), None);
    }

    #[test]
    fn test_renounce_clears_manager() {
        let mut roles = RoleConfig::new(addr(1), addr(2));
        roles.transfer_ownership(addr(1), addr(3)).unwrap();
        roles.renounce_ownership(addr(1)).unwrap();

        assert_eq!(roles.manager(), None);
        assert!(roles.ensure_manager(addr(1)).is_err());
        assert!(roles.accept_ownership(addr(3)).is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Manager.to_string(), "manager");
        assert_eq!(Role::FeeRecipient.to_string(), "fee recipient");
    }
}
