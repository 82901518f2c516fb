//! Thread-safe handle that serializes vault operations.
//!
//! A collaborator that calls back into the vault while an operation is in
//! flight finds the lock held and gets [`VaultError::Reentrant`] instead of
//! blocking.

use crate::error::VaultError;
use crate::vault::Vault;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tracing::warn;

/// Cloneable handle to a [`Vault`].
#[derive(Debug, Clone)]
pub struct SharedVault {
    inner: Arc<Mutex<Vault>>,
}

impl SharedVault {
    #[must_use]
    pub fn new(vault: Vault) -> Self {
        Self {
            inner: Arc::new(Mutex::new(vault)),
        }
    }

    /// Runs `operation` with exclusive access, failing with `Reentrant` if
    /// another operation holds the vault.
    pub fn with<T>(
        &self,
        operation: impl FnOnce(&mut Vault) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let mut guard = self.lock()?;
        operation(&mut guard)
    }

    /// Read-only access under the same guard.
    pub fn read<T>(&self, query: impl FnOnce(&Vault) -> T) -> Result<T, VaultError> {
        let guard = self.lock()?;
        Ok(query(&guard))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vault>, VaultError> {
        match self.inner.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Ok(PoisonError::into_inner(poisoned)),
            Err(TryLockError::WouldBlock) => {
                warn!("Rejected reentrant vault call");
                Err(VaultError::Reentrant)
            }
        }
    }
}
