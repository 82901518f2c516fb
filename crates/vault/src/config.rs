use crate::engine::RecenterConfig;
use crate::params::{DEFAULT_TIMELOCK_SECONDS, ManagerParameters};
use serde::{Deserialize, Serialize};

/// Deployment settings of a vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Version tag used in the share token name and symbol.
    pub version: u32,
    /// Token symbols for the share name; read from the token ledger when
    /// unset.
    pub token_symbols: Option<(String, String)>,
    /// Initial `(lower, upper)` ticks; the full usable range when unset.
    pub initial_range: Option<(i32, i32)>,
    /// Delay before proposed parameters take effect.
    pub timelock_seconds: u64,
    /// Parameters in force at deployment.
    pub params: ManagerParameters,
    pub recenter: RecenterConfig,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            version: 1,
            token_symbols: None,
            initial_range: None,
            timelock_seconds: DEFAULT_TIMELOCK_SECONDS,
            params: ManagerParameters::default(),
            recenter: RecenterConfig::default(),
        }
    }
}

impl VaultConfig {
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_token_symbols(mut self, symbol0: impl Into<String>, symbol1: impl Into<String>) -> Self {
        self.token_symbols = Some((symbol0.into(), symbol1.into()));
        self
    }

    #[must_use]
    pub fn with_initial_range(mut self, lower: i32, upper: i32) -> Self {
        self.initial_range = Some((lower, upper));
        self
    }

    #[must_use]
    pub fn with_timelock(mut self, seconds: u64) -> Self {
        self.timelock_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: ManagerParameters) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_recenter(mut self, recenter: RecenterConfig) -> Self {
        self.recenter = recenter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: VaultConfig =
            serde_json::from_str(r#"{ "version": 2, "initial_range": [-600, 600] }"#).unwrap();
        assert_eq!(config.version, 2);
        assert_eq!(config.initial_range, Some((-600, 600)));
        assert_eq!(config.timelock_seconds, 300);
        assert_eq!(config.params, ManagerParameters::default());
    }

    #[test]
    fn test_builder() {
        let config = VaultConfig::default().with_timelock(60).with_initial_range(-60, 60);
        assert_eq!(config.timelock_seconds, 60);
        assert_eq!(config.initial_range, Some((-60, 60)));
    }
}
