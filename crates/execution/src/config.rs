use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Token the keeper takes its fee in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeSide {
    Token0,
    Token1,
}

/// Settings for the keeper loop and its resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    /// Milliseconds between evaluations.
    pub interval_ms: u64,
    /// Stop after this many evaluations.
    pub max_ticks: Option<u64>,
    /// Stop after this many consecutive failed evaluations.
    pub max_consecutive_failures: u32,
    /// How far the limit price is shifted off the TWAP, in bps.
    pub limit_margin_bps: u16,
    /// Spot deviation the vault may tolerate for the limit price, in bps.
    pub max_slippage_bps: u16,
    /// Side of the TWAP band the limit is placed on.
    pub zero_for_one: bool,
    pub fee_side: FeeSide,
    /// Share of the harvestable fees taken as keeper fee, in bps.
    pub fee_bps: u16,
    /// Reinvest is skipped while the keeper fee would be below this.
    pub min_fee: U256,
    /// Recenter when the tick is within this many ticks of a bound.
    pub edge_buffer_ticks: i32,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            interval_ms: 300_000,
            max_ticks: None,
            max_consecutive_failures: 3,
            limit_margin_bps: 100,
            max_slippage_bps: 1_000,
            zero_for_one: true,
            fee_side: FeeSide::Token1,
            fee_bps: 100,
            min_fee: U256::one(),
            edge_buffer_ticks: 60,
        }
    }
}

impl KeeperConfig {
    #[must_use]
    pub fn with_interval_ms(mut self, millis: u64) -> Self {
        self.interval_ms = millis;
        self
    }

    #[must_use]
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    #[must_use]
    pub fn with_fee(mut self, side: FeeSide, fee_bps: u16, min_fee: U256) -> Self {
        self.fee_side = side;
        self.fee_bps = fee_bps;
        self.min_fee = min_fee;
        self
    }

    #[must_use]
    pub fn with_edge_buffer(mut self, ticks: i32) -> Self {
        self.edge_buffer_ticks = ticks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: KeeperConfig =
            serde_json::from_str(r#"{ "fee_side": "Token0", "max_ticks": 10 }"#).unwrap();
        assert_eq!(config.fee_side, FeeSide::Token0);
        assert_eq!(config.max_ticks, Some(10));
        assert_eq!(config.interval_ms, 300_000);
        assert_eq!(config.fee_bps, 100);
    }
}
