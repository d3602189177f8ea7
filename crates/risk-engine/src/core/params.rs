use rust_decimal::Decimal;

use crate::constants::{
    DEFAULT_BORROW_SAFETY_MARGIN, DEFAULT_DANGEROUS_HEALTH_FACTOR, DEFAULT_THRESHOLD_DECIMALS,
    DEFAULT_USD_DECIMALS, DEFAULT_WATCH_HEALTH_FACTOR, DEFAULT_WITHDRAW_SAFETY_MARGIN,
    DEFAULT_WITHDRAW_THRESHOLD_BUFFER,
};

/// Tolerances and precision passed explicitly to every engine call.
///
/// The margins must stay in line with what the settlement layer accepts:
/// a too-generous value produces transactions that revert on-chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskParameters {
    /// Multiplier on borrow headroom when the user already has debt.
    pub borrow_safety_margin: Decimal,
    /// Added to the liquidation threshold when sizing withdraw headroom.
    pub withdraw_threshold_buffer: Decimal,
    /// Multiplier on withdraw headroom.
    pub withdraw_safety_margin: Decimal,
    /// Projected health factor at or below this is flagged dangerous.
    pub dangerous_health_factor: Decimal,
    /// Projected health factor below this is on watch.
    pub watch_health_factor: Decimal,
    /// Fractional digits kept for a recomputed liquidation threshold.
    pub threshold_decimals: u32,
    /// Fractional digits kept for USD amounts.
    pub usd_decimals: u32,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            borrow_safety_margin: DEFAULT_BORROW_SAFETY_MARGIN,
            withdraw_threshold_buffer: DEFAULT_WITHDRAW_THRESHOLD_BUFFER,
            withdraw_safety_margin: DEFAULT_WITHDRAW_SAFETY_MARGIN,
            dangerous_health_factor: DEFAULT_DANGEROUS_HEALTH_FACTOR,
            watch_health_factor: DEFAULT_WATCH_HEALTH_FACTOR,
            threshold_decimals: DEFAULT_THRESHOLD_DECIMALS,
            usd_decimals: DEFAULT_USD_DECIMALS,
        }
    }
}
