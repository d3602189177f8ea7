use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};

use super::health::HealthFactor;
use super::reserve::EModeCategory;

/// A user's balances in one reserve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserReservePosition {
    pub reserve_id: String,
    /// Amount supplied, in asset units.
    #[serde(with = "rust_decimal::serde::str")]
    pub underlying_balance: Decimal,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub underlying_balance_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_borrows: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_borrows_usd: Decimal,
    pub usage_as_collateral_enabled_on_user: bool,
}

impl UserReservePosition {
    /// Reject negative balances or borrows.
    pub fn check_invariants(&self) -> EngineResult<()> {
        let non_negative = [
            ("underlying_balance", self.underlying_balance),
            ("total_borrows", self.total_borrows),
        ];
        for (name, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(EngineError::InvalidAmount {
                    reason: format!(
                        "position in {}: {name} is negative ({value})",
                        self.reserve_id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Borrowing regime a user is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserMode {
    Standard,
    /// Collateral is a single isolated asset; only isolation-borrowable
    /// stable assets may be borrowed.
    Isolated,
}

/// Totals across all of a user's reserves, in reference currency.
///
/// Produced by [`crate::core::aggregator::aggregate_position`] or supplied
/// by an upstream data source that already computed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAggregatePosition {
    #[serde(with = "rust_decimal::serde::str")]
    pub total_collateral_reference: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_borrows_reference: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub available_borrows_reference: Decimal,
    /// Collateral-weighted average liquidation threshold (fraction).
    #[serde(with = "rust_decimal::serde::str")]
    pub current_liquidation_threshold: Decimal,
    /// Collateral-weighted average loan-to-value (fraction).
    #[serde(default, with = "rust_decimal::serde::str")]
    pub current_ltv: Decimal,
    pub health_factor: HealthFactor,
    pub is_in_isolation_mode: bool,
    #[serde(rename = "emode_category_id", default)]
    pub emode_category: EModeCategory,
}

impl UserAggregatePosition {
    pub fn has_debt(&self) -> bool {
        !self.total_borrows_reference.is_zero()
    }

    pub fn user_mode(&self) -> UserMode {
        if self.is_in_isolation_mode {
            UserMode::Isolated
        } else {
            UserMode::Standard
        }
    }
}
