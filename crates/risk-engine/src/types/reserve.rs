use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};

/// Efficiency-mode risk bucket. Id 0 on the wire means "no category".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum EModeCategory {
    #[default]
    None,
    Category(u8),
}

impl EModeCategory {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Category(_))
    }

    pub fn id(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Category(id) => id,
        }
    }

    /// True when both sides are in the same, active category.
    pub fn matches(self, other: EModeCategory) -> bool {
        self.is_active() && self == other
    }
}

impl From<u8> for EModeCategory {
    fn from(id: u8) -> Self {
        if id == 0 {
            Self::None
        } else {
            Self::Category(id)
        }
    }
}

impl From<EModeCategory> for u8 {
    fn from(category: EModeCategory) -> Self {
        category.id()
    }
}

/// Point-in-time view of one pool reserve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveSnapshot {
    pub id: String,
    pub underlying_asset: Address,
    pub symbol: String,
    pub decimals: u8,

    #[serde(with = "rust_decimal::serde::str")]
    pub price_in_reference_currency: Decimal,

    #[serde(with = "rust_decimal::serde::str")]
    pub available_liquidity: Decimal,
    /// Liquidity not currently lent out; the hard ceiling on withdrawals.
    #[serde(with = "rust_decimal::serde::str")]
    pub unborrowed_liquidity: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_debt: Decimal,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub total_liquidity_usd: Decimal,

    pub is_active: bool,
    pub borrowing_enabled: bool,
    pub borrowable_in_isolation: bool,
    pub usage_as_collateral_enabled: bool,
    pub stable_borrow_rate_enabled: bool,

    #[serde(with = "rust_decimal::serde::str")]
    pub stable_borrow_apy: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub variable_borrow_apy: Decimal,

    /// Fractions in [0, 1].
    #[serde(with = "rust_decimal::serde::str")]
    pub liquidation_threshold: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub emode_liquidation_threshold: Decimal,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub base_ltv: Decimal,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub emode_ltv: Decimal,

    #[serde(rename = "emode_category_id", default)]
    pub emode_category: EModeCategory,

    /// Nonzero marks the asset as an isolated collateral.
    #[serde(default, with = "rust_decimal::serde::str")]
    pub debt_ceiling: Decimal,
}

impl ReserveSnapshot {
    /// Liquidation threshold applying to a user in `user_category`.
    pub fn effective_liquidation_threshold(&self, user_category: EModeCategory) -> Decimal {
        if user_category.matches(self.emode_category) {
            self.emode_liquidation_threshold
        } else {
            self.liquidation_threshold
        }
    }

    /// Loan-to-value applying to a user in `user_category`.
    pub fn effective_ltv(&self, user_category: EModeCategory) -> Decimal {
        if user_category.matches(self.emode_category) {
            self.emode_ltv
        } else {
            self.base_ltv
        }
    }

    pub fn is_isolated_collateral(&self) -> bool {
        self.debt_ceiling > Decimal::ZERO
    }

    /// Reject snapshots whose balances or ratios are out of range.
    ///
    /// A negative price is rejected here; a zero price surfaces as
    /// [`EngineError::DivisionByZero`] at the point it is divided by.
    pub fn check_invariants(&self) -> EngineResult<()> {
        let non_negative = [
            ("price_in_reference_currency", self.price_in_reference_currency),
            ("available_liquidity", self.available_liquidity),
            ("unborrowed_liquidity", self.unborrowed_liquidity),
            ("total_debt", self.total_debt),
            ("debt_ceiling", self.debt_ceiling),
        ];
        for (name, value) in non_negative {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(EngineError::InvalidAmount {
                    reason: format!("reserve {}: {name} is negative ({value})", self.id),
                });
            }
        }

        let fractions = [
            ("liquidation_threshold", self.liquidation_threshold),
            ("emode_liquidation_threshold", self.emode_liquidation_threshold),
            ("base_ltv", self.base_ltv),
            ("emode_ltv", self.emode_ltv),
        ];
        for (name, value) in fractions {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(EngineError::InvalidAmount {
                    reason: format!("reserve {}: {name} out of [0, 1] ({value})", self.id),
                });
            }
        }

        Ok(())
    }
}
