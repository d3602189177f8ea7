//! Decoding of on-chain fixed-point integers into `Decimal`.
//!
//! Data sources that read the pool directly deliver integers: token amounts
//! in base units, prices in the base currency's 8-decimal unit, ratios in
//! basis points and rates in RAY. Nothing here ever falls back to zero; a
//! value that cannot be represented is an error.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::BPS_SCALE;
use crate::core::decimal::DecimalExt;
use crate::errors::{EngineError, EngineResult};
use crate::types::reserve::{EModeCategory, ReserveSnapshot};

const RAY_DECIMALS: u32 = 27;

/// Debt ceilings carry two decimals on-chain.
const DEBT_CEILING_DECIMALS: u32 = 2;

/// Convert an integer scaled by `10^decimals` into a `Decimal`.
///
/// Digits beyond the 28 significant digits a `Decimal` holds are rounded
/// away; integer parts that do not fit fail with
/// [`EngineError::InvalidFixedPoint`].
pub fn fixed_to_decimal(raw: U256, decimals: u32) -> EngineResult<Decimal> {
    let digits = raw.to_string();
    let decimals = decimals as usize;

    let literal = if decimals == 0 {
        digits
    } else if digits.len() > decimals {
        let (int_part, frac_part) = digits.split_at(digits.len() - decimals);
        format!("{int_part}.{frac_part}")
    } else {
        format!("0.{digits:0>decimals$}")
    };

    Decimal::from_str(&literal).map_err(|_| EngineError::InvalidFixedPoint {
        value: raw.to_string(),
    })
}

/// Convert basis points into a fraction (7500 → 0.75).
pub fn bps_to_fraction(bps: u16) -> EngineResult<Decimal> {
    Decimal::from(bps).try_div(BPS_SCALE)
}

/// Convert an amount expressed in base-currency units (e.g. 8-decimal USD).
pub fn base_currency_to_decimal(raw: U256, base_currency_decimals: u32) -> EngineResult<Decimal> {
    fixed_to_decimal(raw, base_currency_decimals)
}

// ---------------------------------------------------------------------------
// RAY (1e27): interest rates
// ---------------------------------------------------------------------------

/// RAY-scaled value (27 decimals). Used for borrow rates.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ray(pub U256);

impl Ray {
    pub const ZERO: Ray = Ray(U256::ZERO);

    pub fn to_decimal(self) -> EngineResult<Decimal> {
        fixed_to_decimal(self.0, RAY_DECIMALS)
    }
}

impl fmt::Debug for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ray({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Raw reserve
// ---------------------------------------------------------------------------

/// Reserve data exactly as read from the pool's data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReserveData {
    pub id: String,
    pub underlying_asset: Address,
    pub symbol: String,
    pub decimals: u8,
    /// Base-currency units.
    pub price_in_market_reference_currency: U256,
    /// Token base units.
    pub available_liquidity: U256,
    pub unborrowed_liquidity: U256,
    pub total_debt: U256,
    /// Base-currency units.
    pub total_liquidity_usd: U256,
    pub is_active: bool,
    pub borrowing_enabled: bool,
    pub borrowable_in_isolation: bool,
    pub usage_as_collateral_enabled: bool,
    pub stable_borrow_rate_enabled: bool,
    pub stable_borrow_rate: Ray,
    pub variable_borrow_rate: Ray,
    pub reserve_liquidation_threshold_bps: u16,
    pub emode_liquidation_threshold_bps: u16,
    pub base_ltv_bps: u16,
    pub emode_ltv_bps: u16,
    pub emode_category_id: u8,
    pub debt_ceiling: U256,
}

impl RawReserveData {
    /// Decode into a [`ReserveSnapshot`]. `base_currency_decimals` is the
    /// scale of prices and USD totals (8 for USD-denominated pools).
    pub fn into_snapshot(self, base_currency_decimals: u32) -> EngineResult<ReserveSnapshot> {
        let token_decimals = u32::from(self.decimals);

        Ok(ReserveSnapshot {
            price_in_reference_currency: base_currency_to_decimal(
                self.price_in_market_reference_currency,
                base_currency_decimals,
            )?,
            available_liquidity: fixed_to_decimal(self.available_liquidity, token_decimals)?,
            unborrowed_liquidity: fixed_to_decimal(self.unborrowed_liquidity, token_decimals)?,
            total_debt: fixed_to_decimal(self.total_debt, token_decimals)?,
            total_liquidity_usd: base_currency_to_decimal(
                self.total_liquidity_usd,
                base_currency_decimals,
            )?,
            is_active: self.is_active,
            borrowing_enabled: self.borrowing_enabled,
            borrowable_in_isolation: self.borrowable_in_isolation,
            usage_as_collateral_enabled: self.usage_as_collateral_enabled,
            stable_borrow_rate_enabled: self.stable_borrow_rate_enabled,
            stable_borrow_apy: self.stable_borrow_rate.to_decimal()?,
            variable_borrow_apy: self.variable_borrow_rate.to_decimal()?,
            liquidation_threshold: bps_to_fraction(self.reserve_liquidation_threshold_bps)?,
            emode_liquidation_threshold: bps_to_fraction(self.emode_liquidation_threshold_bps)?,
            base_ltv: bps_to_fraction(self.base_ltv_bps)?,
            emode_ltv: bps_to_fraction(self.emode_ltv_bps)?,
            emode_category: EModeCategory::from(self.emode_category_id),
            debt_ceiling: fixed_to_decimal(self.debt_ceiling, DEBT_CEILING_DECIMALS)?,
            id: self.id,
            underlying_asset: self.underlying_asset,
            symbol: self.symbol,
            decimals: self.decimals,
        })
    }
}
