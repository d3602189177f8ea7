//! Per-reserve capacity: how much more a user may borrow from, or withdraw
//! out of, a single reserve.

use rust_decimal::Decimal;
use tracing::debug;

use crate::constants::LIQUIDATION_HEALTH_FACTOR;
use crate::core::decimal::{DecimalExt, Rounding};
use crate::core::params::RiskParameters;
use crate::errors::EngineResult;
use crate::types::{
    HealthFactor, ReferenceCurrencyConversion, ReserveCapacity, ReserveSnapshot,
    UserAggregatePosition, UserReservePosition,
};

/// Amount of `reserve` the user can still borrow, in asset units and USD.
///
/// Headroom is converted from reference currency at the reserve price,
/// shaved by `borrow_safety_margin` when the user already has debt (interest
/// and prices move between estimation and settlement), then capped by the
/// pool's available liquidity.
pub fn max_additional_borrow(
    reserve: &ReserveSnapshot,
    aggregate: &UserAggregatePosition,
    conversion: &ReferenceCurrencyConversion,
    params: &RiskParameters,
) -> EngineResult<ReserveCapacity> {
    if aggregate.available_borrows_reference <= Decimal::ZERO {
        return Ok(ReserveCapacity::ZERO);
    }

    let margin = if aggregate.has_debt() {
        params.borrow_safety_margin
    } else {
        Decimal::ONE
    };

    let headroom = aggregate
        .available_borrows_reference
        .try_div(reserve.price_in_reference_currency)?
        .try_mul(margin)?;

    let amount = headroom
        .min(reserve.available_liquidity)
        .max(Decimal::ZERO)
        .round_to(u32::from(reserve.decimals), Rounding::Down);

    let amount_usd = conversion
        .to_usd(amount.try_mul(reserve.price_in_reference_currency)?)?
        .round_to(params.usd_decimals, Rounding::HalfEven);

    debug!(
        reserve = %reserve.id,
        %headroom,
        %amount,
        %amount_usd,
        "borrow capacity"
    );

    Ok(ReserveCapacity { amount, amount_usd })
}

/// Whether withdrawing from this position is limited by solvency: it backs
/// outstanding debt as collateral.
pub fn is_collateral_constrained(
    reserve: &ReserveSnapshot,
    position: &UserReservePosition,
    aggregate: &UserAggregatePosition,
) -> bool {
    position.usage_as_collateral_enabled_on_user
        && reserve.usage_as_collateral_enabled
        && aggregate.has_debt()
}

/// Amount of `reserve` the user can withdraw, in asset units.
///
/// Always bounded by the user's balance and the pool's unborrowed liquidity.
/// For a collateral-constrained position, additionally bounded by the
/// collateral that can leave while keeping the health factor above 1:
///
/// ```text
/// headroom = (HF - 1) * debt / (threshold + buffer) * margin
/// ```
pub fn max_withdrawable(
    reserve: &ReserveSnapshot,
    position: &UserReservePosition,
    aggregate: &UserAggregatePosition,
    params: &RiskParameters,
) -> EngineResult<Decimal> {
    let base_cap = position
        .underlying_balance
        .min(reserve.unborrowed_liquidity);

    if !is_collateral_constrained(reserve, position, aggregate) {
        return Ok(base_cap);
    }

    let HealthFactor::Finite(hf) = aggregate.health_factor else {
        return Ok(base_cap);
    };

    let excess_health = hf.try_sub(LIQUIDATION_HEALTH_FACTOR)?;
    if excess_health <= Decimal::ZERO {
        debug!(reserve = %reserve.id, %hf, "position at liquidation boundary, nothing withdrawable");
        return Ok(Decimal::ZERO);
    }

    let threshold = reserve.effective_liquidation_threshold(aggregate.emode_category);
    let headroom_reference = excess_health
        .try_mul(aggregate.total_borrows_reference)?
        .try_div(threshold.try_add(params.withdraw_threshold_buffer)?)?
        .try_mul(params.withdraw_safety_margin)?;
    let headroom = headroom_reference.try_div(reserve.price_in_reference_currency)?;

    let amount = base_cap
        .min(headroom)
        .round_to(u32::from(reserve.decimals), Rounding::Down);

    debug!(
        reserve = %reserve.id,
        %base_cap,
        %headroom,
        %amount,
        "withdraw capacity"
    );

    Ok(amount)
}
