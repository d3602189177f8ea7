//! Fold per-reserve balances into a [`UserAggregatePosition`].

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::core::decimal::{try_sum, DecimalExt};
use crate::core::health::compute_health_factor;
use crate::errors::{EngineError, EngineResult};
use crate::types::{EModeCategory, ReserveSnapshot, UserAggregatePosition, UserReservePosition};

/// One collateral contribution, in reference currency.
struct CollateralTerm<'a> {
    reserve: &'a ReserveSnapshot,
    value: Decimal,
    threshold: Decimal,
    ltv: Decimal,
}

/// Aggregate a user's positions across reserves.
///
/// Collateral counts only where both the user and the reserve allow it. The
/// liquidation threshold and LTV are collateral-weighted averages computed
/// as sum-then-divide, so input order does not matter. A user whose only
/// collateral is an isolated asset is in isolation mode.
pub fn aggregate_position(
    reserves: &[ReserveSnapshot],
    positions: &[UserReservePosition],
    emode_category: EModeCategory,
) -> EngineResult<UserAggregatePosition> {
    let by_id: HashMap<&str, &ReserveSnapshot> =
        reserves.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut collateral_terms: Vec<CollateralTerm<'_>> = Vec::new();
    let mut debts: Vec<Decimal> = Vec::with_capacity(positions.len());

    for position in positions {
        let reserve = by_id
            .get(position.reserve_id.as_str())
            .copied()
            .ok_or_else(|| EngineError::MissingReserve {
                reserve_id: position.reserve_id.clone(),
            })?;
        reserve.check_invariants()?;
        position.check_invariants()?;

        let price = reserve.price_in_reference_currency;
        debts.push(position.total_borrows.try_mul(price)?);

        let supplied = position.underlying_balance.try_mul(price)?;
        if position.usage_as_collateral_enabled_on_user
            && reserve.usage_as_collateral_enabled
            && supplied > Decimal::ZERO
        {
            collateral_terms.push(CollateralTerm {
                reserve,
                value: supplied,
                threshold: reserve.effective_liquidation_threshold(emode_category),
                ltv: reserve.effective_ltv(emode_category),
            });
        }
    }

    let total_collateral = try_sum(collateral_terms.iter().map(|t| t.value))?;
    let total_borrows = try_sum(debts)?;

    let weighted_threshold = try_sum(
        collateral_terms
            .iter()
            .map(|t| t.value.try_mul(t.threshold))
            .collect::<EngineResult<Vec<_>>>()?,
    )?;
    let weighted_ltv = try_sum(
        collateral_terms
            .iter()
            .map(|t| t.value.try_mul(t.ltv))
            .collect::<EngineResult<Vec<_>>>()?,
    )?;

    let (current_liquidation_threshold, current_ltv) = if total_collateral.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            weighted_threshold.try_div(total_collateral)?,
            weighted_ltv.try_div(total_collateral)?,
        )
    };

    let available_borrows = weighted_ltv.try_sub(total_borrows)?.max(Decimal::ZERO);

    let is_in_isolation_mode = matches!(
        collateral_terms.as_slice(),
        [only] if only.reserve.is_isolated_collateral()
    );

    let health_factor =
        compute_health_factor(total_collateral, total_borrows, current_liquidation_threshold)?;

    debug!(
        %total_collateral,
        %total_borrows,
        %available_borrows,
        %current_liquidation_threshold,
        %health_factor,
        is_in_isolation_mode,
        "aggregated user position"
    );

    Ok(UserAggregatePosition {
        total_collateral_reference: total_collateral,
        total_borrows_reference: total_borrows,
        available_borrows_reference: available_borrows,
        current_liquidation_threshold,
        current_ltv,
        health_factor,
        is_in_isolation_mode,
        emode_category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::reserve::tests::sample_reserve;
    use crate::types::HealthFactor;
    use rust_decimal_macros::dec;

    fn position(
        reserve_id: &str,
        balance: Decimal,
        borrows: Decimal,
        collateral: bool,
    ) -> UserReservePosition {
        UserReservePosition {
            reserve_id: reserve_id.to_string(),
            underlying_balance: balance,
            underlying_balance_usd: Decimal::ZERO,
            total_borrows: borrows,
            total_borrows_usd: Decimal::ZERO,
            usage_as_collateral_enabled_on_user: collateral,
        }
    }

    fn two_reserves() -> Vec<ReserveSnapshot> {
        let mut weth = sample_reserve("weth");
        weth.price_in_reference_currency = dec!(2);
        weth.liquidation_threshold = dec!(0.8);
        weth.base_ltv = dec!(0.75);

        let mut usdc = sample_reserve("usdc");
        usdc.price_in_reference_currency = dec!(1);
        usdc.liquidation_threshold = dec!(0.7);
        usdc.base_ltv = dec!(0.6);

        vec![weth, usdc]
    }

    #[test]
    fn test_aggregate_weighted_threshold() {
        // weth: 300 * 2 = 600 @ 0.8, usdc: 400 @ 0.7 → LT 0.76, LTV 0.69
        let reserves = two_reserves();
        let positions = vec![
            position("weth", dec!(300), Decimal::ZERO, true),
            position("usdc", dec!(400), dec!(500), true),
        ];

        let agg = aggregate_position(&reserves, &positions, EModeCategory::None).unwrap();
        assert_eq!(agg.total_collateral_reference, dec!(1000));
        assert_eq!(agg.total_borrows_reference, dec!(500));
        assert_eq!(agg.current_liquidation_threshold, dec!(0.76));
        assert_eq!(agg.current_ltv, dec!(0.69));
        // 690 - 500
        assert_eq!(agg.available_borrows_reference, dec!(190));
        // 1000 * 0.76 / 500
        assert_eq!(agg.health_factor, HealthFactor::Finite(dec!(1.52)));
        assert!(!agg.is_in_isolation_mode);
    }

    #[test]
    fn test_aggregate_skips_non_collateral() {
        let reserves = two_reserves();
        let positions = vec![
            position("weth", dec!(300), Decimal::ZERO, true),
            position("usdc", dec!(400), Decimal::ZERO, false),
        ];

        let agg = aggregate_position(&reserves, &positions, EModeCategory::None).unwrap();
        assert_eq!(agg.total_collateral_reference, dec!(600));
        assert_eq!(agg.current_liquidation_threshold, dec!(0.8));
        assert_eq!(agg.health_factor, HealthFactor::Infinite);
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let reserves = two_reserves();
        let positions = vec![
            position("weth", dec!(123.456), dec!(1.5), true),
            position("usdc", dec!(987.654), dec!(300), true),
        ];
        let mut reversed = positions.clone();
        reversed.reverse();
        let mut reserves_reversed = reserves.clone();
        reserves_reversed.reverse();

        let a = aggregate_position(&reserves, &positions, EModeCategory::None).unwrap();
        let b = aggregate_position(&reserves_reversed, &reversed, EModeCategory::None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_aggregate_isolation_mode() {
        let mut reserves = two_reserves();
        reserves[0].debt_ceiling = dec!(1_000_000);
        let positions = vec![
            position("weth", dec!(300), Decimal::ZERO, true),
            position("usdc", Decimal::ZERO, dec!(100), false),
        ];

        let agg = aggregate_position(&reserves, &positions, EModeCategory::None).unwrap();
        assert!(agg.is_in_isolation_mode);

        // a second collateral lifts isolation
        let positions = vec![
            position("weth", dec!(300), Decimal::ZERO, true),
            position("usdc", dec!(10), dec!(100), true),
        ];
        let agg = aggregate_position(&reserves, &positions, EModeCategory::None).unwrap();
        assert!(!agg.is_in_isolation_mode);
    }

    #[test]
    fn test_aggregate_emode_thresholds() {
        let mut reserves = two_reserves();
        for r in &mut reserves {
            r.emode_category = EModeCategory::Category(1);
        }
        let positions = vec![position("usdc", dec!(1000), Decimal::ZERO, true)];

        let agg = aggregate_position(&reserves, &positions, EModeCategory::Category(1)).unwrap();
        assert_eq!(agg.current_liquidation_threshold, dec!(0.95));
        assert_eq!(agg.available_borrows_reference, dec!(930));
        assert_eq!(agg.emode_category, EModeCategory::Category(1));
    }

    #[test]
    fn test_aggregate_missing_reserve() {
        let reserves = two_reserves();
        let positions = vec![position("dai", dec!(1), Decimal::ZERO, true)];

        let err = aggregate_position(&reserves, &positions, EModeCategory::None).unwrap_err();
        assert!(matches!(err, EngineError::MissingReserve { reserve_id } if reserve_id == "dai"));
    }

    #[test]
    fn test_aggregate_rejects_negative_inputs() {
        let mut reserves = two_reserves();
        reserves[0].price_in_reference_currency = dec!(-2);
        let positions = vec![position("weth", dec!(300), Decimal::ZERO, true)];
        let err = aggregate_position(&reserves, &positions, EModeCategory::None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount { .. }));

        let reserves = two_reserves();
        let positions = vec![position("usdc", dec!(-10), Decimal::ZERO, true)];
        let err = aggregate_position(&reserves, &positions, EModeCategory::None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount { .. }));
    }

    #[test]
    fn test_aggregate_empty() {
        let agg = aggregate_position(&[], &[], EModeCategory::None).unwrap();
        assert_eq!(agg.total_collateral_reference, Decimal::ZERO);
        assert_eq!(agg.current_liquidation_threshold, Decimal::ZERO);
        assert!(agg.health_factor.is_infinite());
        assert!(!agg.has_debt());
    }
}
