//! Health factor engine: current and projected health factor, risk bands.
//!
//! Pure helper functions over decimals, easy to unit test. The only state is
//! the [`RiskParameters`] the caller passes in.

use rust_decimal::Decimal;

use crate::constants::LIQUIDATION_HEALTH_FACTOR;
use crate::core::decimal::{DecimalExt, Rounding};
use crate::core::params::RiskParameters;
use crate::errors::EngineResult;
use crate::types::{HealthFactor, RiskBand, UserAggregatePosition};

/// Compute health factor: HF = (collateral * liquidation_threshold) / debt.
///
/// Returns [`HealthFactor::Infinite`] if debt is zero (no liquidation risk).
pub fn compute_health_factor(
    total_collateral_reference: Decimal,
    total_borrows_reference: Decimal,
    liquidation_threshold: Decimal,
) -> EngineResult<HealthFactor> {
    if total_borrows_reference <= Decimal::ZERO {
        return Ok(HealthFactor::Infinite);
    }
    let hf = total_collateral_reference
        .try_mul(liquidation_threshold)?
        .try_div(total_borrows_reference)?;
    Ok(HealthFactor::Finite(hf))
}

/// Position after a hypothetical withdrawal of collateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawProjection {
    pub total_collateral_reference: Decimal,
    pub liquidation_threshold: Decimal,
    pub health_factor: HealthFactor,
}

/// Recompute the health factor after removing `amount_withdrawn_reference`
/// of collateral whose liquidation threshold is `reserve_threshold`.
///
/// The reweighted threshold is rounded down to `threshold_decimals`, matching
/// the precision the pool uses when it validates the withdrawal. Withdrawing
/// every unit of collateral while in debt projects a health factor of zero.
pub fn projected_health_factor_after_withdraw(
    current: &UserAggregatePosition,
    amount_withdrawn_reference: Decimal,
    reserve_threshold: Decimal,
    params: &RiskParameters,
) -> EngineResult<WithdrawProjection> {
    let collateral_after = current
        .total_collateral_reference
        .try_sub(amount_withdrawn_reference)?;

    if collateral_after <= Decimal::ZERO {
        let health_factor = if current.has_debt() {
            HealthFactor::Finite(Decimal::ZERO)
        } else {
            HealthFactor::Infinite
        };
        return Ok(WithdrawProjection {
            total_collateral_reference: Decimal::ZERO,
            liquidation_threshold: Decimal::ZERO,
            health_factor,
        });
    }

    let weighted_before = current
        .total_collateral_reference
        .try_mul(current.current_liquidation_threshold)?;
    let withdrawn_weight = amount_withdrawn_reference.try_mul(reserve_threshold)?;
    let liquidation_threshold = weighted_before
        .try_sub(withdrawn_weight)?
        .try_div(collateral_after)?
        .round_to(params.threshold_decimals, Rounding::Down);

    let health_factor = compute_health_factor(
        collateral_after,
        current.total_borrows_reference,
        liquidation_threshold,
    )?;

    Ok(WithdrawProjection {
        total_collateral_reference: collateral_after,
        liquidation_threshold,
        health_factor,
    })
}

/// Health factor after adding `amount_borrowed_reference` of debt.
pub fn projected_health_factor_after_borrow(
    current: &UserAggregatePosition,
    amount_borrowed_reference: Decimal,
) -> EngineResult<HealthFactor> {
    let debt_after = current
        .total_borrows_reference
        .try_add(amount_borrowed_reference)?;
    compute_health_factor(
        current.total_collateral_reference,
        debt_after,
        current.current_liquidation_threshold,
    )
}

/// Near-liquidation warning: debt is outstanding and the projected health
/// factor sits at or below the dangerous threshold.
pub fn is_dangerous(has_debt: bool, projected: HealthFactor, params: &RiskParameters) -> bool {
    has_debt && projected <= HealthFactor::Finite(params.dangerous_health_factor)
}

/// Classify a health factor value into a risk band.
pub fn determine_risk_band(hf: HealthFactor, params: &RiskParameters) -> RiskBand {
    let HealthFactor::Finite(value) = hf else {
        return RiskBand::Safe;
    };
    if value < LIQUIDATION_HEALTH_FACTOR {
        RiskBand::Liquidatable
    } else if value <= params.dangerous_health_factor {
        RiskBand::Dangerous
    } else if value < params.watch_health_factor {
        RiskBand::Watch
    } else {
        RiskBand::Safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EModeCategory;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn aggregate(collateral: Decimal, debt: Decimal, lt: Decimal) -> UserAggregatePosition {
        UserAggregatePosition {
            total_collateral_reference: collateral,
            total_borrows_reference: debt,
            available_borrows_reference: Decimal::ZERO,
            current_liquidation_threshold: lt,
            current_ltv: Decimal::ZERO,
            health_factor: compute_health_factor(collateral, debt, lt).unwrap(),
            is_in_isolation_mode: false,
            emode_category: EModeCategory::None,
        }
    }

    // -----------------------------------------------------------------------
    // compute_health_factor
    // -----------------------------------------------------------------------

    #[test]
    fn test_compute_hf_basic() {
        // collateral=1000, debt=500, LT=0.8 → HF = (1000*0.8)/500 = 1.6
        let hf = compute_health_factor(dec!(1000), dec!(500), dec!(0.8)).unwrap();
        assert_eq!(hf, HealthFactor::Finite(dec!(1.6)));
    }

    #[test]
    fn test_compute_hf_zero_debt() {
        let hf = compute_health_factor(dec!(1000), Decimal::ZERO, dec!(0.8)).unwrap();
        assert_eq!(hf, HealthFactor::Infinite);
    }

    #[test]
    fn test_compute_hf_high_leverage() {
        // collateral=1000, debt=800, LT=0.825 → HF = 1.03125
        let hf = compute_health_factor(dec!(1000), dec!(800), dec!(0.825)).unwrap();
        assert_eq!(hf, HealthFactor::Finite(dec!(1.03125)));
    }

    // -----------------------------------------------------------------------
    // projections
    // -----------------------------------------------------------------------

    #[test]
    fn test_withdraw_projection_single_collateral() {
        // Withdraw 250 of 1000 collateral at LT 0.8 with 500 debt:
        // LT stays 0.8, HF = 750*0.8/500 = 1.2
        let current = aggregate(dec!(1000), dec!(500), dec!(0.8));
        let projection = projected_health_factor_after_withdraw(
            &current,
            dec!(250),
            dec!(0.8),
            &RiskParameters::default(),
        )
        .unwrap();
        assert_eq!(projection.total_collateral_reference, dec!(750));
        assert_eq!(projection.liquidation_threshold, dec!(0.8));
        assert_eq!(projection.health_factor, HealthFactor::Finite(dec!(1.2)));
    }

    #[test]
    fn test_withdraw_projection_reweights_threshold_rounding_down() {
        // Two collaterals: 600 @ 0.8 and 400 @ 0.7 → weighted LT 0.76.
        // Withdraw 100 of the 0.7 asset: (760 - 70) / 900 = 0.76666.. → 0.7666
        let current = aggregate(dec!(1000), dec!(300), dec!(0.76));
        let projection = projected_health_factor_after_withdraw(
            &current,
            dec!(100),
            dec!(0.7),
            &RiskParameters::default(),
        )
        .unwrap();
        assert_eq!(projection.liquidation_threshold, dec!(0.7666));
        // 900 * 0.7666 / 300 = 2.2998
        assert_eq!(projection.health_factor, HealthFactor::Finite(dec!(2.2998)));
    }

    #[test]
    fn test_withdraw_everything_with_debt_projects_zero() {
        let current = aggregate(dec!(1000), dec!(500), dec!(0.8));
        let projection = projected_health_factor_after_withdraw(
            &current,
            dec!(1000),
            dec!(0.8),
            &RiskParameters::default(),
        )
        .unwrap();
        assert_eq!(projection.health_factor, HealthFactor::Finite(Decimal::ZERO));
    }

    #[test]
    fn test_withdraw_without_debt_stays_infinite() {
        let current = aggregate(dec!(1000), Decimal::ZERO, dec!(0.8));
        let projection = projected_health_factor_after_withdraw(
            &current,
            dec!(400),
            dec!(0.8),
            &RiskParameters::default(),
        )
        .unwrap();
        assert!(projection.health_factor.is_infinite());
    }

    #[test]
    fn test_borrow_projection() {
        // 1000 * 0.8 / (500 + 140) = 1.25
        let current = aggregate(dec!(1000), dec!(500), dec!(0.8));
        let hf = projected_health_factor_after_borrow(&current, dec!(140)).unwrap();
        assert_eq!(hf, HealthFactor::Finite(dec!(1.25)));
    }

    // -----------------------------------------------------------------------
    // dangerous band / risk bands
    // -----------------------------------------------------------------------

    #[test]
    fn test_dangerous_boundary() {
        let params = RiskParameters::default();
        assert!(is_dangerous(true, HealthFactor::Finite(dec!(1.05)), &params));
        assert!(!is_dangerous(true, HealthFactor::Finite(dec!(1.06)), &params));
        assert!(!is_dangerous(false, HealthFactor::Finite(dec!(1.0)), &params));
        assert!(!is_dangerous(true, HealthFactor::Infinite, &params));
    }

    #[test]
    fn test_risk_bands() {
        let params = RiskParameters::default();
        let band = |v| determine_risk_band(HealthFactor::Finite(v), &params);
        assert_eq!(band(dec!(0.99)), RiskBand::Liquidatable);
        assert_eq!(band(dec!(1.0)), RiskBand::Dangerous);
        assert_eq!(band(dec!(1.05)), RiskBand::Dangerous);
        assert_eq!(band(dec!(1.051)), RiskBand::Watch);
        assert_eq!(band(dec!(1.499)), RiskBand::Watch);
        assert_eq!(band(dec!(1.5)), RiskBand::Safe);
        assert_eq!(
            determine_risk_band(HealthFactor::Infinite, &params),
            RiskBand::Safe
        );
    }

    // -----------------------------------------------------------------------
    // proptest: HF scales with collateral, never negative
    // -----------------------------------------------------------------------

    proptest! {
        #[test]
        fn health_factor_always_positive(
            collateral in 100u64..1_000_000u64,
            debt in 1u64..500_000u64,
            lt_bps in 5000u32..9500u32,
        ) {
            let hf = compute_health_factor(
                Decimal::from(collateral),
                Decimal::from(debt),
                Decimal::from(lt_bps) / dec!(10000),
            )
            .unwrap();
            prop_assert!(hf > HealthFactor::Finite(Decimal::ZERO));
        }

        #[test]
        fn borrowing_never_raises_health_factor(
            collateral in 1_000u64..1_000_000u64,
            debt in 1u64..500_000u64,
            extra in 0u64..100_000u64,
        ) {
            let current = aggregate(Decimal::from(collateral), Decimal::from(debt), dec!(0.8));
            let after = projected_health_factor_after_borrow(&current, Decimal::from(extra)).unwrap();
            prop_assert!(after <= current.health_factor);
        }
    }
}
