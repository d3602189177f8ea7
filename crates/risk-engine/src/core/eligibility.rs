//! Whether an action is allowed right now, and if not, why.
//!
//! Plain predicates over snapshots. Borrow checks report a
//! [`BorrowIneligibility`]; withdraw and borrow requests report the first
//! [`BlockingReason`] that applies.

use std::collections::HashSet;

use alloy::primitives::Address;
use rust_decimal::Decimal;

use crate::constants::LIQUIDATION_HEALTH_FACTOR;
use crate::core::classifier::AssetClassifier;
use crate::types::{
    BlockingReason, BorrowIneligibility, EModeCategory, HealthFactor, ReserveCapacity,
    ReserveSnapshot, UserAggregatePosition, UserMode,
};

/// Whether the user may borrow from `reserve` at all, given their mode.
pub fn check_borrowable(
    reserve: &ReserveSnapshot,
    aggregate: &UserAggregatePosition,
    classifier: &dyn AssetClassifier,
) -> Result<(), BorrowIneligibility> {
    match aggregate.emode_category {
        EModeCategory::None => {}
        category @ EModeCategory::Category(_) => {
            if reserve.emode_category != category {
                return Err(BorrowIneligibility::EModeCategoryMismatch);
            }
        }
    }

    match aggregate.user_mode() {
        UserMode::Standard => {
            if !reserve.is_active {
                return Err(BorrowIneligibility::ReserveInactive);
            }
            if !reserve.borrowing_enabled {
                return Err(BorrowIneligibility::BorrowingDisabled);
            }
        }
        UserMode::Isolated => {
            if !reserve.borrowable_in_isolation {
                return Err(BorrowIneligibility::NotBorrowableInIsolation);
            }
            if !classifier.is_stable_asset(&reserve.symbol) {
                return Err(BorrowIneligibility::NotStableAsset);
            }
        }
    }

    Ok(())
}

/// Whether `reserve` belongs in the user's "assets to borrow" list.
///
/// On top of [`check_borrowable`], reserves the user already borrows are
/// listed elsewhere, and there must be both user capacity and pool liquidity.
pub fn check_borrow_offerable(
    reserve: &ReserveSnapshot,
    capacity: &ReserveCapacity,
    aggregate: &UserAggregatePosition,
    borrowed_assets: &HashSet<Address>,
    classifier: &dyn AssetClassifier,
) -> Result<(), BorrowIneligibility> {
    if borrowed_assets.contains(&reserve.underlying_asset) {
        return Err(BorrowIneligibility::AlreadyBorrowed);
    }
    if capacity.amount_usd.is_zero() {
        return Err(BorrowIneligibility::NoBorrowCapacity);
    }
    if reserve.total_liquidity_usd.is_zero() {
        return Err(BorrowIneligibility::NoPoolLiquidity);
    }
    check_borrowable(reserve, aggregate, classifier)
}

/// First blocking reason for a withdrawal, in priority order: health
/// factor, user balance, pool liquidity.
pub fn withdraw_blocking_reason(
    collateral_constrained: bool,
    projected_health_factor: HealthFactor,
    underlying_balance: Decimal,
    unborrowed_liquidity: Decimal,
    requested: Decimal,
) -> Option<BlockingReason> {
    if collateral_constrained
        && projected_health_factor < HealthFactor::Finite(LIQUIDATION_HEALTH_FACTOR)
    {
        return Some(BlockingReason::InsufficientHealthFactor);
    }
    if underlying_balance.is_zero() || underlying_balance < requested {
        return Some(BlockingReason::InsufficientUserBalance);
    }
    if unborrowed_liquidity.is_zero() || requested > unborrowed_liquidity {
        return Some(BlockingReason::InsufficientPoolLiquidity);
    }
    None
}

/// First blocking reason for a borrow, in priority order: reserve
/// eligibility, pool liquidity, user capacity.
pub fn borrow_blocking_reason(
    eligibility: Result<(), BorrowIneligibility>,
    requested: Decimal,
    available_liquidity: Decimal,
    capacity: Decimal,
) -> Option<BlockingReason> {
    if let Err(reason) = eligibility {
        return Some(BlockingReason::BorrowUnavailable(reason));
    }
    if available_liquidity.is_zero() || requested > available_liquidity {
        return Some(BlockingReason::InsufficientPoolLiquidity);
    }
    if requested > capacity {
        return Some(BlockingReason::InsufficientBorrowCapacity);
    }
    None
}
