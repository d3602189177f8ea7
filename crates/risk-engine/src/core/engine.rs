//! Entry points used by callers: aggregate a position, build the borrow
//! table, evaluate a borrow or withdraw request.
//!
//! [`RiskEngine`] only borrows its inputs. It holds no state of its own, so
//! separate evaluations can run in parallel without coordination.

use std::collections::HashSet;

use alloy::primitives::Address;
use rust_decimal::Decimal;
use tracing::debug;

use crate::core::aggregator::aggregate_position;
use crate::core::capacity::{is_collateral_constrained, max_additional_borrow, max_withdrawable};
use crate::core::classifier::AssetClassifier;
use crate::core::decimal::{DecimalExt, Rounding};
use crate::core::eligibility::{
    borrow_blocking_reason, check_borrow_offerable, check_borrowable, withdraw_blocking_reason,
};
use crate::core::health::{
    determine_risk_band, is_dangerous, projected_health_factor_after_borrow,
    projected_health_factor_after_withdraw,
};
use crate::core::params::RiskParameters;
use crate::errors::{EngineError, EngineResult};
use crate::types::market::{find_reserve, find_user_reserve};
use crate::types::{
    ActionKind, ActionOutcome, ActionRequest, BorrowTableItem, EModeCategory, PoolSnapshot,
    ReferenceCurrencyConversion, RequestedAmount, ReserveSnapshot, TransactionAmount,
    UserAggregatePosition, UserReservePosition,
};

pub struct RiskEngine<'a> {
    reserves: &'a [ReserveSnapshot],
    positions: &'a [UserReservePosition],
    conversion: &'a ReferenceCurrencyConversion,
    params: &'a RiskParameters,
    classifier: &'a dyn AssetClassifier,
}

impl<'a> RiskEngine<'a> {
    pub fn new(
        reserves: &'a [ReserveSnapshot],
        positions: &'a [UserReservePosition],
        conversion: &'a ReferenceCurrencyConversion,
        params: &'a RiskParameters,
        classifier: &'a dyn AssetClassifier,
    ) -> Self {
        Self {
            reserves,
            positions,
            conversion,
            params,
            classifier,
        }
    }

    pub fn from_snapshot(
        snapshot: &'a PoolSnapshot,
        params: &'a RiskParameters,
        classifier: &'a dyn AssetClassifier,
    ) -> Self {
        Self::new(
            &snapshot.reserves,
            &snapshot.user_reserves,
            &snapshot.conversion,
            params,
            classifier,
        )
    }

    /// Aggregate the user's positions in this snapshot.
    pub fn aggregate(&self, emode_category: EModeCategory) -> EngineResult<UserAggregatePosition> {
        aggregate_position(self.reserves, self.positions, emode_category)
    }

    // -----------------------------------------------------------------------
    // Borrow table
    // -----------------------------------------------------------------------

    /// Every reserve the user can currently be offered to borrow, with its
    /// capacity and rates.
    pub fn borrow_table(
        &self,
        aggregate: &UserAggregatePosition,
    ) -> EngineResult<Vec<BorrowTableItem>> {
        self.conversion.check_invariants()?;
        let borrowed_assets = self.borrowed_assets();
        let mut items = Vec::new();

        for reserve in self.reserves {
            reserve.check_invariants()?;
            let capacity =
                max_additional_borrow(reserve, aggregate, self.conversion, self.params)?;

            if let Err(reason) = check_borrow_offerable(
                reserve,
                &capacity,
                aggregate,
                &borrowed_assets,
                self.classifier,
            ) {
                debug!(reserve = %reserve.id, %reason, "reserve not offered for borrowing");
                continue;
            }

            let user_reserve = find_user_reserve(self.positions, &reserve.id);
            let current_borrows = user_reserve.map_or(Decimal::ZERO, |p| p.total_borrows);
            let current_borrows_usd = user_reserve.map_or(Decimal::ZERO, |p| p.total_borrows_usd);

            items.push(BorrowTableItem {
                reserve_id: reserve.id.clone(),
                symbol: reserve.symbol.clone(),
                underlying_asset: reserve.underlying_asset,
                available_borrows: capacity,
                current_borrows,
                current_borrows_usd,
                total_borrows: reserve.total_debt,
                variable_borrow_rate: reserve
                    .borrowing_enabled
                    .then_some(reserve.variable_borrow_apy),
                stable_borrow_rate: (reserve.borrowing_enabled
                    && reserve.stable_borrow_rate_enabled)
                    .then_some(reserve.stable_borrow_apy),
            });
        }

        Ok(items)
    }

    fn borrowed_assets(&self) -> HashSet<Address> {
        let by_id: HashSet<&str> = self
            .positions
            .iter()
            .filter(|p| p.total_borrows > Decimal::ZERO)
            .map(|p| p.reserve_id.as_str())
            .collect();
        self.reserves
            .iter()
            .filter(|r| by_id.contains(r.id.as_str()))
            .map(|r| r.underlying_asset)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Evaluate a borrow or withdraw request.
    ///
    /// Faults (unknown reserve, zero price, ...) are returned as errors;
    /// expected refusals come back as `blocking_reason` on the outcome.
    pub fn evaluate(&self, request: &ActionRequest) -> EngineResult<ActionOutcome> {
        self.conversion.check_invariants()?;
        let reserve = find_reserve(self.reserves, &request.reserve_id)?;
        reserve.check_invariants()?;

        if let RequestedAmount::Exact(amount) = request.amount {
            if amount < Decimal::ZERO {
                return Err(EngineError::InvalidAmount {
                    reason: format!(
                        "requested {} amount is negative ({amount})",
                        request.kind.as_str()
                    ),
                });
            }
        }

        let outcome = match request.kind {
            ActionKind::Withdraw => self.evaluate_withdraw(reserve, request)?,
            ActionKind::Borrow => self.evaluate_borrow(reserve, request)?,
        };

        debug!(
            kind = request.kind.as_str(),
            reserve = %reserve.id,
            requested = %request.amount,
            allowed = %outcome.allowed_amount,
            projected_hf = %outcome.projected_health_factor,
            blocking = ?outcome.blocking_reason,
            dangerous = outcome.is_dangerous,
            "evaluated action"
        );

        Ok(outcome)
    }

    fn evaluate_withdraw(
        &self,
        reserve: &ReserveSnapshot,
        request: &ActionRequest,
    ) -> EngineResult<ActionOutcome> {
        let aggregate = &request.aggregate;
        let position = find_user_reserve(self.positions, &reserve.id).ok_or_else(|| {
            EngineError::MissingUserPosition {
                reserve_id: reserve.id.clone(),
            }
        })?;
        position.check_invariants()?;

        let max_amount = max_withdrawable(reserve, position, aggregate, self.params)?;

        let (allowed_amount, transaction_amount) = match request.amount {
            RequestedAmount::Exact(amount) => (amount, TransactionAmount::Exact(amount)),
            RequestedAmount::Max if !aggregate.has_debt() => {
                (position.underlying_balance, TransactionAmount::All)
            }
            RequestedAmount::Max if max_amount == position.underlying_balance => {
                (max_amount, TransactionAmount::All)
            }
            RequestedAmount::Max => (max_amount, TransactionAmount::Exact(max_amount)),
        };

        let (projected_health_factor, projected_liquidation_threshold) =
            if position.usage_as_collateral_enabled_on_user && reserve.usage_as_collateral_enabled
            {
                let amount_reference =
                    allowed_amount.try_mul(reserve.price_in_reference_currency)?;
                let threshold = reserve.effective_liquidation_threshold(aggregate.emode_category);
                let projection = projected_health_factor_after_withdraw(
                    aggregate,
                    amount_reference,
                    threshold,
                    self.params,
                )?;
                (projection.health_factor, projection.liquidation_threshold)
            } else {
                (
                    aggregate.health_factor,
                    aggregate.current_liquidation_threshold,
                )
            };

        let blocking_reason = withdraw_blocking_reason(
            is_collateral_constrained(reserve, position, aggregate),
            projected_health_factor,
            position.underlying_balance,
            reserve.unborrowed_liquidity,
            allowed_amount,
        );

        Ok(ActionOutcome {
            kind: ActionKind::Withdraw,
            reserve_id: reserve.id.clone(),
            allowed_amount,
            allowed_amount_usd: self.amount_usd(reserve, allowed_amount)?,
            transaction_amount,
            projected_health_factor,
            projected_liquidation_threshold,
            risk_band: determine_risk_band(projected_health_factor, self.params),
            blocking_reason,
            is_dangerous: is_dangerous(aggregate.has_debt(), projected_health_factor, self.params),
        })
    }

    fn evaluate_borrow(
        &self,
        reserve: &ReserveSnapshot,
        request: &ActionRequest,
    ) -> EngineResult<ActionOutcome> {
        let aggregate = &request.aggregate;
        let capacity = max_additional_borrow(reserve, aggregate, self.conversion, self.params)?;

        let allowed_amount = match request.amount {
            RequestedAmount::Exact(amount) => amount,
            RequestedAmount::Max => capacity.amount,
        };

        let blocking_reason = borrow_blocking_reason(
            check_borrowable(reserve, aggregate, self.classifier),
            allowed_amount,
            reserve.available_liquidity,
            capacity.amount,
        );

        let amount_reference = allowed_amount.try_mul(reserve.price_in_reference_currency)?;
        let projected_health_factor =
            projected_health_factor_after_borrow(aggregate, amount_reference)?;
        // borrowing adds debt; it can only make a debt-free position risky
        let has_debt_after = aggregate.has_debt() || allowed_amount > Decimal::ZERO;

        Ok(ActionOutcome {
            kind: ActionKind::Borrow,
            reserve_id: reserve.id.clone(),
            allowed_amount,
            allowed_amount_usd: self.amount_usd(reserve, allowed_amount)?,
            transaction_amount: TransactionAmount::Exact(allowed_amount),
            projected_health_factor,
            projected_liquidation_threshold: aggregate.current_liquidation_threshold,
            risk_band: determine_risk_band(projected_health_factor, self.params),
            blocking_reason,
            is_dangerous: is_dangerous(has_debt_after, projected_health_factor, self.params),
        })
    }

    fn amount_usd(&self, reserve: &ReserveSnapshot, amount: Decimal) -> EngineResult<Decimal> {
        Ok(self
            .conversion
            .to_usd(amount.try_mul(reserve.price_in_reference_currency)?)?
            .round_to(self.params.usd_decimals, Rounding::HalfEven))
    }
}
