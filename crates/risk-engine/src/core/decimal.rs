//! Checked decimal arithmetic with explicit rounding.
//!
//! Every monetary value in the engine is a `rust_decimal::Decimal`. The
//! operators on `Decimal` panic on overflow and division by zero, so the
//! engine goes through [`DecimalExt`] instead, which turns both into
//! [`EngineError`] values the caller has to handle.
//!
//! Rounding is never implicit: anything that produces a user-facing amount or
//! a value compared against a protocol threshold names its [`Rounding`] mode
//! at the call site.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};

/// Rounding mode applied when truncating to a fixed number of fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Toward zero. Used for capacities and thresholds so that error only
    /// ever shrinks what the user is allowed to do.
    Down,
    /// Banker's rounding. Used for display-only USD values.
    HalfEven,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Self::Down => RoundingStrategy::ToZero,
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// Fallible arithmetic over `Decimal`.
pub trait DecimalExt: Sized {
    fn try_add(self, rhs: Decimal) -> EngineResult<Decimal>;
    fn try_sub(self, rhs: Decimal) -> EngineResult<Decimal>;
    fn try_mul(self, rhs: Decimal) -> EngineResult<Decimal>;
    /// Fails with [`EngineError::DivisionByZero`] when `rhs` is zero.
    fn try_div(self, rhs: Decimal) -> EngineResult<Decimal>;
    /// Round to `decimals` fractional digits with the given mode.
    fn round_to(self, decimals: u32, mode: Rounding) -> Decimal;
    /// Divide by `10^exponent`.
    fn shift_down(self, exponent: u32) -> EngineResult<Decimal>;
}

impl DecimalExt for Decimal {
    fn try_add(self, rhs: Decimal) -> EngineResult<Decimal> {
        self.checked_add(rhs).ok_or(EngineError::Overflow)
    }

    fn try_sub(self, rhs: Decimal) -> EngineResult<Decimal> {
        self.checked_sub(rhs).ok_or(EngineError::Overflow)
    }

    fn try_mul(self, rhs: Decimal) -> EngineResult<Decimal> {
        self.checked_mul(rhs).ok_or(EngineError::Overflow)
    }

    fn try_div(self, rhs: Decimal) -> EngineResult<Decimal> {
        if rhs.is_zero() {
            return Err(EngineError::DivisionByZero);
        }
        self.checked_div(rhs).ok_or(EngineError::Overflow)
    }

    fn round_to(self, decimals: u32, mode: Rounding) -> Decimal {
        self.round_dp_with_strategy(decimals, mode.strategy())
    }

    fn shift_down(self, exponent: u32) -> EngineResult<Decimal> {
        self.try_div(pow10(exponent)?)
    }
}

/// `10^exponent` as a `Decimal`. Fails once the power no longer fits the
/// 96-bit mantissa (exponent > 28).
pub fn pow10(exponent: u32) -> EngineResult<Decimal> {
    let ten = Decimal::TEN;
    (0..exponent).try_fold(Decimal::ONE, |acc, _| acc.try_mul(ten))
}

/// Sum an iterator of decimals, failing on overflow.
pub fn try_sum<I>(values: I) -> EngineResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.try_add(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_div_by_zero_is_error() {
        let err = dec!(10).try_div(Decimal::ZERO).unwrap_err();
        assert!(matches!(err, EngineError::DivisionByZero));
    }

    #[test]
    fn test_div_basic() {
        assert_eq!(dec!(990).try_div(dec!(100)).unwrap(), dec!(9.9));
    }

    #[test]
    fn test_mul_overflow_is_error() {
        let err = Decimal::MAX.try_mul(dec!(2)).unwrap_err();
        assert!(matches!(err, EngineError::Overflow));
    }

    #[test]
    fn test_sub_can_go_negative() {
        assert_eq!(dec!(1).try_sub(dec!(1.5)).unwrap(), dec!(-0.5));
    }

    #[test]
    fn test_round_down_truncates() {
        assert_eq!(dec!(1.23459).round_to(4, Rounding::Down), dec!(1.2345));
        assert_eq!(dec!(0.99999).round_to(2, Rounding::Down), dec!(0.99));
    }

    #[test]
    fn test_round_down_is_toward_zero_for_negatives() {
        assert_eq!(dec!(-1.23459).round_to(4, Rounding::Down), dec!(-1.2345));
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(dec!(2.345).round_to(2, Rounding::HalfEven), dec!(2.34));
        assert_eq!(dec!(2.355).round_to(2, Rounding::HalfEven), dec!(2.36));
        assert_eq!(dec!(2.3451).round_to(2, Rounding::HalfEven), dec!(2.35));
    }

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0).unwrap(), dec!(1));
        assert_eq!(pow10(8).unwrap(), dec!(100_000_000));
        assert!(pow10(28).is_ok());
        assert!(matches!(pow10(29).unwrap_err(), EngineError::Overflow));
    }

    #[test]
    fn test_shift_down() {
        assert_eq!(dec!(250_000_000_000).shift_down(8).unwrap(), dec!(2500));
    }

    #[test]
    fn test_try_sum_empty_is_zero() {
        assert_eq!(try_sum(Vec::new()).unwrap(), Decimal::ZERO);
        assert_eq!(try_sum(vec![dec!(1.5), dec!(2.5)]).unwrap(), dec!(4));
    }
}
