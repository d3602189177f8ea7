use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::USD_DECIMALS_EXPONENT;
use crate::core::decimal::DecimalExt;
use crate::errors::{EngineError, EngineResult};

use super::position::UserReservePosition;
use super::reserve::{EModeCategory, ReserveSnapshot};

fn default_usd_decimals_exponent() -> u32 {
    USD_DECIMALS_EXPONENT
}

/// Reference currency → USD conversion for one pool snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCurrencyConversion {
    /// Price of one reference-currency unit in USD, scaled by
    /// `10^usd_decimals_exponent`.
    #[serde(with = "rust_decimal::serde::str")]
    pub market_reference_price_in_usd: Decimal,
    #[serde(default = "default_usd_decimals_exponent")]
    pub usd_decimals_exponent: u32,
}

impl ReferenceCurrencyConversion {
    /// The reference currency must have a positive USD price; a zero price
    /// would report every capacity as worth nothing.
    pub fn check_invariants(&self) -> EngineResult<()> {
        if self.market_reference_price_in_usd <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount {
                reason: format!(
                    "market_reference_price_in_usd must be positive ({})",
                    self.market_reference_price_in_usd
                ),
            });
        }
        Ok(())
    }

    /// USD value of an amount in reference currency (unrounded).
    pub fn to_usd(&self, amount_reference: Decimal) -> EngineResult<Decimal> {
        self.check_invariants()?;
        amount_reference
            .try_mul(self.market_reference_price_in_usd)?
            .shift_down(self.usd_decimals_exponent)
    }
}

/// Everything the engine needs about one user in one pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub conversion: ReferenceCurrencyConversion,
    #[serde(rename = "user_emode_category_id", default)]
    pub user_emode_category: EModeCategory,
    pub reserves: Vec<ReserveSnapshot>,
    #[serde(default)]
    pub user_reserves: Vec<UserReservePosition>,
}

/// Look up a reserve by id.
pub fn find_reserve<'a>(
    reserves: &'a [ReserveSnapshot],
    reserve_id: &str,
) -> EngineResult<&'a ReserveSnapshot> {
    reserves
        .iter()
        .find(|r| r.id == reserve_id)
        .ok_or_else(|| EngineError::MissingReserve {
            reserve_id: reserve_id.to_string(),
        })
}

/// Look up the user's position in a reserve, if any.
pub fn find_user_reserve<'a>(
    positions: &'a [UserReservePosition],
    reserve_id: &str,
) -> Option<&'a UserReservePosition> {
    positions.iter().find(|p| p.reserve_id == reserve_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_usd_scales_down() {
        // 1 ETH reference unit = $2000.00 in 8-decimal USD
        let conversion = ReferenceCurrencyConversion {
            market_reference_price_in_usd: dec!(200_000_000_000),
            usd_decimals_exponent: 8,
        };
        assert_eq!(conversion.to_usd(dec!(1.5)).unwrap(), dec!(3000));
    }

    #[test]
    fn test_exponent_defaults_to_eight() {
        let conversion: ReferenceCurrencyConversion =
            serde_json::from_str(r#"{ "market_reference_price_in_usd": "100000000" }"#).unwrap();
        assert_eq!(conversion.usd_decimals_exponent, 8);
        assert_eq!(conversion.to_usd(dec!(12.34)).unwrap(), dec!(12.34));
    }

    #[test]
    fn test_non_positive_reference_price_rejected() {
        for price in [Decimal::ZERO, dec!(-100_000_000)] {
            let conversion = ReferenceCurrencyConversion {
                market_reference_price_in_usd: price,
                usd_decimals_exponent: 8,
            };
            assert!(matches!(
                conversion.to_usd(dec!(1)),
                Err(EngineError::InvalidAmount { .. })
            ));
        }
    }

    #[test]
    fn test_find_reserve_missing() {
        let err = find_reserve(&[], "dai").unwrap_err();
        assert!(matches!(err, EngineError::MissingReserve { reserve_id } if reserve_id == "dai"));
    }
}
