use std::fmt;
use std::str::FromStr;

use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{INFINITE_HEALTH_FACTOR_SENTINEL, WAD_DECIMALS};
use crate::errors::{EngineError, EngineResult};
use crate::types::fixed_point::fixed_to_decimal;

/// Ratio of risk-weighted collateral to debt.
///
/// A position without debt has no liquidation risk and carries
/// [`HealthFactor::Infinite`], which orders above every finite value. The
/// infinite variant is never fed into arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthFactor {
    Finite(Decimal),
    Infinite,
}

impl HealthFactor {
    pub fn is_infinite(self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// Decode a WAD-scaled on-chain health factor. `U256::MAX` is what the
    /// pool reports for a position without debt.
    pub fn from_wad(raw: U256) -> EngineResult<Self> {
        if raw == U256::MAX {
            return Ok(Self::Infinite);
        }
        fixed_to_decimal(raw, WAD_DECIMALS).map(Self::Finite)
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(v) => write!(f, "{v}"),
            Self::Infinite => f.write_str("inf"),
        }
    }
}

impl FromStr for HealthFactor {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == INFINITE_HEALTH_FACTOR_SENTINEL
            || s.eq_ignore_ascii_case("inf")
            || s.eq_ignore_ascii_case("infinity")
        {
            return Ok(Self::Infinite);
        }
        let value = Decimal::from_str(s).map_err(|e| EngineError::InvalidAmount {
            reason: format!("health factor {s:?}: {e}"),
        })?;
        if value.is_sign_negative() {
            return Err(EngineError::InvalidAmount {
                reason: format!("health factor {s:?} is negative"),
            });
        }
        Ok(Self::Finite(value))
    }
}

// Serialised as a string: finite values as decimals, infinite as the upstream
// "-1" sentinel so snapshots round-trip through the data source format.
impl Serialize for HealthFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(v) => serializer.serialize_str(&v.to_string()),
            Self::Infinite => serializer.serialize_str(INFINITE_HEALTH_FACTOR_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for HealthFactor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Risk classification of a health factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    /// At or above the watch threshold, or no debt at all.
    Safe,
    /// Above the dangerous band but below the watch threshold.
    Watch,
    /// Between the liquidation boundary and the dangerous threshold (inclusive).
    Dangerous,
    /// Below 1.0: eligible for liquidation.
    Liquidatable,
}
