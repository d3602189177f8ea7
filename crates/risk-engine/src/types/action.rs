use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::MAX_AMOUNT_SENTINEL;
use crate::errors::EngineError;

use super::health::{HealthFactor, RiskBand};
use super::position::UserAggregatePosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Borrow,
    Withdraw,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Borrow => "borrow",
            Self::Withdraw => "withdraw",
        }
    }
}

/// Amount a user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedAmount {
    Exact(Decimal),
    /// "As much as possible".
    Max,
}

impl FromStr for RequestedAmount {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == MAX_AMOUNT_SENTINEL || s.eq_ignore_ascii_case("max") {
            return Ok(Self::Max);
        }
        let value = Decimal::from_str(s).map_err(|e| EngineError::InvalidAmount {
            reason: format!("{s:?}: {e}"),
        })?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(EngineError::InvalidAmount {
                reason: format!("{s:?} is negative"),
            });
        }
        Ok(Self::Exact(value))
    }
}

impl fmt::Display for RequestedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v}"),
            Self::Max => f.write_str(MAX_AMOUNT_SENTINEL),
        }
    }
}

impl Serialize for RequestedAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestedAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A borrow or withdraw the user wants to perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub reserve_id: String,
    pub amount: RequestedAmount,
    pub aggregate: UserAggregatePosition,
}

/// Amount handed to the transaction builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionAmount {
    Exact(#[serde(with = "rust_decimal::serde::str")] Decimal),
    /// Withdraw the whole balance, including interest accrued until settlement.
    All,
}

/// Why a reserve is not offered for borrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorrowIneligibility {
    AlreadyBorrowed,
    NoBorrowCapacity,
    NoPoolLiquidity,
    ReserveInactive,
    BorrowingDisabled,
    NotBorrowableInIsolation,
    NotStableAsset,
    EModeCategoryMismatch,
}

impl BorrowIneligibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyBorrowed => "reserve is already borrowed by the user",
            Self::NoBorrowCapacity => "user has no borrow capacity left",
            Self::NoPoolLiquidity => "pool has no liquidity",
            Self::ReserveInactive => "reserve is not active",
            Self::BorrowingDisabled => "borrowing is disabled on reserve",
            Self::NotBorrowableInIsolation => "reserve cannot be borrowed in isolation mode",
            Self::NotStableAsset => "only stable assets can be borrowed in isolation mode",
            Self::EModeCategoryMismatch => "reserve is outside the user's e-mode category",
        }
    }
}

impl fmt::Display for BorrowIneligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative reason to refuse submitting an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingReason {
    InsufficientHealthFactor,
    InsufficientUserBalance,
    InsufficientPoolLiquidity,
    InsufficientBorrowCapacity,
    BorrowUnavailable(BorrowIneligibility),
}

impl fmt::Display for BlockingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientHealthFactor => {
                f.write_str("action would drop the health factor below 1")
            }
            Self::InsufficientUserBalance => f.write_str("user balance is too low"),
            Self::InsufficientPoolLiquidity => f.write_str("pool liquidity is too low"),
            Self::InsufficientBorrowCapacity => f.write_str("amount exceeds borrow capacity"),
            Self::BorrowUnavailable(reason) => write!(f, "borrow unavailable: {reason}"),
        }
    }
}

/// Result of evaluating an [`ActionRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub reserve_id: String,
    /// Resolved amount in asset units (never a pre-margin or pre-clamp value).
    #[serde(with = "rust_decimal::serde::str")]
    pub allowed_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub allowed_amount_usd: Decimal,
    pub transaction_amount: TransactionAmount,
    pub projected_health_factor: HealthFactor,
    #[serde(with = "rust_decimal::serde::str")]
    pub projected_liquidation_threshold: Decimal,
    pub risk_band: RiskBand,
    pub blocking_reason: Option<BlockingReason>,
    /// Near-liquidation warning.
    pub is_dangerous: bool,
}

/// Borrow capacity for one reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveCapacity {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_usd: Decimal,
}

impl ReserveCapacity {
    pub const ZERO: ReserveCapacity = ReserveCapacity {
        amount: Decimal::ZERO,
        amount_usd: Decimal::ZERO,
    };
}

/// One offerable row of the borrow table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowTableItem {
    pub reserve_id: String,
    pub symbol: String,
    pub underlying_asset: Address,
    pub available_borrows: ReserveCapacity,
    #[serde(with = "rust_decimal::serde::str")]
    pub current_borrows: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub current_borrows_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_borrows: Decimal,
    /// Absent when borrowing is disabled.
    #[serde(with = "rust_decimal::serde::str_option")]
    pub variable_borrow_rate: Option<Decimal>,
    /// Absent unless both borrowing and stable-rate borrowing are enabled.
    #[serde(with = "rust_decimal::serde::str_option")]
    pub stable_borrow_rate: Option<Decimal>,
}
