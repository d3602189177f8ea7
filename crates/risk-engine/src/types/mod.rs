pub mod action;
pub mod fixed_point;
pub mod health;
pub mod market;
pub mod position;
pub mod reserve;

pub use action::{
    ActionKind, ActionOutcome, ActionRequest, BlockingReason, BorrowIneligibility,
    BorrowTableItem, RequestedAmount, ReserveCapacity, TransactionAmount,
};
pub use health::{HealthFactor, RiskBand};
pub use market::{PoolSnapshot, ReferenceCurrencyConversion};
pub use position::{UserAggregatePosition, UserMode, UserReservePosition};
pub use reserve::{EModeCategory, ReserveSnapshot};
