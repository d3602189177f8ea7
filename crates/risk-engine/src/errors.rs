use thiserror::Error;

/// Faults raised by the risk engine.
///
/// Only failures of the engine itself live here. Expected, user-facing
/// decisions (insufficient balance, health factor too low, ...) are reported
/// as [`crate::types::BlockingReason`] inside an outcome instead.
#[derive(Error, Debug)]
pub enum EngineError {
    // -- Arithmetic ---------------------------------------------------------
    #[error("division by zero")]
    DivisionByZero,

    #[error("decimal overflow")]
    Overflow,

    // -- Input --------------------------------------------------------------
    #[error("reserve not found in snapshot: {reserve_id}")]
    MissingReserve { reserve_id: String },

    #[error("user position not found for reserve: {reserve_id}")]
    MissingUserPosition { reserve_id: String },

    #[error("invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("fixed-point value does not fit a decimal: {value}")]
    InvalidFixedPoint { value: String },

    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
