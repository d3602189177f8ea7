use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Exponent of the USD price scale used by the pool oracle (8 decimals).
pub const USD_DECIMALS_EXPONENT: u32 = 8;

/// Health factors and other protocol ratios are WAD-scaled on-chain.
pub const WAD_DECIMALS: u32 = 18;

/// Liquidation thresholds and LTVs are expressed in basis points on-chain.
pub const BPS_SCALE: Decimal = dec!(10_000);

/// Health factor below which a position can be liquidated.
pub const LIQUIDATION_HEALTH_FACTOR: Decimal = dec!(1);

/// Upstream data sources encode "no debt" health factor as `-1`.
pub const INFINITE_HEALTH_FACTOR_SENTINEL: &str = "-1";

/// Upstream data sources encode "maximum amount" requests as `-1`.
pub const MAX_AMOUNT_SENTINEL: &str = "-1";

// ---------------------------------------------------------------------------
// Default settlement tolerances
// ---------------------------------------------------------------------------

/// Applied to borrow capacity when the user already carries debt.
pub const DEFAULT_BORROW_SAFETY_MARGIN: Decimal = dec!(0.99);

/// Added to the liquidation threshold in the withdraw headroom denominator.
pub const DEFAULT_WITHDRAW_THRESHOLD_BUFFER: Decimal = dec!(0.01);

/// Applied to the withdraw headroom in reference currency.
pub const DEFAULT_WITHDRAW_SAFETY_MARGIN: Decimal = dec!(0.99);

// ---------------------------------------------------------------------------
// Default risk bands
// ---------------------------------------------------------------------------

/// Projected health factor at or below this value is flagged as dangerous.
pub const DEFAULT_DANGEROUS_HEALTH_FACTOR: Decimal = dec!(1.05);

/// Below this value (and above the dangerous band) a position is on watch.
pub const DEFAULT_WATCH_HEALTH_FACTOR: Decimal = dec!(1.5);

// ---------------------------------------------------------------------------
// Default precision
// ---------------------------------------------------------------------------

/// Fractional digits kept for a recomputed liquidation threshold.
pub const DEFAULT_THRESHOLD_DECIMALS: u32 = 4;

/// Fractional digits kept for USD amounts.
pub const DEFAULT_USD_DECIMALS: u32 = 2;

/// Largest scale a `rust_decimal::Decimal` can carry.
pub const MAX_DECIMAL_SCALE: u32 = 28;
