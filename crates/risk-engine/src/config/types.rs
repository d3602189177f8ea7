use rust_decimal::Decimal;
use serde::Deserialize;

use crate::constants::{
    DEFAULT_THRESHOLD_DECIMALS, DEFAULT_USD_DECIMALS, DEFAULT_WATCH_HEALTH_FACTOR,
};
use crate::core::classifier::StableAssetList;
use crate::core::params::RiskParameters;

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub app: AppConfig,
    pub risk: RiskConfig,
}

impl EngineConfig {
    /// Parameters handed to every engine call.
    pub fn risk_parameters(&self) -> RiskParameters {
        RiskParameters {
            borrow_safety_margin: self.risk.margins.borrow_safety_margin,
            withdraw_threshold_buffer: self.risk.margins.withdraw_threshold_buffer,
            withdraw_safety_margin: self.risk.margins.withdraw_safety_margin,
            dangerous_health_factor: self.risk.health_bands.dangerous_health_factor,
            watch_health_factor: self.risk.health_bands.watch_health_factor,
            threshold_decimals: self.app.precision.threshold_decimals,
            usd_decimals: self.app.precision.usd_decimals,
        }
    }

    pub fn asset_classifier(&self) -> StableAssetList {
        StableAssetList::new(&self.risk.stable_assets)
    }
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub precision: PrecisionConfig,
    pub logging: LoggingConfig,
}

fn default_threshold_decimals() -> u32 {
    DEFAULT_THRESHOLD_DECIMALS
}

fn default_usd_decimals() -> u32 {
    DEFAULT_USD_DECIMALS
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrecisionConfig {
    #[serde(default = "default_threshold_decimals")]
    pub threshold_decimals: u32,
    #[serde(default = "default_usd_decimals")]
    pub usd_decimals: u32,
}

fn default_log_file() -> String {
    "risk-engine.log".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    #[serde(default = "default_log_file")]
    pub file_name: String,
}

// ---------------------------------------------------------------------------
// risk.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    pub margins: MarginConfig,
    pub health_bands: HealthBandConfig,
    #[serde(default)]
    pub stable_assets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarginConfig {
    #[serde(with = "rust_decimal::serde::str")]
    pub borrow_safety_margin: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub withdraw_threshold_buffer: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub withdraw_safety_margin: Decimal,
}

fn default_watch_health_factor() -> Decimal {
    DEFAULT_WATCH_HEALTH_FACTOR
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthBandConfig {
    #[serde(with = "rust_decimal::serde::str")]
    pub dangerous_health_factor: Decimal,
    #[serde(
        default = "default_watch_health_factor",
        with = "rust_decimal::serde::str"
    )]
    pub watch_health_factor: Decimal,
}
