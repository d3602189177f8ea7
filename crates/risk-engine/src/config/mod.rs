pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Load and merge the config JSON files into a single [`EngineConfig`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   risk.json
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                          | Config Field                                |
/// |----------------------------------|---------------------------------------------|
/// | `RISK_BORROW_SAFETY_MARGIN`      | `risk.margins.borrow_safety_margin`         |
/// | `RISK_WITHDRAW_THRESHOLD_BUFFER` | `risk.margins.withdraw_threshold_buffer`    |
/// | `RISK_WITHDRAW_SAFETY_MARGIN`    | `risk.margins.withdraw_safety_margin`       |
/// | `RISK_DANGEROUS_HEALTH_FACTOR`   | `risk.health_bands.dangerous_health_factor` |
/// | `RISK_LOG_DIR`                   | `app.logging.log_dir`                       |
pub fn load_config(config_dir: &Path) -> Result<EngineConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let risk: RiskConfig =
        serde_json::from_str(&read("risk.json")?).context("parsing risk.json")?;

    let mut config = EngineConfig { app, risk };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Only non-empty env vars take effect. Parse failures are logged and
/// skipped (the JSON value remains).
fn apply_env_overrides(config: &mut EngineConfig) {
    // -- Margins -------------------------------------------------------------
    if let Some(val) = env_decimal("RISK_BORROW_SAFETY_MARGIN") {
        info!(%val, "env override: RISK_BORROW_SAFETY_MARGIN");
        config.risk.margins.borrow_safety_margin = val;
    }

    if let Some(val) = env_decimal("RISK_WITHDRAW_THRESHOLD_BUFFER") {
        info!(%val, "env override: RISK_WITHDRAW_THRESHOLD_BUFFER");
        config.risk.margins.withdraw_threshold_buffer = val;
    }

    if let Some(val) = env_decimal("RISK_WITHDRAW_SAFETY_MARGIN") {
        info!(%val, "env override: RISK_WITHDRAW_SAFETY_MARGIN");
        config.risk.margins.withdraw_safety_margin = val;
    }

    // -- Health bands --------------------------------------------------------
    if let Some(val) = env_decimal("RISK_DANGEROUS_HEALTH_FACTOR") {
        info!(%val, "env override: RISK_DANGEROUS_HEALTH_FACTOR");
        config.risk.health_bands.dangerous_health_factor = val;
    }

    // -- Logging -------------------------------------------------------------
    if let Some(val) = env_string("RISK_LOG_DIR") {
        info!(log_dir = %val, "env override: RISK_LOG_DIR");
        config.app.logging.log_dir = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var and parse it as `Decimal`.
fn env_decimal(key: &str) -> Option<Decimal> {
    let raw = env_string(key)?;
    match Decimal::from_str(raw.trim()) {
        Ok(val) => Some(val),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring unparseable env override");
            None
        }
    }
}
