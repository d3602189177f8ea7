use anyhow::{bail, Result};
use rust_decimal::Decimal;

use super::types::EngineConfig;
use crate::constants::MAX_DECIMAL_SCALE;

/// Validate invariants across the merged config that serde alone cannot
/// enforce. Called automatically by [`super::load_config`].
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_app_config(config, &mut errors);
    validate_margins(config, &mut errors);
    validate_health_bands(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

fn validate_app_config(config: &EngineConfig, errors: &mut Vec<String>) {
    let app = &config.app;

    if app.logging.log_dir.trim().is_empty() {
        errors.push("app.logging: log_dir is empty".into());
    }
    if app.logging.file_name.trim().is_empty() {
        errors.push("app.logging: file_name is empty".into());
    }

    let precision = [
        ("threshold_decimals", app.precision.threshold_decimals),
        ("usd_decimals", app.precision.usd_decimals),
    ];
    for (name, value) in precision {
        if value > MAX_DECIMAL_SCALE {
            errors.push(format!(
                "app.precision.{name}: must be <= {MAX_DECIMAL_SCALE}, got {value}"
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// risk.json
// ---------------------------------------------------------------------------

fn validate_margins(config: &EngineConfig, errors: &mut Vec<String>) {
    let margins = &config.risk.margins;

    let multipliers = [
        ("borrow_safety_margin", margins.borrow_safety_margin),
        ("withdraw_safety_margin", margins.withdraw_safety_margin),
    ];
    for (name, value) in multipliers {
        if value <= Decimal::ZERO || value > Decimal::ONE {
            errors.push(format!("risk.margins.{name}: must be in (0, 1], got {value}"));
        }
    }

    let buffer = margins.withdraw_threshold_buffer;
    if buffer < Decimal::ZERO || buffer >= Decimal::ONE {
        errors.push(format!(
            "risk.margins.withdraw_threshold_buffer: must be in [0, 1), got {buffer}"
        ));
    }
}

fn validate_health_bands(config: &EngineConfig, errors: &mut Vec<String>) {
    let bands = &config.risk.health_bands;

    if bands.dangerous_health_factor <= Decimal::ONE {
        errors.push(format!(
            "risk.health_bands.dangerous_health_factor: must be > 1, got {}",
            bands.dangerous_health_factor
        ));
    }

    if bands.watch_health_factor <= bands.dangerous_health_factor {
        errors.push(format!(
            "risk.health_bands.watch_health_factor ({}) must be > dangerous_health_factor ({})",
            bands.watch_health_factor, bands.dangerous_health_factor
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{
        AppConfig, HealthBandConfig, LoggingConfig, MarginConfig, PrecisionConfig, RiskConfig,
    };
    use rust_decimal_macros::dec;

    fn valid_config() -> EngineConfig {
        EngineConfig {
            app: AppConfig {
                precision: PrecisionConfig {
                    threshold_decimals: 4,
                    usd_decimals: 2,
                },
                logging: LoggingConfig {
                    log_dir: "logs".into(),
                    file_name: "risk-engine.log".into(),
                },
            },
            risk: RiskConfig {
                margins: MarginConfig {
                    borrow_safety_margin: dec!(0.99),
                    withdraw_threshold_buffer: dec!(0.01),
                    withdraw_safety_margin: dec!(0.99),
                },
                health_bands: HealthBandConfig {
                    dangerous_health_factor: dec!(1.05),
                    watch_health_factor: dec!(1.5),
                },
                stable_assets: vec!["USDC".into()],
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_margin_bounds() {
        let mut config = valid_config();
        config.risk.margins.borrow_safety_margin = Decimal::ZERO;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.risk.margins.withdraw_safety_margin = dec!(1.01);
        assert!(validate_config(&config).is_err());

        // 1.0 means "no margin" and is allowed
        let mut config = valid_config();
        config.risk.margins.borrow_safety_margin = Decimal::ONE;
        assert!(validate_config(&config).is_ok());

        let mut config = valid_config();
        config.risk.margins.withdraw_threshold_buffer = Decimal::ONE;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_health_band_ordering() {
        let mut config = valid_config();
        config.risk.health_bands.dangerous_health_factor = dec!(0.95);
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.risk.health_bands.watch_health_factor = dec!(1.05);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.app.logging.log_dir = String::new();
        config.app.precision.usd_decimals = 29;
        config.risk.margins.borrow_safety_margin = dec!(-1);

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("3 errors"), "{err}");
        assert!(err.contains("log_dir"));
        assert!(err.contains("usd_decimals"));
        assert!(err.contains("borrow_safety_margin"));
    }
}
