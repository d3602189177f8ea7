use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use risk_engine::config;
use risk_engine::core::engine::RiskEngine;
use risk_engine::logging;
use risk_engine::types::{ActionKind, ActionRequest, PoolSnapshot, RequestedAmount};

/// Offline borrow/withdraw evaluator for a single user's pool snapshot.
#[derive(Debug, Parser)]
#[command(name = "risk-engine", version, about)]
struct Cli {
    /// Config directory holding app.json and risk.json. Falls back to
    /// `RISK_CONFIG_DIR`, then `./config`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pool snapshot JSON (conversion, reserves, user reserves).
    #[arg(long)]
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List reserves the user can borrow, with capacity and rates.
    BorrowTable,
    /// Evaluate a withdrawal. Amount is a decimal, `max` or `-1`.
    Withdraw {
        reserve_id: String,
        #[arg(allow_negative_numbers = true)]
        amount: RequestedAmount,
    },
    /// Evaluate a borrow. Amount is a decimal, `max` or `-1`.
    Borrow {
        reserve_id: String,
        #[arg(allow_negative_numbers = true)]
        amount: RequestedAmount,
    },
}

fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config_dir = cli
        .config
        .clone()
        .or_else(|| std::env::var("RISK_CONFIG_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config"));

    let config = config::load_config(&config_dir)?;

    // Hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    let params = config.risk_parameters();
    let classifier = config.asset_classifier();

    info!(
        config_dir = %config_dir.display(),
        borrow_safety_margin = %params.borrow_safety_margin,
        withdraw_safety_margin = %params.withdraw_safety_margin,
        dangerous_health_factor = %params.dangerous_health_factor,
        stable_assets = classifier.len(),
        "configuration loaded"
    );

    let snapshot = load_snapshot(&cli.snapshot)?;
    let engine = RiskEngine::from_snapshot(&snapshot, &params, &classifier);

    let aggregate = engine
        .aggregate(snapshot.user_emode_category)
        .context("aggregating user position")?;

    info!(
        reserves = snapshot.reserves.len(),
        positions = snapshot.user_reserves.len(),
        health_factor = %aggregate.health_factor,
        isolated = aggregate.is_in_isolation_mode,
        emode_category = aggregate.emode_category.id(),
        "snapshot loaded"
    );

    match cli.command {
        Command::BorrowTable => {
            let table = engine.borrow_table(&aggregate)?;
            info!(rows = table.len(), "borrow table built");
            print_json(&table)?;
        }
        Command::Withdraw { reserve_id, amount } => {
            let outcome = engine.evaluate(&ActionRequest {
                kind: ActionKind::Withdraw,
                reserve_id,
                amount,
                aggregate,
            })?;
            print_json(&outcome)?;
        }
        Command::Borrow { reserve_id, amount } => {
            let outcome = engine.evaluate(&ActionRequest {
                kind: ActionKind::Borrow,
                reserve_id,
                amount,
                aggregate,
            })?;
            print_json(&outcome)?;
        }
    }

    Ok(())
}

fn load_snapshot(path: &Path) -> Result<PoolSnapshot> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing snapshot: {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing result")?;
    println!("{json}");
    Ok(())
}
