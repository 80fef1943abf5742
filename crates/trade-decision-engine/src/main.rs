use std::io::Read;

use anyhow::{Context, Result};
use trade_decision_engine::{EngineConfig, TradeDecisionEngine};

/// Evaluate one request read from the file given as the first argument,
/// or from stdin, and print the decision as JSON.
fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    // Logs go to stderr so stdout carries only the decision
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }

    let config = EngineConfig::from_env()?;
    tracing::info!(
        "Configuration loaded: cap {}, lot size {}, min score {}, windows {}",
        config.daily_loss_cap,
        config.lot_multiplier,
        config.min_score,
        config
            .windows
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(",")
    );

    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request file {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };

    let engine = TradeDecisionEngine::new(config)?;
    let decision = engine
        .evaluate_json(&raw)
        .context("Request rejected at validation")?;

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
