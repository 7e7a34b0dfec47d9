use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use otcbot::broker::PaperBroker;
use otcbot::clock::SystemClock;
use otcbot::session::SessionController;
use otcbot::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "otcbot",
    about = "Binary-options scan loop with pattern entries and bounded martingale staking"
)]
struct Cli {
    /// Path to a TOML config file (see config/trend.toml, config/fibo.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    initial_stake: Option<f64>,

    /// Balance at which the session stops in profit
    #[arg(long)]
    target_profit: Option<f64>,

    /// Balance at which the session stops in loss
    #[arg(long)]
    stop_loss: Option<f64>,

    /// Stop after this many full scans of the asset list
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Seed for the paper market
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    if let Some(max_cycles) = cli.max_cycles {
        settings.session.max_cycles = Some(max_cycles);
    }
    if let Some(seed) = cli.seed {
        settings.paper.seed = seed;
    }

    let initial_stake = resolve(cli.initial_stake.or(settings.money.initial_stake), "Enter Initial Stake: ")?;
    let target_profit = resolve(cli.target_profit.or(settings.money.target_profit), "Enter Target Profit Amount: ")?;
    let stop_loss = resolve(cli.stop_loss.or(settings.money.stop_loss), "Enter Stop Loss Amount: ")?;

    if initial_stake <= 0.0 {
        bail!("initial stake must be positive, got {}", initial_stake);
    }
    if stop_loss >= target_profit {
        bail!(
            "stop loss ({}) must be below target profit ({})",
            stop_loss,
            target_profit
        );
    }
    let thresholds = settings.apply_money(initial_stake, target_profit, stop_loss);

    tracing::info!("🚀 otcbot starting");
    tracing::info!("  Strategy: {:?} ({:?})", settings.strategy, settings.direction_mode);
    tracing::info!("  Staking: {:?} x{} over {} levels", settings.staking.mode, settings.staking.factor, settings.staking.max_stage);
    tracing::info!("  Assets: {}", settings.session.assets.join(", "));

    let clock = Arc::new(SystemClock);
    let broker = Arc::new(PaperBroker::new(settings.paper.clone(), clock.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("⚠️  Received Ctrl+C, stopping after the current asset...");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut controller =
        SessionController::new(&settings, thresholds, broker, clock).with_shutdown(shutdown_rx);
    let report = controller.run().await.context("Session failed")?;

    tracing::info!(
        "👋 otcbot stopped after {} cycles ({:?})",
        report.cycles,
        report.end
    );
    tracing::debug!(
        "Final ledger: {}",
        serde_json::to_string(&report.ledger).context("Failed to serialize ledger")?
    );
    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("otcbot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Use the configured value, or ask on stdin
fn resolve(value: Option<f64>, prompt: &str) -> Result<f64> {
    if let Some(value) = value {
        return Ok(value);
    }

    print!("{}", prompt);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;

    line.trim()
        .parse::<f64>()
        .with_context(|| format!("Not a number: {:?}", line.trim()))
}
