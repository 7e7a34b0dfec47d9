use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::broker::BrokerClient;
use crate::clock::Clock;
use crate::execution::{
    ActiveTradeGate, ExecutionAction, Executor, Settlement, TradeTracker,
};
use crate::market::CandleAggregator;
use crate::models::{Direction, TradeIntent};
use crate::risk::{SessionLedger, StakeTransition, StakingPolicy, StopThresholds, ThresholdBreach};
use crate::settings::Settings;
use crate::strategy::{Decision, EntryFilter, SkipReason};
use crate::{Error, Result};

/// Scan loop pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Scanned in order, round-robin
    pub assets: Vec<String>,
    /// Pause after each asset
    pub asset_delay_seconds: u64,
    /// Back-off when an asset's turn finds the gate held
    pub gate_poll_seconds: u64,
    /// Stop after this many full cycles
    pub max_cycles: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            assets: ["BRLUSD_otc", "GBPJPY_otc", "USDINR_otc", "NZDUSD_otc"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            asset_delay_seconds: 1,
            gate_poll_seconds: 5,
            max_cycles: None,
        }
    }
}

/// What one asset's turn produced
#[derive(Debug, Clone, PartialEq)]
pub enum AssetScan {
    /// Another trade held the gate
    GateHeld,
    /// Candles could not be fetched or were unusable
    DataError(String),
    /// Entry filter stood aside
    NoSignal(SkipReason),
    /// Signal present but execution checks refused it
    Blocked(String),
    /// Broker declined the order
    Rejected(String),
    /// One trade, plus any immediate recovery trades
    Traded(Vec<Settlement>),
}

/// Why the session ended
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    Threshold(ThresholdBreach),
    Interrupted,
    CycleLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub end: SessionEnd,
    pub cycles: u64,
    pub ledger: SessionLedger,
}

/// Drives the asset scan loop until a stop threshold, an interrupt or the
/// cycle limit
pub struct SessionController {
    config: SessionConfig,
    broker: Arc<dyn BrokerClient>,
    clock: Arc<dyn Clock>,
    aggregator: CandleAggregator,
    filter: EntryFilter,
    executor: Executor,
    tracker: TradeTracker,
    gate: ActiveTradeGate,
    staking: StakingPolicy,
    thresholds: StopThresholds,
    ledger: SessionLedger,
    shutdown: Option<watch::Receiver<bool>>,
}

impl SessionController {
    pub fn new(
        settings: &Settings,
        thresholds: StopThresholds,
        broker: Arc<dyn BrokerClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let strategy = settings
            .strategy
            .build(settings.direction_mode, settings.market.min_bars);
        let tracker = TradeTracker::new(broker.clone(), clock.clone(), settings.trade.clone())
            .with_bar_seconds(settings.market.bar_seconds);

        Self {
            config: settings.session.clone(),
            aggregator: CandleAggregator::new(settings.market.clone()),
            filter: EntryFilter::new(strategy, settings.signals.clone(), settings.guards.clone()),
            executor: Executor::new(settings.trade.duration_seconds),
            tracker,
            gate: ActiveTradeGate::new(),
            staking: StakingPolicy::new(settings.staking.clone()),
            thresholds,
            ledger: SessionLedger::new(0.0),
            shutdown: None,
            broker,
            clock,
        }
    }

    /// Stop between assets once `true` is sent
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn gate(&self) -> &ActiveTradeGate {
        &self.gate
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    pub fn staking(&self) -> &StakingPolicy {
        &self.staking
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Connect, then scan until the session ends
    ///
    /// # Errors
    /// `Connectivity` if the broker session cannot be opened or the initial
    /// balance cannot be read. Nothing else ends the session with an error.
    pub async fn run(&mut self) -> Result<SessionReport> {
        if self.config.assets.is_empty() {
            return Err(Error::Config(config::ConfigError::Message(
                "no assets configured".to_string(),
            )));
        }

        let (connected, message) = self.broker.connect().await;
        if !connected {
            error!("❌ Connection failed: {}", message);
            return Err(Error::Connectivity(message));
        }
        info!("✅ Connected: {}", message);

        let balance = self
            .broker
            .get_balance()
            .await
            .map_err(|e| Error::Connectivity(format!("initial balance unavailable: {}", e)))?;
        self.ledger = SessionLedger::new(balance);
        info!("💰 Initial Account Balance: {:.2}", balance);
        info!(
            "🎯 Target {:.2} | 🛑 Stop {:.2} | Strategy {} | Stake {:.2}",
            self.thresholds.target_profit,
            self.thresholds.stop_loss,
            self.filter.strategy_name(),
            self.staking.current_stake()
        );

        let (end, cycles) = self.scan_loop().await;

        match &end {
            SessionEnd::Threshold(breach) => info!("🏁 Session stopped: {}", breach),
            SessionEnd::Interrupted => info!("⚠️ Session interrupted"),
            SessionEnd::CycleLimit => info!("🏁 Cycle limit reached after {} cycles", cycles),
        }
        info!("📊 Final: {}", self.ledger);

        if let Err(e) = self.broker.close().await {
            warn!("Broker close failed: {}", e);
        }

        Ok(SessionReport {
            end,
            cycles,
            ledger: self.ledger.clone(),
        })
    }

    async fn scan_loop(&mut self) -> (SessionEnd, u64) {
        if let Err(breach) = self.thresholds.check(&self.ledger) {
            return (SessionEnd::Threshold(breach), 0);
        }

        let mut cycles = 0;
        let assets = self.config.assets.clone();

        loop {
            if self.config.max_cycles.is_some_and(|max| cycles >= max) {
                return (SessionEnd::CycleLimit, cycles);
            }
            cycles += 1;
            debug!(cycle = cycles, "Starting scan cycle");

            for asset in &assets {
                if self.shutdown_requested() {
                    return (SessionEnd::Interrupted, cycles);
                }

                let scan = self.scan_asset(asset).await;
                self.log_scan(asset, &scan);

                if let Err(breach) = self.thresholds.check(&self.ledger) {
                    return (SessionEnd::Threshold(breach), cycles);
                }

                self.clock
                    .sleep(Duration::from_secs(self.config.asset_delay_seconds))
                    .await;
            }
        }
    }

    /// One asset's turn: aggregate, decide, maybe trade
    ///
    /// Never fails; every per-asset problem becomes an `AssetScan`.
    pub async fn scan_asset(&mut self, asset: &str) -> AssetScan {
        if self.gate.is_held() {
            self.clock
                .sleep(Duration::from_secs(self.config.gate_poll_seconds))
                .await;
            return AssetScan::GateHeld;
        }

        let market = self.aggregator.config().clone();
        let raw = match self
            .broker
            .get_candles(asset, self.clock.now(), market.lookback_seconds, market.bar_seconds)
            .await
        {
            Ok(raw) => raw,
            Err(e) => return AssetScan::DataError(e.to_string()),
        };

        let window = match self.aggregator.aggregate(asset, &raw) {
            Ok(window) => window,
            Err(Error::InsufficientData { have, need }) => {
                return AssetScan::NoSignal(SkipReason::InsufficientData { have, need })
            }
            Err(e) if e.is_data_error() => return AssetScan::DataError(e.to_string()),
            Err(e) => {
                warn!(asset, "Unexpected aggregation failure: {}", e);
                return AssetScan::DataError(e.to_string());
            }
        };

        let decision = self.filter.evaluate(&window);
        self.filter.reset();
        if let Decision::Stand(reason) = &decision {
            return AssetScan::NoSignal(reason.clone());
        }

        let execution = self.executor.process_decision(
            asset,
            &decision,
            &self.gate,
            &self.staking,
            &self.ledger,
            &self.thresholds,
        );
        let intent = match execution.action {
            ExecutionAction::Execute { intent } => intent,
            ExecutionAction::Skip => return AssetScan::Blocked(execution.reason),
        };
        info!(asset, "📈 Signal: {} ({})", intent.direction.as_str().to_uppercase(), execution.reason);

        let first = match self.place(&intent).await {
            Ok(settlement) => settlement,
            Err(Error::AlreadyActive(_)) => return AssetScan::GateHeld,
            Err(e) => return AssetScan::Rejected(e.to_string()),
        };

        let mut settlements = vec![first];
        if self.staking.config().recover_immediately {
            self.recover(asset, intent.direction, &mut settlements).await;
        }

        AssetScan::Traded(settlements)
    }

    async fn place(&mut self, intent: &TradeIntent) -> Result<Settlement> {
        let handle = self.gate.begin_trade()?;
        self.tracker
            .execute(handle, intent, &mut self.ledger, &mut self.staking)
            .await
    }

    /// Re-enter at the escalated stake until the martingale run ends
    async fn recover(&mut self, asset: &str, direction: Direction, settlements: &mut Vec<Settlement>) {
        while settlements
            .last()
            .is_some_and(|s| s.transition == StakeTransition::Escalated)
        {
            if self.thresholds.check(&self.ledger).is_err() || self.shutdown_requested() {
                return;
            }

            let intent = TradeIntent {
                asset: asset.to_string(),
                direction,
                stake: self.staking.current_stake(),
                duration_secs: self.tracker.config().duration_seconds,
            };
            info!(asset, stage = self.staking.stage(), "🔁 Recovery trade at {:.2}", intent.stake);

            match self.place(&intent).await {
                Ok(settlement) => settlements.push(settlement),
                Err(e) => {
                    warn!(asset, "Recovery trade not placed: {}", e);
                    return;
                }
            }
        }
    }

    fn log_scan(&self, asset: &str, scan: &AssetScan) {
        match scan {
            AssetScan::GateHeld => debug!(asset, "⏳ Trade in progress, skipping"),
            AssetScan::DataError(e) => warn!(asset, "⚠️ Skipping asset: {}", e),
            AssetScan::NoSignal(reason) => info!(asset, "⏭️ No trade: {}", reason),
            AssetScan::Blocked(reason) => info!(asset, "⛔ Signal not executed: {}", reason),
            AssetScan::Rejected(reason) => warn!(asset, "❌ Failed to place trade: {}", reason),
            AssetScan::Traded(settlements) => debug!(asset, trades = settlements.len(), "Turn complete"),
        }
    }
}
