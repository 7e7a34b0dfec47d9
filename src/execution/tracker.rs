use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::gate::TradeHandle;
use crate::broker::BrokerClient;
use crate::clock::{seconds_until_entry, Clock};
use crate::models::{TradeIntent, TradeOutcome, TradeResult};
use crate::risk::{SessionLedger, StakeTransition, StakingPolicy};
use crate::{Error, Result};

/// Order and settlement timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    pub duration_seconds: u64,
    /// Extra time after expiry before the outcome is forced to Undetermined
    pub grace_seconds: u64,
    pub settle_poll_seconds: u64,
    /// Submit just before the next bar opens
    pub align_entry: bool,
    pub entry_lead_seconds: u64,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 60,
            grace_seconds: 5,
            settle_poll_seconds: 2,
            align_entry: true,
            entry_lead_seconds: 1,
        }
    }
}

/// Result of one tracked trade
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub outcome: TradeOutcome,
    pub transition: StakeTransition,
}

/// Submits a gated trade, waits out settlement and books the outcome
///
/// The ledger and staking policy are only written here, one trade at a time.
pub struct TradeTracker {
    broker: Arc<dyn BrokerClient>,
    clock: Arc<dyn Clock>,
    config: TradeConfig,
    bar_seconds: u64,
}

impl TradeTracker {
    pub fn new(broker: Arc<dyn BrokerClient>, clock: Arc<dyn Clock>, config: TradeConfig) -> Self {
        Self {
            broker,
            clock,
            config,
            bar_seconds: 60,
        }
    }

    /// Bar length used for entry alignment
    pub fn with_bar_seconds(mut self, bar_seconds: u64) -> Self {
        self.bar_seconds = bar_seconds;
        self
    }

    pub fn config(&self) -> &TradeConfig {
        &self.config
    }

    /// Run one trade end to end
    ///
    /// The gate handle is dropped on every return path. A broker rejection
    /// returns `OrderRejected` and leaves the ledger and stake untouched.
    pub async fn execute(
        &self,
        handle: TradeHandle,
        intent: &TradeIntent,
        ledger: &mut SessionLedger,
        staking: &mut StakingPolicy,
    ) -> Result<Settlement> {
        if self.config.align_entry {
            let wait =
                seconds_until_entry(self.clock.now(), self.bar_seconds, self.config.entry_lead_seconds);
            if wait > 0 {
                debug!(asset = %intent.asset, "Waiting {}s for bar-aligned entry", wait);
                self.clock.sleep(Duration::from_secs(wait)).await;
            }
        }

        info!(
            asset = %intent.asset,
            stake = intent.stake,
            stage = staking.stage(),
            "🚀 Placing {} trade for {}s",
            intent.direction.as_str().to_uppercase(),
            intent.duration_secs
        );

        let info = match self
            .broker
            .buy(intent.stake, &intent.asset, intent.direction, intent.duration_secs)
            .await
        {
            Ok((true, info)) => info,
            Ok((false, info)) => {
                return Err(Error::OrderRejected {
                    asset: intent.asset.clone(),
                    reason: info
                        .message
                        .unwrap_or_else(|| "broker declined the order".to_string()),
                })
            }
            Err(e) => {
                return Err(Error::OrderRejected {
                    asset: intent.asset.clone(),
                    reason: e.to_string(),
                })
            }
        };

        let result = match info.id.as_deref() {
            Some(id) => self.await_settlement(id, intent.duration_secs).await,
            None => {
                warn!(asset = %intent.asset, "Order accepted without a trade id, outcome unknown");
                TradeResult::Undetermined
            }
        };

        let profit = match result {
            TradeResult::Win => info.profit.unwrap_or(0.0),
            TradeResult::Loss => -intent.stake,
            TradeResult::Undetermined => 0.0,
        };

        let outcome = TradeOutcome {
            trade_id: info.id,
            asset: intent.asset.clone(),
            direction: intent.direction,
            stake: intent.stake,
            result,
            profit,
            settled_at: self.clock.now(),
        };

        match result {
            TradeResult::Win => info!(asset = %outcome.asset, "✅ Trade won | Profit: {:.2}", profit),
            TradeResult::Loss => info!(asset = %outcome.asset, "❌ Trade lost | Profit: {:.2}", profit),
            TradeResult::Undetermined => {
                info!(asset = %outcome.asset, "⚖️ Trade undetermined, stake unchanged")
            }
        }

        ledger.record(&outcome);
        match self.broker.get_balance().await {
            Ok(balance) => ledger.sync_balance(balance),
            Err(e) => warn!("Balance refresh failed, using outcome profit: {}", e),
        }

        let transition = staking.apply(result);
        info!(
            next_stake = staking.current_stake(),
            stage = staking.stage(),
            "📊 {}",
            ledger
        );

        drop(handle);
        Ok(Settlement {
            outcome,
            transition,
        })
    }

    /// Poll `check_win` from expiry until `duration + grace`
    async fn await_settlement(&self, trade_id: &str, duration_secs: u64) -> TradeResult {
        let started = self.clock.now();
        let window = duration_secs + self.config.grace_seconds;
        let deadline = started + chrono::Duration::seconds(window as i64);
        let poll = self.config.settle_poll_seconds.max(1);

        self.clock.sleep(Duration::from_secs(duration_secs)).await;

        loop {
            match self.broker.check_win(trade_id).await {
                Ok(Some(true)) => return TradeResult::Win,
                Ok(Some(false)) => return TradeResult::Loss,
                Ok(None) => debug!(trade_id, "Trade not settled yet"),
                Err(e) => warn!(trade_id, "Settlement check failed: {}", e),
            }

            let remaining = (deadline - self.clock.now()).num_seconds();
            if remaining <= 0 {
                let timeout = Error::SettlementTimeout {
                    trade_id: trade_id.to_string(),
                    waited_secs: window,
                };
                warn!("{}, resolving as undetermined", timeout);
                return TradeResult::Undetermined;
            }

            self.clock
                .sleep(Duration::from_secs(poll.min(remaining as u64)))
                .await;
        }
    }
}
