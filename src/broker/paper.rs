use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::synthetic::{MarketScenario, SyntheticGenerator};
use super::{BrokerClient, BuyInfo};
use crate::clock::Clock;
use crate::market::RawCandle;
use crate::models::{Candle, Direction};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub seed: u64,
    pub starting_balance: f64,
    /// Fraction of the stake paid on a win
    pub payout_ratio: f64,
    pub base_price: f64,
    /// Spacing of simulated price ticks
    pub tick_seconds: u64,
    /// Ticks before the simulated market may change regime
    pub regime_ticks: usize,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            starting_balance: 1_000.0,
            payout_ratio: 0.85,
            base_price: 1.1,
            tick_seconds: 5,
            regime_ticks: 120,
        }
    }
}

/// Settled trade results kept for repeated `check_win` calls
const SETTLED_HISTORY: usize = 256;

/// Lazily extended tick path for one asset, one bar per tick
struct PriceTrack {
    generator: SyntheticGenerator,
    scenario: MarketScenario,
    origin: i64,
    bars: Vec<Candle>,
}

impl PriceTrack {
    fn new(seed: u64, base_price: f64, origin: i64) -> Self {
        let mut generator = SyntheticGenerator::new(seed, base_price);
        let scenario = generator.pick_scenario();
        let price = generator.price();
        let start = DateTime::from_timestamp(origin, 0).unwrap_or_default();
        Self {
            bars: vec![Candle::new(start, price, price, price, price)],
            generator,
            scenario,
            origin,
        }
    }

    fn index_of(&self, ts: i64, tick: i64) -> usize {
        ((ts - self.origin).max(0) / tick) as usize
    }

    fn extend_to(&mut self, index: usize, tick: i64, regime_ticks: usize) {
        while self.bars.len() <= index {
            if regime_ticks > 0 && self.bars.len() % regime_ticks == 0 {
                self.scenario = self.generator.pick_scenario();
            }
            let ts = self.origin + self.bars.len() as i64 * tick;
            let start = DateTime::from_timestamp(ts, 0).unwrap_or_default();
            let next = self.generator.generate(self.scenario, start, 1, tick);
            self.bars.extend(next);
        }
    }
}

struct OpenTrade {
    asset: String,
    direction: Direction,
    stake: f64,
    entry_price: f64,
    expires_at: DateTime<Utc>,
}

struct PaperState {
    balance: f64,
    tracks: HashMap<String, PriceTrack>,
    /// Trades not yet settled
    trades: HashMap<String, OpenTrade>,
    /// Most recent settlements, oldest first
    settled: VecDeque<(String, bool)>,
}

/// Simulated broker for paper trading.
///
/// Serves seeded synthetic ticks per asset, holds a balance, and settles
/// trades at expiry by comparing the simulated price with the entry price.
/// A flat close counts as a loss.
pub struct PaperBroker {
    config: PaperConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<PaperState>,
}

impl PaperBroker {
    pub fn new(config: PaperConfig, clock: Arc<dyn Clock>) -> Self {
        info!(
            balance = config.starting_balance,
            payout = config.payout_ratio,
            seed = config.seed,
            "PaperBroker initialized"
        );
        Self {
            state: Mutex::new(PaperState {
                balance: config.starting_balance,
                tracks: HashMap::new(),
                trades: HashMap::new(),
                settled: VecDeque::new(),
            }),
            config,
            clock,
        }
    }

    fn asset_seed(&self, asset: &str) -> u64 {
        asset
            .bytes()
            .fold(self.config.seed, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
    }

    fn tick(&self) -> i64 {
        self.config.tick_seconds.max(1) as i64
    }

    /// Simulated tick bar of `asset` covering `at`, extending its path as needed
    fn bar_at(&self, state: &mut PaperState, asset: &str, at: DateTime<Utc>) -> Candle {
        let tick = self.tick();
        let ts = at.timestamp();
        let track = state.tracks.entry(asset.to_string()).or_insert_with(|| {
            PriceTrack::new(self.asset_seed(asset), self.config.base_price, ts)
        });
        let index = track.index_of(ts, tick);
        track.extend_to(index, tick, self.config.regime_ticks);
        track.bars[index].clone()
    }

    fn price_at(&self, state: &mut PaperState, asset: &str, at: DateTime<Utc>) -> f64 {
        self.bar_at(state, asset, at).close
    }

    fn settle(&self, state: &mut PaperState, trade_id: &str) -> Result<Option<bool>> {
        if let Some(&(_, won)) = state.settled.iter().find(|(id, _)| id == trade_id) {
            return Ok(Some(won));
        }

        let now = self.clock.now();
        let Some(trade) = state.trades.get(trade_id) else {
            return Err(Error::Broker(format!("unknown trade id {}", trade_id)));
        };
        if now < trade.expires_at {
            return Ok(None);
        }
        let (asset, expires_at) = (trade.asset.clone(), trade.expires_at);

        let exit_price = self.price_at(state, &asset, expires_at);
        let Some(trade) = state.trades.remove(trade_id) else {
            return Err(Error::Broker(format!("unknown trade id {}", trade_id)));
        };

        let won = match trade.direction {
            Direction::Call => exit_price > trade.entry_price,
            Direction::Put => exit_price < trade.entry_price,
        };
        let credit = if won {
            trade.stake * (1.0 + self.config.payout_ratio)
        } else {
            0.0
        };

        debug!(
            trade_id,
            entry = trade.entry_price,
            exit = exit_price,
            won,
            "Paper trade settled"
        );

        state.balance += credit;
        state.settled.push_back((trade_id.to_string(), won));
        if state.settled.len() > SETTLED_HISTORY {
            state.settled.pop_front();
        }
        Ok(Some(won))
    }
}

#[async_trait]
impl BrokerClient for PaperBroker {
    async fn connect(&self) -> (bool, String) {
        (true, "paper session ready".to_string())
    }

    async fn get_candles(
        &self,
        asset: &str,
        end_time: DateTime<Utc>,
        lookback_seconds: u64,
        _bar_seconds: u64,
    ) -> Result<Vec<RawCandle>> {
        let tick = self.tick();
        let end = end_time.timestamp();
        let start = end - lookback_seconds as i64;
        // First tick on the grid at or after `start`
        let first = start.div_euclid(tick) * tick + if start.rem_euclid(tick) == 0 { 0 } else { tick };

        let mut state = self.state.lock().await;
        let mut records = Vec::new();
        let mut ts = first;

        while ts <= end {
            let at = DateTime::from_timestamp(ts, 0).unwrap_or(end_time);
            let bar = self.bar_at(&mut state, asset, at);
            records.push(RawCandle::new(ts as f64, bar.open, bar.high, bar.low, bar.close));
            ts += tick;
        }

        Ok(records)
    }

    async fn get_balance(&self) -> Result<f64> {
        Ok(self.state.lock().await.balance)
    }

    async fn buy(
        &self,
        stake: f64,
        asset: &str,
        direction: Direction,
        duration_seconds: u64,
    ) -> Result<(bool, BuyInfo)> {
        let mut state = self.state.lock().await;

        if !stake.is_finite() || stake <= 0.0 {
            return Ok((
                false,
                BuyInfo {
                    message: Some(format!("invalid stake {}", stake)),
                    ..Default::default()
                },
            ));
        }
        if stake > state.balance {
            return Ok((
                false,
                BuyInfo {
                    message: Some(format!(
                        "insufficient balance {:.2} for stake {:.2}",
                        state.balance, stake
                    )),
                    ..Default::default()
                },
            ));
        }

        let now = self.clock.now();
        let entry_price = self.price_at(&mut state, asset, now);
        let id = uuid::Uuid::new_v4().to_string();

        state.balance -= stake;
        state.trades.insert(
            id.clone(),
            OpenTrade {
                asset: asset.to_string(),
                direction,
                stake,
                entry_price,
                expires_at: now + chrono::Duration::seconds(duration_seconds as i64),
            },
        );

        debug!(
            asset,
            %direction,
            stake,
            entry = entry_price,
            "Paper trade opened"
        );

        Ok((
            true,
            BuyInfo {
                id: Some(id),
                profit: Some(stake * self.config.payout_ratio),
                message: None,
            },
        ))
    }

    async fn check_win(&self, trade_id: &str) -> Result<Option<bool>> {
        let mut state = self.state.lock().await;
        self.settle(&mut state, trade_id)
    }

    async fn close(&self) -> Result<()> {
        info!("PaperBroker session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    fn broker(clock: Arc<ManualClock>) -> PaperBroker {
        PaperBroker::new(PaperConfig::default(), clock)
    }

    #[tokio::test]
    async fn test_candles_cover_lookback() {
        let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
        let broker = broker(clock.clone());

        let raw = broker
            .get_candles("EURUSD_otc", clock.now(), 600, 60)
            .await
            .unwrap();

        // 600s of 5s ticks, both ends inclusive
        assert_eq!(raw.len(), 121);
        assert_eq!(raw[0].time, Some(1_699_999_400.0));
        assert!(raw.iter().all(|r| r.high >= r.open && r.low <= r.close));
    }

    #[tokio::test]
    async fn test_price_path_is_stable_across_requests() {
        let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
        let broker = broker(clock.clone());

        let first = broker.get_candles("GBPUSD_otc", clock.now(), 300, 60).await.unwrap();
        clock.advance(Duration::from_secs(60));
        let second = broker.get_candles("GBPUSD_otc", clock.now(), 360, 60).await.unwrap();

        assert_eq!(first, second[..first.len()].to_vec());
    }

    #[tokio::test]
    async fn test_trade_lifecycle_updates_balance() {
        let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
        let broker = broker(clock.clone());

        let (ok, info) = broker.buy(10.0, "EURUSD_otc", Direction::Call, 60).await.unwrap();
        assert!(ok);
        assert_eq!(info.profit, Some(8.5));
        assert_eq!(broker.get_balance().await.unwrap(), 990.0);

        let id = info.id.unwrap();
        assert_eq!(broker.check_win(&id).await.unwrap(), None);

        clock.advance(Duration::from_secs(60));
        let won = broker.check_win(&id).await.unwrap().unwrap();
        let expected = if won { 1_008.5 } else { 990.0 };
        assert!((broker.get_balance().await.unwrap() - expected).abs() < 1e-9);

        // Settlement is idempotent
        assert_eq!(broker.check_win(&id).await.unwrap(), Some(won));
        assert!((broker.get_balance().await.unwrap() - expected).abs() < 1e-9);

        let state = broker.state.lock().await;
        assert!(state.trades.is_empty());
        assert_eq!(state.settled.len(), 1);
    }

    #[tokio::test]
    async fn test_settled_history_is_bounded() {
        let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
        let broker = broker(clock.clone());

        let mut ids = Vec::new();
        for _ in 0..SETTLED_HISTORY + 10 {
            let (ok, info) = broker.buy(1.0, "EURUSD_otc", Direction::Call, 60).await.unwrap();
            assert!(ok);
            ids.push(info.id.unwrap());
        }

        clock.advance(Duration::from_secs(60));
        for id in &ids {
            assert!(broker.check_win(id).await.unwrap().is_some());
        }

        {
            let state = broker.state.lock().await;
            assert!(state.trades.is_empty());
            assert_eq!(state.settled.len(), SETTLED_HISTORY);
        }
        // Oldest settlements are forgotten, recent ones still answer
        assert!(broker.check_win(&ids[0]).await.is_err());
        assert!(broker.check_win(&ids[ids.len() - 1]).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_tick_bars_are_continuous_and_well_formed() {
        let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
        let broker = broker(clock.clone());

        let raw = broker.get_candles("EURUSD_otc", clock.now(), 0, 60).await.unwrap();
        assert_eq!(raw.len(), 1);
        // First bar of a fresh path is flat
        assert_eq!(raw[0].open, raw[0].close);

        clock.advance(Duration::from_secs(300));
        let raw = broker.get_candles("EURUSD_otc", clock.now(), 300, 60).await.unwrap();
        for pair in raw.windows(2) {
            assert_eq!(pair[1].open, pair[0].close);
        }
        for r in &raw {
            let (open, high, low, close) =
                (r.open.unwrap(), r.high.unwrap(), r.low.unwrap(), r.close.unwrap());
            assert!(high >= open.max(close) && low <= open.min(close));
        }
    }

    #[tokio::test]
    async fn test_rejects_oversized_stake() {
        let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
        let broker = broker(clock);

        let (ok, info) = broker.buy(5_000.0, "EURUSD_otc", Direction::Put, 60).await.unwrap();
        assert!(!ok);
        assert!(info.id.is_none());
        assert!(info.message.unwrap().contains("insufficient balance"));
    }

    #[tokio::test]
    async fn test_unknown_trade_id_errors() {
        let clock = Arc::new(ManualClock::at_timestamp(1_700_000_000));
        let broker = broker(clock);
        assert!(broker.check_win("missing").await.is_err());
    }
}
