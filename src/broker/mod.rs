// Market data and order client
pub mod paper;
pub mod synthetic;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::market::RawCandle;
use crate::models::Direction;
use crate::Result;

pub use paper::{PaperBroker, PaperConfig};
pub use synthetic::{MarketScenario, SyntheticGenerator};

/// Order acknowledgement returned alongside the `buy` success flag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyInfo {
    /// Broker trade id; settlement can only be polled when present
    pub id: Option<String>,
    /// Payout credited on a win
    pub profit: Option<f64>,
    /// Rejection or status text
    pub message: Option<String>,
}

/// Abstraction over the binary-options broker session.
///
/// `PaperBroker` implements this for simulation. Only the trade tracker
/// places orders through it; the session controller reads candles and
/// balance.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Open the session. `(false, reason)` is fatal for the session.
    async fn connect(&self) -> (bool, String);

    /// Raw records covering `[end_time - lookback_seconds, end_time]`; may be empty
    async fn get_candles(
        &self,
        asset: &str,
        end_time: DateTime<Utc>,
        lookback_seconds: u64,
        bar_seconds: u64,
    ) -> Result<Vec<RawCandle>>;

    async fn get_balance(&self) -> Result<f64>;

    /// Place a fixed-duration trade. `Ok((false, info))` is a broker-side rejection.
    async fn buy(
        &self,
        stake: f64,
        asset: &str,
        direction: Direction,
        duration_seconds: u64,
    ) -> Result<(bool, BuyInfo)>;

    /// `Some(win)` once settled, `None` while the trade is still open
    async fn check_win(&self, trade_id: &str) -> Result<Option<bool>>;

    async fn close(&self) -> Result<()>;
}
