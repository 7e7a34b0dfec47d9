// Entry decision module
pub mod filter;
pub mod retracement;
pub mod signals;
pub mod trend_confirmation;

use serde::{Deserialize, Serialize};

use crate::market::CandleWindow;
use crate::models::Direction;

pub use filter::{Decision, EntryFilter, FilterState, GuardConfig, SkipReason};
pub use retracement::RetracementStrategy;
pub use signals::{SignalBundle, SignalConfig};
pub use trend_confirmation::{DirectionMode, TrendConfirmationStrategy};

/// A directional decision with a human-readable justification
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub direction: Direction,
    pub reason: String,
}

/// Base trait for entry decision rules
pub trait EntryStrategy: Send + Sync {
    /// Decide a direction from the window and its signal bundle, or stand aside
    fn decide(&self, window: &CandleWindow, signals: &SignalBundle) -> Option<Entry>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required for this strategy
    fn min_candles_required(&self) -> usize;
}

/// Which decision rule drives the entry filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Fibonacci retracement continuation / reversion
    Retracement,
    /// MA trend confirmed by a candlestick pattern
    #[default]
    TrendConfirmation,
}

impl StrategyKind {
    pub fn build(self, mode: DirectionMode, min_candles: usize) -> Box<dyn EntryStrategy> {
        match self {
            StrategyKind::Retracement => Box::new(RetracementStrategy::new(min_candles)),
            StrategyKind::TrendConfirmation => {
                Box::new(TrendConfirmationStrategy::new(mode, min_candles))
            }
        }
    }
}
