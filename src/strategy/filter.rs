use serde::{Deserialize, Serialize};
use std::fmt;

use super::signals::{SignalBundle, SignalConfig};
use super::{Entry, EntryStrategy};
use crate::indicators::{is_doji, is_market_volatile, is_opposing_streak};
use crate::market::CandleWindow;
use crate::models::Direction;
use crate::Error;

/// Entry guards applied on top of any strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Skip when wick range dwarfs body size
    pub volatility: bool,
    pub volatility_lookback: usize,
    /// Skip when the latest bar is a doji
    pub doji: bool,
    /// Skip a direction after a run of bars against it
    pub streak: bool,
    pub streak_length: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            volatility: true,
            volatility_lookback: 5,
            doji: true,
            streak: true,
            streak_length: 3,
        }
    }
}

impl GuardConfig {
    pub fn disabled() -> Self {
        Self {
            volatility: false,
            doji: false,
            streak: false,
            ..Default::default()
        }
    }
}

/// Why an asset produced no trade this cycle
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    InsufficientData { have: usize, need: usize },
    Volatile,
    Doji,
    OpposingStreak(Direction),
    /// One of the last two bars was built from incomplete records
    StaleBar,
    NoSetup,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientData { have, need } => {
                write!(f, "collecting data ({}/{} bars)", have, need)
            }
            SkipReason::Volatile => f.write_str("market too volatile"),
            SkipReason::Doji => f.write_str("doji on latest bar"),
            SkipReason::OpposingStreak(direction) => {
                write!(f, "last bars all against {}", direction.as_str().to_uppercase())
            }
            SkipReason::StaleBar => f.write_str("latest bars incomplete"),
            SkipReason::NoSetup => f.write_str("no valid setup"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterState {
    Idle,
    Evaluating,
    Signal(Direction),
    NoSignal(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Enter(Entry),
    Stand(SkipReason),
}

/// Composes a strategy with the entry guards into one go/no-go decision
///
/// Idle -> Evaluating -> Signal | NoSignal. `reset` returns to Idle.
pub struct EntryFilter {
    strategy: Box<dyn EntryStrategy>,
    signals: SignalConfig,
    guards: GuardConfig,
    state: FilterState,
}

impl EntryFilter {
    pub fn new(strategy: Box<dyn EntryStrategy>, signals: SignalConfig, guards: GuardConfig) -> Self {
        Self {
            strategy,
            signals,
            guards,
            state: FilterState::Idle,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Bars needed by both the signal bundle and the strategy
    pub fn min_candles(&self) -> usize {
        self.signals
            .min_candles()
            .max(self.strategy.min_candles_required())
    }

    pub fn reset(&mut self) {
        self.state = FilterState::Idle;
    }

    /// Evaluate one asset's window
    pub fn evaluate(&mut self, window: &CandleWindow) -> Decision {
        self.state = FilterState::Evaluating;

        let decision = self.run_checks(window);
        self.state = match &decision {
            Decision::Enter(entry) => FilterState::Signal(entry.direction),
            Decision::Stand(reason) => FilterState::NoSignal(reason.clone()),
        };

        decision
    }

    /// Every check below sees only bars that are not defaulted
    fn run_checks(&self, window: &CandleWindow) -> Decision {
        if window.recent(2).iter().any(|c| c.defaulted) {
            return Decision::Stand(SkipReason::StaleBar);
        }

        let dropped = window.defaulted_count();
        if dropped > 0 {
            tracing::debug!(asset = %window.asset(), dropped, "Excluding defaulted bars from signals");
        }
        let clean = window.without_defaulted();
        let window = &clean;

        let need = self.min_candles();
        if window.len() < need {
            return Decision::Stand(SkipReason::InsufficientData {
                have: window.len(),
                need,
            });
        }

        let signals = match SignalBundle::compute(window, &self.signals) {
            Ok(signals) => signals,
            Err(Error::InsufficientData { have, need }) => {
                return Decision::Stand(SkipReason::InsufficientData { have, need })
            }
            Err(e) => {
                tracing::warn!(asset = %window.asset(), "Signal computation failed: {}", e);
                return Decision::Stand(SkipReason::NoSetup);
            }
        };

        tracing::info!(
            asset = %window.asset(),
            "Market trend: {:?} (RSI {:.1})",
            signals.trend,
            signals.rsi
        );

        if self.guards.volatility
            && is_market_volatile(window.candles(), self.guards.volatility_lookback)
        {
            return Decision::Stand(SkipReason::Volatile);
        }

        if self.guards.doji && window.latest().is_some_and(is_doji) {
            return Decision::Stand(SkipReason::Doji);
        }

        let Some(entry) = self.strategy.decide(window, &signals) else {
            return Decision::Stand(SkipReason::NoSetup);
        };

        if self.guards.streak
            && is_opposing_streak(window.candles(), entry.direction, self.guards.streak_length)
        {
            return Decision::Stand(SkipReason::OpposingStreak(entry.direction));
        }

        Decision::Enter(entry)
    }
}
