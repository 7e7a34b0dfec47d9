use serde::{Deserialize, Serialize};

use super::{signals::SignalBundle, Entry, EntryStrategy};
use crate::market::CandleWindow;
use crate::models::{Direction, Trend};

/// How the trade direction is chosen once trend and pattern agree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMode {
    /// Bullish -> Call, Bearish -> Put
    #[default]
    FollowTrend,
    /// Against the colour of the latest bar: green -> Put, otherwise Call
    FadeLastCandle,
}

/// Trade only when the MA trend agrees with a matched candlestick pattern
///
/// Bullish trend needs a bullish engulfing, harami or pin bar; bearish
/// trend needs the bearish counterpart. Sideways never trades.
#[derive(Debug, Clone, Default)]
pub struct TrendConfirmationStrategy {
    mode: DirectionMode,
    min_candles: usize,
}

impl TrendConfirmationStrategy {
    pub fn new(mode: DirectionMode, min_candles: usize) -> Self {
        Self { mode, min_candles }
    }

    fn direction_for(&self, trend_direction: Direction, window: &CandleWindow) -> Direction {
        match self.mode {
            DirectionMode::FollowTrend => trend_direction,
            DirectionMode::FadeLastCandle => match window.latest() {
                Some(latest) if latest.is_bullish() => Direction::Put,
                _ => Direction::Call,
            },
        }
    }
}

impl EntryStrategy for TrendConfirmationStrategy {
    fn decide(&self, window: &CandleWindow, signals: &SignalBundle) -> Option<Entry> {
        let trend_direction = match signals.trend {
            Trend::Bullish if signals.has_bullish_pattern() => Direction::Call,
            Trend::Bearish if signals.has_bearish_pattern() => Direction::Put,
            _ => return None,
        };

        let direction = self.direction_for(trend_direction, window);
        Some(Entry {
            direction,
            reason: format!(
                "{:?} trend confirmed by {}",
                signals.trend,
                signals
                    .patterns
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>()
                    .join("+")
            ),
        })
    }

    fn name(&self) -> &str {
        "TrendConfirmation"
    }

    fn min_candles_required(&self) -> usize {
        self.min_candles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{FibLevels, Pattern};
    use crate::models::Candle;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn bundle(trend: Trend, patterns: &[Pattern]) -> SignalBundle {
        SignalBundle {
            trend,
            rsi: 55.0,
            fib: FibLevels::from_swing(2.0, 1.0),
            patterns: patterns.iter().copied().collect::<BTreeSet<_>>(),
            last_close: 1.5,
            prev_close: 1.4,
        }
    }

    fn window_ending_green() -> CandleWindow {
        CandleWindow::from_candles("X", vec![Candle::new(Utc::now(), 1.0, 1.6, 0.9, 1.5)], 10)
    }

    #[test]
    fn test_bullish_trend_with_bullish_pattern_calls() {
        let strategy = TrendConfirmationStrategy::new(DirectionMode::FollowTrend, 21);
        let entry = strategy
            .decide(&window_ending_green(), &bundle(Trend::Bullish, &[Pattern::BullishEngulfing]))
            .unwrap();
        assert_eq!(entry.direction, Direction::Call);
        assert!(entry.reason.contains("bullish_engulfing"));
    }

    #[test]
    fn test_bearish_trend_with_bearish_pattern_puts() {
        let strategy = TrendConfirmationStrategy::default();
        let entry = strategy
            .decide(&window_ending_green(), &bundle(Trend::Bearish, &[Pattern::BearishPinBar]))
            .unwrap();
        assert_eq!(entry.direction, Direction::Put);
    }

    #[test]
    fn test_disagreement_stands_aside() {
        let strategy = TrendConfirmationStrategy::default();
        let window = window_ending_green();
        assert!(strategy
            .decide(&window, &bundle(Trend::Bullish, &[Pattern::BearishHarami]))
            .is_none());
        assert!(strategy.decide(&window, &bundle(Trend::Bearish, &[])).is_none());
        assert!(strategy
            .decide(&window, &bundle(Trend::Sideways, &[Pattern::BullishEngulfing]))
            .is_none());
    }

    #[test]
    fn test_doji_alone_is_not_confirmation() {
        let strategy = TrendConfirmationStrategy::default();
        assert!(strategy
            .decide(&window_ending_green(), &bundle(Trend::Bullish, &[Pattern::Doji]))
            .is_none());
    }

    #[test]
    fn test_fade_last_candle() {
        let strategy = TrendConfirmationStrategy::new(DirectionMode::FadeLastCandle, 21);
        let entry = strategy
            .decide(&window_ending_green(), &bundle(Trend::Bullish, &[Pattern::BullishPinBar]))
            .unwrap();
        assert_eq!(entry.direction, Direction::Put);
    }
}
