use super::{signals::SignalBundle, Entry, EntryStrategy};
use crate::market::CandleWindow;
use crate::models::Direction;

/// Lower and upper bounds of the continuation band, as retracement ratios
const BAND_DEEP: f64 = 0.618;
const BAND_SHALLOW: f64 = 0.5;
const REVERSAL_RATIO: f64 = 0.786;

/// Fibonacci retracement strategy
///
/// - Price inside the 50%-61.8% band: follow the last close-to-close move.
/// - Otherwise, price at or above the 78.6% level: mean reversion, Call when
///   price sits nearer the swing low, Put when nearer the swing high.
#[derive(Debug, Clone, Default)]
pub struct RetracementStrategy {
    min_candles: usize,
}

impl RetracementStrategy {
    pub fn new(min_candles: usize) -> Self {
        Self { min_candles }
    }
}

impl EntryStrategy for RetracementStrategy {
    fn decide(&self, _window: &CandleWindow, signals: &SignalBundle) -> Option<Entry> {
        let fib = &signals.fib;
        if fib.swing_high <= fib.swing_low {
            return None;
        }

        let price = signals.last_close;
        let prev = signals.prev_close;
        let band_low = fib.level(BAND_DEEP);
        let band_high = fib.level(BAND_SHALLOW);

        if (band_low..=band_high).contains(&price) {
            let direction = if price > prev {
                Direction::Call
            } else if price < prev {
                Direction::Put
            } else {
                return None;
            };
            return Some(Entry {
                direction,
                reason: format!(
                    "Price {:.5} in 50-61.8% band [{:.5}, {:.5}], continuation",
                    price, band_low, band_high
                ),
            });
        }

        let reversal_level = fib.level(REVERSAL_RATIO);
        if price >= reversal_level {
            let to_low = price - fib.swing_low;
            let to_high = fib.swing_high - price;
            let direction = if to_low < to_high {
                Direction::Call
            } else {
                Direction::Put
            };
            return Some(Entry {
                direction,
                reason: format!(
                    "Price {:.5} above 78.6% level {:.5}, reverting",
                    price, reversal_level
                ),
            });
        }

        None
    }

    fn name(&self) -> &str {
        "FibRetracement"
    }

    fn min_candles_required(&self) -> usize {
        self.min_candles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::FibLevels;
    use crate::models::Trend;
    use std::collections::BTreeSet;

    // Swing 110 / 100: level(0.5)=105, level(0.618)=103.82, level(0.786)=102.14
    fn bundle(last_close: f64, prev_close: f64) -> SignalBundle {
        SignalBundle {
            trend: Trend::Sideways,
            rsi: 50.0,
            fib: FibLevels::from_swing(110.0, 100.0),
            patterns: BTreeSet::new(),
            last_close,
            prev_close,
        }
    }

    fn decide(last: f64, prev: f64) -> Option<Direction> {
        let window = CandleWindow::new("X", 10);
        RetracementStrategy::new(12)
            .decide(&window, &bundle(last, prev))
            .map(|e| e.direction)
    }

    #[test]
    fn test_band_rising_calls() {
        assert_eq!(decide(104.5, 104.0), Some(Direction::Call));
    }

    #[test]
    fn test_band_falling_puts() {
        assert_eq!(decide(104.0, 104.5), Some(Direction::Put));
    }

    #[test]
    fn test_band_flat_stands_aside() {
        assert_eq!(decide(104.0, 104.0), None);
    }

    #[test]
    fn test_band_edges_inclusive() {
        assert_eq!(decide(105.0, 104.0), Some(Direction::Call));
    }

    #[test]
    fn test_reversal_near_high_puts() {
        assert_eq!(decide(109.0, 108.0), Some(Direction::Put));
    }

    #[test]
    fn test_reversal_near_low_calls() {
        // Between 78.6% level and the band, nearer the low
        assert_eq!(decide(103.0, 103.5), Some(Direction::Call));
    }

    #[test]
    fn test_deep_retrace_stands_aside() {
        assert_eq!(decide(101.0, 101.5), None);
    }

    #[test]
    fn test_flat_swing_stands_aside() {
        let window = CandleWindow::new("X", 10);
        let mut flat = bundle(100.0, 99.0);
        flat.fib = FibLevels::from_swing(100.0, 100.0);
        assert!(RetracementStrategy::default().decide(&window, &flat).is_none());
    }
}
