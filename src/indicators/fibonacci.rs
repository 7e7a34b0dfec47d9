//! Fibonacci retracement levels
//!
//! level(r) = high - (high - low) * r, so the levels fall as the ratio grows.

use crate::models::Candle;

pub const FIB_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];

#[derive(Debug, Clone, PartialEq)]
pub struct FibLevels {
    pub swing_high: f64,
    pub swing_low: f64,
    /// (ratio, price) pairs in ascending ratio order
    pub levels: Vec<(f64, f64)>,
}

impl FibLevels {
    pub fn from_swing(swing_high: f64, swing_low: f64) -> Self {
        let diff = swing_high - swing_low;
        let levels = FIB_RATIOS
            .iter()
            .map(|&r| (r, swing_high - diff * r))
            .collect();

        Self {
            swing_high,
            swing_low,
            levels,
        }
    }

    /// Swing high/low over the window (max high, min low)
    pub fn from_candles(candles: &[Candle]) -> Option<Self> {
        if candles.is_empty() {
            return None;
        }

        let swing_high = candles.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let swing_low = candles.iter().map(|c| c.low).fold(f64::MAX, f64::min);

        Some(Self::from_swing(swing_high, swing_low))
    }

    /// Price at any retracement ratio
    pub fn level(&self, ratio: f64) -> f64 {
        self.swing_high - (self.swing_high - self.swing_low) * ratio
    }
}
