use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::indicators::{calculate_rsi, detect_patterns, identify_trend, FibLevels, Pattern};
use crate::market::CandleWindow;
use crate::models::Trend;
use crate::{Error, Result};

/// Configuration for signal generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub short_ma_period: usize,
    pub long_ma_period: usize,
    pub rsi_period: usize,
    /// Bars used to find the swing high/low for Fibonacci levels
    pub swing_lookback: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            short_ma_period: 5,
            long_ma_period: 20,
            rsi_period: 14,
            swing_lookback: 10,
        }
    }
}

impl SignalConfig {
    /// Bars needed before every indicator in the bundle is defined
    ///
    /// # Example
    /// ```
    /// use otcbot::strategy::signals::SignalConfig;
    ///
    /// let config = SignalConfig::default();
    /// // long MA of 20 dominates RSI(14), which needs 15
    /// assert_eq!(config.min_candles(), 20);
    /// ```
    pub fn min_candles(&self) -> usize {
        self.long_ma_period
            .max(self.short_ma_period)
            .max(self.rsi_period + 1)
            .max(2)
    }
}

/// Per-asset, per-cycle indicator snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBundle {
    pub trend: Trend,
    pub rsi: f64,
    pub fib: FibLevels,
    pub patterns: BTreeSet<Pattern>,
    pub last_close: f64,
    pub prev_close: f64,
}

impl SignalBundle {
    /// Compute every signal for the window
    ///
    /// Defaulted bars are left out of every indicator.
    ///
    /// # Errors
    /// `InsufficientData` when fewer than `config.min_candles()` usable bars remain
    pub fn compute(window: &CandleWindow, config: &SignalConfig) -> Result<Self> {
        let clean;
        let window = if window.defaulted_count() > 0 {
            clean = window.without_defaulted();
            &clean
        } else {
            window
        };

        let need = config.min_candles();
        if window.len() < need {
            return Err(Error::InsufficientData {
                have: window.len(),
                need,
            });
        }

        let closes = window.closes();
        let insufficient = || Error::InsufficientData {
            have: window.len(),
            need,
        };

        let trend = identify_trend(&closes, config.short_ma_period, config.long_ma_period)
            .ok_or_else(insufficient)?;
        let rsi = calculate_rsi(&closes, config.rsi_period).ok_or_else(insufficient)?;
        let fib = FibLevels::from_candles(window.recent(config.swing_lookback.max(1)))
            .ok_or_else(insufficient)?;
        let patterns = detect_patterns(window.candles());

        let last_close = closes[closes.len() - 1];
        let prev_close = closes[closes.len() - 2];

        tracing::debug!(
            asset = %window.asset(),
            "Indicators: trend={:?}, RSI={:.1}, swing={:.5}/{:.5}, patterns={:?}",
            trend,
            rsi,
            fib.swing_high,
            fib.swing_low,
            patterns.iter().map(Pattern::name).collect::<Vec<_>>()
        );

        Ok(Self {
            trend,
            rsi,
            fib,
            patterns,
            last_close,
            prev_close,
        })
    }

    pub fn has_bullish_pattern(&self) -> bool {
        self.patterns.iter().any(Pattern::is_bullish)
    }

    pub fn has_bearish_pattern(&self) -> bool {
        self.patterns.iter().any(Pattern::is_bearish)
    }
}
