use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OHLC bar for one asset
///
/// `defaulted` marks bars built from records with missing fields (zero-filled)
/// or that break the OHLC invariant. Pattern checks skip such bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub defaulted: bool,
}

impl Candle {
    pub fn new(time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            defaulted: false,
        }
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full high-low range
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Green candle
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Red candle
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// `high >= max(open, close)` and `low <= min(open, close)`
    pub fn is_well_formed(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }
}

/// Trade direction as the broker understands it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Call,
    Put,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Call => "call",
            Direction::Put => "put",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moving-average trend classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Sideways,
}

/// An order the trade gate may submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub asset: String,
    pub direction: Direction,
    pub stake: f64,
    pub duration_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeResult {
    Win,
    Loss,
    /// Doji, missing trade id, or no result before the settlement deadline
    Undetermined,
}

/// Terminal record of a settled (or force-resolved) trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub trade_id: Option<String>,
    pub asset: String,
    pub direction: Direction,
    pub stake: f64,
    pub result: TradeResult,
    pub profit: f64,
    pub settled_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(Utc::now(), open, high, low, close)
    }

    #[test]
    fn test_candle_geometry() {
        let c = candle(10.0, 12.0, 7.0, 11.0);
        assert_eq!(c.body(), 1.0);
        assert_eq!(c.range(), 5.0);
        assert_eq!(c.upper_wick(), 1.0);
        assert_eq!(c.lower_wick(), 3.0);
        assert!(c.is_bullish());
        assert!(!c.is_bearish());
        assert!(c.is_well_formed());
    }

    #[test]
    fn test_malformed_candle() {
        // High below close
        let c = candle(10.0, 10.5, 9.0, 11.0);
        assert!(!c.is_well_formed());
    }

    #[test]
    fn test_direction_serialization() {
        assert_eq!(serde_json::to_string(&Direction::Call).unwrap(), "\"call\"");
        assert_eq!(Direction::Put.to_string(), "put");
    }
}
