use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CandleValidator, CandleWindow};
use crate::models::Candle;
use crate::{Error, Result};

/// Candle or tick record as delivered by the broker
///
/// Fields are optional because the feed is not trusted to send all of them.
/// A tick is a record with only `time` and `close` (or all four prices equal).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
}

impl RawCandle {
    pub fn new(time: f64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time: Some(time),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
        }
    }

    pub fn tick(time: f64, price: f64) -> Self {
        Self::new(time, price, price, price, price)
    }
}

/// Candle window shape for each scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Bar duration; bars start on multiples of this from the epoch
    pub bar_seconds: u64,
    /// History requested from the broker per scan
    pub lookback_seconds: u64,
    /// Bars kept in the window
    pub window_size: usize,
    /// Fewer bars than this is an insufficient-data skip
    pub min_bars: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            bar_seconds: 60,
            lookback_seconds: 10_800, // 3 hours of 1 minute bars
            window_size: 180,
            min_bars: 21,
        }
    }
}

/// One normalised record before bucketing
struct Normalized {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    defaulted: bool,
}

impl Normalized {
    fn from_raw(raw: &RawCandle) -> Self {
        let defaulted = raw.time.is_none()
            || raw.open.is_none()
            || raw.high.is_none()
            || raw.low.is_none()
            || raw.close.is_none();

        Self {
            time: raw.time.unwrap_or(0.0).floor() as i64,
            open: raw.open.unwrap_or(0.0),
            high: raw.high.unwrap_or(0.0),
            low: raw.low.unwrap_or(0.0),
            close: raw.close.unwrap_or(0.0),
            defaulted,
        }
    }
}

/// Builds clock-aligned OHLC bars from raw broker records
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    config: MarketConfig,
    validator: CandleValidator,
}

impl CandleAggregator {
    pub fn new(config: MarketConfig) -> Self {
        Self {
            config,
            validator: CandleValidator::new(),
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Aggregate raw records into a window of at most `window_size` bars
    ///
    /// Records with missing fields are zero-filled and the resulting bar is
    /// flagged `defaulted`, as is any bar failing validation.
    ///
    /// # Errors
    /// * `NoCandles` when the broker returned nothing
    /// * `InsufficientData` when fewer than `min_bars` bars result
    pub fn aggregate(&self, asset: &str, raw: &[RawCandle]) -> Result<CandleWindow> {
        if raw.is_empty() {
            return Err(Error::NoCandles {
                asset: asset.to_string(),
            });
        }

        let buckets = self.bucket_into_bars(raw);
        let mut window = CandleWindow::new(asset, self.config.window_size);

        for (bucket_start, records) in buckets {
            window.push(self.synthesize_bar(bucket_start, &records));
        }

        if window.len() < self.config.min_bars {
            return Err(Error::InsufficientData {
                have: window.len(),
                need: self.config.min_bars,
            });
        }

        if window.defaulted_count() > 0 {
            tracing::warn!(
                asset = %asset,
                defaulted = window.defaulted_count(),
                "Window contains defaulted bars; pattern checks will skip them"
            );
        }

        Ok(window)
    }

    /// Bucket records into bars aligned to `bar_seconds` boundaries
    fn bucket_into_bars(&self, raw: &[RawCandle]) -> BTreeMap<i64, Vec<Normalized>> {
        let bar = self.config.bar_seconds.max(1) as i64;
        let mut records: Vec<Normalized> = raw.iter().map(Normalized::from_raw).collect();

        // Stable: records sharing a timestamp keep arrival order
        records.sort_by_key(|r| r.time);

        let mut buckets: BTreeMap<i64, Vec<Normalized>> = BTreeMap::new();
        for record in records {
            let bucket = record.time.div_euclid(bar) * bar;
            buckets.entry(bucket).or_default().push(record);
        }

        buckets
    }

    /// Collapse one bucket into a bar: first open, last close, extreme high/low
    fn synthesize_bar(&self, bucket_start: i64, records: &[Normalized]) -> Candle {
        let first = &records[0];
        let last = &records[records.len() - 1];

        let high = records.iter().map(|r| r.high).fold(f64::MIN, f64::max);
        let low = records.iter().map(|r| r.low).fold(f64::MAX, f64::min);

        let time: DateTime<Utc> = DateTime::from_timestamp(bucket_start, 0).unwrap_or_default();
        let mut candle = Candle::new(time, first.open, high, low, last.close);

        let any_defaulted = records.iter().any(|r| r.defaulted);
        if any_defaulted {
            candle.defaulted = true;
        } else if let Err(issue) = self.validator.validate(&candle) {
            tracing::debug!("Flagging bar at {} as defaulted: {}", time, issue);
            candle.defaulted = true;
        }

        candle
    }
}
