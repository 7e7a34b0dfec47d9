use thiserror::Error;

use crate::models::Candle;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleIssue {
    #[error("invalid {field} price: {value}")]
    NonPositivePrice { field: &'static str, value: f64 },

    #[error("high ({high}) is less than low ({low})")]
    HighBelowLow { high: f64, low: f64 },

    #[error("high ({high}) is below the body top ({body_top})")]
    HighBelowBody { high: f64, body_top: f64 },

    #[error("low ({low}) is above the body bottom ({body_bottom})")]
    LowAboveBody { low: f64, body_bottom: f64 },
}

/// Validates OHLC candle data for sanity and correctness
#[derive(Debug, Clone, Copy, Default)]
pub struct CandleValidator;

impl CandleValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a candle for correctness
    pub fn validate(&self, candle: &Candle) -> Result<(), CandleIssue> {
        self.validate_prices(candle)?;
        self.validate_ohlc_relationship(candle)?;
        Ok(())
    }

    /// Validate that all prices are positive
    fn validate_prices(&self, candle: &Candle) -> Result<(), CandleIssue> {
        let fields = [
            ("open", candle.open),
            ("high", candle.high),
            ("low", candle.low),
            ("close", candle.close),
        ];

        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(CandleIssue::NonPositivePrice { field, value });
            }
        }
        Ok(())
    }

    /// Validate OHLC relationships (high >= low, etc.)
    fn validate_ohlc_relationship(&self, candle: &Candle) -> Result<(), CandleIssue> {
        if candle.high < candle.low {
            return Err(CandleIssue::HighBelowLow {
                high: candle.high,
                low: candle.low,
            });
        }

        let body_top = candle.open.max(candle.close);
        if candle.high < body_top {
            return Err(CandleIssue::HighBelowBody {
                high: candle.high,
                body_top,
            });
        }

        let body_bottom = candle.open.min(candle.close);
        if candle.low > body_bottom {
            return Err(CandleIssue::LowAboveBody {
                low: candle.low,
                body_bottom,
            });
        }

        Ok(())
    }
}
