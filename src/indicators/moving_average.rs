use crate::models::Trend;

/// Calculate Simple Moving Average (SMA) over the trailing `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Classify trend from a short/long SMA cross
///
/// Bullish when short > long, Bearish when short < long, Sideways on a tie.
/// Returns None if there are fewer prices than the long period.
pub fn identify_trend(prices: &[f64], short_period: usize, long_period: usize) -> Option<Trend> {
    let short_ma = calculate_sma(prices, short_period)?;
    let long_ma = calculate_sma(prices, long_period)?;

    let trend = if short_ma > long_ma {
        Trend::Bullish
    } else if short_ma < long_ma {
        Trend::Bearish
    } else {
        Trend::Sideways
    };

    Some(trend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let prices = vec![100.0, 102.0, 104.0, 106.0, 108.0];
        let sma = calculate_sma(&prices, 5);
        assert_eq!(sma, Some(104.0));
    }

    #[test]
    fn test_sma_uses_trailing_window() {
        let prices = vec![1.0, 1.0, 1.0, 10.0, 20.0];
        assert_eq!(calculate_sma(&prices, 2), Some(15.0));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let prices = vec![100.0, 102.0];
        let sma = calculate_sma(&prices, 5);
        assert!(sma.is_none());
    }

    #[test]
    fn test_trend_bullish() {
        let prices: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        assert_eq!(identify_trend(&prices, 5, 20), Some(Trend::Bullish));
    }

    #[test]
    fn test_trend_bearish() {
        let prices: Vec<f64> = (0..25).map(|i| 100.0 - i as f64).collect();
        assert_eq!(identify_trend(&prices, 5, 20), Some(Trend::Bearish));
    }

    #[test]
    fn test_trend_tie_is_sideways() {
        let prices = vec![50.0; 25];
        assert_eq!(identify_trend(&prices, 5, 20), Some(Trend::Sideways));
    }

    #[test]
    fn test_trend_needs_long_period() {
        let prices = vec![50.0; 10];
        assert!(identify_trend(&prices, 5, 20).is_none());
    }
}
