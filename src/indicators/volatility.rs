use crate::models::{Candle, Direction};

/// Volatile when the mean high-low range over the last `lookback` bars is
/// more than twice the mean body size
///
/// Returns false when there are fewer than `lookback` bars.
pub fn is_market_volatile(candles: &[Candle], lookback: usize) -> bool {
    if lookback == 0 || candles.len() < lookback {
        return false;
    }

    let recent = &candles[candles.len() - lookback..];
    let avg_body = recent.iter().map(Candle::body).sum::<f64>() / lookback as f64;
    let avg_wick = recent.iter().map(Candle::range).sum::<f64>() / lookback as f64;

    avg_wick > 2.0 * avg_body
}

/// Momentum-exhaustion filter
///
/// True when the last `streak` bars all run against `direction`:
/// all red for a Call, all green for a Put.
pub fn is_opposing_streak(candles: &[Candle], direction: Direction, streak: usize) -> bool {
    if streak == 0 || candles.len() < streak {
        return false;
    }

    let recent = &candles[candles.len() - streak..];
    match direction {
        Direction::Call => recent.iter().all(Candle::is_bearish),
        Direction::Put => recent.iter().all(Candle::is_bullish),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(Utc::now(), open, high, low, close)
    }

    #[test]
    fn test_volatile_long_wicks() {
        // body 1, range 5 on every bar
        let candles = vec![bar(10.0, 13.0, 8.0, 11.0); 5];
        assert!(is_market_volatile(&candles, 5));
    }

    #[test]
    fn test_calm_full_bodies() {
        // body 2, range 3
        let candles = vec![bar(10.0, 12.5, 9.5, 12.0); 5];
        assert!(!is_market_volatile(&candles, 5));
    }

    #[test]
    fn test_volatility_needs_lookback() {
        let candles = vec![bar(10.0, 13.0, 8.0, 11.0); 4];
        assert!(!is_market_volatile(&candles, 5));
    }

    #[test]
    fn test_volatility_only_reads_trailing_bars() {
        let mut candles = vec![bar(10.0, 20.0, 0.0, 10.5); 10];
        candles.extend(vec![bar(10.0, 12.5, 9.5, 12.0); 5]);
        assert!(!is_market_volatile(&candles, 5));
    }

    #[test]
    fn test_red_streak_blocks_call() {
        let candles = vec![bar(11.0, 11.0, 10.0, 10.0); 3];
        assert!(is_opposing_streak(&candles, Direction::Call, 3));
        assert!(!is_opposing_streak(&candles, Direction::Put, 3));
    }

    #[test]
    fn test_green_streak_blocks_put() {
        let candles = vec![bar(10.0, 11.0, 10.0, 11.0); 3];
        assert!(is_opposing_streak(&candles, Direction::Put, 3));
        assert!(!is_opposing_streak(&candles, Direction::Call, 3));
    }

    #[test]
    fn test_mixed_colors_pass() {
        let candles = vec![
            bar(10.0, 11.0, 10.0, 11.0),
            bar(11.0, 11.0, 10.0, 10.0),
            bar(10.0, 11.0, 10.0, 11.0),
        ];
        assert!(!is_opposing_streak(&candles, Direction::Call, 3));
        assert!(!is_opposing_streak(&candles, Direction::Put, 3));
    }

    #[test]
    fn test_streak_needs_enough_bars() {
        let candles = vec![bar(11.0, 11.0, 10.0, 10.0); 2];
        assert!(!is_opposing_streak(&candles, Direction::Call, 3));
    }
}
