use crate::models::Candle;

/// Bounded, chronological candle history for one asset
///
/// Most recent bar last. Rebuilt every scan cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleWindow {
    asset: String,
    candles: Vec<Candle>,
    max_candles: usize,
}

impl CandleWindow {
    /// Create an empty window
    ///
    /// # Arguments
    /// * `max_candles` - Maximum number of candles to keep
    pub fn new(asset: impl Into<String>, max_candles: usize) -> Self {
        Self {
            asset: asset.into(),
            candles: Vec::with_capacity(max_candles),
            max_candles,
        }
    }

    /// Build a window from chronological candles, keeping the newest `max_candles`
    pub fn from_candles(asset: impl Into<String>, candles: Vec<Candle>, max_candles: usize) -> Self {
        let mut window = Self::new(asset, max_candles);
        for candle in candles {
            window.push(candle);
        }
        window
    }

    /// Append a candle, evicting the oldest when full
    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);

        if self.candles.len() > self.max_candles {
            let excess = self.candles.len() - self.max_candles;
            self.candles.drain(..excess);
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// The N most recent candles (fewer if the window is shorter)
    pub fn recent(&self, n: usize) -> &[Candle] {
        let start = self.candles.len().saturating_sub(n);
        &self.candles[start..]
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn max_candles(&self) -> usize {
        self.max_candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Number of bars flagged as defaulted (stale/unreliable)
    pub fn defaulted_count(&self) -> usize {
        self.candles.iter().filter(|c| c.defaulted).count()
    }

    /// Copy of the window with defaulted bars dropped
    pub fn without_defaulted(&self) -> CandleWindow {
        Self {
            asset: self.asset.clone(),
            candles: self.candles.iter().filter(|c| !c.defaulted).cloned().collect(),
            max_candles: self.max_candles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_candle(price: f64) -> Candle {
        Candle::new(Utc::now(), price, price, price, price)
    }

    #[test]
    fn test_new_window() {
        let window = CandleWindow::new("EURUSD_otc", 100);
        assert_eq!(window.max_candles(), 100);
        assert_eq!(window.asset(), "EURUSD_otc");
        assert!(window.is_empty());
        assert!(window.latest().is_none());
    }

    #[test]
    fn test_push_keeps_order() {
        let mut window = CandleWindow::new("EURUSD_otc", 100);
        window.push(create_test_candle(100.0));
        window.push(create_test_candle(101.0));
        window.push(create_test_candle(102.0));

        let candles = window.candles();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].close, 100.0);
        assert_eq!(window.latest().unwrap().close, 102.0);
    }

    #[test]
    fn test_max_candles_limit() {
        let mut window = CandleWindow::new("EURUSD_otc", 5);

        for i in 0..10 {
            window.push(create_test_candle(100.0 + i as f64));
        }

        let candles = window.candles();
        assert_eq!(candles.len(), 5); // Should only keep last 5

        // Should have prices 105-109
        assert_eq!(candles[0].close, 105.0);
        assert_eq!(candles[4].close, 109.0);
    }

    #[test]
    fn test_recent() {
        let candles: Vec<Candle> = (0..10).map(|i| create_test_candle(100.0 + i as f64)).collect();
        let window = CandleWindow::from_candles("EURUSD_otc", candles, 100);

        let recent = window.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].close, 107.0); // Last 3: 107, 108, 109
        assert_eq!(recent[2].close, 109.0);

        assert_eq!(window.recent(50).len(), 10);
    }

    #[test]
    fn test_closes_and_defaulted() {
        let mut stale = create_test_candle(0.0);
        stale.defaulted = true;
        let window = CandleWindow::from_candles(
            "EURUSD_otc",
            vec![create_test_candle(1.0), stale, create_test_candle(2.0)],
            10,
        );
        assert_eq!(window.closes(), vec![1.0, 0.0, 2.0]);
        assert_eq!(window.defaulted_count(), 1);

        let clean = window.without_defaulted();
        assert_eq!(clean.closes(), vec![1.0, 2.0]);
        assert_eq!(clean.defaulted_count(), 0);
        assert_eq!(clean.asset(), "EURUSD_otc");
        assert_eq!(clean.max_candles(), 10);
    }
}
