use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::Candle;

/// Market scenario types for synthetic price generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady rise with noise
    Uptrend,
    /// Steady fall with noise
    Downtrend,
    /// Mean-reverting chop around the base price
    Sideways,
    /// Large swings (long wicks, small bodies)
    Volatile,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 4] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
    ];
}

/// Seeded random-walk price generator
pub struct SyntheticGenerator {
    rng: StdRng,
    base_price: f64,
    price: f64,
}

impl SyntheticGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64, base_price: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price,
            price: base_price,
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    /// Pick a scenario at random
    pub fn pick_scenario(&mut self) -> MarketScenario {
        MarketScenario::ALL[self.rng.gen_range(0..MarketScenario::ALL.len())]
    }

    /// Advance the walk by one step
    pub fn next_price(&mut self, scenario: MarketScenario) -> f64 {
        let p = self.price;
        let change = match scenario {
            MarketScenario::Uptrend => p * (0.0003 + self.rng.gen_range(-0.0005..0.0005)),
            MarketScenario::Downtrend => p * (-0.0003 + self.rng.gen_range(-0.0005..0.0005)),
            MarketScenario::Sideways => {
                (self.base_price - p) * 0.1 + p * self.rng.gen_range(-0.01..0.01)
            }
            MarketScenario::Volatile => p * self.rng.gen_range(-0.005..0.005),
        };

        // Keep the walk away from zero
        self.price = (p + change).max(self.base_price * 0.5);
        self.price
    }

    /// Intrabar high/low around an open-close pair
    ///
    /// Always well-formed: `high >= max(open, close)`, `low <= min(open, close)`.
    pub fn wick(&mut self, open: f64, close: f64, scenario: MarketScenario) -> (f64, f64) {
        let noise_pct = match scenario {
            MarketScenario::Volatile => 0.004,
            _ => 0.0005,
        };
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..noise_pct));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..noise_pct));
        (high, low)
    }

    /// Generate `count` consecutive bars `step_seconds` apart starting at `start`
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        start: DateTime<Utc>,
        count: usize,
        step_seconds: i64,
    ) -> Vec<Candle> {
        let mut candles = Vec::with_capacity(count);

        for i in 0..count {
            let time = start + Duration::seconds(i as i64 * step_seconds);
            let open = self.price;
            let close = self.next_price(scenario);
            let (high, low) = self.wick(open, close, scenario);
            candles.push(Candle::new(time, open, high, low, close));
        }

        candles
    }
}
