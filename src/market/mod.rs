// Candle aggregation: raw broker records -> validated, clock-aligned windows
pub mod aggregator;
pub mod validator;
pub mod window;

pub use aggregator::{CandleAggregator, MarketConfig, RawCandle};
pub use validator::{CandleIssue, CandleValidator};
pub use window::CandleWindow;
