// Technical indicators module
// Implements MA trend, RSI, Fibonacci levels, candlestick patterns and guards

pub mod fibonacci;
pub mod moving_average;
pub mod patterns;
pub mod rsi;
pub mod volatility;

pub use fibonacci::{FibLevels, FIB_RATIOS};
pub use moving_average::{calculate_sma, identify_trend};
pub use patterns::{detect_patterns, is_doji, Pattern};
pub use rsi::calculate_rsi;
pub use volatility::{is_market_volatile, is_opposing_streak};
