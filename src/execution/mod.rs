// Trade gating, order submission and settlement tracking
pub mod executor;
pub mod gate;
pub mod tracker;

pub use executor::{ExecutionAction, ExecutionDecision, Executor};
pub use gate::{ActiveTradeGate, TradeHandle};
pub use tracker::{Settlement, TradeConfig, TradeTracker};
