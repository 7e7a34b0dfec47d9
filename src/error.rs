use thiserror::Error;

/// Returned by [`crate::execution::ActiveTradeGate::begin_trade`] while
/// another trade is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a trade is already active")]
pub struct AlreadyActive;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no candles available for {asset}")]
    NoCandles { asset: String },

    #[error("insufficient data: {have} bars, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("order rejected for {asset}: {reason}")]
    OrderRejected { asset: String, reason: String },

    #[error("no settlement for trade {trade_id} within {waited_secs}s")]
    SettlementTimeout { trade_id: String, waited_secs: u64 },

    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("broker error: {0}")]
    Broker(String),

    #[error(transparent)]
    AlreadyActive(#[from] AlreadyActive),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Data errors only cost the asset its turn this cycle.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Error::NoCandles { .. } | Error::InsufficientData { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
