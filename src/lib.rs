// Core modules
pub mod broker;
pub mod clock;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod market;
pub mod models;
pub mod risk;
pub mod session;
pub mod settings;
pub mod strategy;

// Re-export commonly used types
pub use broker::BrokerClient;
pub use error::{AlreadyActive, Error, Result};
pub use models::*;
pub use settings::Settings;
pub use strategy::EntryStrategy;
