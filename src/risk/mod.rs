// Risk management module
pub mod ledger;
pub mod staking;

pub use ledger::{SessionLedger, StopThresholds, ThresholdBreach};
pub use staking::{StakeTransition, StakingConfig, StakingMode, StakingPolicy};
