use serde::{Deserialize, Serialize};

use crate::models::TradeResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakingMode {
    /// Same stake every trade
    Fixed,
    /// Multiply on loss up to `max_stage` levels, reset on win or cap
    #[default]
    Martingale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingConfig {
    pub mode: StakingMode,
    pub initial_stake: f64,
    pub factor: f64,
    /// Number of stake levels including the base stake
    pub max_stage: u32,
    /// Re-enter the same asset and direction right after an escalating loss
    pub recover_immediately: bool,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            mode: StakingMode::Martingale,
            initial_stake: 1.0,
            factor: 2.0,
            max_stage: 2,
            recover_immediately: false,
        }
    }
}

/// What a settled outcome did to the stake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeTransition {
    Reset,
    Escalated,
    Unchanged,
}

/// Bounded martingale state: `(current_stake, stage)`
///
/// Stage runs `0..max_stage`. A loss on the last level resets instead of
/// escalating further.
///
/// `max_stage` counts stake levels, not escalations. With stake 100,
/// factor 2 and `max_stage = 2` the losses `[L, L, L]` stake
/// `[100, 200, 100]`. Treating `max_stage` as the highest reachable stage
/// index would instead allow `[100, 200, 400]`; that reading is not used,
/// so the largest stake is `initial_stake * factor^(max_stage - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StakingPolicy {
    config: StakingConfig,
    current_stake: f64,
    stage: u32,
}

impl StakingPolicy {
    pub fn new(config: StakingConfig) -> Self {
        Self {
            current_stake: config.initial_stake,
            stage: 0,
            config,
        }
    }

    pub fn config(&self) -> &StakingConfig {
        &self.config
    }

    pub fn current_stake(&self) -> f64 {
        self.current_stake
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn reset(&mut self) {
        self.current_stake = self.config.initial_stake;
        self.stage = 0;
    }

    /// Apply one settled outcome
    pub fn apply(&mut self, result: TradeResult) -> StakeTransition {
        let transition = match (self.config.mode, result) {
            (_, TradeResult::Undetermined) => StakeTransition::Unchanged,
            (StakingMode::Fixed, _) => StakeTransition::Unchanged,
            (StakingMode::Martingale, TradeResult::Win) => {
                self.reset();
                StakeTransition::Reset
            }
            (StakingMode::Martingale, TradeResult::Loss) => {
                if self.stage + 1 < self.config.max_stage {
                    self.current_stake *= self.config.factor;
                    self.stage += 1;
                    StakeTransition::Escalated
                } else {
                    self.reset();
                    StakeTransition::Reset
                }
            }
        };

        tracing::debug!(
            stake = self.current_stake,
            stage = self.stage,
            "Staking after {:?}: {:?}",
            result,
            transition
        );

        transition
    }

    /// Stakes placed for each trade in an outcome history, from a fresh state
    ///
    /// # Example
    /// ```
    /// use otcbot::risk::{StakingConfig, StakingPolicy};
    /// use otcbot::TradeResult::Loss;
    ///
    /// let config = StakingConfig { initial_stake: 100.0, ..Default::default() };
    /// assert_eq!(StakingPolicy::simulate(&config, &[Loss, Loss, Loss]), vec![100.0, 200.0, 100.0]);
    /// ```
    pub fn simulate(config: &StakingConfig, outcomes: &[TradeResult]) -> Vec<f64> {
        let mut policy = Self::new(config.clone());
        outcomes
            .iter()
            .map(|&result| {
                let stake = policy.current_stake();
                policy.apply(result);
                stake
            })
            .collect()
    }
}
