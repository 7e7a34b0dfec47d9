use crate::execution::ActiveTradeGate;
use crate::models::TradeIntent;
use crate::risk::{SessionLedger, StakingPolicy, StopThresholds};
use crate::strategy::Decision;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAction {
    Execute { intent: TradeIntent },
    Skip,
}

#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub action: ExecutionAction,
    pub reason: String,
}

/// Turns an entry decision into a trade intent, or a reason not to trade
pub struct Executor {
    duration_secs: u64,
}

impl Executor {
    pub fn new(duration_secs: u64) -> Self {
        Self { duration_secs }
    }

    /// Process a decision and decide what to do
    pub fn process_decision(
        &self,
        asset: &str,
        decision: &Decision,
        gate: &ActiveTradeGate,
        staking: &StakingPolicy,
        ledger: &SessionLedger,
        thresholds: &StopThresholds,
    ) -> ExecutionDecision {
        let entry = match decision {
            Decision::Enter(entry) => entry,
            Decision::Stand(reason) => {
                return ExecutionDecision {
                    action: ExecutionAction::Skip,
                    reason: reason.to_string(),
                }
            }
        };

        // Check 1: another trade in flight
        if gate.is_held() {
            return ExecutionDecision {
                action: ExecutionAction::Skip,
                reason: "Another trade is active".to_string(),
            };
        }

        // Check 2: stop thresholds
        if let Err(breach) = thresholds.check(ledger) {
            return ExecutionDecision {
                action: ExecutionAction::Skip,
                reason: format!("Stop threshold: {}", breach),
            };
        }

        // Check 3: stake must be affordable
        let stake = staking.current_stake();
        if stake > ledger.balance {
            return ExecutionDecision {
                action: ExecutionAction::Skip,
                reason: format!(
                    "Stake {:.2} exceeds balance {:.2}",
                    stake, ledger.balance
                ),
            };
        }

        ExecutionDecision {
            action: ExecutionAction::Execute {
                intent: TradeIntent {
                    asset: asset.to_string(),
                    direction: entry.direction,
                    stake,
                    duration_secs: self.duration_secs,
                },
            },
            reason: entry.reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, TradeResult};
    use crate::risk::StakingConfig;
    use crate::strategy::{Entry, SkipReason};

    fn enter_call() -> Decision {
        Decision::Enter(Entry {
            direction: Direction::Call,
            reason: "Bullish trend confirmed by bullish_engulfing".to_string(),
        })
    }

    fn thresholds() -> StopThresholds {
        StopThresholds {
            target_profit: 1_200.0,
            stop_loss: 800.0,
        }
    }

    fn staking() -> StakingPolicy {
        StakingPolicy::new(StakingConfig {
            initial_stake: 10.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_execute_when_valid() {
        let executor = Executor::new(60);
        let decision = executor.process_decision(
            "EURUSD_otc",
            &enter_call(),
            &ActiveTradeGate::new(),
            &staking(),
            &SessionLedger::new(1_000.0),
            &thresholds(),
        );

        match decision.action {
            ExecutionAction::Execute { intent } => {
                assert_eq!(intent.asset, "EURUSD_otc");
                assert_eq!(intent.direction, Direction::Call);
                assert_eq!(intent.stake, 10.0);
                assert_eq!(intent.duration_secs, 60);
            }
            ExecutionAction::Skip => panic!("expected execute, got skip: {}", decision.reason),
        }
        assert!(decision.reason.contains("bullish_engulfing"));
    }

    #[test]
    fn test_stand_skips_with_reason() {
        let executor = Executor::new(60);
        let decision = executor.process_decision(
            "EURUSD_otc",
            &Decision::Stand(SkipReason::Volatile),
            &ActiveTradeGate::new(),
            &staking(),
            &SessionLedger::new(1_000.0),
            &thresholds(),
        );

        assert_eq!(decision.action, ExecutionAction::Skip);
        assert_eq!(decision.reason, "market too volatile");
    }

    #[test]
    fn test_skip_when_gate_held() {
        let executor = Executor::new(60);
        let gate = ActiveTradeGate::new();
        let _handle = gate.begin_trade().unwrap();

        let decision = executor.process_decision(
            "EURUSD_otc",
            &enter_call(),
            &gate,
            &staking(),
            &SessionLedger::new(1_000.0),
            &thresholds(),
        );

        assert_eq!(decision.action, ExecutionAction::Skip);
        assert!(decision.reason.contains("Another trade"));
    }

    #[test]
    fn test_threshold_blocks_execution() {
        let executor = Executor::new(60);
        let decision = executor.process_decision(
            "EURUSD_otc",
            &enter_call(),
            &ActiveTradeGate::new(),
            &staking(),
            &SessionLedger::new(790.0),
            &thresholds(),
        );

        assert_eq!(decision.action, ExecutionAction::Skip);
        assert!(decision.reason.contains("stop loss"));
    }

    #[test]
    fn test_escalated_stake_used() {
        let executor = Executor::new(60);
        let mut staking = staking();
        staking.apply(TradeResult::Loss);

        let decision = executor.process_decision(
            "EURUSD_otc",
            &enter_call(),
            &ActiveTradeGate::new(),
            &staking,
            &SessionLedger::new(1_000.0),
            &thresholds(),
        );

        assert!(matches!(
            decision.action,
            ExecutionAction::Execute { ref intent } if intent.stake == 20.0
        ));
    }

    #[test]
    fn test_unaffordable_stake_skips() {
        let executor = Executor::new(60);
        let thresholds = StopThresholds {
            target_profit: 100.0,
            stop_loss: 0.0,
        };
        let decision = executor.process_decision(
            "EURUSD_otc",
            &enter_call(),
            &ActiveTradeGate::new(),
            &staking(),
            &SessionLedger::new(5.0),
            &thresholds,
        );

        assert_eq!(decision.action, ExecutionAction::Skip);
        assert!(decision.reason.contains("exceeds balance"));
    }
}
