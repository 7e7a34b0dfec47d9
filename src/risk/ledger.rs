use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{TradeOutcome, TradeResult};

/// Balance levels that end the session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopThresholds {
    /// Stop once balance reaches this level
    pub target_profit: f64,
    /// Stop once balance falls to this level
    pub stop_loss: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdBreach {
    TargetProfit { balance: f64 },
    StopLoss { balance: f64 },
}

impl fmt::Display for ThresholdBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdBreach::TargetProfit { balance } => {
                write!(f, "target profit reached (balance {:.2})", balance)
            }
            ThresholdBreach::StopLoss { balance } => {
                write!(f, "stop loss hit (balance {:.2})", balance)
            }
        }
    }
}

impl StopThresholds {
    pub fn check(&self, ledger: &SessionLedger) -> Result<(), ThresholdBreach> {
        let balance = ledger.balance;

        if balance >= self.target_profit {
            return Err(ThresholdBreach::TargetProfit { balance });
        }

        if balance <= self.stop_loss {
            return Err(ThresholdBreach::StopLoss { balance });
        }

        Ok(())
    }
}

/// Session-wide trade counters and balance
///
/// Written only by the trade tracker, one settlement at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLedger {
    pub total_trades: u32,
    pub wins: u32,
    pub losses: u32,
    pub undetermined: u32,
    pub starting_balance: f64,
    pub balance: f64,
    pub realized_pnl: f64,
}

impl SessionLedger {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            total_trades: 0,
            wins: 0,
            losses: 0,
            undetermined: 0,
            starting_balance,
            balance: starting_balance,
            realized_pnl: 0.0,
        }
    }

    /// Count an outcome and adjust the balance by its profit
    pub fn record(&mut self, outcome: &TradeOutcome) {
        self.total_trades += 1;
        match outcome.result {
            TradeResult::Win => self.wins += 1,
            TradeResult::Loss => self.losses += 1,
            TradeResult::Undetermined => self.undetermined += 1,
        }
        self.realized_pnl += outcome.profit;
        self.balance += outcome.profit;
    }

    /// Replace the tracked balance with the broker's figure
    pub fn sync_balance(&mut self, balance: f64) {
        self.balance = balance;
    }

    pub fn win_rate(&self) -> f64 {
        let decided = self.wins + self.losses;
        if decided == 0 {
            return 0.0;
        }
        self.wins as f64 / decided as f64
    }
}

impl fmt::Display for SessionLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trades {} | wins {} | losses {} | undetermined {} | win rate {:.1}% | balance {:.2} ({:+.2})",
            self.total_trades,
            self.wins,
            self.losses,
            self.undetermined,
            self.win_rate() * 100.0,
            self.balance,
            self.balance - self.starting_balance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::Utc;

    fn outcome(result: TradeResult, profit: f64) -> TradeOutcome {
        TradeOutcome {
            trade_id: Some("t-1".to_string()),
            asset: "EURUSD_otc".to_string(),
            direction: Direction::Call,
            stake: 10.0,
            result,
            profit,
            settled_at: Utc::now(),
        }
    }

    fn thresholds() -> StopThresholds {
        StopThresholds {
            target_profit: 1100.0,
            stop_loss: 900.0,
        }
    }

    #[test]
    fn test_record_counts() {
        let mut ledger = SessionLedger::new(1000.0);
        ledger.record(&outcome(TradeResult::Win, 8.5));
        ledger.record(&outcome(TradeResult::Loss, -10.0));
        ledger.record(&outcome(TradeResult::Undetermined, 0.0));

        assert_eq!(ledger.total_trades, 3);
        assert_eq!(ledger.wins, 1);
        assert_eq!(ledger.losses, 1);
        assert_eq!(ledger.undetermined, 1);
        assert!((ledger.balance - 998.5).abs() < 1e-9);
        assert!((ledger.realized_pnl + 1.5).abs() < 1e-9);
        assert_eq!(ledger.win_rate(), 0.5);
    }

    #[test]
    fn test_within_thresholds() {
        let ledger = SessionLedger::new(1000.0);
        assert!(thresholds().check(&ledger).is_ok());
    }

    #[test]
    fn test_target_profit_breach() {
        let mut ledger = SessionLedger::new(1000.0);
        ledger.sync_balance(1100.0);
        assert_eq!(
            thresholds().check(&ledger),
            Err(ThresholdBreach::TargetProfit { balance: 1100.0 })
        );
    }

    #[test]
    fn test_stop_loss_breach() {
        let mut ledger = SessionLedger::new(1000.0);
        ledger.record(&outcome(TradeResult::Loss, -120.0));
        assert_eq!(
            thresholds().check(&ledger),
            Err(ThresholdBreach::StopLoss { balance: 880.0 })
        );
    }

    #[test]
    fn test_summary_line() {
        let mut ledger = SessionLedger::new(100.0);
        ledger.record(&outcome(TradeResult::Win, 9.0));
        assert_eq!(
            ledger.to_string(),
            "trades 1 | wins 1 | losses 0 | undetermined 0 | win rate 100.0% | balance 109.00 (+9.00)"
        );
    }
}
