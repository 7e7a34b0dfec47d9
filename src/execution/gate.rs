use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::AlreadyActive;

/// Session-wide single-trade gate
///
/// At most one trade may be in flight. Acquisition is a single
/// compare-and-swap; the returned handle releases the gate when dropped,
/// so every exit path of a trade releases it.
#[derive(Debug, Clone, Default)]
pub struct ActiveTradeGate {
    held: Arc<AtomicBool>,
}

/// Proof of holding the gate. Dropping it releases the gate.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the handle is dropped"]
pub struct TradeHandle {
    held: Arc<AtomicBool>,
}

impl ActiveTradeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or fail if another trade holds it
    pub fn begin_trade(&self) -> Result<TradeHandle, AlreadyActive> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AlreadyActive)?;

        Ok(TradeHandle {
            held: Arc::clone(&self.held),
        })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl TradeHandle {
    /// Release explicitly
    pub fn release(self) {}
}

impl Drop for TradeHandle {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}
