//! Single-slot mailbox for manually requested bets.
//!
//! Whatever front end is attached posts at most one pending request; a
//! newer request replaces an unconsumed older one. The bet executor
//! drains the slot at the top of every cycle.

use std::sync::Mutex;
use tracing::debug;

use crate::types::ManualBetRequest;

use super::lock;

#[derive(Default)]
pub struct ManualBetSlot {
    slot: Mutex<Option<ManualBetRequest>>,
}

impl ManualBetSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a request, replacing any request still waiting.
    pub fn post(&self, request: ManualBetRequest) {
        let mut slot = lock(&self.slot);
        if let Some(previous) = slot.replace(request) {
            debug!(
                round = previous.round_number,
                "unconsumed manual bet replaced"
            );
        }
    }

    /// Take the pending request, leaving the slot empty.
    pub fn take(&self) -> Option<ManualBetRequest> {
        lock(&self.slot).take()
    }
}
