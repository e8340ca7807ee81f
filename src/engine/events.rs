//! Engine event channel.
//!
//! The loops publish telemetry and human-readable status lines to a
//! bounded channel. Whatever presentation consumer is attached (a TUI, a
//! log drain, nothing at all) reads the other end; the engine never
//! blocks on it and keeps running if events are dropped.

use chrono::Local;
use solana_sdk::signature::Signature;
use tokio::sync::mpsc;
use tracing::info;

use crate::types::{Direction, RoundSnapshot};

/// Default channel capacity. Telemetry is cheap to drop; a consumer that
/// falls this far behind only loses stale snapshots.
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Timestamped human-readable status line.
    Status(String),
    /// Telemetry snapshot from the round monitor.
    RoundUpdate(RoundSnapshot),
    /// A bet submission is in flight (`true`) or finished (`false`).
    BetPlacing(bool),
    /// A bet was placed this session.
    BetPlaced {
        round_number: u64,
        direction: Direction,
        amount: f64,
        signature: Signature,
    },
    /// A reward claim settled.
    ClaimSettled {
        round_number: u64,
        payout: f64,
        signature: Signature,
    },
}

/// Cloneable publishing handle for [`EngineEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<EngineEvent>,
}

impl EventBus {
    /// Create a bus and the receiving end for a consumer.
    pub fn channel() -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        (Self { tx }, rx)
    }

    /// Publish an event, dropping it if the channel is full or closed.
    pub fn publish(&self, event: EngineEvent) {
        let _ = self.tx.try_send(event);
    }

    /// Publish a timestamped status line, mirrored to the log.
    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        let line = format!("[{}] {message}", Local::now().format("%H:%M:%S"));
        self.publish(EngineEvent::Status(line));
    }
}
