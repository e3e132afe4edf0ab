//! Per-turn countdowns bounding how long an assistant turn may stay pending.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::controller::TurnEvent;
use crate::turn::TurnId;

/// Default bound before a pending turn is forced into failure.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(30);

/// Arms one countdown per pending assistant turn and cancels it when the
/// turn resolves first. Cancellation aborts the sleep task, and any firing
/// that slips through the abort window is neutralized downstream by the
/// store's resolve-once check.
pub struct TimeoutGuard {
    timeout: Duration,
    events: UnboundedSender<TurnEvent>,
    armed: HashMap<TurnId, AbortHandle>,
}

impl TimeoutGuard {
    pub fn new(timeout: Duration, events: UnboundedSender<TurnEvent>) -> Self {
        Self {
            timeout,
            events,
            armed: HashMap::new(),
        }
    }

    /// Start the countdown for a turn entering the pending state. Countdowns
    /// for other turns are unaffected.
    pub fn arm(&mut self, turn: TurnId) {
        if let Some(previous) = self.armed.remove(&turn) {
            previous.abort();
        }

        let events = self.events.clone();
        let timeout = self.timeout;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            debug!(%turn, "countdown elapsed before resolution");
            let _ = events.send(TurnEvent::TimedOut { turn });
        });
        self.armed.insert(turn, handle.abort_handle());
    }

    /// Discard the countdown for a turn that reached a terminal state.
    pub fn cancel(&mut self, turn: TurnId) {
        if let Some(handle) = self.armed.remove(&turn) {
            handle.abort();
        }
    }

    pub fn is_armed(&self, turn: TurnId) -> bool {
        self.armed.contains_key(&turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn countdowns_are_independent_per_turn() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut guard = TimeoutGuard::new(Duration::from_secs(30), tx);

        let first = TurnId(1);
        let second = TurnId(2);
        guard.arm(first);
        guard.arm(second);
        assert!(guard.is_armed(first));
        assert!(guard.is_armed(second));

        // Cancelling one countdown leaves the other running.
        guard.cancel(first);
        assert!(!guard.is_armed(first));
        assert!(guard.is_armed(second));

        match rx.recv().await {
            Some(TurnEvent::TimedOut { turn }) => assert_eq!(turn, second),
            other => panic!("expected timeout for second turn, got {other:?}"),
        }

        // The cancelled countdown never fires.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_expiry_stays_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut guard = TimeoutGuard::new(Duration::from_secs(30), tx);

        let turn = TurnId(7);
        guard.arm(turn);
        tokio::time::sleep(Duration::from_secs(10)).await;
        guard.cancel(turn);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }
}
