//! FILENAME: app/src/events.rs
//! PURPOSE: Host change notifications and the refresh suppression window.
//! CONTEXT: The host pushes `DataChanged` through a `ChangeNotifier`. While a
//! filter sequence holds a `SuspendGuard`, notifications are dropped; the
//! sequence itself forces one refresh when it finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::log_debug;

/// Inbound push signal from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostEvent {
    DataChanged,
}

// ============================================================================
// REFRESH GATE
// ============================================================================

/// Shared open/closed flag; closed while a filter sequence is in flight.
#[derive(Debug, Clone, Default)]
pub struct RefreshGate {
    suspended: Arc<AtomicBool>,
}

impl RefreshGate {
    pub fn new() -> Self {
        RefreshGate::default()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// Closes the gate. Returns None if it is already closed.
    pub fn try_suspend(&self) -> Option<SuspendGuard> {
        if self.suspended.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(SuspendGuard {
            suspended: Arc::clone(&self.suspended),
        })
    }
}

/// Reopens the gate on drop.
#[derive(Debug)]
pub struct SuspendGuard {
    suspended: Arc<AtomicBool>,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        self.suspended.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// CHANGE NOTIFIER
// ============================================================================

/// Host-side sender for `HostEvent`s, filtered by the gate.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: mpsc::UnboundedSender<HostEvent>,
    gate: RefreshGate,
}

impl ChangeNotifier {
    pub fn new(tx: mpsc::UnboundedSender<HostEvent>, gate: RefreshGate) -> Self {
        ChangeNotifier { tx, gate }
    }

    /// Returns true if the event was queued.
    pub fn notify(&self) -> bool {
        if self.gate.is_suspended() {
            log_debug!("EVENTS", "DataChanged suppressed (filter sequence in flight)");
            return false;
        }
        self.tx.send(HostEvent::DataChanged).is_ok()
    }
}

/// Notifier/receiver pair sharing `gate`.
pub fn change_channel(gate: RefreshGate) -> (ChangeNotifier, mpsc::UnboundedReceiver<HostEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChangeNotifier::new(tx, gate), rx)
}

/// Discards whatever is already queued; returns how many events were dropped.
pub fn drain_pending(rx: &mut mpsc::UnboundedReceiver<HostEvent>) -> usize {
    let mut dropped = 0;
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        log_debug!("EVENTS", "collapsed {} queued change event(s)", dropped);
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_reopens_gate_on_drop() {
        let gate = RefreshGate::new();
        {
            let _guard = gate.try_suspend().unwrap();
            assert!(gate.is_suspended());
            assert!(gate.try_suspend().is_none());
        }
        assert!(!gate.is_suspended());
        assert!(gate.try_suspend().is_some());
    }

    #[test]
    fn test_notifier_drops_events_while_suspended() {
        let gate = RefreshGate::new();
        let (notifier, mut rx) = change_channel(gate.clone());

        assert!(notifier.notify());
        let guard = gate.try_suspend().unwrap();
        assert!(!notifier.notify());
        assert!(!notifier.notify());
        drop(guard);

        assert_eq!(rx.try_recv().ok(), Some(HostEvent::DataChanged));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_drain_collapses_queue() {
        let (notifier, mut rx) = change_channel(RefreshGate::new());
        for _ in 0..3 {
            notifier.notify();
        }
        assert_eq!(drain_pending(&mut rx), 3);
        assert_eq!(drain_pending(&mut rx), 0);
    }
}
