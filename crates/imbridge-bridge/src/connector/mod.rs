// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge readiness latch.
//
// The host announces its bridge through one of two handshakes (see `poll` and
// `event`). Both may fire in the same page, so the connector keeps the first
// bridge it is given and ignores every later signal. Callbacks registered with
// `on_ready` run exactly once: immediately if the bridge is already latched,
// otherwise when the first signal arrives.

pub mod event;
pub mod poll;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use imbridge_core::error::{BridgeError, Result};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::traits::{BridgeHandle, HandleSource};

/// Which handshake delivered the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessPath {
    /// Callback queue drained by the host after the navigation probe.
    Poll,
    /// One-shot readiness event dispatched by the host.
    Event,
}

/// Snapshot of the latched bridge.
#[derive(Debug, Clone)]
pub struct ReadyState {
    pub path: ReadinessPath,
    pub platform: String,
    pub ready_at: DateTime<Utc>,
}

pub type ReadyCallback = Box<dyn FnOnce() + Send + 'static>;

enum Latch {
    Pending(Vec<ReadyCallback>),
    Ready {
        handle: Arc<dyn BridgeHandle>,
        state: ReadyState,
    },
}

/// Owns the process-wide bridge handle once the host has provided it.
pub struct BridgeConnector {
    latch: Mutex<Latch>,
    ready_tx: watch::Sender<Option<Arc<dyn BridgeHandle>>>,
}

impl BridgeConnector {
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(None);
        Self {
            latch: Mutex::new(Latch::Pending(Vec::new())),
            ready_tx,
        }
    }

    /// Run `callback` once the bridge is ready.
    ///
    /// There is no timeout: if no host ever signals, the callback never runs.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut latch = self.latch.lock().expect("bridge latch poisoned");
            if let Latch::Pending(queue) = &mut *latch {
                queue.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    /// Latch `handle` as the bridge. Returns `false` if one was already latched.
    pub fn signal_ready(&self, handle: Arc<dyn BridgeHandle>, path: ReadinessPath) -> bool {
        let state = ReadyState {
            path,
            platform: handle.platform_name().to_owned(),
            ready_at: Utc::now(),
        };

        let queued = {
            let mut latch = self.latch.lock().expect("bridge latch poisoned");
            let previous = std::mem::replace(
                &mut *latch,
                Latch::Ready {
                    handle: Arc::clone(&handle),
                    state: state.clone(),
                },
            );
            match previous {
                Latch::Pending(queue) => queue,
                Latch::Ready {
                    handle: first,
                    state: latched,
                } => {
                    debug!(?path, latched = ?latched.path, "duplicate readiness signal ignored");
                    *latch = Latch::Ready {
                        handle: first,
                        state: latched,
                    };
                    return false;
                }
            }
        };

        info!(
            ?path,
            platform = %state.platform,
            waiting = queued.len(),
            "native bridge ready"
        );
        self.ready_tx.send_replace(Some(handle));

        for callback in queued {
            callback();
        }
        true
    }

    pub fn handle(&self) -> Option<Arc<dyn BridgeHandle>> {
        match &*self.latch.lock().expect("bridge latch poisoned") {
            Latch::Ready { handle, .. } => Some(Arc::clone(handle)),
            Latch::Pending(_) => None,
        }
    }

    pub fn ready_state(&self) -> Option<ReadyState> {
        match &*self.latch.lock().expect("bridge latch poisoned") {
            Latch::Ready { state, .. } => Some(state.clone()),
            Latch::Pending(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready_state().is_some()
    }

    /// Wait for the bridge. Resolves immediately if it is already latched.
    pub async fn ready(&self) -> Result<Arc<dyn BridgeHandle>> {
        let mut rx = self.ready_tx.subscribe();
        let slot = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| BridgeError::NotReady)?;
        slot.as_ref().map(Arc::clone).ok_or(BridgeError::NotReady)
    }
}

impl Default for BridgeConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleSource for BridgeConnector {
    fn current_handle(&self) -> Option<Arc<dyn BridgeHandle>> {
        self.handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::loopback::LoopbackBridge;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn queued_callbacks_run_on_first_signal() {
        let connector = BridgeConnector::new();
        let (count, cb) = counter();
        connector.on_ready(cb);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!connector.is_ready());

        assert!(connector.signal_ready(Arc::new(LoopbackBridge::new()), ReadinessPath::Poll));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(connector.handle().is_some());
    }

    #[test]
    fn second_signal_is_ignored() {
        let connector = BridgeConnector::new();
        let (count, cb) = counter();
        connector.on_ready(cb);

        assert!(connector.signal_ready(Arc::new(LoopbackBridge::new()), ReadinessPath::Poll));
        assert!(!connector.signal_ready(Arc::new(LoopbackBridge::new()), ReadinessPath::Event));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        let state = connector.ready_state().expect("ready");
        assert_eq!(state.path, ReadinessPath::Poll);
        assert_eq!(state.platform, "Loopback");
    }

    #[test]
    fn late_registration_runs_immediately() {
        let connector = BridgeConnector::new();
        connector.signal_ready(Arc::new(LoopbackBridge::new()), ReadinessPath::Event);

        let (count, cb) = counter();
        connector.on_ready(cb);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_may_reenter_connector() {
        let connector = Arc::new(BridgeConnector::new());
        let inner = Arc::clone(&connector);
        let (count, cb) = counter();
        connector.on_ready(move || {
            assert!(inner.handle().is_some());
            inner.on_ready(cb);
        });
        connector.signal_ready(Arc::new(LoopbackBridge::new()), ReadinessPath::Poll);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ready_resolves_after_signal() {
        let connector = Arc::new(BridgeConnector::new());
        let waiter = {
            let connector = Arc::clone(&connector);
            tokio::spawn(async move { connector.ready().await.map(|h| h.platform_name().to_owned()) })
        };
        tokio::task::yield_now().await;
        connector.signal_ready(Arc::new(LoopbackBridge::new()), ReadinessPath::Event);

        let platform = waiter.await.expect("join").expect("ready");
        assert_eq!(platform, "Loopback");
    }
}
