// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Poll-based handshake (WKWebView hosts).
//
// The page cannot be told directly that the bridge exists. Instead it queues
// its callbacks and triggers an invisible navigation to a probe URL; the host
// intercepts that navigation, injects the bridge and drains the queue.

use std::sync::{Arc, Mutex};

use imbridge_core::BridgeSettings;
use tracing::debug;

use super::{BridgeConnector, ReadinessPath};
use crate::traits::BridgeHandle;

/// Fires the invisible navigation the host listens for.
pub trait NavigationProbe: Send + Sync {
    fn navigate(&self, url: &str);
}

type HandshakeCallback = Box<dyn FnOnce(Arc<dyn BridgeHandle>) + Send + 'static>;

#[derive(Default)]
struct PollState {
    /// Set once the host has injected the bridge.
    bridge: Option<Arc<dyn BridgeHandle>>,
    /// Callbacks waiting for the host. `Some` once the probe has fired.
    queue: Option<Vec<HandshakeCallback>>,
}

pub struct PollHandshake {
    probe: Arc<dyn NavigationProbe>,
    probe_url: String,
    state: Mutex<PollState>,
}

impl PollHandshake {
    pub fn new(probe: Arc<dyn NavigationProbe>, settings: &BridgeSettings) -> Self {
        Self {
            probe,
            probe_url: settings.probe_url.clone(),
            state: Mutex::new(PollState::default()),
        }
    }

    /// Hand `callback` the bridge as soon as the host provides it.
    ///
    /// The probe fires only for the first queued callback.
    pub fn setup<F>(&self, callback: F)
    where
        F: FnOnce(Arc<dyn BridgeHandle>) + Send + 'static,
    {
        let mut state = self.state.lock().expect("poll handshake poisoned");
        if let Some(bridge) = state.bridge.clone() {
            drop(state);
            callback(bridge);
            return;
        }
        if let Some(queue) = state.queue.as_mut() {
            queue.push(Box::new(callback));
            return;
        }
        state.queue = Some(vec![Box::new(callback)]);
        drop(state);

        debug!(url = %self.probe_url, "firing bridge probe");
        self.probe.navigate(&self.probe_url);
    }

    /// Route this handshake's result into `connector`.
    pub fn attach(&self, connector: &Arc<BridgeConnector>) {
        let connector = Arc::clone(connector);
        self.setup(move |bridge| {
            connector.signal_ready(bridge, ReadinessPath::Poll);
        });
    }

    /// Host side: the bridge has been injected. Runs every queued callback
    /// and returns how many there were.
    pub fn drain(&self, bridge: Arc<dyn BridgeHandle>) -> usize {
        let queued = {
            let mut state = self.state.lock().expect("poll handshake poisoned");
            state.bridge = Some(Arc::clone(&bridge));
            state.queue.take().unwrap_or_default()
        };
        debug!(callbacks = queued.len(), "draining poll handshake queue");

        let count = queued.len();
        for callback in queued {
            callback(Arc::clone(&bridge));
        }
        count
    }

    /// Whether the probe has fired and callbacks are waiting on the host.
    pub fn is_pending(&self) -> bool {
        self.state
            .lock()
            .expect("poll handshake poisoned")
            .queue
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::loopback::LoopbackBridge;

    #[derive(Default)]
    struct CountingProbe {
        hits: AtomicUsize,
        last_url: Mutex<Option<String>>,
    }

    impl NavigationProbe for CountingProbe {
        fn navigate(&self, url: &str) {
            self.hits.fetch_add(1, Ordering::SeqCst);
            *self.last_url.lock().expect("probe lock") = Some(url.to_owned());
        }
    }

    fn handshake() -> (Arc<CountingProbe>, PollHandshake) {
        let probe = Arc::new(CountingProbe::default());
        let poll = PollHandshake::new(probe.clone(), &BridgeSettings::default());
        (probe, poll)
    }

    #[test]
    fn probe_fires_once_for_many_callbacks() {
        let (probe, poll) = handshake();
        poll.setup(|_| {});
        poll.setup(|_| {});
        poll.setup(|_| {});

        assert_eq!(probe.hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            probe.last_url.lock().expect("probe lock").as_deref(),
            Some("https://__bridge_loaded__")
        );
        assert!(poll.is_pending());
    }

    #[test]
    fn drain_runs_queue_then_bridge_is_present() {
        let (probe, poll) = handshake();
        let seen = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            poll.setup(move |bridge| {
                assert_eq!(bridge.platform_name(), "Loopback");
                seen.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(poll.drain(Arc::new(LoopbackBridge::new())), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(!poll.is_pending());

        // Bridge now exists: new callbacks run at once and no probe fires.
        let seen_late = Arc::clone(&seen);
        poll.setup(move |_| {
            seen_late.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(probe.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn attach_latches_connector() {
        let (_probe, poll) = handshake();
        let connector = Arc::new(BridgeConnector::new());
        poll.attach(&connector);
        assert!(!connector.is_ready());

        poll.drain(Arc::new(LoopbackBridge::new()));
        let state = connector.ready_state().expect("ready");
        assert_eq!(state.path, ReadinessPath::Poll);
    }
}
