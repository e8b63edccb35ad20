// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event-based handshake (Android WebView hosts).
//
// The host injects the bridge and then dispatches a one-shot readiness event.
// Before the bridge can be used the page must register a handler for
// host-initiated messages through `init`.

use std::sync::{Arc, Mutex};

use imbridge_core::BridgeSettings;
use tracing::debug;

use super::{BridgeConnector, ReadinessPath};
use crate::traits::{BridgeHandle, default_message_handler};

type ReadyListener = Box<dyn FnOnce(Arc<dyn BridgeHandle>) + Send + 'static>;

#[derive(Default)]
struct EventState {
    bridge: Option<Arc<dyn BridgeHandle>>,
    listeners: Vec<ReadyListener>,
}

pub struct EventHandshake {
    event_name: String,
    state: Mutex<EventState>,
}

impl EventHandshake {
    pub fn new(settings: &BridgeSettings) -> Self {
        Self {
            event_name: settings.ready_event.clone(),
            state: Mutex::new(EventState::default()),
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Hand `callback` the bridge, now if it exists, otherwise when the host
    /// dispatches the readiness event.
    pub fn connect<F>(&self, callback: F)
    where
        F: FnOnce(Arc<dyn BridgeHandle>) + Send + 'static,
    {
        let mut state = self.state.lock().expect("event handshake poisoned");
        if let Some(bridge) = state.bridge.clone() {
            drop(state);
            callback(bridge);
            return;
        }
        debug!(event = %self.event_name, "waiting for bridge readiness event");
        state.listeners.push(Box::new(callback));
    }

    /// Route this handshake's result into `connector`, registering the default
    /// message handler on the bridge first.
    pub fn attach(&self, connector: &Arc<BridgeConnector>) {
        let connector = Arc::clone(connector);
        self.connect(move |bridge| {
            bridge.init(default_message_handler());
            connector.signal_ready(bridge, ReadinessPath::Event);
        });
    }

    /// Host side: dispatch the readiness event. Listeners are one-shot, so a
    /// repeated dispatch reaches nobody. Returns the number notified.
    pub fn dispatch_ready(&self, bridge: Arc<dyn BridgeHandle>) -> usize {
        let listeners = {
            let mut state = self.state.lock().expect("event handshake poisoned");
            state.bridge = Some(Arc::clone(&bridge));
            std::mem::take(&mut state.listeners)
        };
        debug!(
            event = %self.event_name,
            listeners = listeners.len(),
            "bridge readiness event dispatched"
        );

        let count = listeners.len();
        for listener in listeners {
            listener(Arc::clone(&bridge));
        }
        count
    }
}
