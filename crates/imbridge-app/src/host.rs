// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Simulated IM host: a loopback bridge answering the methods a real host
// application exposes to its WebViews.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use imbridge_bridge::connector::poll::NavigationProbe;
use imbridge_bridge::loopback::LoopbackBridge;
use imbridge_core::types::methods;
use serde_json::json;
use tracing::info;

/// Channel the demo WebView pretends to be opened from.
pub const DEMO_CHANNEL_ID: &str = "g_general";

/// Build the loopback host with handlers for every host method.
pub fn demo_host() -> Arc<LoopbackBridge> {
    let host = LoopbackBridge::new();

    host.respond_with(
        methods::GET_CHANNEL,
        json!({
            "err_code": 200,
            "channel_id": DEMO_CHANNEL_ID,
            "channel_type": 2,
            "name": "General",
        })
        .to_string(),
    );

    host.register(methods::SHOW_CONVERSATION, |options| {
        match options.and_then(|o| o.get("channel_id")).and_then(|id| id.as_str()) {
            Some(id) if !id.is_empty() => json!({"err_code": 200}).to_string(),
            _ => json!({"err_code": 400, "msg": "channel_id is required"}).to_string(),
        }
    });

    host.respond_with(methods::QUIT, "{}");
    host.respond_with(methods::POP, "{}");

    Arc::new(host)
}

/// Records that the page fired the bridge probe.
#[derive(Default)]
pub struct HostProbe {
    hit: AtomicBool,
}

impl HostProbe {
    pub fn was_hit(&self) -> bool {
        self.hit.load(Ordering::SeqCst)
    }
}

impl NavigationProbe for HostProbe {
    fn navigate(&self, url: &str) {
        info!(url, "host intercepted bridge probe");
        self.hit.store(true, Ordering::SeqCst);
    }
}
