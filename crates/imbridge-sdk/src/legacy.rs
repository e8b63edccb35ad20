// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Legacy plugin-addressed invocation.
//
// Older pages talk to a single host plugin through
// `callNative(plugin, method, params, success, fail)` and get a
// `(ok, payload)` callback. Superseded by `ImClient`, kept for those pages.

use std::sync::{Arc, Mutex};

use imbridge_bridge::traits::PluginBridge;
use imbridge_core::error::Result;
use imbridge_core::types::methods;
use imbridge_core::{BridgeSettings, ChannelType, ShowConversationOptions};
use serde_json::Value;
use tracing::debug;

/// Receives `true` and the payload on success, `false` and the payload on failure.
pub type LegacyCallback = Box<dyn FnOnce(bool, Value) + Send + 'static>;

pub struct LegacyInvoker {
    bridge: Arc<dyn PluginBridge>,
    plugin: String,
}

impl LegacyInvoker {
    pub fn new(bridge: Arc<dyn PluginBridge>, settings: &BridgeSettings) -> Self {
        Self {
            bridge,
            plugin: settings.legacy_plugin.clone(),
        }
    }

    pub fn invoke(&self, method: &str, params: Option<Value>, callback: Option<LegacyCallback>) {
        debug!(plugin = %self.plugin, method, "legacy native invoke");

        let slot = Arc::new(Mutex::new(callback));
        let fail_slot = Arc::clone(&slot);
        self.bridge.call_native(
            &self.plugin,
            method,
            params,
            Box::new(move |res: Value| settle(&slot, true, res)),
            Box::new(move |res: Value| settle(&fail_slot, false, res)),
        );
    }

    /// Pop the WebView off the host's navigation stack.
    pub fn pop(&self) {
        self.invoke(methods::POP, None, None);
    }

    pub fn close_web_view(&self) {
        self.pop();
    }

    pub fn show_conversation(&self, channel_id: &str, channel_type: ChannelType) -> Result<()> {
        let options = serde_json::to_value(ShowConversationOptions::replace(channel_id, channel_type))?;
        self.invoke(methods::SHOW_CONVERSATION, Some(options), None);
        Ok(())
    }
}

// Whichever of success/fail fires first consumes the callback.
fn settle(slot: &Mutex<Option<LegacyCallback>>, ok: bool, payload: Value) {
    let callback = slot.lock().expect("legacy callback poisoned").take();
    if let Some(callback) = callback {
        callback(ok, payload);
    }
}
