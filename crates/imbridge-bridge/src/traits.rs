// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the native WebView bridge.
//
// The host application injects an object into the page that exposes
// `callHandler(method, options, callback)`. These traits describe that object
// so the dispatcher never touches platform globals directly.

use std::sync::Arc;

use serde_json::Value;

/// Receives the raw JSON response string for one bridge call.
pub type ResponseCallback = Box<dyn FnOnce(String) + Send + 'static>;

/// Answers a host-initiated message. `None` is an empty response.
pub type Responder = Box<dyn FnOnce(Option<Value>) + Send + 'static>;

/// Page-side handler for messages the host pushes into the WebView.
pub type MessageHandler = Arc<dyn Fn(Value, Responder) + Send + Sync + 'static>;

/// Callback used by the legacy plugin path. Receives the host payload.
pub type PluginCallback = Box<dyn FnOnce(Value) + Send + 'static>;

/// The native bridge object the host exposes to the page.
///
/// There is one per process. It is created by the host, handed to the page
/// through a readiness handshake and never destroyed.
pub trait BridgeHandle: Send + Sync {
    /// Human-readable host name (e.g. "iOS WKWebView", "Android").
    fn platform_name(&self) -> &str;

    /// Invoke `method` on the host. `callback` receives the JSON response
    /// string; hosts may call it on any thread, or never.
    fn call_handler(&self, method: &str, options: Option<Value>, callback: ResponseCallback);

    /// Register the page's handler for host-initiated messages.
    ///
    /// Event-based hosts require this before the bridge is usable; poll-based
    /// hosts ignore it.
    fn init(&self, _handler: MessageHandler) {}
}

/// Older plugin-addressed bridge (`callNative(plugin, method, params, ok, fail)`).
pub trait PluginBridge: Send + Sync {
    fn call_native(
        &self,
        plugin: &str,
        method: &str,
        params: Option<Value>,
        on_success: PluginCallback,
        on_fail: PluginCallback,
    );
}

/// Anything that can hand the dispatcher the current bridge, if there is one.
pub trait HandleSource: Send + Sync {
    fn current_handle(&self) -> Option<Arc<dyn BridgeHandle>>;
}

impl HandleSource for Arc<dyn BridgeHandle> {
    fn current_handle(&self) -> Option<Arc<dyn BridgeHandle>> {
        Some(Arc::clone(self))
    }
}

/// Handler that answers every host message with an empty response.
pub fn default_message_handler() -> MessageHandler {
    Arc::new(|_message: Value, respond: Responder| respond(None))
}
