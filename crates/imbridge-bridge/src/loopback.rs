// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process host for desktop/CI builds where no native WebView exists.
//
// Answers bridge calls from handlers registered per method name. Every call is
// recorded so tests can assert on exactly what reached the "host".

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use imbridge_core::ResponseEnvelope;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::traits::*;

type MethodHandler = Box<dyn Fn(Option<&Value>) -> String + Send + Sync + 'static>;

/// One call as the host saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Set for calls arriving through the legacy plugin path.
    pub plugin: Option<String>,
    pub method: String,
    pub options: Option<Value>,
}

/// A call whose response is being held back by the host.
pub struct PendingCall {
    pub method: String,
    callback: ResponseCallback,
}

impl PendingCall {
    pub fn respond(self, raw: impl Into<String>) {
        (self.callback)(raw.into());
    }
}

/// No-native-host bridge returned on non-mobile platforms and used by tests.
#[derive(Default)]
pub struct LoopbackBridge {
    handlers: RwLock<HashMap<String, MethodHandler>>,
    invocations: Mutex<Vec<Invocation>>,
    /// `Some` while responses are deferred.
    pending: Mutex<Option<Vec<PendingCall>>>,
    message_handler: Mutex<Option<MessageHandler>>,
}

impl LoopbackBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with the string produced by `handler`.
    pub fn register<F>(&self, method: &str, handler: F)
    where
        F: Fn(Option<&Value>) -> String + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .expect("loopback handlers poisoned")
            .insert(method.to_owned(), Box::new(handler));
    }

    /// Answer `method` with a fixed response string.
    pub fn respond_with(&self, method: &str, response: impl Into<String>) {
        let response = response.into();
        self.register(method, move |_| response.clone());
    }

    pub fn with_response(self, method: &str, response: impl Into<String>) -> Self {
        self.respond_with(method, response);
        self
    }

    /// Hold back responses until [`take_pending`](Self::take_pending).
    pub fn defer_responses(&self) {
        let mut pending = self.pending.lock().expect("loopback pending poisoned");
        if pending.is_none() {
            *pending = Some(Vec::new());
        }
    }

    /// Calls waiting for a response. Dropping one means the host never answers.
    pub fn take_pending(&self) -> Vec<PendingCall> {
        self.pending
            .lock()
            .expect("loopback pending poisoned")
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .expect("loopback invocations poisoned")
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.invocations
            .lock()
            .expect("loopback invocations poisoned")
            .len()
    }

    /// Push a host-initiated message into the page. Returns `false` if the
    /// page never registered a handler through `init`.
    pub fn push_message(&self, message: Value, respond: Responder) -> bool {
        let handler = self
            .message_handler
            .lock()
            .expect("loopback handler poisoned")
            .clone();
        match handler {
            Some(handler) => {
                handler(message, respond);
                true
            }
            None => false,
        }
    }

    fn record(&self, plugin: Option<&str>, method: &str, options: Option<&Value>) {
        self.invocations
            .lock()
            .expect("loopback invocations poisoned")
            .push(Invocation {
                plugin: plugin.map(str::to_owned),
                method: method.to_owned(),
                options: options.cloned(),
            });
    }

    fn response_for(&self, method: &str, options: Option<&Value>) -> String {
        let handlers = self.handlers.read().expect("loopback handlers poisoned");
        match handlers.get(method) {
            Some(handler) => handler(options),
            None => {
                warn!(method, "loopback host has no handler");
                json!({"err_code": 404, "msg": format!("unknown method: {method}")}).to_string()
            }
        }
    }
}

impl BridgeHandle for LoopbackBridge {
    fn platform_name(&self) -> &str {
        "Loopback"
    }

    fn call_handler(&self, method: &str, options: Option<Value>, callback: ResponseCallback) {
        self.record(None, method, options.as_ref());

        {
            let mut pending = self.pending.lock().expect("loopback pending poisoned");
            if let Some(queue) = pending.as_mut() {
                debug!(method, "loopback response deferred");
                queue.push(PendingCall {
                    method: method.to_owned(),
                    callback,
                });
                return;
            }
        }

        // Locks are released before the callback so it may call back in.
        let response = self.response_for(method, options.as_ref());
        callback(response);
    }

    fn init(&self, handler: MessageHandler) {
        *self
            .message_handler
            .lock()
            .expect("loopback handler poisoned") = Some(handler);
    }
}

impl PluginBridge for LoopbackBridge {
    fn call_native(
        &self,
        plugin: &str,
        method: &str,
        params: Option<Value>,
        on_success: PluginCallback,
        on_fail: PluginCallback,
    ) {
        self.record(Some(plugin), method, params.as_ref());

        let raw = self.response_for(method, params.as_ref());
        match ResponseEnvelope::parse(&raw) {
            Ok(envelope) if envelope.is_success() => on_success(envelope.into_value()),
            Ok(envelope) => on_fail(envelope.into_value()),
            Err(e) => on_fail(json!({"msg": format!("invalid host response: {e}")})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn capture() -> (Arc<Mutex<Vec<String>>>, impl Fn() -> ResponseCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move || {
            let sink = Arc::clone(&sink);
            Box::new(move |raw: String| sink.lock().expect("seen").push(raw)) as ResponseCallback
        })
    }

    #[test]
    fn registered_handler_answers() {
        let host = LoopbackBridge::new().with_response("getChannel", r#"{"err_code":200}"#);
        let (seen, cb) = capture();

        host.call_handler("getChannel", Some(json!({"a": 1})), cb());

        assert_eq!(*seen.lock().expect("seen"), vec![r#"{"err_code":200}"#.to_owned()]);
        assert_eq!(
            host.invocations(),
            vec![Invocation {
                plugin: None,
                method: "getChannel".into(),
                options: Some(json!({"a": 1})),
            }]
        );
    }

    #[test]
    fn unknown_method_is_404() {
        let host = LoopbackBridge::new();
        let (seen, cb) = capture();
        host.call_handler("nope", None, cb());

        let raw = seen.lock().expect("seen")[0].clone();
        let envelope = ResponseEnvelope::parse(&raw).expect("json");
        assert_eq!(envelope.err_code(), Some(404));
    }

    #[test]
    fn deferred_calls_wait_for_host() {
        let host = LoopbackBridge::new().with_response("quit", "{}");
        host.defer_responses();
        let (seen, cb) = capture();
        host.call_handler("quit", None, cb());
        assert!(seen.lock().expect("seen").is_empty());

        let pending = host.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].method, "quit");
        for call in pending {
            call.respond(r#"{"err_code":500}"#);
        }
        assert_eq!(seen.lock().expect("seen").len(), 1);
    }

    #[test]
    fn plugin_path_splits_success_and_failure() {
        let host = LoopbackBridge::new()
            .with_response("pop", "{}")
            .with_response("showConversation", r#"{"err_code":403}"#);
        let outcomes = Arc::new(Mutex::new(Vec::new()));

        for method in ["pop", "showConversation"] {
            let ok = Arc::clone(&outcomes);
            let fail = Arc::clone(&outcomes);
            host.call_native(
                "LIMCommonPlugin",
                method,
                None,
                Box::new(move |_: Value| ok.lock().expect("outcomes").push(true)),
                Box::new(move |_: Value| fail.lock().expect("outcomes").push(false)),
            );
        }

        assert_eq!(*outcomes.lock().expect("outcomes"), vec![true, false]);
        assert_eq!(host.invocations()[0].plugin.as_deref(), Some("LIMCommonPlugin"));
    }
}
