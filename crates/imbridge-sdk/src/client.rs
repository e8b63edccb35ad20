// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-facing client: configuration, readiness, calls and the common host
// operations (quit, channel lookup, conversation navigation).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use imbridge_bridge::Handshakes;
use imbridge_bridge::connector::BridgeConnector;
use imbridge_bridge::connector::poll::NavigationProbe;
use imbridge_core::error::{BridgeError, Result};
use imbridge_core::types::methods;
use imbridge_core::{AuthConfig, BridgeSettings, CallId, Channel, ChannelType, ShowConversationOptions};
use tracing::{debug, info};

use crate::dispatcher::{CallDispatcher, CallParams, ErrorSink};

/// One client per page. Cheap to share behind an `Arc`.
pub struct ImClient {
    auth: RwLock<AuthConfig>,
    errors: ErrorSink,
    connector: Arc<BridgeConnector>,
    handshakes: Handshakes,
    attached: AtomicBool,
    dispatcher: CallDispatcher,
}

impl ImClient {
    /// Client using the given handshakes to find the bridge.
    pub fn new(handshakes: Handshakes) -> Self {
        let connector = Arc::new(BridgeConnector::new());
        let errors = ErrorSink::default();
        let dispatcher = CallDispatcher::new(connector.clone()).with_error_sink(errors.clone());
        Self {
            auth: RwLock::new(AuthConfig::default()),
            errors,
            connector,
            handshakes,
            attached: AtomicBool::new(false),
            dispatcher,
        }
    }

    /// Client using the handshakes appropriate for this target OS.
    pub fn for_platform(probe: Arc<dyn NavigationProbe>, settings: &BridgeSettings) -> Self {
        Self::new(imbridge_bridge::platform_handshakes(probe, settings))
    }

    /// Store the page's authorization config, replacing any previous one.
    ///
    /// Call before issuing host calls, and again after each navigation in a
    /// single-page app.
    pub fn config(&self, cfg: AuthConfig) {
        debug!(keys = cfg.as_map().len(), "auth config updated");
        *self.auth.write().expect("auth config poisoned") = cfg;
    }

    pub fn auth_config(&self) -> AuthConfig {
        self.auth.read().expect("auth config poisoned").clone()
    }

    /// Register the page-wide error handler.
    ///
    /// It receives `NotReady` when a call is made before the bridge exists, and
    /// malformed host responses for calls that set no fault continuation.
    pub fn on_error<F>(&self, handler: F)
    where
        F: Fn(&BridgeError) + Send + Sync + 'static,
    {
        self.errors.set(Arc::new(handler));
    }

    /// Run `callback` once the bridge is ready. Starts the handshakes on first
    /// use. May be called from inside a ready callback.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.connector.on_ready(callback);
        // Attaching can run ready callbacks synchronously, which may re-enter
        // here; the flag is set before that happens.
        if !self.attached.swap(true, Ordering::SeqCst) {
            info!("starting bridge handshakes");
            self.handshakes.attach(&self.connector);
        }
    }

    /// Issue `method` on the host.
    pub fn call(&self, method: &str, params: CallParams) -> Result<CallId> {
        self.dispatcher.call(method, params).inspect_err(|e| {
            self.errors.report(e);
        })
    }

    /// Close the WebView.
    pub fn quit(&self) -> Result<CallId> {
        self.call(methods::QUIT, CallParams::new())
    }

    /// The channel the WebView was opened from.
    ///
    /// An application-level failure comes back as `Rejected` with the host's
    /// envelope.
    pub async fn get_channel(&self) -> Result<Channel> {
        let envelope = self.dispatcher.call_async(methods::GET_CHANNEL, None).await?;
        envelope.decode().map_err(|source| BridgeError::Payload {
            method: methods::GET_CHANNEL.to_owned(),
            source,
        })
    }

    /// Replace the WebView with the conversation screen for a channel.
    pub fn show_conversation(&self, channel_id: &str, channel_type: ChannelType) -> Result<CallId> {
        let params =
            CallParams::new().options_from(&ShowConversationOptions::replace(channel_id, channel_type))?;
        self.call(methods::SHOW_CONVERSATION, params)
    }

    pub fn connector(&self) -> &Arc<BridgeConnector> {
        &self.connector
    }

    pub fn dispatcher(&self) -> &CallDispatcher {
        &self.dispatcher
    }
}
