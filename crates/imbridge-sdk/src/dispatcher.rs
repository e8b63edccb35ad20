// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Call dispatcher: one host invocation per call, response routed by status.
//
// Continuations run synchronously inside the host's response callback, in the
// order success/error then complete. A response that is not JSON never reaches
// them; it is reported as `MalformedResponse` instead.

use std::sync::{Arc, RwLock};

use imbridge_bridge::traits::{BridgeHandle, HandleSource};
use imbridge_core::error::{BridgeError, Result};
use imbridge_core::{CallId, ResponseEnvelope};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

/// Receives the decoded envelope.
pub type Continuation = Box<dyn FnOnce(&ResponseEnvelope) + Send + 'static>;

/// Receives a failure that produced no envelope.
pub type FaultHandler = Box<dyn FnOnce(BridgeError) + Send + 'static>;

/// Page-wide error handler registered through `on_error`.
pub type ErrorHandler = Arc<dyn Fn(&BridgeError) + Send + Sync + 'static>;

/// Shared slot for the page-wide error handler.
#[derive(Clone, Default)]
pub struct ErrorSink(Arc<RwLock<Option<ErrorHandler>>>);

impl ErrorSink {
    pub fn set(&self, handler: ErrorHandler) {
        *self.0.write().expect("error sink poisoned") = Some(handler);
    }

    /// Hand `err` to the registered handler. Returns `false` if there is none.
    pub fn report(&self, err: &BridgeError) -> bool {
        let handler = self.0.read().expect("error sink poisoned").clone();
        match handler {
            Some(handler) => {
                handler(err);
                true
            }
            None => false,
        }
    }
}

/// Options and continuations for one call. Every part is optional.
#[derive(Default)]
pub struct CallParams {
    options: Option<Value>,
    success: Option<Continuation>,
    error: Option<Continuation>,
    complete: Option<Continuation>,
    fault: Option<FaultHandler>,
}

impl CallParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options forwarded verbatim to the host.
    pub fn options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn options_from<T: Serialize>(self, options: &T) -> Result<Self> {
        Ok(self.options(serde_json::to_value(options)?))
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&ResponseEnvelope) + Send + 'static,
    {
        self.success = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&ResponseEnvelope) + Send + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }

    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&ResponseEnvelope) + Send + 'static,
    {
        self.complete = Some(Box::new(f));
        self
    }

    /// Called instead of the other continuations when the host answers with
    /// something that is not JSON.
    pub fn on_fault<F>(mut self, f: F) -> Self
    where
        F: FnOnce(BridgeError) + Send + 'static,
    {
        self.fault = Some(Box::new(f));
        self
    }
}

/// The continuations left once options have been sent.
struct Continuations {
    success: Option<Continuation>,
    error: Option<Continuation>,
    complete: Option<Continuation>,
}

impl Continuations {
    fn settle(self, call_id: CallId, method: &str, envelope: &ResponseEnvelope) {
        if envelope.is_success() {
            debug!(%call_id, method, "bridge call succeeded");
            if let Some(success) = self.success {
                success(envelope);
            }
        } else {
            debug!(
                %call_id,
                method,
                err_code = ?envelope.err_code(),
                msg = ?envelope.message(),
                "bridge call rejected by host"
            );
            if let Some(error) = self.error {
                error(envelope);
            }
        }
        if let Some(complete) = self.complete {
            complete(envelope);
        }
    }
}

/// Issues calls against whichever bridge its source currently provides.
pub struct CallDispatcher {
    source: Arc<dyn HandleSource>,
    errors: ErrorSink,
}

impl CallDispatcher {
    pub fn new(source: Arc<dyn HandleSource>) -> Self {
        Self {
            source,
            errors: ErrorSink::default(),
        }
    }

    /// Report unhandled faults to `errors` instead of only logging them.
    pub fn with_error_sink(mut self, errors: ErrorSink) -> Self {
        self.errors = errors;
        self
    }

    /// Invoke `method` on the host.
    ///
    /// Fails with `NotReady` (and touches nothing) when there is no bridge.
    /// Otherwise exactly one host invocation is made and the returned id tags
    /// the log lines for its response.
    pub fn call(&self, method: &str, params: CallParams) -> Result<CallId> {
        let handle = self.handle_for(method)?;
        let call_id = CallId::new();
        let CallParams {
            options,
            success,
            error,
            complete,
            fault,
        } = params;
        let continuations = Continuations {
            success,
            error,
            complete,
        };

        debug!(%call_id, method, platform = handle.platform_name(), "dispatching bridge call");

        let errors = self.errors.clone();
        let name = method.to_owned();
        handle.call_handler(
            method,
            options,
            Box::new(move |raw: String| match parse_response(&name, &raw) {
                Ok(envelope) => continuations.settle(call_id, &name, &envelope),
                Err(err) => {
                    error!(%call_id, method = %name, error = %err, "bridge response dropped");
                    match fault {
                        Some(fault) => fault(err),
                        None => {
                            errors.report(&err);
                        }
                    }
                }
            }),
        );
        Ok(call_id)
    }

    /// Invoke `method` and wait for the host's answer.
    ///
    /// Application errors come back as `Rejected` carrying the envelope. If the
    /// host drops the callback without answering, the result is `Cancelled`.
    pub async fn call_async(&self, method: &str, options: Option<Value>) -> Result<ResponseEnvelope> {
        let handle = self.handle_for(method)?;
        let (tx, rx) = oneshot::channel();
        let name = method.to_owned();

        debug!(method, platform = handle.platform_name(), "dispatching awaited bridge call");
        handle.call_handler(
            method,
            options,
            Box::new(move |raw: String| {
                let outcome = parse_response(&name, &raw).and_then(|envelope| {
                    if envelope.is_success() {
                        Ok(envelope)
                    } else {
                        Err(BridgeError::Rejected(envelope))
                    }
                });
                // The caller may have stopped waiting; nothing to do then.
                let _ = tx.send(outcome);
            }),
        );
        drop(handle);

        rx.await.unwrap_or_else(|_| {
            Err(BridgeError::Cancelled {
                method: method.to_owned(),
            })
        })
    }

    fn handle_for(&self, method: &str) -> Result<Arc<dyn BridgeHandle>> {
        self.source.current_handle().ok_or_else(|| {
            warn!(method, "native bridge not ready, call not sent");
            BridgeError::NotReady
        })
    }
}

fn parse_response(method: &str, raw: &str) -> Result<ResponseEnvelope> {
    ResponseEnvelope::parse(raw).map_err(|source| BridgeError::MalformedResponse {
        method: method.to_owned(),
        source,
    })
}
