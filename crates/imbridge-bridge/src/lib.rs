// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! imbridge: Native WebView bridge abstractions.
//!
//! Defines the bridge capability the host injects into the page, the two
//! readiness handshakes hosts use to announce it, and the connector that
//! latches the first bridge delivered.

pub mod connector;
pub mod loopback;
pub mod traits;

use std::sync::Arc;

use imbridge_core::BridgeSettings;

use connector::BridgeConnector;
use connector::event::EventHandshake;
use connector::poll::{NavigationProbe, PollHandshake};

/// The handshakes active for this build.
#[derive(Clone, Default)]
pub struct Handshakes {
    pub poll: Option<Arc<PollHandshake>>,
    pub event: Option<Arc<EventHandshake>>,
}

impl Handshakes {
    /// Start every handshake, routing results into `connector`.
    pub fn attach(&self, connector: &Arc<BridgeConnector>) {
        if let Some(poll) = &self.poll {
            poll.attach(connector);
        }
        if let Some(event) = &self.event {
            event.attach(connector);
        }
    }
}

/// Selects the readiness handshakes for the target operating system.
///
/// WKWebView hosts answer the navigation probe; Android hosts dispatch the
/// readiness event. Elsewhere the page cannot tell which host it is in, so
/// both run and the connector keeps whichever bridge arrives first.
#[cfg_attr(target_os = "android", allow(unused_variables))]
pub fn platform_handshakes(
    probe: Arc<dyn NavigationProbe>,
    settings: &BridgeSettings,
) -> Handshakes {
    #[cfg(target_os = "ios")]
    {
        Handshakes {
            poll: Some(Arc::new(PollHandshake::new(probe, settings))),
            event: None,
        }
    }
    #[cfg(target_os = "android")]
    {
        Handshakes {
            poll: None,
            event: Some(Arc::new(EventHandshake::new(settings))),
        }
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        Handshakes {
            poll: Some(Arc::new(PollHandshake::new(probe, settings))),
            event: Some(Arc::new(EventHandshake::new(settings))),
        }
    }
}
