// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// imbridge demo: runs one WebView session against a simulated host.
//
// Usage: imbridge-demo [settings.json]
//
// Initialises logging, loads bridge settings, lets the page register for
// readiness, has the host answer both handshakes, then exercises every host
// operation the SDK exposes.

mod host;

use std::path::PathBuf;
use std::sync::Arc;

use imbridge_bridge::traits::BridgeHandle;
use imbridge_core::error::Result;
use imbridge_core::{AuthConfig, BridgeSettings};
use imbridge_sdk::{CallParams, ImClient, LegacyInvoker};
use tracing::{error, info, warn};

use host::{HostProbe, demo_host};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("imbridge demo starting");

    if let Err(e) = run().await {
        error!(error = %e, "demo session failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let settings = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!(path = %path.display(), "loading bridge settings");
            BridgeSettings::load(&path)?
        }
        None => BridgeSettings::default(),
    };

    let host = demo_host();
    let probe = Arc::new(HostProbe::default());
    let handshakes = imbridge_bridge::platform_handshakes(probe.clone(), &settings);
    let client = ImClient::new(handshakes.clone());

    client.config(AuthConfig::new().with("app_id", "imbridge-demo"));
    client.on_error(|e| warn!(error = %e, "page error handler"));

    // Before readiness the call is refused and reported, never silently lost.
    let _ = client.quit();

    client.on_ready(|| info!("page: bridge ready"));

    // Host side: answer whichever handshakes this build runs. When both run,
    // the second signal is ignored by the latch.
    let bridge: Arc<dyn BridgeHandle> = host.clone();
    if let Some(poll) = &handshakes.poll {
        info!(probed = probe.was_hit(), "host draining poll handshake");
        poll.drain(Arc::clone(&bridge));
    }
    if let Some(event) = &handshakes.event {
        event.dispatch_ready(Arc::clone(&bridge));
    }

    let channel = client.get_channel().await?;
    info!(
        channel_id = %channel.channel_id,
        channel_type = ?channel.channel_type,
        name = ?channel.name,
        "page: got channel"
    );

    client.show_conversation(&channel.channel_id, channel.channel_type)?;

    client.call(
        "showConversation",
        CallParams::new()
            .options(serde_json::json!({"forward": "replace"}))
            .on_error(|env| warn!(err_code = ?env.err_code(), msg = ?env.message(), "page: host refused"))
            .on_complete(|_| info!("page: showConversation settled")),
    )?;

    LegacyInvoker::new(host.clone(), &settings).pop();

    client.quit()?;

    info!(host_calls = host.call_count(), "demo session finished");
    Ok(())
}
