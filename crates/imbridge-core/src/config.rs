// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page authorization config and bridge settings.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};

/// Authorization parameters injected by the page before any call is issued.
///
/// Opaque to the SDK: nothing is validated locally, the host checks it.
/// Pages call `config` once per URL (or on every route change in a
/// single-page app), so setting it replaces the previous value wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthConfig(Map<String, Value>);

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an arbitrary JSON value. Non-object values are rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(BridgeError::Config(format!(
                "auth config must be a JSON object, got {other}"
            ))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for AuthConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Host-integration constants, overridable from a JSON settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// URL the poll handshake navigates to so the host notices the page.
    pub probe_url: String,
    /// Name of the one-shot event the event-based host fires when ready.
    pub ready_event: String,
    /// Plugin addressed by the legacy `callNative` path.
    pub legacy_plugin: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            probe_url: "https://__bridge_loaded__".into(),
            ready_event: "WebViewJavascriptBridgeReady".into(),
            legacy_plugin: "LIMCommonPlugin".into(),
        }
    }
}

impl BridgeSettings {
    /// Load settings from a JSON file.
    ///
    /// A missing file yields the defaults; an unreadable or invalid file is
    /// an error. Fields absent from the file keep their default values.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
