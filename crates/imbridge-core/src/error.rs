// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for imbridge.

use thiserror::Error;

use crate::envelope::ResponseEnvelope;

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Readiness --
    #[error("native bridge is not ready")]
    NotReady,

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Responses --
    #[error("malformed response to `{method}`: {source}")]
    MalformedResponse {
        method: String,
        source: serde_json::Error,
    },

    #[error("host rejected the call: {0}")]
    Rejected(ResponseEnvelope),

    #[error("host dropped the response callback for `{method}`")]
    Cancelled { method: String },

    #[error("unexpected payload for `{method}`: {source}")]
    Payload {
        method: String,
        source: serde_json::Error,
    },

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// The envelope carried by an application-level rejection, if any.
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::Rejected(envelope) => Some(envelope),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display_includes_payload() {
        let env = ResponseEnvelope::parse(r#"{"err_code":403,"msg":"denied"}"#).expect("parse");
        let err = BridgeError::Rejected(env);
        let text = err.to_string();
        assert!(text.contains("403"));
        assert!(text.contains("denied"));
        assert!(err.envelope().is_some());
    }

    #[test]
    fn malformed_names_method() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = BridgeError::MalformedResponse {
            method: "getChannel".into(),
            source,
        };
        assert!(err.to_string().starts_with("malformed response to `getChannel`"));
        assert!(err.envelope().is_none());
    }
}
