// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// imbridge: Core types and error definitions shared across all crates.

pub mod config;
pub mod envelope;
pub mod error;
pub mod types;

pub use config::{AuthConfig, BridgeSettings};
pub use envelope::ResponseEnvelope;
pub use error::BridgeError;
pub use types::*;
