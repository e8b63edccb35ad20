// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// imbridge: page-side SDK for calling into the IM host application.

pub mod client;
pub mod dispatcher;
pub mod legacy;

pub use client::ImClient;
pub use dispatcher::{CallDispatcher, CallParams, ErrorSink};
pub use legacy::LegacyInvoker;
