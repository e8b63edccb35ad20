// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Domain types exchanged with the IM host application.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Correlation id attached to every dispatched call (logging only, never sent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of conversation a channel represents. Wire value is a `u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelType {
    None,
    /// One-to-one chat.
    Person,
    Group,
    CustomerService,
    Community,
    CommunityTopic,
    /// News/information feed.
    Info,
    /// A value this SDK does not know; kept so it can be sent back verbatim.
    Other(u8),
}

impl From<u8> for ChannelType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Person,
            2 => Self::Group,
            3 => Self::CustomerService,
            4 => Self::Community,
            5 => Self::CommunityTopic,
            6 => Self::Info,
            other => Self::Other(other),
        }
    }
}

impl From<ChannelType> for u8 {
    fn from(value: ChannelType) -> Self {
        match value {
            ChannelType::None => 0,
            ChannelType::Person => 1,
            ChannelType::Group => 2,
            ChannelType::CustomerService => 3,
            ChannelType::Community => 4,
            ChannelType::CommunityTopic => 5,
            ChannelType::Info => 6,
            ChannelType::Other(other) => other,
        }
    }
}

/// Channel the WebView was opened from, as returned by `getChannel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default = "default_channel_type")]
    pub channel_type: ChannelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Everything else the host sent (including `err_code`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_channel_type() -> ChannelType {
    ChannelType::None
}

/// Navigation mode for `showConversation`: replace the WebView in the stack.
pub const FORWARD_REPLACE: &str = "replace";

/// Options sent with `showConversation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowConversationOptions {
    pub forward: String,
    pub channel_id: String,
    pub channel_type: ChannelType,
}

impl ShowConversationOptions {
    pub fn replace(channel_id: impl Into<String>, channel_type: ChannelType) -> Self {
        Self {
            forward: FORWARD_REPLACE.into(),
            channel_id: channel_id.into(),
            channel_type,
        }
    }
}

/// Host method names understood by the IM application.
pub mod methods {
    pub const QUIT: &str = "quit";
    pub const GET_CHANNEL: &str = "getChannel";
    pub const SHOW_CONVERSATION: &str = "showConversation";
    /// Legacy plugin path only.
    pub const POP: &str = "pop";
}
