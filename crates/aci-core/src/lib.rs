// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! aci-core
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The typed contract for ACP traffic.
//!
//! If you only take one dependency, take this one.

/// Capability advertisements exchanged during initialization.
pub mod caps;
/// Content blocks carried in prompts and streamed updates.
pub mod content;
/// Direction-tagged message algebra and method names.
pub mod message;
/// Request parameter and result payloads for every canonical method.
pub mod payload;
/// JSON-RPC envelope primitives: ids and wire errors.
pub mod rpc;
/// Tool call reports and incremental tool call updates.
pub mod tool;
/// Streaming session updates and execution plans.
pub mod update;

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use caps::{
    AgentCapabilities, AuthMethod, ClientCapabilities, FileSystemCapability, PromptCapabilities,
};
pub use content::{
    AudioContent, ContentBlock, EmbeddedResource, ImageContent, ResourceContents, ResourceLink,
    TextContent,
};
pub use message::{
    AgentMessage, AgentNotification, AgentRequest, AgentResponse, ClientMessage,
    ClientNotification, ClientRequest, ClientResponse, Message, method,
};
pub use payload::{
    AuthenticateParams, AuthenticateResult, EnvVariable, InitializeParams, InitializeResult,
    McpServer, PermissionOption, PermissionOptionKind, PermissionOutcome, ReadTextFileParams,
    ReadTextFileResult, RequestPermissionResult, SessionCancelParams, SessionLoadParams,
    SessionLoadResult, SessionMode, SessionModeState, SessionNewParams, SessionNewResult,
    SessionPromptParams, SessionPromptResult, SessionRequestPermissionParams,
    SessionSetModeParams, SessionSetModeResult, SessionUpdateParams, StopReason,
    TerminalCreateParams, TerminalCreateResult, TerminalExitStatus, TerminalKillParams,
    TerminalKillResult, TerminalOutputParams, TerminalOutputResult, TerminalReleaseParams,
    TerminalReleaseResult, TerminalWaitForExitParams, TerminalWaitForExitResult,
    WriteTextFileParams, WriteTextFileResult,
};
pub use rpc::{JsonRpcError, JsonRpcId};
pub use tool::{
    KnownToolCallContent, ToolCall, ToolCallContent, ToolCallLocation, ToolCallStatus,
    ToolCallUpdate, ToolKind,
};
pub use update::{Plan, PlanEntry, PlanEntryPriority, PlanEntryStatus, SessionUpdate};

/// Protocol schema version this library targets.
///
/// Advertised by the state machine as its schema and used as the default in
/// [`payload::InitializeParams`] builders.
pub const PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion(1);

/// Keys of the W3C trace-context convention recognized inside `_meta`.
///
/// The core recognizes them for the benefit of embedders but neither
/// requires nor validates them.
pub const TRACE_CONTEXT_META_KEYS: [&str; 3] = ["traceparent", "tracestate", "baggage"];

/// An opaque bag of fields that were present on the wire but are not part
/// of the typed shape of a payload.
///
/// Every known payload struct carries one of these, flattened, so unknown
/// fields survive a decode → encode round-trip.
pub type ExtMap = BTreeMap<String, serde_json::Value>;

/// Negotiated ACP protocol version. Plain integer on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ProtocolVersion(pub u16);

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the connection produced a message.
///
/// The same JSON shape decodes into different halves of the message algebra
/// depending on direction, so every codec operation takes one.
///
/// # Examples
///
/// ```
/// use aci_core::Direction;
///
/// assert_eq!(Direction::FromClient.opposite(), Direction::FromAgent);
/// assert_eq!(Direction::parse_alias("c->a"), Some(Direction::FromClient));
/// assert_eq!(Direction::parse_alias("AGENT"), Some(Direction::FromAgent));
/// assert_eq!(Direction::FromAgent.as_str(), "fromAgent");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Editor side: the client sent this frame.
    FromClient,
    /// Agent side: the coding agent sent this frame.
    FromAgent,
}

impl Direction {
    /// The other side of the connection.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::FromClient => Self::FromAgent,
            Self::FromAgent => Self::FromClient,
        }
    }

    /// Canonical wire spelling: `"fromClient"` or `"fromAgent"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FromClient => "fromClient",
            Self::FromAgent => "fromAgent",
        }
    }

    /// Parse any of the spellings found in recorded traces, case-insensitively.
    ///
    /// Client side: `fromClient`, `client`, `c2a`, `c->a`.
    /// Agent side: `fromAgent`, `agent`, `a2c`, `a->c`.
    ///
    /// Canonical output is always [`Direction::as_str`].
    #[must_use]
    pub fn parse_alias(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fromclient" | "client" | "c2a" | "c->a" => Some(Self::FromClient),
            "fromagent" | "agent" | "a2c" | "a->c" => Some(Self::FromAgent),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw identifier string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

opaque_id! {
    /// Opaque session identifier minted by the agent in `session/new`.
    SessionId
}

opaque_id! {
    /// Opaque identifier correlating tool call reports and updates.
    ToolCallId
}

opaque_id! {
    /// Opaque identifier of an agent interaction mode.
    ModeId
}

opaque_id! {
    /// Opaque identifier of an embedder-side terminal.
    TerminalId
}

opaque_id! {
    /// Opaque identifier of an authentication method.
    AuthMethodId
}

opaque_id! {
    /// Identifies one connection in validator output. Purely a label; the
    /// core never compares connections.
    ConnectionId
}

impl ConnectionId {
    /// Mint a fresh random connection id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Identifies one prompt turn within a session.
///
/// Assigned by the state machine when a `session/prompt` is admitted;
/// monotonically increasing per session, starting at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct TurnId(pub u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_alias_table() {
        for alias in ["fromClient", "FROMCLIENT", "client", "C2A", "c->a"] {
            assert_eq!(Direction::parse_alias(alias), Some(Direction::FromClient));
        }
        for alias in ["fromAgent", "agent", "a2c", "A->C"] {
            assert_eq!(Direction::parse_alias(alias), Some(Direction::FromAgent));
        }
        assert_eq!(Direction::parse_alias("sideways"), None);
    }

    #[test]
    fn direction_serde_canonical() {
        let json = serde_json::to_string(&Direction::FromClient).unwrap();
        assert_eq!(json, "\"fromClient\"");
        let back: Direction = serde_json::from_str("\"fromAgent\"").unwrap();
        assert_eq!(back, Direction::FromAgent);
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::generate(), ConnectionId::generate());
    }

    #[test]
    fn session_id_is_transparent() {
        let sid = SessionId::new("s1");
        assert_eq!(serde_json::to_string(&sid).unwrap(), "\"s1\"");
    }
}
