// SPDX-License-Identifier: MIT OR Apache-2.0
//! Findings: structured observations with stable codes.
//!
//! Every code carries its lane and default severity so call sites cannot
//! disagree about classification. The wire form of a code is its stable
//! `ACP.*` string; embedders pattern-match on those.

use std::fmt;

use aci_core::{ConnectionId, SessionId, ToolCallId, TurnId};
use aci_protocol::ProtocolError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A category of validation rules with an independent gating policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Lane {
    /// Handshake ordering and transition legality. Gating.
    Protocol,
    /// Session and prompt turn lifecycle. Gating.
    Session,
    /// Framing, sizes, and envelope hygiene. Gating.
    Transport,
    /// Tool call surface conventions. Advisory, opt-in.
    ToolSurface,
    /// Capability and schema discipline. Advisory.
    Implementation,
}

impl Lane {
    /// Whether errors in this lane gate (recommend blocking or closing).
    #[must_use]
    pub fn gates(self) -> bool {
        matches!(self, Self::Protocol | Self::Session | Self::Transport)
    }
}

/// How serious a finding is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    /// A hard violation of the protocol.
    Error,
    /// Suspicious but tolerated.
    Warning,
    /// Worth knowing, nothing wrong.
    Info,
}

/// The entity a finding is about.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Subject {
    /// The connection as a whole.
    Connection,
    /// One session.
    Session(SessionId),
    /// One prompt turn of one session.
    PromptTurn(SessionId, TurnId),
    /// One position in the trace, with the method observed there.
    MessageAt(usize, String),
    /// One tool call.
    ToolCall(ToolCallId),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "connection"),
            Self::Session(sid) => write!(f, "session {sid}"),
            Self::PromptTurn(sid, turn) => write!(f, "session {sid} turn {turn}"),
            Self::MessageAt(i, method) => write!(f, "message #{i} ({method})"),
            Self::ToolCall(id) => write!(f, "tool call {id}"),
        }
    }
}

/// The closed catalog of finding codes.
///
/// # Examples
///
/// ```
/// use aci_validate::{FindingCode, Lane, Severity};
///
/// let code = FindingCode::CancelMismatch;
/// assert_eq!(code.code(), "ACP.SESSION.CANCEL_MISMATCH");
/// assert_eq!(code.lane(), Lane::Session);
/// assert_eq!(code.default_severity(), Severity::Error);
/// assert_eq!(FindingCode::from_code("ACP.SESSION.CANCEL_MISMATCH"), Some(code));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FindingCode {
    // ── Protocol ──────────────────────────────────────────────────────
    /// Traffic before the initialize handshake completed.
    NotInitialized,
    /// A second initialize exchange.
    DuplicateInitialize,
    /// A message that fits no rule in the current phase.
    InvalidTransition,

    // ── Session ───────────────────────────────────────────────────────
    /// Reference to a session this connection never created or loaded.
    UnknownSession,
    /// A prompt while another prompt was in flight.
    MultiplePromptsInFlight,
    /// A prompt result for an idle session.
    ResultWithoutPrompt,
    /// A cancelled turn that ended with the wrong stop reason.
    CancelMismatch,
    /// A permission request outside any prompt turn.
    PermissionOutsideTurn,
    /// A cancel for a session with nothing in flight.
    CancelIdleSession,
    /// A mode switch to a mode the session never advertised.
    UnknownMode,

    // ── Transport ─────────────────────────────────────────────────────
    /// A frame larger than the profile's ceiling.
    MaxMessageBytesExceeded,
    /// A frame that could not be decoded as a JSON-RPC 2.0 message.
    /// Emitted at the adapter boundary, where raw text meets the codec.
    MalformedEnvelope,
    /// A request using the literal `null` as its id.
    NullRequestId,

    // ── ToolSurface ───────────────────────────────────────────────────
    /// A tool call update out of lifecycle order.
    ToolOutOfOrder,

    // ── Implementation ────────────────────────────────────────────────
    /// Content or methods beyond what the peer advertised.
    CapabilityViolation,
    /// Unknown fields on a known payload.
    UnknownFields,
    /// `_meta` present under a profile that disallows it.
    MetaDisallowed,
    /// A content kind outside the profile's allow list.
    ContentKindDisallowed,
}

impl FindingCode {
    /// Stable machine-readable code string.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "ACP.PROTOCOL.NOT_INITIALIZED",
            Self::DuplicateInitialize => "ACP.PROTOCOL.DUPLICATE_INITIALIZE",
            Self::InvalidTransition => "ACP.PROTOCOL.INVALID_TRANSITION",

            Self::UnknownSession => "ACP.SESSION.UNKNOWN_SESSION",
            Self::MultiplePromptsInFlight => "ACP.SESSION.MULTIPLE_PROMPTS_IN_FLIGHT",
            Self::ResultWithoutPrompt => "ACP.SESSION.RESULT_WITHOUT_PROMPT",
            Self::CancelMismatch => "ACP.SESSION.CANCEL_MISMATCH",
            Self::PermissionOutsideTurn => "ACP.SESSION.PERMISSION_OUTSIDE_TURN",
            Self::CancelIdleSession => "ACP.SESSION.CANCEL_IDLE_SESSION",
            Self::UnknownMode => "ACP.SESSION.UNKNOWN_MODE",

            Self::MaxMessageBytesExceeded => "ACP.TRANSPORT.MAX_MESSAGE_BYTES_EXCEEDED",
            Self::MalformedEnvelope => "ACP.TRANSPORT.MALFORMED_ENVELOPE",
            Self::NullRequestId => "ACP.TRANSPORT.NULL_REQUEST_ID",

            Self::ToolOutOfOrder => "ACP.TOOL.OUT_OF_ORDER",

            Self::CapabilityViolation => "ACP.IMPL.CAPABILITY_VIOLATION",
            Self::UnknownFields => "ACP.IMPL.UNKNOWN_FIELDS",
            Self::MetaDisallowed => "ACP.IMPL.META_DISALLOWED",
            Self::ContentKindDisallowed => "ACP.IMPL.CONTENT_KIND_DISALLOWED",
        }
    }

    /// Parse a stable code string back into its catalog entry.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        const ALL: [FindingCode; 18] = [
            FindingCode::NotInitialized,
            FindingCode::DuplicateInitialize,
            FindingCode::InvalidTransition,
            FindingCode::UnknownSession,
            FindingCode::MultiplePromptsInFlight,
            FindingCode::ResultWithoutPrompt,
            FindingCode::CancelMismatch,
            FindingCode::PermissionOutsideTurn,
            FindingCode::CancelIdleSession,
            FindingCode::UnknownMode,
            FindingCode::MaxMessageBytesExceeded,
            FindingCode::MalformedEnvelope,
            FindingCode::NullRequestId,
            FindingCode::ToolOutOfOrder,
            FindingCode::CapabilityViolation,
            FindingCode::UnknownFields,
            FindingCode::MetaDisallowed,
            FindingCode::ContentKindDisallowed,
        ];
        ALL.into_iter().find(|c| c.code() == code)
    }

    /// The lane this code belongs to.
    #[must_use]
    pub fn lane(&self) -> Lane {
        match self {
            Self::NotInitialized | Self::DuplicateInitialize | Self::InvalidTransition => {
                Lane::Protocol
            }
            Self::UnknownSession
            | Self::MultiplePromptsInFlight
            | Self::ResultWithoutPrompt
            | Self::CancelMismatch
            | Self::PermissionOutsideTurn
            | Self::CancelIdleSession
            | Self::UnknownMode => Lane::Session,
            Self::MaxMessageBytesExceeded | Self::MalformedEnvelope | Self::NullRequestId => {
                Lane::Transport
            }
            Self::ToolOutOfOrder => Lane::ToolSurface,
            Self::CapabilityViolation
            | Self::UnknownFields
            | Self::MetaDisallowed
            | Self::ContentKindDisallowed => Lane::Implementation,
        }
    }

    /// The severity a finding with this code carries unless escalated.
    #[must_use]
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::NotInitialized
            | Self::DuplicateInitialize
            | Self::InvalidTransition
            | Self::UnknownSession
            | Self::MultiplePromptsInFlight
            | Self::ResultWithoutPrompt
            | Self::CancelMismatch
            | Self::PermissionOutsideTurn
            | Self::MaxMessageBytesExceeded
            | Self::MalformedEnvelope => Severity::Error,

            Self::UnknownMode
            | Self::NullRequestId
            | Self::ToolOutOfOrder
            | Self::CapabilityViolation
            | Self::MetaDisallowed
            | Self::ContentKindDisallowed => Severity::Warning,

            Self::CancelIdleSession | Self::UnknownFields => Severity::Info,
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for FindingCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for FindingCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Self::from_code(&code).ok_or_else(|| D::Error::custom(format!("unknown code {code}")))
    }
}

/// One structured observation emitted by the validator.
///
/// `(lane, severity, code, subject, trace_index)` is the deduplication
/// key: repeated folds over the same trace produce the same findings in
/// the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFinding {
    /// The lane whose rule fired.
    pub lane: Lane,
    /// The finding's severity.
    pub severity: Severity,
    /// What the finding is about.
    pub subject: Subject,
    /// The stable catalog code.
    pub code: FindingCode,
    /// Human-readable detail, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Position in the trace this finding anchors to.
    pub trace_index: usize,
    /// The protocol error behind a gating finding, if one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProtocolError>,
}

impl ValidationFinding {
    /// A finding with the code's default lane and severity.
    #[must_use]
    pub fn new(code: FindingCode, subject: Subject, trace_index: usize) -> Self {
        Self {
            lane: code.lane(),
            severity: code.default_severity(),
            subject,
            code,
            message: None,
            trace_index,
            failure: None,
        }
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Escalate or soften the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach the underlying protocol error.
    #[must_use]
    pub fn with_failure(mut self, failure: ProtocolError) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Whether this finding gates (error in a gating lane).
    #[must_use]
    pub fn is_gating(&self) -> bool {
        self.lane.gates() && self.severity == Severity::Error
    }

    /// The deduplication key.
    #[must_use]
    pub fn dedup_key(&self) -> (Lane, Severity, FindingCode, Subject, usize) {
        (
            self.lane,
            self.severity,
            self.code,
            self.subject.clone(),
            self.trace_index,
        )
    }
}

/// Identifies the connection a validation run was about.
///
/// Re-exported convenience so embedders can build findings reports keyed
/// by connection.
pub type Connection = ConnectionId;
