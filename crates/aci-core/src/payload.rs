// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter and result payloads for every canonical ACP method.
//!
//! Shapes that the protocol defines `_meta` on carry it as an opaque
//! [`serde_json::Value`]; it is never inspected or rewritten. All payloads
//! keep unknown fields in a flattened extension bag.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    AgentCapabilities, AuthMethod, AuthMethodId, ClientCapabilities, ContentBlock, ExtMap, ModeId,
    PROTOCOL_VERSION, ProtocolVersion, SessionId, SessionUpdate, TerminalId, ToolCallUpdate,
};

// ---------------------------------------------------------------------------
// Initialization & authentication
// ---------------------------------------------------------------------------

/// Parameters of `initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// The latest protocol version the client supports.
    pub protocol_version: ProtocolVersion,
    /// Capabilities the client offers to the agent.
    #[serde(default)]
    pub client_capabilities: ClientCapabilities,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

impl Default for InitializeParams {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            client_capabilities: ClientCapabilities::default(),
            extra: ExtMap::new(),
        }
    }
}

/// Result of `initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// The version the connection will speak.
    pub protocol_version: ProtocolVersion,
    /// Capabilities the agent offers back.
    #[serde(default)]
    pub agent_capabilities: AgentCapabilities,
    /// Authentication methods the agent accepts, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth_methods: Vec<AuthMethod>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            agent_capabilities: AgentCapabilities::default(),
            auth_methods: Vec::new(),
            extra: ExtMap::new(),
        }
    }
}

/// Parameters of `authenticate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateParams {
    /// The method chosen from the advertised [`AuthMethod`] list.
    pub method_id: AuthMethodId,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `authenticate`. The protocol defines no fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuthenticateResult {
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// An MCP server the agent should connect to for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct McpServer {
    /// Display name of the server.
    pub name: String,
    /// Executable to spawn.
    pub command: String,
    /// Arguments passed to the executable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment variables set for the process.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVariable>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// A single environment variable binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnvVariable {
    /// Variable name.
    pub name: String,
    /// Variable value.
    pub value: String,
}

/// Parameters of `session/new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionNewParams {
    /// Working directory for the session. Expected to be absolute.
    pub cwd: String,
    /// MCP servers to connect.
    #[serde(default)]
    pub mcp_servers: Vec<McpServer>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `session/new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionNewResult {
    /// The freshly minted session id. Uniqueness is the agent's duty.
    pub session_id: SessionId,
    /// Interaction modes the session supports, if the agent has any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modes: Option<SessionModeState>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

impl SessionNewResult {
    /// A result carrying only the session id.
    #[must_use]
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            modes: None,
            extra: ExtMap::new(),
        }
    }
}

/// Mode advertisement attached to a new or loaded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionModeState {
    /// The mode in effect right now.
    pub current_mode_id: ModeId,
    /// All modes the session can switch between.
    pub available_modes: Vec<SessionMode>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// One selectable interaction mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionMode {
    /// Identifier used in `session/set_mode`.
    pub id: ModeId,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Parameters of `session/load`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionLoadParams {
    /// The session to resume.
    pub session_id: SessionId,
    /// Working directory for the resumed session.
    pub cwd: String,
    /// MCP servers to reconnect.
    #[serde(default)]
    pub mcp_servers: Vec<McpServer>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `session/load`. The protocol defines no fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionLoadResult {
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

// ---------------------------------------------------------------------------
// Prompt turns
// ---------------------------------------------------------------------------

/// Parameters of `session/prompt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionPromptParams {
    /// The session receiving the user message.
    pub session_id: SessionId,
    /// The blocks composing the user's message.
    pub prompt: Vec<ContentBlock>,
    /// Opaque embedder metadata, preserved bit for bit.
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

impl SessionPromptParams {
    /// A prompt consisting of a single text block.
    #[must_use]
    pub fn text(session_id: impl Into<SessionId>, text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            prompt: vec![ContentBlock::text(text)],
            meta: None,
            extra: ExtMap::new(),
        }
    }
}

/// Why a prompt turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The turn finished normally.
    EndTurn,
    /// The model hit its token ceiling.
    MaxTokens,
    /// The agent hit its per-turn request ceiling.
    MaxTurnRequests,
    /// The agent declined to continue.
    Refusal,
    /// The client cancelled the turn.
    Cancelled,
}

/// Result of `session/prompt`, ending the turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionPromptResult {
    /// The session whose turn ended.
    pub session_id: SessionId,
    /// Why the turn ended.
    pub stop_reason: StopReason,
    /// Opaque embedder metadata, preserved bit for bit.
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

impl SessionPromptResult {
    /// A result with the given stop reason and no metadata.
    #[must_use]
    pub fn new(session_id: impl Into<SessionId>, stop_reason: StopReason) -> Self {
        Self {
            session_id: session_id.into(),
            stop_reason,
            meta: None,
            extra: ExtMap::new(),
        }
    }
}

/// Parameters of the `session/cancel` notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCancelParams {
    /// The session whose turn should stop.
    pub session_id: SessionId,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

impl SessionCancelParams {
    /// Cancel for the given session.
    #[must_use]
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            extra: ExtMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// Parameters of `session/set_mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSetModeParams {
    /// The session switching mode.
    pub session_id: SessionId,
    /// The requested mode.
    pub mode_id: ModeId,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `session/set_mode`, confirming the switch.
///
/// The wire result may be an empty object; the codec fills the session and
/// mode back in from the pending request it correlates with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSetModeResult {
    /// The session that switched.
    pub session_id: SessionId,
    /// The mode now in effect.
    pub mode_id: ModeId,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

// ---------------------------------------------------------------------------
// Streaming updates
// ---------------------------------------------------------------------------

/// Parameters of the `session/update` notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdateParams {
    /// The session this update belongs to.
    pub session_id: SessionId,
    /// The update itself.
    pub update: SessionUpdate,
    /// Opaque embedder metadata, preserved bit for bit.
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

// ---------------------------------------------------------------------------
// Permission requests
// ---------------------------------------------------------------------------

/// Parameters of `session/request_permission`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequestPermissionParams {
    /// The session whose turn needs authorization.
    pub session_id: SessionId,
    /// The tool call awaiting permission.
    pub tool_call: ToolCallUpdate,
    /// Choices presented to the user.
    pub options: Vec<PermissionOption>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// One choice in a permission prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionOption {
    /// Identifier echoed back in the outcome.
    pub option_id: String,
    /// Label shown to the user.
    pub name: String,
    /// Hint for icons and default-button treatment.
    pub kind: PermissionOptionKind,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// The nature of a permission option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOptionKind {
    /// Allow this once.
    AllowOnce,
    /// Allow and remember.
    AllowAlways,
    /// Reject this once.
    RejectOnce,
    /// Reject and remember.
    RejectAlways,
}

/// Result of `session/request_permission`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestPermissionResult {
    /// What the user decided.
    pub outcome: PermissionOutcome,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// The user's decision on a permission request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PermissionOutcome {
    /// The turn was cancelled before the user answered.
    Cancelled,
    /// The user picked one of the offered options.
    #[serde(rename_all = "camelCase")]
    Selected {
        /// The chosen option.
        option_id: String,
    },
}

// ---------------------------------------------------------------------------
// File system
// ---------------------------------------------------------------------------

/// Parameters of `fs/read_text_file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadTextFileParams {
    /// The session on whose behalf the agent reads.
    pub session_id: SessionId,
    /// Absolute path to read.
    pub path: String,
    /// Optional 1-based first line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Optional maximum number of lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `fs/read_text_file`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReadTextFileResult {
    /// The file contents.
    pub content: String,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Parameters of `fs/write_text_file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteTextFileParams {
    /// The session on whose behalf the agent writes.
    pub session_id: SessionId,
    /// Absolute path to write.
    pub path: String,
    /// Full new file contents.
    pub content: String,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `fs/write_text_file`. The protocol defines no fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WriteTextFileResult {
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

// ---------------------------------------------------------------------------
// Terminals
// ---------------------------------------------------------------------------

/// Parameters of `terminal/create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalCreateParams {
    /// The session the terminal belongs to.
    pub session_id: SessionId,
    /// Command to run.
    pub command: String,
    /// Arguments for the command.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment variables for the command.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVariable>,
    /// Optional working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Cap on retained output bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_byte_limit: Option<u64>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `terminal/create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalCreateResult {
    /// Identifier of the new terminal.
    pub terminal_id: TerminalId,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Parameters of `terminal/output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalOutputParams {
    /// The owning session.
    pub session_id: SessionId,
    /// The terminal to read.
    pub terminal_id: TerminalId,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `terminal/output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalOutputResult {
    /// Output captured so far.
    pub output: String,
    /// Whether earlier output was dropped to honor the byte limit.
    #[serde(default)]
    pub truncated: bool,
    /// Exit status, if the command has finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<TerminalExitStatus>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// How a terminal command exited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalExitStatus {
    /// Process exit code, if it exited normally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<u32>,
    /// Terminating signal name, if killed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
}

/// Parameters of `terminal/wait_for_exit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalWaitForExitParams {
    /// The owning session.
    pub session_id: SessionId,
    /// The terminal to wait on.
    pub terminal_id: TerminalId,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `terminal/wait_for_exit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalWaitForExitResult {
    /// The exit status, flattened onto the result object.
    #[serde(flatten)]
    pub exit_status: TerminalExitStatus,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Parameters of `terminal/kill`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalKillParams {
    /// The owning session.
    pub session_id: SessionId,
    /// The terminal whose command should be killed.
    pub terminal_id: TerminalId,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `terminal/kill`. The protocol defines no fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TerminalKillResult {
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Parameters of `terminal/release`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalReleaseParams {
    /// The owning session.
    pub session_id: SessionId,
    /// The terminal to dispose of.
    pub terminal_id: TerminalId,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Result of `terminal/release`. The protocol defines no fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TerminalReleaseResult {
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}
