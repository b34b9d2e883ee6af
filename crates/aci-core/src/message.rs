// SPDX-License-Identifier: MIT OR Apache-2.0
//! The direction-tagged message algebra.
//!
//! A message is a value. Requests, notifications, responses, and error
//! responses each live on exactly one side of the connection; the codec is
//! the only component that turns wire frames into these values or back.
//! Unknown methods flow through the `Ext` variants without touching the
//! rest of the algebra.

use serde_json::Value;

use crate::payload::*;
use crate::rpc::{JsonRpcError, JsonRpcId};
use crate::{Direction, SessionId};

/// Canonical ACP method names.
pub mod method {
    /// Connection handshake.
    pub const INITIALIZE: &str = "initialize";
    /// Authentication with a previously advertised method.
    pub const AUTHENTICATE: &str = "authenticate";
    /// Create a session.
    pub const SESSION_NEW: &str = "session/new";
    /// Resume a previous session.
    pub const SESSION_LOAD: &str = "session/load";
    /// Start a prompt turn.
    pub const SESSION_PROMPT: &str = "session/prompt";
    /// Switch the session's interaction mode.
    pub const SESSION_SET_MODE: &str = "session/set_mode";
    /// Ask the agent to stop the in-flight turn (notification).
    pub const SESSION_CANCEL: &str = "session/cancel";
    /// Streamed progress during a turn (notification).
    pub const SESSION_UPDATE: &str = "session/update";
    /// Ask the user to authorize a tool call.
    pub const SESSION_REQUEST_PERMISSION: &str = "session/request_permission";
    /// Read a text file through the client.
    pub const FS_READ_TEXT_FILE: &str = "fs/read_text_file";
    /// Write a text file through the client.
    pub const FS_WRITE_TEXT_FILE: &str = "fs/write_text_file";
    /// Start a command in an embedder terminal.
    pub const TERMINAL_CREATE: &str = "terminal/create";
    /// Fetch terminal output so far.
    pub const TERMINAL_OUTPUT: &str = "terminal/output";
    /// Block until the terminal command exits.
    pub const TERMINAL_WAIT_FOR_EXIT: &str = "terminal/wait_for_exit";
    /// Kill the terminal command.
    pub const TERMINAL_KILL: &str = "terminal/kill";
    /// Dispose of a terminal.
    pub const TERMINAL_RELEASE: &str = "terminal/release";
}

/// A request the client sends to the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    /// `initialize`.
    Initialize(InitializeParams),
    /// `authenticate`.
    Authenticate(AuthenticateParams),
    /// `session/new`.
    SessionNew(SessionNewParams),
    /// `session/load`.
    SessionLoad(SessionLoadParams),
    /// `session/prompt`.
    SessionPrompt(SessionPromptParams),
    /// `session/set_mode`.
    SessionSetMode(SessionSetModeParams),
    /// A method this library does not know, preserved verbatim.
    Ext {
        /// The wire method name.
        method: String,
        /// Raw `params`, if present.
        params: Option<Value>,
    },
}

impl ClientRequest {
    /// The wire method name.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Initialize(_) => method::INITIALIZE,
            Self::Authenticate(_) => method::AUTHENTICATE,
            Self::SessionNew(_) => method::SESSION_NEW,
            Self::SessionLoad(_) => method::SESSION_LOAD,
            Self::SessionPrompt(_) => method::SESSION_PROMPT,
            Self::SessionSetMode(_) => method::SESSION_SET_MODE,
            Self::Ext { method, .. } => method,
        }
    }

    /// The session this request addresses, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::SessionLoad(p) => Some(&p.session_id),
            Self::SessionPrompt(p) => Some(&p.session_id),
            Self::SessionSetMode(p) => Some(&p.session_id),
            Self::Initialize(_) | Self::Authenticate(_) | Self::SessionNew(_) | Self::Ext { .. } => {
                None
            }
        }
    }
}

/// A notification the client sends to the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientNotification {
    /// `session/cancel`.
    SessionCancel(SessionCancelParams),
    /// A notification method this library does not know, preserved verbatim.
    Ext {
        /// The wire method name.
        method: String,
        /// Raw `params`, if present.
        params: Option<Value>,
    },
}

impl ClientNotification {
    /// The wire method name.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::SessionCancel(_) => method::SESSION_CANCEL,
            Self::Ext { method, .. } => method,
        }
    }

    /// The session this notification addresses, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::SessionCancel(p) => Some(&p.session_id),
            Self::Ext { .. } => None,
        }
    }
}

/// A successful response the client sends back to an agent request.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientResponse {
    /// Answers `fs/read_text_file`.
    ReadTextFile(ReadTextFileResult),
    /// Answers `fs/write_text_file`.
    WriteTextFile(WriteTextFileResult),
    /// Answers `session/request_permission`.
    RequestPermission(RequestPermissionResult),
    /// Answers `terminal/create`.
    TerminalCreate(TerminalCreateResult),
    /// Answers `terminal/output`.
    TerminalOutput(TerminalOutputResult),
    /// Answers `terminal/wait_for_exit`.
    TerminalWaitForExit(TerminalWaitForExitResult),
    /// Answers `terminal/kill`.
    TerminalKill(TerminalKillResult),
    /// Answers `terminal/release`.
    TerminalRelease(TerminalReleaseResult),
    /// Answers an unknown method, preserved verbatim.
    Ext {
        /// The method of the request this answers.
        method: String,
        /// Raw `result`.
        result: Value,
    },
}

impl ClientResponse {
    /// The method of the request this response answers.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::ReadTextFile(_) => method::FS_READ_TEXT_FILE,
            Self::WriteTextFile(_) => method::FS_WRITE_TEXT_FILE,
            Self::RequestPermission(_) => method::SESSION_REQUEST_PERMISSION,
            Self::TerminalCreate(_) => method::TERMINAL_CREATE,
            Self::TerminalOutput(_) => method::TERMINAL_OUTPUT,
            Self::TerminalWaitForExit(_) => method::TERMINAL_WAIT_FOR_EXIT,
            Self::TerminalKill(_) => method::TERMINAL_KILL,
            Self::TerminalRelease(_) => method::TERMINAL_RELEASE,
            Self::Ext { method, .. } => method,
        }
    }
}

/// Any message the client can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// A request awaiting an agent response.
    Request {
        /// Correlation id.
        id: JsonRpcId,
        /// The typed request.
        request: ClientRequest,
    },
    /// A fire-and-forget notification.
    Notification {
        /// The typed notification.
        notification: ClientNotification,
    },
    /// A successful response to an agent request.
    Response {
        /// Correlation id of the agent request.
        id: JsonRpcId,
        /// The typed response.
        response: ClientResponse,
    },
    /// An error response to an agent request.
    Error {
        /// Correlation id of the agent request.
        id: JsonRpcId,
        /// The method of the request this answers.
        method: String,
        /// The session the failed request addressed, when the codec could
        /// correlate one.
        session: Option<SessionId>,
        /// The wire error object.
        error: JsonRpcError,
    },
}

/// A request the agent sends to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentRequest {
    /// `fs/read_text_file`.
    ReadTextFile(ReadTextFileParams),
    /// `fs/write_text_file`.
    WriteTextFile(WriteTextFileParams),
    /// `session/request_permission`.
    RequestPermission(SessionRequestPermissionParams),
    /// `terminal/create`.
    TerminalCreate(TerminalCreateParams),
    /// `terminal/output`.
    TerminalOutput(TerminalOutputParams),
    /// `terminal/wait_for_exit`.
    TerminalWaitForExit(TerminalWaitForExitParams),
    /// `terminal/kill`.
    TerminalKill(TerminalKillParams),
    /// `terminal/release`.
    TerminalRelease(TerminalReleaseParams),
    /// A method this library does not know, preserved verbatim.
    Ext {
        /// The wire method name.
        method: String,
        /// Raw `params`, if present.
        params: Option<Value>,
    },
}

impl AgentRequest {
    /// The wire method name.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::ReadTextFile(_) => method::FS_READ_TEXT_FILE,
            Self::WriteTextFile(_) => method::FS_WRITE_TEXT_FILE,
            Self::RequestPermission(_) => method::SESSION_REQUEST_PERMISSION,
            Self::TerminalCreate(_) => method::TERMINAL_CREATE,
            Self::TerminalOutput(_) => method::TERMINAL_OUTPUT,
            Self::TerminalWaitForExit(_) => method::TERMINAL_WAIT_FOR_EXIT,
            Self::TerminalKill(_) => method::TERMINAL_KILL,
            Self::TerminalRelease(_) => method::TERMINAL_RELEASE,
            Self::Ext { method, .. } => method,
        }
    }

    /// The session this request addresses, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::ReadTextFile(p) => Some(&p.session_id),
            Self::WriteTextFile(p) => Some(&p.session_id),
            Self::RequestPermission(p) => Some(&p.session_id),
            Self::TerminalCreate(p) => Some(&p.session_id),
            Self::TerminalOutput(p) => Some(&p.session_id),
            Self::TerminalWaitForExit(p) => Some(&p.session_id),
            Self::TerminalKill(p) => Some(&p.session_id),
            Self::TerminalRelease(p) => Some(&p.session_id),
            Self::Ext { .. } => None,
        }
    }
}

/// A notification the agent sends to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentNotification {
    /// `session/update`.
    SessionUpdate(SessionUpdateParams),
    /// A notification method this library does not know, preserved verbatim.
    Ext {
        /// The wire method name.
        method: String,
        /// Raw `params`, if present.
        params: Option<Value>,
    },
}

impl AgentNotification {
    /// The wire method name.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::SessionUpdate(_) => method::SESSION_UPDATE,
            Self::Ext { method, .. } => method,
        }
    }

    /// The session this notification addresses, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::SessionUpdate(p) => Some(&p.session_id),
            Self::Ext { .. } => None,
        }
    }
}

/// A successful response the agent sends back to a client request.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    /// Answers `initialize`.
    Initialize(InitializeResult),
    /// Answers `authenticate`.
    Authenticate(AuthenticateResult),
    /// Answers `session/new`.
    SessionNew(SessionNewResult),
    /// Answers `session/load`.
    SessionLoad(SessionLoadResult),
    /// Answers `session/prompt`, ending the turn.
    SessionPrompt(SessionPromptResult),
    /// Answers `session/set_mode`.
    SessionSetMode(SessionSetModeResult),
    /// Answers an unknown method, preserved verbatim.
    Ext {
        /// The method of the request this answers.
        method: String,
        /// Raw `result`.
        result: Value,
    },
}

impl AgentResponse {
    /// The method of the request this response answers.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Initialize(_) => method::INITIALIZE,
            Self::Authenticate(_) => method::AUTHENTICATE,
            Self::SessionNew(_) => method::SESSION_NEW,
            Self::SessionLoad(_) => method::SESSION_LOAD,
            Self::SessionPrompt(_) => method::SESSION_PROMPT,
            Self::SessionSetMode(_) => method::SESSION_SET_MODE,
            Self::Ext { method, .. } => method,
        }
    }

    /// The session this response concerns, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::SessionNew(r) => Some(&r.session_id),
            Self::SessionPrompt(r) => Some(&r.session_id),
            Self::SessionSetMode(r) => Some(&r.session_id),
            Self::Initialize(_) | Self::Authenticate(_) | Self::SessionLoad(_) | Self::Ext { .. } => {
                None
            }
        }
    }
}

/// Any message the agent can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentMessage {
    /// A request awaiting a client response.
    Request {
        /// Correlation id.
        id: JsonRpcId,
        /// The typed request.
        request: AgentRequest,
    },
    /// A fire-and-forget notification.
    Notification {
        /// The typed notification.
        notification: AgentNotification,
    },
    /// A successful response to a client request.
    Response {
        /// Correlation id of the client request.
        id: JsonRpcId,
        /// The typed response.
        response: AgentResponse,
    },
    /// An error response to a client request.
    Error {
        /// Correlation id of the client request.
        id: JsonRpcId,
        /// The method of the request this answers.
        method: String,
        /// The session the failed request addressed, when the codec could
        /// correlate one.
        session: Option<SessionId>,
        /// The wire error object.
        error: JsonRpcError,
    },
}

/// A message from either side of the connection.
///
/// # Examples
///
/// ```
/// use aci_core::{ClientRequest, Direction, InitializeParams, Message};
///
/// let msg = Message::client_request(1, ClientRequest::Initialize(InitializeParams::default()));
/// assert_eq!(msg.direction(), Direction::FromClient);
/// assert_eq!(msg.method(), "initialize");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The client sent this.
    FromClient(ClientMessage),
    /// The agent sent this.
    FromAgent(AgentMessage),
}

impl Message {
    /// Wrap a client request with its correlation id.
    #[must_use]
    pub fn client_request(id: impl Into<JsonRpcId>, request: ClientRequest) -> Self {
        Self::FromClient(ClientMessage::Request {
            id: id.into(),
            request,
        })
    }

    /// Wrap a client notification.
    #[must_use]
    pub fn client_notification(notification: ClientNotification) -> Self {
        Self::FromClient(ClientMessage::Notification { notification })
    }

    /// Wrap a client response with the id of the agent request it answers.
    #[must_use]
    pub fn client_response(id: impl Into<JsonRpcId>, response: ClientResponse) -> Self {
        Self::FromClient(ClientMessage::Response {
            id: id.into(),
            response,
        })
    }

    /// Wrap an agent request with its correlation id.
    #[must_use]
    pub fn agent_request(id: impl Into<JsonRpcId>, request: AgentRequest) -> Self {
        Self::FromAgent(AgentMessage::Request {
            id: id.into(),
            request,
        })
    }

    /// Wrap an agent notification.
    #[must_use]
    pub fn agent_notification(notification: AgentNotification) -> Self {
        Self::FromAgent(AgentMessage::Notification { notification })
    }

    /// Wrap an agent response with the id of the client request it answers.
    #[must_use]
    pub fn agent_response(id: impl Into<JsonRpcId>, response: AgentResponse) -> Self {
        Self::FromAgent(AgentMessage::Response {
            id: id.into(),
            response,
        })
    }

    /// Which side produced this message.
    #[must_use]
    pub fn direction(&self) -> Direction {
        match self {
            Self::FromClient(_) => Direction::FromClient,
            Self::FromAgent(_) => Direction::FromAgent,
        }
    }

    /// The wire method name this message carries or answers.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::FromClient(m) => match m {
                ClientMessage::Request { request, .. } => request.method(),
                ClientMessage::Notification { notification } => notification.method(),
                ClientMessage::Response { response, .. } => response.method(),
                ClientMessage::Error { method, .. } => method,
            },
            Self::FromAgent(m) => match m {
                AgentMessage::Request { request, .. } => request.method(),
                AgentMessage::Notification { notification } => notification.method(),
                AgentMessage::Response { response, .. } => response.method(),
                AgentMessage::Error { method, .. } => method,
            },
        }
    }

    /// The correlation id, absent for notifications.
    #[must_use]
    pub fn id(&self) -> Option<&JsonRpcId> {
        match self {
            Self::FromClient(ClientMessage::Request { id, .. })
            | Self::FromClient(ClientMessage::Response { id, .. })
            | Self::FromClient(ClientMessage::Error { id, .. })
            | Self::FromAgent(AgentMessage::Request { id, .. })
            | Self::FromAgent(AgentMessage::Response { id, .. })
            | Self::FromAgent(AgentMessage::Error { id, .. }) => Some(id),
            Self::FromClient(ClientMessage::Notification { .. })
            | Self::FromAgent(AgentMessage::Notification { .. }) => None,
        }
    }

    /// The session this message addresses or concerns, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::FromClient(m) => match m {
                ClientMessage::Request { request, .. } => request.session_id(),
                ClientMessage::Notification { notification } => notification.session_id(),
                ClientMessage::Error { session, .. } => session.as_ref(),
                ClientMessage::Response { .. } => None,
            },
            Self::FromAgent(m) => match m {
                AgentMessage::Request { request, .. } => request.session_id(),
                AgentMessage::Notification { notification } => notification.session_id(),
                AgentMessage::Response { response, .. } => response.session_id(),
                AgentMessage::Error { session, .. } => session.as_ref(),
            },
        }
    }

    /// `true` for request frames (an `id` plus a `method`).
    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Self::FromClient(ClientMessage::Request { .. })
                | Self::FromAgent(AgentMessage::Request { .. })
        )
    }

    /// `true` for notification frames (a `method`, no `id`).
    #[must_use]
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            Self::FromClient(ClientMessage::Notification { .. })
                | Self::FromAgent(AgentMessage::Notification { .. })
        )
    }

    /// `true` for response frames, successful or error.
    #[must_use]
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            Self::FromClient(ClientMessage::Response { .. })
                | Self::FromClient(ClientMessage::Error { .. })
                | Self::FromAgent(AgentMessage::Response { .. })
                | Self::FromAgent(AgentMessage::Error { .. })
        )
    }

    /// `true` when this message decoded through an `Ext` escape hatch.
    #[must_use]
    pub fn is_ext(&self) -> bool {
        match self {
            Self::FromClient(m) => matches!(
                m,
                ClientMessage::Request {
                    request: ClientRequest::Ext { .. },
                    ..
                } | ClientMessage::Notification {
                    notification: ClientNotification::Ext { .. },
                } | ClientMessage::Response {
                    response: ClientResponse::Ext { .. },
                    ..
                }
            ),
            Self::FromAgent(m) => matches!(
                m,
                AgentMessage::Request {
                    request: AgentRequest::Ext { .. },
                    ..
                } | AgentMessage::Notification {
                    notification: AgentNotification::Ext { .. },
                } | AgentMessage::Response {
                    response: AgentResponse::Ext { .. },
                    ..
                }
            ),
        }
    }

    /// The opaque `_meta` object, for the payloads that define one.
    #[must_use]
    pub fn meta(&self) -> Option<&Value> {
        match self {
            Self::FromClient(ClientMessage::Request {
                request: ClientRequest::SessionPrompt(p),
                ..
            }) => p.meta.as_ref(),
            Self::FromAgent(AgentMessage::Response {
                response: AgentResponse::SessionPrompt(r),
                ..
            }) => r.meta.as_ref(),
            Self::FromAgent(AgentMessage::Notification {
                notification: AgentNotification::SessionUpdate(p),
            }) => p.meta.as_ref(),
            _ => None,
        }
    }
}
