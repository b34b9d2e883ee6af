// SPDX-License-Identifier: MIT OR Apache-2.0
//! The transition function, in one place.

use std::collections::BTreeMap;

use aci_core::{
    AgentMessage, AgentNotification, AgentRequest, AgentResponse, ClientMessage,
    ClientNotification, ClientRequest, Message, SessionId, StopReason, TurnId, method,
};

use crate::{Phase, ProtocolError, SessionState};

/// Advance `phase` by one message.
pub(crate) fn step(phase: &Phase, message: &Message) -> Result<Phase, ProtocolError> {
    // Unrecognized methods bypass the machine entirely. They stay visible
    // in the trace for the advisory lanes.
    if message.is_ext() {
        return Ok(phase.clone());
    }

    match phase {
        Phase::AwaitingInitialize => step_awaiting(message),
        Phase::WaitingForInitializeResult => step_waiting(message),
        Phase::Ready { sessions } => step_ready(sessions, message),
    }
}

fn not_initialized(message: &Message) -> ProtocolError {
    ProtocolError::NotInitialized {
        method: message.method().to_string(),
    }
}

fn step_awaiting(message: &Message) -> Result<Phase, ProtocolError> {
    match message {
        Message::FromClient(ClientMessage::Request {
            request: ClientRequest::Initialize(_),
            ..
        }) => Ok(Phase::WaitingForInitializeResult),
        _ => Err(not_initialized(message)),
    }
}

fn step_waiting(message: &Message) -> Result<Phase, ProtocolError> {
    match message {
        Message::FromAgent(AgentMessage::Response {
            response: AgentResponse::Initialize(_),
            ..
        }) => Ok(Phase::ready()),

        // A failed initialize returns the connection to its starting
        // phase; the client may retry.
        Message::FromAgent(AgentMessage::Error { method, .. })
            if method == method::INITIALIZE =>
        {
            Ok(Phase::AwaitingInitialize)
        }

        Message::FromClient(ClientMessage::Request {
            request: ClientRequest::Initialize(_),
            ..
        }) => Err(ProtocolError::DuplicateInitialize),

        _ => Err(not_initialized(message)),
    }
}

fn step_ready(
    sessions: &BTreeMap<SessionId, SessionState>,
    message: &Message,
) -> Result<Phase, ProtocolError> {
    match message {
        Message::FromClient(m) => step_ready_client(sessions, m),
        Message::FromAgent(m) => step_ready_agent(sessions, m),
    }
}

fn require_session<'a>(
    sessions: &'a BTreeMap<SessionId, SessionState>,
    session: &SessionId,
    method_name: &str,
) -> Result<&'a SessionState, ProtocolError> {
    sessions
        .get(session)
        .ok_or_else(|| ProtocolError::UnknownSession {
            session: session.clone(),
            method: method_name.to_string(),
        })
}

fn ready_with(
    sessions: &BTreeMap<SessionId, SessionState>,
    session: &SessionId,
    state: SessionState,
) -> Phase {
    let mut sessions = sessions.clone();
    sessions.insert(session.clone(), state);
    Phase::Ready { sessions }
}

fn unchanged(sessions: &BTreeMap<SessionId, SessionState>) -> Phase {
    Phase::Ready {
        sessions: sessions.clone(),
    }
}

fn step_ready_client(
    sessions: &BTreeMap<SessionId, SessionState>,
    message: &ClientMessage,
) -> Result<Phase, ProtocolError> {
    match message {
        ClientMessage::Request { request, .. } => match request {
            ClientRequest::Initialize(_) => Err(ProtocolError::DuplicateInitialize),

            ClientRequest::Authenticate(_) | ClientRequest::SessionNew(_) => {
                Ok(unchanged(sessions))
            }

            // The session becomes known as soon as the load is requested;
            // the result carries nothing to key on.
            ClientRequest::SessionLoad(p) => {
                if sessions.contains_key(&p.session_id) {
                    Ok(unchanged(sessions))
                } else {
                    Ok(ready_with(sessions, &p.session_id, SessionState::default()))
                }
            }

            ClientRequest::SessionPrompt(p) => {
                let state = require_session(sessions, &p.session_id, request.method())?;
                if let Some(turn) = state.inflight_prompt {
                    return Err(ProtocolError::MultiplePromptsInFlight {
                        session: p.session_id.clone(),
                        turn,
                    });
                }
                let mut next = state.clone();
                next.turns_started += 1;
                next.inflight_prompt = Some(TurnId(next.turns_started));
                next.cancel_requested = false;
                Ok(ready_with(sessions, &p.session_id, next))
            }

            ClientRequest::SessionSetMode(p) => {
                require_session(sessions, &p.session_id, request.method())?;
                // The mode changes when the agent confirms, not here.
                Ok(unchanged(sessions))
            }

            ClientRequest::Ext { .. } => Ok(unchanged(sessions)),
        },

        ClientMessage::Notification { notification } => match notification {
            ClientNotification::SessionCancel(p) => {
                let state = require_session(sessions, &p.session_id, notification.method())?;
                if state.inflight_prompt.is_none() {
                    // Cancelling an idle session is harmless; the
                    // validator notes it as information.
                    return Ok(unchanged(sessions));
                }
                let mut next = state.clone();
                next.cancel_requested = true;
                Ok(ready_with(sessions, &p.session_id, next))
            }
            ClientNotification::Ext { .. } => Ok(unchanged(sessions)),
        },

        // Client responses answer agent requests; they carry no session
        // lifecycle of their own.
        ClientMessage::Response { .. } | ClientMessage::Error { .. } => Ok(unchanged(sessions)),
    }
}

fn step_ready_agent(
    sessions: &BTreeMap<SessionId, SessionState>,
    message: &AgentMessage,
) -> Result<Phase, ProtocolError> {
    match message {
        AgentMessage::Response { response, .. } => match response {
            AgentResponse::Initialize(_) => Err(ProtocolError::DuplicateInitialize),

            AgentResponse::Authenticate(_) | AgentResponse::SessionLoad(_) => {
                Ok(unchanged(sessions))
            }

            AgentResponse::SessionNew(r) => {
                let mode = r
                    .modes
                    .as_ref()
                    .map(|m| m.current_mode_id.clone());
                Ok(ready_with(
                    sessions,
                    &r.session_id,
                    SessionState::with_mode(mode),
                ))
            }

            AgentResponse::SessionPrompt(r) => {
                let state = require_session(sessions, &r.session_id, response.method())?;
                let Some(turn) = state.inflight_prompt else {
                    return Err(ProtocolError::ResultWithoutPrompt {
                        session: r.session_id.clone(),
                    });
                };
                if state.cancel_requested && r.stop_reason != StopReason::Cancelled {
                    return Err(ProtocolError::CancelMismatch {
                        session: r.session_id.clone(),
                        turn,
                        stop_reason: r.stop_reason,
                    });
                }
                let mut next = state.clone();
                next.inflight_prompt = None;
                next.cancel_requested = false;
                Ok(ready_with(sessions, &r.session_id, next))
            }

            AgentResponse::SessionSetMode(r) => {
                let state = require_session(sessions, &r.session_id, response.method())?;
                let mut next = state.clone();
                next.mode = Some(r.mode_id.clone());
                Ok(ready_with(sessions, &r.session_id, next))
            }

            AgentResponse::Ext { .. } => Ok(unchanged(sessions)),
        },

        AgentMessage::Request { request, .. } => match request {
            AgentRequest::RequestPermission(p) => {
                let state = require_session(sessions, &p.session_id, request.method())?;
                if state.inflight_prompt.is_none() {
                    return Err(ProtocolError::PermissionOutsideTurn {
                        session: p.session_id.clone(),
                    });
                }
                Ok(unchanged(sessions))
            }

            AgentRequest::ReadTextFile(_)
            | AgentRequest::WriteTextFile(_)
            | AgentRequest::TerminalCreate(_)
            | AgentRequest::TerminalOutput(_)
            | AgentRequest::TerminalWaitForExit(_)
            | AgentRequest::TerminalKill(_)
            | AgentRequest::TerminalRelease(_) => {
                if let Some(session) = request.session_id() {
                    require_session(sessions, session, request.method())?;
                }
                Ok(unchanged(sessions))
            }

            AgentRequest::Ext { .. } => Ok(unchanged(sessions)),
        },

        AgentMessage::Notification { notification } => match notification {
            AgentNotification::SessionUpdate(p) => {
                require_session(sessions, &p.session_id, notification.method())?;
                Ok(unchanged(sessions))
            }
            AgentNotification::Ext { .. } => Ok(unchanged(sessions)),
        },

        // An error answering a prompt still ends the turn; other errors
        // leave the lifecycle alone.
        AgentMessage::Error {
            method: m, session, ..
        } => {
            if m == method::SESSION_PROMPT {
                if let Some(sid) = session {
                    if let Some(state) = sessions.get(sid) {
                        if state.inflight_prompt.is_some() {
                            let mut next = state.clone();
                            next.inflight_prompt = None;
                            next.cancel_requested = false;
                            return Ok(ready_with(sessions, sid, next));
                        }
                    }
                }
            }
            Ok(unchanged(sessions))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aci_core::{InitializeParams, InitializeResult, SessionNewResult, SessionPromptParams};

    fn ready_with_session(sid: &str) -> Phase {
        let mut sessions = BTreeMap::new();
        sessions.insert(SessionId::new(sid), SessionState::default());
        Phase::Ready { sessions }
    }

    #[test]
    fn initialize_walks_the_handshake() {
        let phase = Phase::AwaitingInitialize;
        let init = Message::client_request(1, ClientRequest::Initialize(InitializeParams::default()));
        let phase = step(&phase, &init).unwrap();
        assert_eq!(phase, Phase::WaitingForInitializeResult);

        let result =
            Message::agent_response(1, AgentResponse::Initialize(InitializeResult::default()));
        let phase = step(&phase, &result).unwrap();
        assert_eq!(phase, Phase::ready());
    }

    #[test]
    fn session_new_result_registers_the_session() {
        let phase = Phase::ready();
        let result =
            Message::agent_response(2, AgentResponse::SessionNew(SessionNewResult::new("s1")));
        let phase = step(&phase, &result).unwrap();
        assert!(phase.session(&SessionId::new("s1")).is_some());
    }

    #[test]
    fn prompt_assigns_monotonic_turns() {
        let phase = ready_with_session("s1");
        let prompt = Message::client_request(
            3,
            ClientRequest::SessionPrompt(SessionPromptParams::text("s1", "one")),
        );
        let phase = step(&phase, &prompt).unwrap();
        let state = phase.session(&SessionId::new("s1")).unwrap();
        assert_eq!(state.inflight_prompt, Some(TurnId(1)));
        assert_eq!(state.turns_started, 1);
    }
}
