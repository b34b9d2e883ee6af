// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! aci-protocol
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Ordering and lifecycle rules for one ACP connection, as data.

mod machine;

use std::collections::BTreeMap;

use aci_core::{
    Message, ModeId, PROTOCOL_VERSION, ProtocolVersion, SessionId, StopReason, TurnId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The protocol definition: schema version plus the transition function.
///
/// # Examples
///
/// ```
/// use aci_core::{ClientRequest, InitializeParams, Message};
/// use aci_protocol::{Phase, ProtocolSpec};
///
/// let spec = ProtocolSpec::default();
/// let phase = spec.initial();
/// let message = Message::client_request(1, ClientRequest::Initialize(InitializeParams::default()));
/// let phase = spec.step(&phase, &message).unwrap();
/// assert_eq!(phase, Phase::WaitingForInitializeResult);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolSpec {
    /// The protocol schema version these rules target.
    pub schema: ProtocolVersion,
}

impl Default for ProtocolSpec {
    fn default() -> Self {
        Self {
            schema: PROTOCOL_VERSION,
        }
    }
}

impl ProtocolSpec {
    /// The phase of a fresh connection.
    #[must_use]
    pub fn initial(&self) -> Phase {
        Phase::AwaitingInitialize
    }

    /// Advance `phase` by one observed message.
    ///
    /// Total over well-formed messages: every `(phase, message)` pair
    /// either advances or yields a typed [`ProtocolError`]. A returned
    /// error leaves the phase untouched by construction, since `phase` is
    /// borrowed.
    ///
    /// # Errors
    ///
    /// One of the [`ProtocolError`] rules, earliest-listed rule first when
    /// several are violated at once.
    pub fn step(&self, phase: &Phase, message: &Message) -> Result<Phase, ProtocolError> {
        machine::step(phase, message)
    }
}

/// The lifecycle phase of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Nothing has happened yet; only `initialize` is legal.
    AwaitingInitialize,
    /// The client has asked to initialize; the agent has not confirmed.
    WaitingForInitializeResult,
    /// Handshake complete; sessions may be created and driven.
    Ready {
        /// Per-session lifecycle state, keyed by session id.
        sessions: BTreeMap<SessionId, SessionState>,
    },
}

impl Phase {
    /// Short name for error messages and findings.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingInitialize => "awaitingInitialize",
            Self::WaitingForInitializeResult => "waitingForInitializeResult",
            Self::Ready { .. } => "ready",
        }
    }

    /// An empty `Ready` phase.
    #[must_use]
    pub fn ready() -> Self {
        Self::Ready {
            sessions: BTreeMap::new(),
        }
    }

    /// Look up a session's state, if the phase is `Ready` and the session
    /// is known.
    #[must_use]
    pub fn session(&self, id: &SessionId) -> Option<&SessionState> {
        match self {
            Self::Ready { sessions } => sessions.get(id),
            _ => None,
        }
    }

    /// A copy of this phase with `session`'s turn cleared.
    ///
    /// This is the recovery a validator applies after reporting a turn
    /// that terminated wrongly: the turn is over either way.
    #[must_use]
    pub fn with_turn_ended(&self, session: &SessionId) -> Self {
        let mut next = self.clone();
        if let Self::Ready { sessions } = &mut next {
            if let Some(state) = sessions.get_mut(session) {
                state.inflight_prompt = None;
                state.cancel_requested = false;
            }
        }
        next
    }
}

/// Lifecycle state of one session inside [`Phase::Ready`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// The turn currently awaiting its prompt result, if any.
    pub inflight_prompt: Option<TurnId>,
    /// Set by `session/cancel`; cleared when the turn ends.
    pub cancel_requested: bool,
    /// The mode confirmed by the last `session/set_mode` result.
    pub mode: Option<ModeId>,
    /// How many turns have ever started on this session.
    pub turns_started: u64,
}

impl SessionState {
    /// State of a session created by a `session/new` result advertising
    /// `mode` as current.
    #[must_use]
    pub fn with_mode(mode: Option<ModeId>) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// A violated ordering or lifecycle rule.
///
/// Protocol errors never advance the phase; the frame was syntactically
/// fine, only its timing was wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProtocolError {
    /// A message arrived before the initialize handshake completed.
    #[error("{method} before the connection was initialized")]
    NotInitialized {
        /// The premature method.
        method: String,
    },

    /// A second initialize exchange was attempted.
    #[error("connection was already initialized")]
    DuplicateInitialize,

    /// A session-scoped message referenced a session this connection never
    /// created or loaded.
    #[error("{method} references unknown session {session}")]
    UnknownSession {
        /// The unknown session id.
        session: SessionId,
        /// The referencing method.
        method: String,
    },

    /// A prompt was sent while another prompt was still in flight.
    #[error("session {session} already has prompt turn {turn} in flight")]
    MultiplePromptsInFlight {
        /// The session with the active turn.
        session: SessionId,
        /// The turn already in flight.
        turn: TurnId,
    },

    /// A prompt result arrived for a session with no prompt in flight.
    #[error("prompt result for session {session} without a prompt in flight")]
    ResultWithoutPrompt {
        /// The idle session.
        session: SessionId,
    },

    /// A cancelled turn terminated with a stop reason other than
    /// `cancelled`.
    #[error(
        "turn {turn} of session {session} was cancelled but ended with {stop_reason:?}"
    )]
    CancelMismatch {
        /// The cancelled session.
        session: SessionId,
        /// The turn that ended wrongly.
        turn: TurnId,
        /// The stop reason the agent reported instead.
        stop_reason: StopReason,
    },

    /// A permission request arrived outside any prompt turn.
    #[error("permission request for session {session} outside a prompt turn")]
    PermissionOutsideTurn {
        /// The idle session.
        session: SessionId,
    },

    /// Catch-all for a message that fits no rule in the current phase.
    #[error("{method} is not a legal transition from the {from} phase")]
    InvalidTransition {
        /// The phase the connection was in.
        #[serde(skip_deserializing, default)]
        from: &'static str,
        /// The offending method.
        method: String,
    },
}
