// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-connection codec bookkeeping.

use std::collections::{BTreeMap, BTreeSet};

use aci_core::{AgentRequest, ClientRequest, Direction, JsonRpcId, ModeId, SessionId};

/// A request that has been sent and is awaiting its response.
///
/// Besides the method (used to type the paired response), the entry keeps
/// enough request context to enrich responses whose wire shape omits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// The request's wire method.
    pub method: String,
    /// The session the request addressed, if any.
    pub session: Option<SessionId>,
    /// The mode a `session/set_mode` request asked for.
    pub mode: Option<ModeId>,
}

impl PendingRequest {
    pub(crate) fn for_client_request(request: &ClientRequest) -> Self {
        Self {
            method: request.method().to_string(),
            session: request.session_id().cloned(),
            mode: match request {
                ClientRequest::SessionSetMode(p) => Some(p.mode_id.clone()),
                _ => None,
            },
        }
    }

    pub(crate) fn for_agent_request(request: &AgentRequest) -> Self {
        Self {
            method: request.method().to_string(),
            session: request.session_id().cloned(),
            mode: None,
        }
    }
}

/// Correlation and bookkeeping state for one connection.
///
/// The codec is a pure function over this state: [`CodecState::decode`] and
/// [`CodecState::encode`] return an updated copy and never mutate in place,
/// so a failed operation leaves the caller holding a consistent state.
///
/// # Examples
///
/// ```
/// use aci_core::Direction;
/// use aci_codec::CodecState;
///
/// let state = CodecState::new();
/// let frame = r#"{"jsonrpc":"2.0","method":"initialize","params":{"protocolVersion":1},"id":1}"#;
/// let (state, message) = state.decode(Direction::FromClient, frame).unwrap();
/// assert_eq!(message.method(), "initialize");
/// assert_eq!(state.pending_count(Direction::FromClient), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecState {
    /// Requests sent by the client, keyed by id, awaiting agent responses.
    pub(crate) pending_from_client: BTreeMap<JsonRpcId, PendingRequest>,
    /// Requests sent by the agent, keyed by id, awaiting client responses.
    pub(crate) pending_from_agent: BTreeMap<JsonRpcId, PendingRequest>,
    /// Session ids observed in `session/new` results and `session/load`
    /// requests.
    pub(crate) seen_sessions: BTreeSet<SessionId>,
    /// Frames decoded, per sending side.
    pub(crate) decoded: DirectionCounters,
    /// Frames encoded, per sending side.
    pub(crate) encoded: DirectionCounters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DirectionCounters {
    pub(crate) from_client: u64,
    pub(crate) from_agent: u64,
}

impl DirectionCounters {
    pub(crate) fn bump(&mut self, direction: Direction) {
        match direction {
            Direction::FromClient => self.from_client += 1,
            Direction::FromAgent => self.from_agent += 1,
        }
    }

    pub(crate) fn get(self, direction: Direction) -> u64 {
        match direction {
            Direction::FromClient => self.from_client,
            Direction::FromAgent => self.from_agent,
        }
    }
}

impl CodecState {
    /// Fresh state for a new connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outstanding requests originated by `direction`.
    #[must_use]
    pub fn pending_count(&self, direction: Direction) -> usize {
        self.pending(direction).len()
    }

    /// Look up the outstanding request originated by `direction` under `id`.
    #[must_use]
    pub fn pending_request(&self, direction: Direction, id: &JsonRpcId) -> Option<&PendingRequest> {
        self.pending(direction).get(id)
    }

    /// Whether a session id has been observed on this connection.
    #[must_use]
    pub fn has_seen_session(&self, session: &SessionId) -> bool {
        self.seen_sessions.contains(session)
    }

    /// Number of frames decoded that were sent by `direction`.
    #[must_use]
    pub fn frames_decoded(&self, direction: Direction) -> u64 {
        self.decoded.get(direction)
    }

    /// Number of frames encoded on behalf of `direction`.
    #[must_use]
    pub fn frames_encoded(&self, direction: Direction) -> u64 {
        self.encoded.get(direction)
    }

    pub(crate) fn pending(&self, direction: Direction) -> &BTreeMap<JsonRpcId, PendingRequest> {
        match direction {
            Direction::FromClient => &self.pending_from_client,
            Direction::FromAgent => &self.pending_from_agent,
        }
    }

    pub(crate) fn pending_mut(
        &mut self,
        direction: Direction,
    ) -> &mut BTreeMap<JsonRpcId, PendingRequest> {
        match direction {
            Direction::FromClient => &mut self.pending_from_client,
            Direction::FromAgent => &mut self.pending_from_agent,
        }
    }
}
