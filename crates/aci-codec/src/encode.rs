// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame encoding: typed messages to raw JSON text.

use aci_core::rpc::JSONRPC_VERSION;
use aci_core::{
    AgentMessage, AgentNotification, AgentRequest, AgentResponse, ClientMessage,
    ClientNotification, ClientRequest, ClientResponse, Direction, JsonRpcId, Message,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::state::PendingRequest;
use crate::{CodecState, EncodeError};

fn to_value<T: Serialize>(payload: &T) -> Result<Value, EncodeError> {
    serde_json::to_value(payload).map_err(EncodeError::Serialize)
}

fn id_value(id: &JsonRpcId) -> Value {
    match id {
        JsonRpcId::Number(n) => Value::Number((*n).into()),
        JsonRpcId::Str(s) => Value::String(s.clone()),
        JsonRpcId::Null => Value::Null,
    }
}

fn frame_to_string(frame: Map<String, Value>) -> Result<String, EncodeError> {
    serde_json::to_string(&Value::Object(frame)).map_err(EncodeError::Serialize)
}

fn request_frame(
    method: &str,
    params: Option<Value>,
    id: Option<&JsonRpcId>,
) -> Map<String, Value> {
    let mut frame = Map::new();
    frame.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
    frame.insert("method".into(), Value::String(method.into()));
    if let Some(params) = params {
        frame.insert("params".into(), params);
    }
    if let Some(id) = id {
        frame.insert("id".into(), id_value(id));
    }
    frame
}

impl CodecState {
    /// Track an outbound request. Re-encoding a frame that was already
    /// decoded on this state (the interceptor pattern) finds an identical
    /// entry and is a no-op; a genuinely different request under the same
    /// id is rejected.
    fn register_outbound(
        &mut self,
        direction: Direction,
        id: JsonRpcId,
        entry: PendingRequest,
    ) -> Result<(), EncodeError> {
        match self.pending(direction).get(&id) {
            Some(existing) if *existing == entry => Ok(()),
            Some(_) => Err(EncodeError::DuplicateRequestId { id }),
            None => {
                self.pending_mut(direction).insert(id, entry);
                Ok(())
            }
        }
    }

    /// Encode a typed [`Message`] into one JSON frame.
    ///
    /// Outbound requests are registered in the pending table so the paired
    /// response can be decoded later; responses resolve their pending
    /// entry. On error `self` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::DuplicateRequestId`] when a request reuses an
    /// id that is still awaiting a response, or
    /// [`EncodeError::Serialize`] when a payload cannot be serialized.
    pub fn encode(&self, message: &Message) -> Result<(Self, String), EncodeError> {
        self.encode_with_id(None, message)
    }

    /// Like [`CodecState::encode`], but with an optional id override.
    ///
    /// When `id` is given, it replaces the id embedded in a request or
    /// response message. Notifications never carry an id; the override is
    /// ignored for them.
    ///
    /// # Errors
    ///
    /// Same contract as [`CodecState::encode`].
    pub fn encode_with_id(
        &self,
        id: Option<JsonRpcId>,
        message: &Message,
    ) -> Result<(Self, String), EncodeError> {
        let mut next = self.clone();
        let direction = message.direction();
        next.encoded.bump(direction);

        let text = match message {
            Message::FromClient(m) => next.encode_client(m, id)?,
            Message::FromAgent(m) => next.encode_agent(m, id)?,
        };
        Ok((next, text))
    }

    fn encode_client(
        &mut self,
        message: &ClientMessage,
        id_override: Option<JsonRpcId>,
    ) -> Result<String, EncodeError> {
        match message {
            ClientMessage::Request { id, request } => {
                let id = id_override.unwrap_or_else(|| id.clone());
                let entry = PendingRequest::for_client_request(request);
                self.register_outbound(Direction::FromClient, id.clone(), entry)?;
                if let ClientRequest::SessionLoad(p) = request {
                    self.seen_sessions.insert(p.session_id.clone());
                }
                let params = match request {
                    ClientRequest::Initialize(p) => Some(to_value(p)?),
                    ClientRequest::Authenticate(p) => Some(to_value(p)?),
                    ClientRequest::SessionNew(p) => Some(to_value(p)?),
                    ClientRequest::SessionLoad(p) => Some(to_value(p)?),
                    ClientRequest::SessionPrompt(p) => Some(to_value(p)?),
                    ClientRequest::SessionSetMode(p) => Some(to_value(p)?),
                    ClientRequest::Ext { params, .. } => params.clone(),
                };
                frame_to_string(request_frame(request.method(), params, Some(&id)))
            }
            ClientMessage::Notification { notification } => {
                let params = match notification {
                    ClientNotification::SessionCancel(p) => Some(to_value(p)?),
                    ClientNotification::Ext { params, .. } => params.clone(),
                };
                frame_to_string(request_frame(notification.method(), params, None))
            }
            ClientMessage::Response { id, response } => {
                let id = id_override.unwrap_or_else(|| id.clone());
                let result = match response {
                    ClientResponse::ReadTextFile(r) => to_value(r)?,
                    ClientResponse::WriteTextFile(r) => to_value(r)?,
                    ClientResponse::RequestPermission(r) => to_value(r)?,
                    ClientResponse::TerminalCreate(r) => to_value(r)?,
                    ClientResponse::TerminalOutput(r) => to_value(r)?,
                    ClientResponse::TerminalWaitForExit(r) => to_value(r)?,
                    ClientResponse::TerminalKill(r) => to_value(r)?,
                    ClientResponse::TerminalRelease(r) => to_value(r)?,
                    ClientResponse::Ext { result, .. } => result.clone(),
                };
                self.pending_mut(Direction::FromAgent).remove(&id);
                let mut frame = Map::new();
                frame.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
                frame.insert("result".into(), result);
                frame.insert("id".into(), id_value(&id));
                frame_to_string(frame)
            }
            ClientMessage::Error { id, error, .. } => {
                let id = id_override.unwrap_or_else(|| id.clone());
                self.pending_mut(Direction::FromAgent).remove(&id);
                let mut frame = Map::new();
                frame.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
                frame.insert("error".into(), to_value(error)?);
                frame.insert("id".into(), id_value(&id));
                frame_to_string(frame)
            }
        }
    }

    fn encode_agent(
        &mut self,
        message: &AgentMessage,
        id_override: Option<JsonRpcId>,
    ) -> Result<String, EncodeError> {
        match message {
            AgentMessage::Request { id, request } => {
                let id = id_override.unwrap_or_else(|| id.clone());
                let entry = PendingRequest::for_agent_request(request);
                self.register_outbound(Direction::FromAgent, id.clone(), entry)?;
                let params = match request {
                    AgentRequest::ReadTextFile(p) => Some(to_value(p)?),
                    AgentRequest::WriteTextFile(p) => Some(to_value(p)?),
                    AgentRequest::RequestPermission(p) => Some(to_value(p)?),
                    AgentRequest::TerminalCreate(p) => Some(to_value(p)?),
                    AgentRequest::TerminalOutput(p) => Some(to_value(p)?),
                    AgentRequest::TerminalWaitForExit(p) => Some(to_value(p)?),
                    AgentRequest::TerminalKill(p) => Some(to_value(p)?),
                    AgentRequest::TerminalRelease(p) => Some(to_value(p)?),
                    AgentRequest::Ext { params, .. } => params.clone(),
                };
                frame_to_string(request_frame(request.method(), params, Some(&id)))
            }
            AgentMessage::Notification { notification } => {
                let params = match notification {
                    AgentNotification::SessionUpdate(p) => Some(to_value(p)?),
                    AgentNotification::Ext { params, .. } => params.clone(),
                };
                frame_to_string(request_frame(notification.method(), params, None))
            }
            AgentMessage::Response { id, response } => {
                let id = id_override.unwrap_or_else(|| id.clone());
                let result = match response {
                    AgentResponse::Initialize(r) => to_value(r)?,
                    AgentResponse::Authenticate(r) => to_value(r)?,
                    AgentResponse::SessionNew(r) => {
                        self.seen_sessions.insert(r.session_id.clone());
                        to_value(r)?
                    }
                    AgentResponse::SessionLoad(r) => to_value(r)?,
                    AgentResponse::SessionPrompt(r) => to_value(r)?,
                    AgentResponse::SessionSetMode(r) => to_value(r)?,
                    AgentResponse::Ext { result, .. } => result.clone(),
                };
                self.pending_mut(Direction::FromClient).remove(&id);
                let mut frame = Map::new();
                frame.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
                frame.insert("result".into(), result);
                frame.insert("id".into(), id_value(&id));
                frame_to_string(frame)
            }
            AgentMessage::Error { id, error, .. } => {
                let id = id_override.unwrap_or_else(|| id.clone());
                self.pending_mut(Direction::FromClient).remove(&id);
                let mut frame = Map::new();
                frame.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
                frame.insert("error".into(), to_value(error)?);
                frame.insert("id".into(), id_value(&id));
                frame_to_string(frame)
            }
        }
    }
}
