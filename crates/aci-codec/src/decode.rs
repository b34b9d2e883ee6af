// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame decoding: raw JSON text to typed messages.

use aci_core::rpc::JSONRPC_VERSION;
use aci_core::{
    AgentMessage, AgentNotification, AgentRequest, AgentResponse, ClientMessage,
    ClientNotification, ClientRequest, ClientResponse, Direction, JsonRpcError, JsonRpcId,
    Message, SessionId, method,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::state::PendingRequest;
use crate::{CodecState, DecodeError};

/// Methods the client sends as requests.
const CLIENT_REQUEST_METHODS: [&str; 6] = [
    method::INITIALIZE,
    method::AUTHENTICATE,
    method::SESSION_NEW,
    method::SESSION_LOAD,
    method::SESSION_PROMPT,
    method::SESSION_SET_MODE,
];

/// Methods the agent sends as requests.
const AGENT_REQUEST_METHODS: [&str; 8] = [
    method::FS_READ_TEXT_FILE,
    method::FS_WRITE_TEXT_FILE,
    method::SESSION_REQUEST_PERMISSION,
    method::TERMINAL_CREATE,
    method::TERMINAL_OUTPUT,
    method::TERMINAL_WAIT_FOR_EXIT,
    method::TERMINAL_KILL,
    method::TERMINAL_RELEASE,
];

fn malformed(reason: impl Into<String>) -> DecodeError {
    DecodeError::MalformedEnvelope {
        reason: reason.into(),
    }
}

fn parse_id(value: &Value) -> Result<JsonRpcId, DecodeError> {
    match value {
        Value::Null => Ok(JsonRpcId::Null),
        Value::String(s) => Ok(JsonRpcId::Str(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(JsonRpcId::Number)
            .ok_or_else(|| malformed("id must be an integer, a string, or null")),
        _ => Err(malformed("id must be an integer, a string, or null")),
    }
}

fn parse_payload<T: DeserializeOwned>(method: &str, payload: Value) -> Result<T, DecodeError> {
    serde_json::from_value(payload).map_err(|e| DecodeError::ParamsShape {
        method: method.to_string(),
        detail: e.to_string(),
    })
}

fn params_or_empty(params: Option<&Value>) -> Value {
    params.cloned().unwrap_or_else(|| Value::Object(Map::new()))
}

/// Insert `key` into a result object when the pending request knows the
/// value and the wire omitted it. Live agents often reply to
/// session-scoped requests with bare results; the correlation table is
/// what ties them back.
fn enrich_result(result: &mut Value, key: &str, value: Option<String>) {
    if let Value::Object(map) = result {
        if !map.contains_key(key) {
            if let Some(v) = value {
                map.insert(key.to_string(), Value::String(v));
            }
        }
    }
}

impl CodecState {
    /// Decode one raw frame sent by `direction` into a typed [`Message`].
    ///
    /// On success the returned state has recorded the frame (pending
    /// request added or resolved, counters bumped). On error `self` is
    /// unchanged and remains valid.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the text is not JSON, the envelope is
    /// not JSON-RPC 2.0, a known method's payload fails to parse, a
    /// response matches no outstanding request, or a request id is reused.
    pub fn decode(
        &self,
        direction: Direction,
        text: &str,
    ) -> Result<(Self, Message), DecodeError> {
        let root: Value = serde_json::from_str(text).map_err(DecodeError::InvalidJson)?;
        let Value::Object(frame) = root else {
            return Err(malformed("frame root must be a JSON object"));
        };

        if let Some(version) = frame.get("jsonrpc") {
            if version.as_str() != Some(JSONRPC_VERSION) {
                return Err(malformed(format!(
                    "jsonrpc must be \"{JSONRPC_VERSION}\", got {version}"
                )));
            }
        }

        let method_field = match frame.get("method") {
            None => None,
            Some(Value::String(m)) => Some(m.clone()),
            Some(_) => return Err(malformed("method must be a string")),
        };
        let has_result = frame.contains_key("result");
        let has_error = frame.contains_key("error");
        let id = frame.get("id").map(parse_id).transpose()?;

        if method_field.is_some() && (has_result || has_error) {
            return Err(malformed("frame carries both method and result/error"));
        }
        if has_result && has_error {
            return Err(malformed("frame carries both result and error"));
        }

        let mut next = self.clone();
        next.decoded.bump(direction);

        let message = if let Some(method_name) = method_field {
            next.decode_call(
                direction,
                &method_name,
                frame.get("params"),
                id,
            )?
        } else if has_result {
            next.decode_result(
                direction,
                id.ok_or_else(|| malformed("response frame has no id"))?,
                frame.get("result").cloned().unwrap_or(Value::Null),
            )?
        } else if has_error {
            let error: JsonRpcError = frame
                .get("error")
                .cloned()
                .map(|v| {
                    serde_json::from_value(v)
                        .map_err(|e| malformed(format!("error object: {e}")))
                })
                .transpose()?
                .ok_or_else(|| malformed("frame carries no error object"))?;
            next.decode_error(
                direction,
                id.ok_or_else(|| malformed("response frame has no id"))?,
                error,
            )?
        } else {
            return Err(malformed(
                "frame is neither a request, a notification, nor a response",
            ));
        };

        Ok((next, message))
    }

    fn decode_call(
        &mut self,
        direction: Direction,
        method_name: &str,
        params: Option<&Value>,
        id: Option<JsonRpcId>,
    ) -> Result<Message, DecodeError> {
        let known_request = match direction {
            Direction::FromClient => CLIENT_REQUEST_METHODS.contains(&method_name),
            Direction::FromAgent => AGENT_REQUEST_METHODS.contains(&method_name),
        };
        let known_notification = match direction {
            Direction::FromClient => method_name == method::SESSION_CANCEL,
            Direction::FromAgent => method_name == method::SESSION_UPDATE,
        };
        let misdirected = match direction {
            Direction::FromClient => {
                AGENT_REQUEST_METHODS.contains(&method_name)
                    || method_name == method::SESSION_UPDATE
            }
            Direction::FromAgent => {
                CLIENT_REQUEST_METHODS.contains(&method_name)
                    || method_name == method::SESSION_CANCEL
            }
        };

        if misdirected {
            return Err(DecodeError::MethodNotApplicableInDirection {
                method: method_name.to_string(),
                direction,
            });
        }
        if known_request && id.is_none() {
            return Err(malformed(format!("{method_name} requires an id")));
        }
        if known_notification && id.is_some() {
            return Err(malformed(format!("{method_name} must not carry an id")));
        }

        match (direction, id) {
            (Direction::FromClient, Some(id)) => {
                let request = self.parse_client_request(method_name, params)?;
                self.register_request(Direction::FromClient, id.clone(), &request)?;
                Ok(Message::FromClient(ClientMessage::Request { id, request }))
            }
            (Direction::FromClient, None) => {
                let notification = if known_notification {
                    ClientNotification::SessionCancel(parse_payload(
                        method_name,
                        params_or_empty(params),
                    )?)
                } else {
                    ClientNotification::Ext {
                        method: method_name.to_string(),
                        params: params.cloned(),
                    }
                };
                Ok(Message::FromClient(ClientMessage::Notification {
                    notification,
                }))
            }
            (Direction::FromAgent, Some(id)) => {
                let request = self.parse_agent_request(method_name, params)?;
                self.register_agent_request(id.clone(), &request)?;
                Ok(Message::FromAgent(AgentMessage::Request { id, request }))
            }
            (Direction::FromAgent, None) => {
                let notification = if known_notification {
                    AgentNotification::SessionUpdate(parse_payload(
                        method_name,
                        params_or_empty(params),
                    )?)
                } else {
                    AgentNotification::Ext {
                        method: method_name.to_string(),
                        params: params.cloned(),
                    }
                };
                Ok(Message::FromAgent(AgentMessage::Notification {
                    notification,
                }))
            }
        }
    }

    fn parse_client_request(
        &self,
        method_name: &str,
        params: Option<&Value>,
    ) -> Result<ClientRequest, DecodeError> {
        let payload = params_or_empty(params);
        Ok(match method_name {
            method::INITIALIZE => ClientRequest::Initialize(parse_payload(method_name, payload)?),
            method::AUTHENTICATE => {
                ClientRequest::Authenticate(parse_payload(method_name, payload)?)
            }
            method::SESSION_NEW => ClientRequest::SessionNew(parse_payload(method_name, payload)?),
            method::SESSION_LOAD => {
                ClientRequest::SessionLoad(parse_payload(method_name, payload)?)
            }
            method::SESSION_PROMPT => {
                ClientRequest::SessionPrompt(parse_payload(method_name, payload)?)
            }
            method::SESSION_SET_MODE => {
                ClientRequest::SessionSetMode(parse_payload(method_name, payload)?)
            }
            _ => ClientRequest::Ext {
                method: method_name.to_string(),
                params: params.cloned(),
            },
        })
    }

    fn parse_agent_request(
        &self,
        method_name: &str,
        params: Option<&Value>,
    ) -> Result<AgentRequest, DecodeError> {
        let payload = params_or_empty(params);
        Ok(match method_name {
            method::FS_READ_TEXT_FILE => {
                AgentRequest::ReadTextFile(parse_payload(method_name, payload)?)
            }
            method::FS_WRITE_TEXT_FILE => {
                AgentRequest::WriteTextFile(parse_payload(method_name, payload)?)
            }
            method::SESSION_REQUEST_PERMISSION => {
                AgentRequest::RequestPermission(parse_payload(method_name, payload)?)
            }
            method::TERMINAL_CREATE => {
                AgentRequest::TerminalCreate(parse_payload(method_name, payload)?)
            }
            method::TERMINAL_OUTPUT => {
                AgentRequest::TerminalOutput(parse_payload(method_name, payload)?)
            }
            method::TERMINAL_WAIT_FOR_EXIT => {
                AgentRequest::TerminalWaitForExit(parse_payload(method_name, payload)?)
            }
            method::TERMINAL_KILL => {
                AgentRequest::TerminalKill(parse_payload(method_name, payload)?)
            }
            method::TERMINAL_RELEASE => {
                AgentRequest::TerminalRelease(parse_payload(method_name, payload)?)
            }
            _ => AgentRequest::Ext {
                method: method_name.to_string(),
                params: params.cloned(),
            },
        })
    }

    fn register_request(
        &mut self,
        direction: Direction,
        id: JsonRpcId,
        request: &ClientRequest,
    ) -> Result<(), DecodeError> {
        if self.pending(direction).contains_key(&id) {
            return Err(DecodeError::DuplicateRequestId { id });
        }
        if let ClientRequest::SessionLoad(p) = request {
            self.seen_sessions.insert(p.session_id.clone());
        }
        self.pending_mut(direction)
            .insert(id, PendingRequest::for_client_request(request));
        Ok(())
    }

    fn register_agent_request(
        &mut self,
        id: JsonRpcId,
        request: &AgentRequest,
    ) -> Result<(), DecodeError> {
        if self.pending(Direction::FromAgent).contains_key(&id) {
            return Err(DecodeError::DuplicateRequestId { id });
        }
        self.pending_mut(Direction::FromAgent)
            .insert(id, PendingRequest::for_agent_request(request));
        Ok(())
    }

    fn take_pending(
        &mut self,
        responder: Direction,
        id: &JsonRpcId,
    ) -> Result<PendingRequest, DecodeError> {
        let requester = responder.opposite();
        self.pending_mut(requester)
            .remove(id)
            .ok_or_else(|| DecodeError::UnmatchedResponse { id: id.clone() })
    }

    fn decode_result(
        &mut self,
        direction: Direction,
        id: JsonRpcId,
        mut result: Value,
    ) -> Result<Message, DecodeError> {
        // Peek first: a failed payload parse must not consume the entry.
        let requester = direction.opposite();
        let pending = self
            .pending(requester)
            .get(&id)
            .cloned()
            .ok_or_else(|| DecodeError::UnmatchedResponse { id: id.clone() })?;

        let message = match direction {
            Direction::FromAgent => {
                let response = match pending.method.as_str() {
                    method::INITIALIZE => {
                        AgentResponse::Initialize(parse_payload(&pending.method, result)?)
                    }
                    method::AUTHENTICATE => {
                        AgentResponse::Authenticate(parse_payload(&pending.method, result)?)
                    }
                    method::SESSION_NEW => {
                        let parsed = parse_payload::<aci_core::SessionNewResult>(
                            &pending.method,
                            result,
                        )?;
                        self.seen_sessions.insert(parsed.session_id.clone());
                        AgentResponse::SessionNew(parsed)
                    }
                    method::SESSION_LOAD => {
                        AgentResponse::SessionLoad(parse_payload(&pending.method, result)?)
                    }
                    method::SESSION_PROMPT => {
                        enrich_result(
                            &mut result,
                            "sessionId",
                            pending.session.as_ref().map(|s| s.0.clone()),
                        );
                        AgentResponse::SessionPrompt(parse_payload(&pending.method, result)?)
                    }
                    method::SESSION_SET_MODE => {
                        enrich_result(
                            &mut result,
                            "sessionId",
                            pending.session.as_ref().map(|s| s.0.clone()),
                        );
                        enrich_result(
                            &mut result,
                            "modeId",
                            pending.mode.as_ref().map(|m| m.0.clone()),
                        );
                        AgentResponse::SessionSetMode(parse_payload(&pending.method, result)?)
                    }
                    _ => AgentResponse::Ext {
                        method: pending.method.clone(),
                        result,
                    },
                };
                Message::FromAgent(AgentMessage::Response { id: id.clone(), response })
            }
            Direction::FromClient => {
                let response = match pending.method.as_str() {
                    method::FS_READ_TEXT_FILE => {
                        ClientResponse::ReadTextFile(parse_payload(&pending.method, result)?)
                    }
                    method::FS_WRITE_TEXT_FILE => {
                        ClientResponse::WriteTextFile(parse_payload(&pending.method, result)?)
                    }
                    method::SESSION_REQUEST_PERMISSION => {
                        ClientResponse::RequestPermission(parse_payload(&pending.method, result)?)
                    }
                    method::TERMINAL_CREATE => {
                        ClientResponse::TerminalCreate(parse_payload(&pending.method, result)?)
                    }
                    method::TERMINAL_OUTPUT => {
                        ClientResponse::TerminalOutput(parse_payload(&pending.method, result)?)
                    }
                    method::TERMINAL_WAIT_FOR_EXIT => {
                        ClientResponse::TerminalWaitForExit(parse_payload(&pending.method, result)?)
                    }
                    method::TERMINAL_KILL => {
                        ClientResponse::TerminalKill(parse_payload(&pending.method, result)?)
                    }
                    method::TERMINAL_RELEASE => {
                        ClientResponse::TerminalRelease(parse_payload(&pending.method, result)?)
                    }
                    _ => ClientResponse::Ext {
                        method: pending.method.clone(),
                        result,
                    },
                };
                Message::FromClient(ClientMessage::Response { id: id.clone(), response })
            }
        };

        // Parse succeeded: the request is now answered.
        self.take_pending(direction, &id)?;
        Ok(message)
    }

    fn decode_error(
        &mut self,
        direction: Direction,
        id: JsonRpcId,
        error: JsonRpcError,
    ) -> Result<Message, DecodeError> {
        let pending = self.take_pending(direction, &id)?;
        let session: Option<SessionId> = pending.session;
        Ok(match direction {
            Direction::FromAgent => Message::FromAgent(AgentMessage::Error {
                id,
                method: pending.method,
                session,
                error,
            }),
            Direction::FromClient => Message::FromClient(ClientMessage::Error {
                id,
                method: pending.method,
                session,
                error,
            }),
        })
    }
}
