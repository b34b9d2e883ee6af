// SPDX-License-Identifier: MIT OR Apache-2.0
use aci_codec::{CodecState, DecodeError, EncodeError};
use aci_core::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

// ── Helpers ──────────────────────────────────────────────────────────────

fn frame(v: Value) -> String {
    serde_json::to_string(&v).unwrap()
}

/// Run the canonical handshake and session setup, returning the state.
fn ready_state() -> CodecState {
    let state = CodecState::new();
    let (state, _) = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "jsonrpc": "2.0",
                "method": "initialize",
                "params": {"protocolVersion": 1, "clientCapabilities": {"fs": {"readTextFile": true, "writeTextFile": false}, "terminal": false}},
                "id": 1
            })),
        )
        .unwrap();
    let (state, _) = state
        .decode(
            Direction::FromAgent,
            &frame(json!({"jsonrpc": "2.0", "result": {"protocolVersion": 1}, "id": 1})),
        )
        .unwrap();
    let (state, _) = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "jsonrpc": "2.0",
                "method": "session/new",
                "params": {"cwd": "/tmp", "mcpServers": []},
                "id": 2
            })),
        )
        .unwrap();
    let (state, _) = state
        .decode(
            Direction::FromAgent,
            &frame(json!({"jsonrpc": "2.0", "result": {"sessionId": "s1"}, "id": 2})),
        )
        .unwrap();
    state
}

// ── Happy path ───────────────────────────────────────────────────────────

#[test]
fn handshake_and_session_decode() {
    let state = ready_state();
    assert_eq!(state.pending_count(Direction::FromClient), 0);
    assert!(state.has_seen_session(&SessionId::new("s1")));
    assert_eq!(state.frames_decoded(Direction::FromClient), 2);
    assert_eq!(state.frames_decoded(Direction::FromAgent), 2);
}

#[test]
fn responses_are_typed_by_the_request_they_answer() {
    let state = CodecState::new();
    let (state, _) = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "method": "initialize",
                "params": {"protocolVersion": 1},
                "id": "init-1"
            })),
        )
        .unwrap();
    let (_, message) = state
        .decode(
            Direction::FromAgent,
            &frame(json!({
                "result": {"protocolVersion": 1, "agentCapabilities": {"loadSession": true}},
                "id": "init-1"
            })),
        )
        .unwrap();

    let Message::FromAgent(AgentMessage::Response { response, .. }) = message else {
        panic!("expected agent response");
    };
    let AgentResponse::Initialize(result) = response else {
        panic!("expected initialize result");
    };
    assert!(result.agent_capabilities.load_session);
}

#[test]
fn prompt_result_is_enriched_from_the_pending_request() {
    let state = ready_state();
    let (state, _) = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "method": "session/prompt",
                "params": {"sessionId": "s1", "prompt": [{"type": "text", "text": "hi"}]},
                "id": 3
            })),
        )
        .unwrap();
    // Result omits sessionId, as live agents do.
    let (_, message) = state
        .decode(
            Direction::FromAgent,
            &frame(json!({"result": {"stopReason": "end_turn"}, "id": 3})),
        )
        .unwrap();

    let Message::FromAgent(AgentMessage::Response {
        response: AgentResponse::SessionPrompt(result),
        ..
    }) = message
    else {
        panic!("expected prompt result");
    };
    assert_eq!(result.session_id.as_str(), "s1");
    assert_eq!(result.stop_reason, StopReason::EndTurn);
}

#[test]
fn set_mode_result_is_enriched_from_the_pending_request() {
    let state = ready_state();
    let (state, _) = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "method": "session/set_mode",
                "params": {"sessionId": "s1", "modeId": "plan"},
                "id": 4
            })),
        )
        .unwrap();
    let (_, message) = state
        .decode(Direction::FromAgent, &frame(json!({"result": {}, "id": 4})))
        .unwrap();

    let Message::FromAgent(AgentMessage::Response {
        response: AgentResponse::SessionSetMode(result),
        ..
    }) = message
    else {
        panic!("expected set_mode result");
    };
    assert_eq!(result.session_id.as_str(), "s1");
    assert_eq!(result.mode_id.as_str(), "plan");
}

// ── Direction correlation ────────────────────────────────────────────────

#[test]
fn agent_and_client_requests_correlate_independently() {
    // The same numeric id in flight on both sides must not collide.
    let state = ready_state();
    let (state, _) = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "method": "session/prompt",
                "params": {"sessionId": "s1", "prompt": []},
                "id": 7
            })),
        )
        .unwrap();
    let (state, _) = state
        .decode(
            Direction::FromAgent,
            &frame(json!({
                "method": "fs/read_text_file",
                "params": {"sessionId": "s1", "path": "/tmp/a.txt"},
                "id": 7
            })),
        )
        .unwrap();
    assert_eq!(state.pending_count(Direction::FromClient), 1);
    assert_eq!(state.pending_count(Direction::FromAgent), 1);

    // The client answers the agent's read.
    let (state, message) = state
        .decode(
            Direction::FromClient,
            &frame(json!({"result": {"content": "data"}, "id": 7})),
        )
        .unwrap();
    assert!(matches!(
        message,
        Message::FromClient(ClientMessage::Response {
            response: ClientResponse::ReadTextFile(_),
            ..
        })
    ));
    assert_eq!(state.pending_count(Direction::FromAgent), 0);
    assert_eq!(state.pending_count(Direction::FromClient), 1);
}

// ── Errors ───────────────────────────────────────────────────────────────

#[test]
fn invalid_json_is_rejected() {
    let err = CodecState::new()
        .decode(Direction::FromClient, "{nope")
        .unwrap_err();
    assert!(matches!(err, DecodeError::InvalidJson(_)));
}

#[test]
fn non_object_root_is_malformed() {
    let err = CodecState::new()
        .decode(Direction::FromClient, "[1,2,3]")
        .unwrap_err();
    assert!(matches!(err, DecodeError::MalformedEnvelope { .. }));
}

#[test]
fn method_and_result_together_are_malformed() {
    let err = CodecState::new()
        .decode(
            Direction::FromClient,
            &frame(json!({"method": "initialize", "result": {}, "id": 1})),
        )
        .unwrap_err();
    assert!(matches!(err, DecodeError::MalformedEnvelope { .. }));
}

#[test]
fn params_shape_mismatch_names_the_method() {
    let err = CodecState::new()
        .decode(
            Direction::FromClient,
            &frame(json!({"method": "initialize", "params": {"protocolVersion": "one"}, "id": 1})),
        )
        .unwrap_err();
    let DecodeError::ParamsShape { method, .. } = err else {
        panic!("expected params shape error");
    };
    assert_eq!(method, "initialize");
}

#[test]
fn unmatched_response_is_rejected() {
    let err = ready_state()
        .decode(
            Direction::FromAgent,
            &frame(json!({"result": {"sessionId": "s1", "stopReason": "end_turn"}, "id": 99})),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::UnmatchedResponse {
            id: JsonRpcId::Number(99)
        }
    ));
}

#[test]
fn duplicate_request_id_is_rejected() {
    let state = ready_state();
    let (state, _) = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "method": "session/prompt",
                "params": {"sessionId": "s1", "prompt": []},
                "id": 5
            })),
        )
        .unwrap();
    let err = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "method": "session/set_mode",
                "params": {"sessionId": "s1", "modeId": "code"},
                "id": 5
            })),
        )
        .unwrap_err();
    assert!(matches!(err, DecodeError::DuplicateRequestId { .. }));
}

#[test]
fn misdirected_method_is_rejected() {
    let err = CodecState::new()
        .decode(
            Direction::FromAgent,
            &frame(json!({"method": "initialize", "params": {"protocolVersion": 1}, "id": 1})),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::MethodNotApplicableInDirection {
            direction: Direction::FromAgent,
            ..
        }
    ));

    let err = CodecState::new()
        .decode(
            Direction::FromClient,
            &frame(json!({"method": "session/update", "params": {}})),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::MethodNotApplicableInDirection { .. }
    ));
}

#[test]
fn decode_errors_do_not_advance_state() {
    let state = ready_state();
    let before = state.clone();

    // Unmatched response.
    let _ = state
        .decode(Direction::FromAgent, &frame(json!({"result": {}, "id": 42})))
        .unwrap_err();
    assert_eq!(state, before);

    // Params shape failure on a request keeps the pending table unchanged.
    let _ = state
        .decode(
            Direction::FromClient,
            &frame(json!({"method": "session/prompt", "params": {"prompt": 1}, "id": 8})),
        )
        .unwrap_err();
    assert_eq!(state, before);
}

#[test]
fn failed_result_parse_keeps_the_pending_entry() {
    let state = ready_state();
    let (state, _) = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "method": "session/prompt",
                "params": {"sessionId": "s1", "prompt": []},
                "id": 6
            })),
        )
        .unwrap();

    // stopReason has the wrong type; the parse fails.
    let err = state
        .decode(
            Direction::FromAgent,
            &frame(json!({"result": {"sessionId": "s1", "stopReason": 17}, "id": 6})),
        )
        .unwrap_err();
    assert!(matches!(err, DecodeError::ParamsShape { .. }));

    // The request is still awaiting its response; a correct frame works.
    let (_, message) = state
        .decode(
            Direction::FromAgent,
            &frame(json!({"result": {"sessionId": "s1", "stopReason": "end_turn"}, "id": 6})),
        )
        .unwrap();
    assert_eq!(message.method(), "session/prompt");
}

// ── Notifications ────────────────────────────────────────────────────────

#[test]
fn cancel_is_a_notification_and_must_not_carry_an_id() {
    let state = ready_state();
    let (_, message) = state
        .decode(
            Direction::FromClient,
            &frame(json!({"method": "session/cancel", "params": {"sessionId": "s1"}})),
        )
        .unwrap();
    assert!(message.is_notification());

    let err = state
        .decode(
            Direction::FromClient,
            &frame(json!({"method": "session/cancel", "params": {"sessionId": "s1"}, "id": 9})),
        )
        .unwrap_err();
    assert!(matches!(err, DecodeError::MalformedEnvelope { .. }));
}

#[test]
fn known_request_method_without_id_is_malformed() {
    let err = CodecState::new()
        .decode(
            Direction::FromClient,
            &frame(json!({"method": "initialize", "params": {"protocolVersion": 1}})),
        )
        .unwrap_err();
    assert!(matches!(err, DecodeError::MalformedEnvelope { .. }));
}

// ── Null ids ─────────────────────────────────────────────────────────────

#[test]
fn null_id_is_a_legal_distinct_id() {
    let state = ready_state();
    let (state, message) = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "method": "session/prompt",
                "params": {"sessionId": "s1", "prompt": []},
                "id": null
            })),
        )
        .unwrap();
    assert_eq!(message.id(), Some(&JsonRpcId::Null));

    let (_, message) = state
        .decode(
            Direction::FromAgent,
            &frame(json!({"result": {"sessionId": "s1", "stopReason": "end_turn"}, "id": null})),
        )
        .unwrap();
    assert!(message.is_response());
}

// ── Ext passthrough ──────────────────────────────────────────────────────

#[test]
fn unknown_methods_decode_to_ext_and_reencode_verbatim() {
    let raw = json!({
        "jsonrpc": "2.0",
        "method": "proxy/forward",
        "params": {"hop": 1, "nested": {"deep": [true, null]}},
        "id": 11
    });
    let state = CodecState::new();
    let (state, message) = state.decode(Direction::FromClient, &frame(raw.clone())).unwrap();
    assert!(message.is_ext());
    assert_eq!(message.method(), "proxy/forward");

    let (_, encoded) = state.encode(&message).unwrap();
    let reencoded: Value = serde_json::from_str(&encoded).unwrap();
    assert_eq!(reencoded, raw);
}

#[test]
fn ext_response_pairs_with_ext_request() {
    let state = CodecState::new();
    let (state, _) = state
        .decode(
            Direction::FromClient,
            &frame(json!({"method": "proxy/forward", "params": {}, "id": 12})),
        )
        .unwrap();
    let (_, message) = state
        .decode(
            Direction::FromAgent,
            &frame(json!({"result": {"hops": 3}, "id": 12})),
        )
        .unwrap();

    let Message::FromAgent(AgentMessage::Response {
        response: AgentResponse::Ext { method, result },
        ..
    }) = message
    else {
        panic!("expected ext response");
    };
    assert_eq!(method, "proxy/forward");
    assert_eq!(result["hops"], 3);
}

#[test]
fn error_frames_decode_to_typed_errors_with_session_context() {
    let state = ready_state();
    let (state, _) = state
        .decode(
            Direction::FromClient,
            &frame(json!({
                "method": "session/prompt",
                "params": {"sessionId": "s1", "prompt": []},
                "id": 13
            })),
        )
        .unwrap();
    let (state, message) = state
        .decode(
            Direction::FromAgent,
            &frame(json!({"error": {"code": -32000, "message": "model overloaded"}, "id": 13})),
        )
        .unwrap();

    let Message::FromAgent(AgentMessage::Error {
        method, session, error, ..
    }) = message
    else {
        panic!("expected error response");
    };
    assert_eq!(method, "session/prompt");
    assert_eq!(session, Some(SessionId::new("s1")));
    assert_eq!(error.code, -32000);
    assert_eq!(state.pending_count(Direction::FromClient), 0);
}

// ── _meta passthrough ────────────────────────────────────────────────────

#[test]
fn meta_survives_decode_then_encode() {
    let raw = json!({
        "jsonrpc": "2.0",
        "method": "session/update",
        "params": {
            "sessionId": "s1",
            "update": {"sessionUpdate": "agent_message_chunk", "content": {"type": "text", "text": "hi"}},
            "_meta": {"traceparent": "00-abc-def-01", "baggage": "k=v"}
        }
    });
    let state = CodecState::new();
    let (state, message) = state.decode(Direction::FromAgent, &frame(raw.clone())).unwrap();

    let (_, encoded) = state.encode(&message).unwrap();
    let reencoded: Value = serde_json::from_str(&encoded).unwrap();
    assert_eq!(reencoded["params"]["_meta"]["traceparent"], "00-abc-def-01");
    assert_eq!(reencoded, raw);
}

// ── Encoding ─────────────────────────────────────────────────────────────

#[test]
fn encode_registers_the_pending_request() {
    let state = CodecState::new();
    let message = Message::client_request(
        21,
        ClientRequest::Initialize(InitializeParams::default()),
    );
    let (state, text) = state.encode(&message).unwrap();
    assert_eq!(state.pending_count(Direction::FromClient), 1);
    assert_eq!(state.frames_encoded(Direction::FromClient), 1);

    let v: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["jsonrpc"], "2.0");
    assert_eq!(v["method"], "initialize");
    assert_eq!(v["id"], 21);
}

#[test]
fn encode_rejects_a_different_request_under_an_inflight_id() {
    let state = CodecState::new();
    let first = Message::client_request(
        22,
        ClientRequest::SessionNew(SessionNewParams {
            cwd: "/tmp".into(),
            mcp_servers: vec![],
            extra: ExtMap::new(),
        }),
    );
    let (state, _) = state.encode(&first).unwrap();

    let second = Message::client_request(
        22,
        ClientRequest::SessionPrompt(SessionPromptParams::text("s1", "hi")),
    );
    let err = state.encode(&second).unwrap_err();
    assert!(matches!(err, EncodeError::DuplicateRequestId { .. }));
}

#[test]
fn reencoding_a_decoded_frame_is_idempotent() {
    // The interceptor pattern: decode inbound, re-encode outbound on the
    // same state.
    let raw = frame(json!({
        "jsonrpc": "2.0",
        "method": "initialize",
        "params": {"protocolVersion": 1},
        "id": 1
    }));
    let (state, message) = CodecState::new()
        .decode(Direction::FromClient, &raw)
        .unwrap();
    let (state, _) = state.encode(&message).unwrap();
    assert_eq!(state.pending_count(Direction::FromClient), 1);
}

#[test]
fn encode_with_id_overrides_the_embedded_id() {
    let state = CodecState::new();
    let message = Message::client_request(
        1,
        ClientRequest::Initialize(InitializeParams::default()),
    );
    let (_, text) = state
        .encode_with_id(Some(JsonRpcId::Str("override".into())), &message)
        .unwrap();
    let v: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["id"], "override");
}

#[test]
fn encode_notification_has_no_id() {
    let state = CodecState::new();
    let message = Message::client_notification(ClientNotification::SessionCancel(
        SessionCancelParams::new("s1"),
    ));
    let (_, text) = state.encode(&message).unwrap();
    let v: Value = serde_json::from_str(&text).unwrap();
    assert!(v.get("id").is_none());
    assert_eq!(v["method"], "session/cancel");
}

#[test]
fn decode_of_encode_is_identity() {
    let samples = vec![
        Message::client_request(
            31,
            ClientRequest::SessionPrompt(SessionPromptParams::text("s1", "do the thing")),
        ),
        Message::client_notification(ClientNotification::SessionCancel(
            SessionCancelParams::new("s1"),
        )),
        Message::agent_notification(AgentNotification::SessionUpdate(SessionUpdateParams {
            session_id: SessionId::new("s1"),
            update: SessionUpdate::AgentMessageChunk {
                content: ContentBlock::text("chunk"),
                extra: ExtMap::new(),
            },
            meta: Some(json!({"traceparent": "00-abc-def-01"})),
            extra: ExtMap::new(),
        })),
        Message::agent_request(
            32,
            AgentRequest::ReadTextFile(ReadTextFileParams {
                session_id: SessionId::new("s1"),
                path: "/tmp/a.txt".into(),
                line: Some(1),
                limit: None,
                extra: ExtMap::new(),
            }),
        ),
    ];

    for message in samples {
        let (_, text) = CodecState::new().encode(&message).unwrap();
        // The peer decodes from its own fresh state.
        let (_, decoded) = CodecState::new().decode(message.direction(), &text).unwrap();
        assert_eq!(decoded, message);
    }
}
