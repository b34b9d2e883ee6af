// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based round-trip tests for the frame codec.

use aci_codec::CodecState;
use aci_core::*;
use proptest::prelude::*;
use serde_json::Value;

// ── Strategies ───────────────────────────────────────────────────────────

fn arb_string() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_ .-]{0,20}"
}

fn arb_nonempty_string() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,20}"
}

fn arb_id() -> impl Strategy<Value = JsonRpcId> {
    prop_oneof![
        any::<i64>().prop_map(JsonRpcId::Number),
        arb_nonempty_string().prop_map(JsonRpcId::Str),
        Just(JsonRpcId::Null),
    ]
}

fn arb_content() -> impl Strategy<Value = ContentBlock> {
    prop_oneof![
        arb_string().prop_map(ContentBlock::text),
        (arb_nonempty_string(), arb_nonempty_string()).prop_map(|(uri, name)| {
            ContentBlock::ResourceLink(ResourceLink {
                uri,
                name,
                title: None,
                description: None,
                mime_type: None,
                size: None,
                extra: ExtMap::new(),
            })
        }),
    ]
}

fn arb_client_request() -> impl Strategy<Value = ClientRequest> {
    prop_oneof![
        Just(ClientRequest::Initialize(InitializeParams::default())),
        (arb_nonempty_string(), prop::collection::vec(arb_content(), 0..4)).prop_map(
            |(sid, prompt)| {
                ClientRequest::SessionPrompt(SessionPromptParams {
                    session_id: SessionId::new(sid),
                    prompt,
                    meta: None,
                    extra: ExtMap::new(),
                })
            }
        ),
        (arb_nonempty_string(), arb_nonempty_string()).prop_map(|(sid, mode)| {
            ClientRequest::SessionSetMode(SessionSetModeParams {
                session_id: SessionId::new(sid),
                mode_id: ModeId::new(mode),
                extra: ExtMap::new(),
            })
        }),
        arb_nonempty_string().prop_map(|cwd| {
            ClientRequest::SessionNew(SessionNewParams {
                cwd,
                mcp_servers: vec![],
                extra: ExtMap::new(),
            })
        }),
    ]
}

fn arb_agent_request() -> impl Strategy<Value = AgentRequest> {
    prop_oneof![
        (arb_nonempty_string(), arb_nonempty_string()).prop_map(|(sid, path)| {
            AgentRequest::ReadTextFile(ReadTextFileParams {
                session_id: SessionId::new(sid),
                path,
                line: None,
                limit: None,
                extra: ExtMap::new(),
            })
        }),
        (arb_nonempty_string(), arb_nonempty_string()).prop_map(|(sid, terminal)| {
            AgentRequest::TerminalOutput(TerminalOutputParams {
                session_id: SessionId::new(sid),
                terminal_id: TerminalId::new(terminal),
                extra: ExtMap::new(),
            })
        }),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        (arb_id(), arb_client_request())
            .prop_map(|(id, request)| Message::client_request(id, request)),
        (arb_id(), arb_agent_request())
            .prop_map(|(id, request)| Message::agent_request(id, request)),
        arb_nonempty_string().prop_map(|sid| {
            Message::client_notification(ClientNotification::SessionCancel(
                SessionCancelParams::new(sid),
            ))
        }),
        (arb_nonempty_string(), arb_content()).prop_map(|(sid, content)| {
            Message::agent_notification(AgentNotification::SessionUpdate(SessionUpdateParams {
                session_id: SessionId::new(sid),
                update: SessionUpdate::AgentMessageChunk {
                    content,
                    extra: ExtMap::new(),
                },
                meta: None,
                extra: ExtMap::new(),
            }))
        }),
    ]
}

// ── Properties ───────────────────────────────────────────────────────────

proptest! {
    /// decode(encode(m)) is the identity on typed messages.
    #[test]
    fn decode_of_encode_is_identity(message in arb_message()) {
        let (_, text) = CodecState::new().encode(&message).unwrap();
        let (_, decoded) = CodecState::new()
            .decode(message.direction(), &text)
            .unwrap();
        prop_assert_eq!(decoded, message);
    }

    /// Encoding is stable: a decoded message re-encodes to structurally
    /// equal JSON.
    #[test]
    fn reencoding_is_structurally_stable(message in arb_message()) {
        let (_, first) = CodecState::new().encode(&message).unwrap();
        let (_, decoded) = CodecState::new()
            .decode(message.direction(), &first)
            .unwrap();
        let (_, second) = CodecState::new().encode(&decoded).unwrap();

        let a: Value = serde_json::from_str(&first).unwrap();
        let b: Value = serde_json::from_str(&second).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Requests leave exactly one pending entry; notifications none.
    #[test]
    fn pending_bookkeeping_matches_frame_kind(message in arb_message()) {
        let (state, _) = CodecState::new().encode(&message).unwrap();
        let direction = message.direction();
        let expected = usize::from(message.is_request());
        prop_assert_eq!(state.pending_count(direction), expected);
        prop_assert_eq!(state.pending_count(direction.opposite()), 0);
    }

    /// The codec never panics on arbitrary text.
    #[test]
    fn decode_is_total_over_garbage(text in ".{0,200}") {
        let _ = CodecState::new().decode(Direction::FromClient, &text);
        let _ = CodecState::new().decode(Direction::FromAgent, &text);
    }
}
