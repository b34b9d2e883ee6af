// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests over randomized message traces.

use aci_core::*;
use aci_protocol::{Phase, ProtocolSpec};
use aci_validate::{RuntimeProfile, Validator, ValidatorState};
use proptest::prelude::*;

// ── Trace generation ─────────────────────────────────────────────────────

/// Abstract operations appended after a valid handshake.
#[derive(Debug, Clone)]
enum Op {
    Prompt { id: i64, sid: u8 },
    PromptResult { id: i64, sid: u8, stop: StopReason },
    Cancel { sid: u8 },
    Update { sid: u8 },
    SetMode { id: i64, sid: u8 },
    ExtNotification,
}

fn sid_name(sid: u8) -> String {
    format!("s{}", sid % 3)
}

fn arb_stop_reason() -> impl Strategy<Value = StopReason> {
    prop_oneof![
        Just(StopReason::EndTurn),
        Just(StopReason::MaxTokens),
        Just(StopReason::Refusal),
        Just(StopReason::Cancelled),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1i64..50, any::<u8>()).prop_map(|(id, sid)| Op::Prompt { id, sid }),
        (1i64..50, any::<u8>(), arb_stop_reason())
            .prop_map(|(id, sid, stop)| Op::PromptResult { id, sid, stop }),
        any::<u8>().prop_map(|sid| Op::Cancel { sid }),
        any::<u8>().prop_map(|sid| Op::Update { sid }),
        (50i64..99, any::<u8>()).prop_map(|(id, sid)| Op::SetMode { id, sid }),
        Just(Op::ExtNotification),
    ]
}

fn op_message(op: &Op) -> Message {
    match op {
        Op::Prompt { id, sid } => Message::client_request(
            *id,
            ClientRequest::SessionPrompt(SessionPromptParams::text(sid_name(*sid), "go")),
        ),
        Op::PromptResult { id, sid, stop } => Message::agent_response(
            *id,
            AgentResponse::SessionPrompt(SessionPromptResult::new(sid_name(*sid), *stop)),
        ),
        Op::Cancel { sid } => Message::client_notification(ClientNotification::SessionCancel(
            SessionCancelParams::new(sid_name(*sid)),
        )),
        Op::Update { sid } => {
            Message::agent_notification(AgentNotification::SessionUpdate(SessionUpdateParams {
                session_id: SessionId::new(sid_name(*sid)),
                update: SessionUpdate::AgentMessageChunk {
                    content: ContentBlock::text("chunk"),
                    extra: ExtMap::new(),
                },
                meta: None,
                extra: ExtMap::new(),
            }))
        }
        Op::SetMode { id, sid } => Message::client_request(
            *id,
            ClientRequest::SessionSetMode(SessionSetModeParams {
                session_id: SessionId::new(sid_name(*sid)),
                mode_id: ModeId::new("ask"),
                extra: ExtMap::new(),
            }),
        ),
        Op::ExtNotification => Message::client_notification(ClientNotification::Ext {
            method: "telemetry/hint".into(),
            params: Some(serde_json::json!({"k": 1})),
        }),
    }
}

/// A trace that always begins with a clean handshake and two sessions.
fn arb_trace() -> impl Strategy<Value = Vec<Message>> {
    prop::collection::vec(arb_op(), 0..25).prop_map(|ops| {
        let mut messages = vec![
            Message::client_request(1, ClientRequest::Initialize(InitializeParams::default())),
            Message::agent_response(1, AgentResponse::Initialize(InitializeResult::default())),
            Message::client_request(
                2,
                ClientRequest::SessionNew(SessionNewParams {
                    cwd: "/tmp".into(),
                    mcp_servers: vec![],
                    extra: ExtMap::new(),
                }),
            ),
            Message::agent_response(2, AgentResponse::SessionNew(SessionNewResult::new("s0"))),
            Message::client_request(
                3,
                ClientRequest::SessionNew(SessionNewParams {
                    cwd: "/tmp".into(),
                    mcp_servers: vec![],
                    extra: ExtMap::new(),
                }),
            ),
            Message::agent_response(3, AgentResponse::SessionNew(SessionNewResult::new("s1"))),
        ];
        messages.extend(ops.iter().map(op_message));
        messages
    })
}

fn validator() -> Validator {
    Validator::new(
        ConnectionId::new("conn-prop"),
        ProtocolSpec::default(),
        RuntimeProfile::default(),
    )
}

// ── Properties ───────────────────────────────────────────────────────────

proptest! {
    /// Two runs over the same trace are identical, trace and findings.
    #[test]
    fn validation_is_deterministic(messages in arb_trace()) {
        let v = validator();
        let a = v.run(&messages, false, None);
        let b = v.run(&messages, false, None);
        prop_assert_eq!(a.findings, b.findings);
        prop_assert_eq!(a.trace, b.trace);
        prop_assert_eq!(a.final_phase, b.final_phase);
    }

    /// The online fold and the batch run agree message for message.
    #[test]
    fn online_and_batch_runs_agree(messages in arb_trace()) {
        let v = validator();
        let batch = v.run(&messages, false, None);

        let mut state = ValidatorState::new(ProtocolSpec::default().initial());
        let mut online = Vec::new();
        for message in &messages {
            let (next, findings) = v.step(&state, message);
            online.extend(findings);
            state = next;
        }

        prop_assert_eq!(online, batch.findings);
        prop_assert_eq!(state.phase, batch.final_phase);
    }

    /// A trace that completed the handshake never ends in the starting
    /// phase.
    #[test]
    fn initialized_traces_leave_the_initial_phase(messages in arb_trace()) {
        let run = validator().run(&messages, false, None);
        prop_assert!(run.final_phase != Phase::AwaitingInitialize);
    }

    /// Concurrency findings are bounded by the number of prompts sent for
    /// the offending session.
    #[test]
    fn inflight_findings_are_bounded_by_prompts(messages in arb_trace()) {
        let run = validator().run(&messages, false, None);
        for sid in ["s0", "s1", "s2"] {
            let prompts = messages
                .iter()
                .filter(|m| {
                    m.method() == "session/prompt"
                        && m.is_request()
                        && m.session_id().map(SessionId::as_str) == Some(sid)
                })
                .count();
            let flagged = run
                .findings
                .iter()
                .filter(|f| {
                    f.code.code() == "ACP.SESSION.MULTIPLE_PROMPTS_IN_FLIGHT"
                        && f.subject == aci_validate::Subject::Session(SessionId::new(sid))
                })
                .count();
            prop_assert!(flagged <= prompts);
        }
    }

    /// Findings always anchor to a valid trace index, and the dedup key
    /// identifies each finding uniquely.
    #[test]
    fn findings_anchor_and_dedup(messages in arb_trace()) {
        let run = validator().run(&messages, false, None);
        for finding in &run.findings {
            prop_assert!(finding.trace_index < run.trace.len());
        }
        let mut keys: Vec<_> = run.findings.iter().map(|f| f.dedup_key()).collect();
        let count = keys.len();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), count);
    }

    /// A cancel observed mid-turn is always resolved by the turn's end:
    /// a cancelled stop reason passes, anything else draws exactly one
    /// mismatch finding for that turn.
    #[test]
    fn cancel_is_always_resolved(stop in arb_stop_reason()) {
        let mut messages = vec![
            Message::client_request(1, ClientRequest::Initialize(InitializeParams::default())),
            Message::agent_response(1, AgentResponse::Initialize(InitializeResult::default())),
            Message::client_request(
                2,
                ClientRequest::SessionNew(SessionNewParams {
                    cwd: "/tmp".into(),
                    mcp_servers: vec![],
                    extra: ExtMap::new(),
                }),
            ),
            Message::agent_response(2, AgentResponse::SessionNew(SessionNewResult::new("s0"))),
            Message::client_request(
                4,
                ClientRequest::SessionPrompt(SessionPromptParams::text("s0", "go")),
            ),
            Message::client_notification(ClientNotification::SessionCancel(
                SessionCancelParams::new("s0"),
            )),
            Message::agent_response(
                4,
                AgentResponse::SessionPrompt(SessionPromptResult::new("s0", stop)),
            ),
        ];
        // Whatever happens, the turn is over afterwards.
        messages.push(Message::client_request(
            5,
            ClientRequest::SessionPrompt(SessionPromptParams::text("s0", "next")),
        ));

        let run = validator().run(&messages, false, None);
        let mismatches = run
            .findings
            .iter()
            .filter(|f| f.code.code() == "ACP.SESSION.CANCEL_MISMATCH")
            .count();
        if stop == StopReason::Cancelled {
            prop_assert_eq!(mismatches, 0);
        } else {
            prop_assert_eq!(mismatches, 1);
        }
        // The follow-up prompt was admitted either way.
        let state = run.final_phase.session(&SessionId::new("s0")).unwrap();
        prop_assert_eq!(state.inflight_prompt, Some(TurnId(2)));
    }
}
