// SPDX-License-Identifier: MIT OR Apache-2.0
//! The lane validator: one step function, two entry points.

use std::collections::{BTreeMap, BTreeSet};

use aci_core::{
    AgentCapabilities, AgentMessage, AgentNotification, AgentRequest, AgentResponse,
    ClientCapabilities, ClientMessage, ClientNotification, ClientRequest, ClientResponse,
    ConnectionId, ContentBlock, Direction, JsonRpcId, Message, ModeId, SessionId, SessionUpdate,
    ToolCallId, ToolCallStatus,
};
use aci_protocol::{Phase, ProtocolError, ProtocolSpec};
use chrono::{DateTime, Utc};

use crate::finding::{FindingCode, Subject, ValidationFinding};
use crate::profile::RuntimeProfile;

/// Injected time source for trace timestamps. Keeping the clock outside
/// the engine keeps runs reproducible.
pub type Clock<'a> = &'a dyn Fn() -> DateTime<Utc>;

/// One observed message, anchored to its position.
///
/// The trace is append-only; downstream tooling depends on index
/// stability for subject anchoring.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    /// Position in the trace.
    pub index: usize,
    /// Which side sent the message.
    pub direction: Direction,
    /// The method observed at this position.
    pub method: String,
    /// When the validator observed it, if a clock was supplied.
    pub observed_at: Option<DateTime<Utc>>,
    /// `false` for messages after a halt: they were recorded but not
    /// validated.
    pub validated: bool,
    /// The message itself.
    pub message: Message,
}

/// The outcome of a validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRun {
    /// The connection the run was about.
    pub connection: ConnectionId,
    /// Every observed message in order.
    pub trace: Vec<TraceEntry>,
    /// Findings in emission order.
    pub findings: Vec<ValidationFinding>,
    /// The phase after the last validated message.
    pub final_phase: Phase,
}

/// Everything the validator remembers between messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorState {
    /// The protocol phase.
    pub phase: Phase,
    next_index: usize,
    client_caps: Option<ClientCapabilities>,
    agent_caps: Option<AgentCapabilities>,
    session_modes: BTreeMap<SessionId, BTreeSet<ModeId>>,
    tool_calls: BTreeMap<ToolCallId, ToolCallStatus>,
}

impl ValidatorState {
    /// Fresh state starting from `phase`.
    #[must_use]
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            next_index: 0,
            client_caps: None,
            agent_caps: None,
            session_modes: BTreeMap::new(),
            tool_calls: BTreeMap::new(),
        }
    }

    /// The index the next observed message will get.
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Capture advertisements and tool lifecycle off an admitted message.
    fn observe(&mut self, message: &Message, track_tools: bool) {
        match message {
            Message::FromClient(ClientMessage::Request {
                request: ClientRequest::Initialize(p),
                ..
            }) => {
                self.client_caps = Some(p.client_capabilities.clone());
            }
            Message::FromAgent(AgentMessage::Response {
                response: AgentResponse::Initialize(r),
                ..
            }) => {
                self.agent_caps = Some(r.agent_capabilities.clone());
            }
            Message::FromAgent(AgentMessage::Response {
                response: AgentResponse::SessionNew(r),
                ..
            }) => {
                if let Some(modes) = &r.modes {
                    self.session_modes.insert(
                        r.session_id.clone(),
                        modes.available_modes.iter().map(|m| m.id.clone()).collect(),
                    );
                }
            }
            Message::FromAgent(AgentMessage::Notification {
                notification: AgentNotification::SessionUpdate(p),
            }) if track_tools => match &p.update {
                SessionUpdate::ToolCall(call) => {
                    self.tool_calls.insert(call.id.clone(), call.status);
                }
                SessionUpdate::ToolCallUpdate(update) => {
                    if let Some(status) = update.status {
                        self.tool_calls.insert(update.id.clone(), status);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
}

/// A configured validator for one connection.
///
/// # Examples
///
/// ```
/// use aci_core::{ClientRequest, ConnectionId, InitializeParams, Message};
/// use aci_protocol::ProtocolSpec;
/// use aci_validate::{RuntimeProfile, Validator};
///
/// let validator = Validator::new(
///     ConnectionId::new("conn-1"),
///     ProtocolSpec::default(),
///     RuntimeProfile::default(),
/// );
/// let messages = vec![Message::client_request(
///     1,
///     ClientRequest::Initialize(InitializeParams::default()),
/// )];
/// let run = validator.run(&messages, false, None);
/// assert!(run.findings.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Validator {
    /// Label attached to runs, for embedders juggling many connections.
    pub connection: ConnectionId,
    /// The protocol rules to fold with.
    pub spec: ProtocolSpec,
    /// Strictness switches.
    pub profile: RuntimeProfile,
}

impl Validator {
    /// A validator for `connection` with the given rules and profile.
    #[must_use]
    pub fn new(connection: ConnectionId, spec: ProtocolSpec, profile: RuntimeProfile) -> Self {
        Self {
            connection,
            spec,
            profile,
        }
    }

    /// Observe one message: advance the phase and emit this message's
    /// findings, sorted by lane then code.
    ///
    /// Both the online (per message) and the batch ([`Validator::run`])
    /// entry points go through here, so they cannot drift apart.
    #[must_use]
    pub fn step(
        &self,
        state: &ValidatorState,
        message: &Message,
    ) -> (ValidatorState, Vec<ValidationFinding>) {
        let index = state.next_index;
        let mut next = state.clone();
        next.next_index += 1;
        let mut findings = Vec::new();

        self.transport_checks(message, index, &mut findings);

        match self.spec.step(&state.phase, message) {
            Ok(phase_after) => {
                self.session_checks(state, message, index, &mut findings);
                self.tool_surface_checks(state, message, index, &mut findings);
                self.implementation_checks(state, message, index, &mut findings);
                next.observe(message, self.profile.tool_surface_enabled);
                next.phase = phase_after;
                tracing::debug!(index, method = message.method(), "message admitted");
            }
            Err(error) => {
                // The turn is over even when it ended with the wrong stop
                // reason; leaving it in flight would cascade into bogus
                // findings for the rest of the trace.
                if let ProtocolError::CancelMismatch { session, .. } = &error {
                    next.phase = state.phase.with_turn_ended(session);
                }
                findings.push(finding_for_error(&error, message, index));
            }
        }

        findings.sort_by(|a, b| {
            a.lane
                .cmp(&b.lane)
                .then_with(|| a.code.code().cmp(b.code.code()))
        });
        for finding in &findings {
            if finding.is_gating() {
                tracing::warn!(
                    connection = %self.connection,
                    code = finding.code.code(),
                    subject = %finding.subject,
                    "gating finding"
                );
            } else {
                tracing::info!(
                    connection = %self.connection,
                    code = finding.code.code(),
                    subject = %finding.subject,
                    "advisory finding"
                );
            }
        }

        (next, findings)
    }

    /// Fold a whole message sequence from the initial phase.
    ///
    /// With `stop_on_first_error`, the fold halts after the first message
    /// that produced a gating finding; the rest of the trace is recorded
    /// unvalidated.
    #[must_use]
    pub fn run(
        &self,
        messages: &[Message],
        stop_on_first_error: bool,
        clock: Option<Clock<'_>>,
    ) -> ValidationRun {
        let mut state = ValidatorState::new(self.spec.initial());
        let mut findings = Vec::new();
        let mut trace = Vec::with_capacity(messages.len());
        let mut halted = false;

        for (index, message) in messages.iter().enumerate() {
            let observed_at = clock.map(|c| c());
            if halted {
                trace.push(TraceEntry {
                    index,
                    direction: message.direction(),
                    method: message.method().to_string(),
                    observed_at,
                    validated: false,
                    message: message.clone(),
                });
                continue;
            }

            let (next, step_findings) = self.step(&state, message);
            trace.push(TraceEntry {
                index,
                direction: message.direction(),
                method: message.method().to_string(),
                observed_at,
                validated: true,
                message: message.clone(),
            });
            let gated = step_findings.iter().any(ValidationFinding::is_gating);
            findings.extend(step_findings);
            state = next;
            if stop_on_first_error && gated {
                halted = true;
            }
        }

        ValidationRun {
            connection: self.connection.clone(),
            trace,
            findings,
            final_phase: state.phase,
        }
    }

    // ── Lane sidechecks ─────────────────────────────────────────────────

    fn transport_checks(
        &self,
        message: &Message,
        index: usize,
        findings: &mut Vec<ValidationFinding>,
    ) {
        if message.id() == Some(&JsonRpcId::Null) {
            findings.push(
                ValidationFinding::new(
                    FindingCode::NullRequestId,
                    Subject::MessageAt(index, message.method().to_string()),
                    index,
                )
                .with_message("the literal null is a fragile correlation id"),
            );
        }
    }

    fn session_checks(
        &self,
        state: &ValidatorState,
        message: &Message,
        index: usize,
        findings: &mut Vec<ValidationFinding>,
    ) {
        match message {
            // A cancel that found nothing in flight: legal, but worth a
            // note since it usually means the turn raced to completion.
            Message::FromClient(ClientMessage::Notification {
                notification: ClientNotification::SessionCancel(p),
            }) => {
                if let Some(session) = state.phase.session(&p.session_id) {
                    if session.inflight_prompt.is_none() {
                        findings.push(
                            ValidationFinding::new(
                                FindingCode::CancelIdleSession,
                                Subject::Session(p.session_id.clone()),
                                index,
                            )
                            .with_message("cancel arrived with no prompt in flight"),
                        );
                    }
                }
            }

            Message::FromClient(ClientMessage::Request {
                request: ClientRequest::SessionSetMode(p),
                ..
            }) => {
                if let Some(advertised) = state.session_modes.get(&p.session_id) {
                    if !advertised.contains(&p.mode_id) {
                        findings.push(
                            ValidationFinding::new(
                                FindingCode::UnknownMode,
                                Subject::Session(p.session_id.clone()),
                                index,
                            )
                            .with_message(format!(
                                "mode {} was never advertised for this session",
                                p.mode_id
                            )),
                        );
                    }
                }
            }

            _ => {}
        }
    }

    fn tool_surface_checks(
        &self,
        state: &ValidatorState,
        message: &Message,
        index: usize,
        findings: &mut Vec<ValidationFinding>,
    ) {
        if !self.profile.tool_surface_enabled {
            return;
        }
        let Message::FromAgent(AgentMessage::Notification {
            notification: AgentNotification::SessionUpdate(p),
        }) = message
        else {
            return;
        };
        let SessionUpdate::ToolCallUpdate(update) = &p.update else {
            return;
        };
        let Some(status) = update.status else {
            return;
        };
        if !status.is_terminal() {
            return;
        }
        let running = matches!(
            state.tool_calls.get(&update.id),
            Some(ToolCallStatus::Pending | ToolCallStatus::InProgress)
        );
        if !running {
            findings.push(
                ValidationFinding::new(
                    FindingCode::ToolOutOfOrder,
                    Subject::ToolCall(update.id.clone()),
                    index,
                )
                .with_message(format!(
                    "terminal status {status:?} without a pending or in-progress call"
                )),
            );
        }
    }

    fn implementation_checks(
        &self,
        state: &ValidatorState,
        message: &Message,
        index: usize,
        findings: &mut Vec<ValidationFinding>,
    ) {
        let subject = || Subject::MessageAt(index, message.method().to_string());

        // Capability assertions. Advisory by design: plenty of recorded
        // traffic predates capability advertisement.
        if let Some(caps) = &state.agent_caps {
            for block in prompt_blocks(message) {
                let violation = match block {
                    ContentBlock::Image(_) => (!caps.prompt_capabilities.image)
                        .then_some("image content without promptCapabilities.image"),
                    ContentBlock::Audio(_) => (!caps.prompt_capabilities.audio)
                        .then_some("audio content without promptCapabilities.audio"),
                    ContentBlock::Resource(_) => (!caps.prompt_capabilities.embedded_context)
                        .then_some("embedded resource without promptCapabilities.embeddedContext"),
                    _ => None,
                };
                if let Some(detail) = violation {
                    findings.push(
                        ValidationFinding::new(FindingCode::CapabilityViolation, subject(), index)
                            .with_message(detail),
                    );
                }
            }
        }
        if let Some(caps) = &state.client_caps {
            if let Message::FromAgent(AgentMessage::Request { request, .. }) = message {
                let violation = match request {
                    AgentRequest::ReadTextFile(_) => (!caps.fs.read_text_file)
                        .then_some("fs/read_text_file without fs.readTextFile"),
                    AgentRequest::WriteTextFile(_) => (!caps.fs.write_text_file)
                        .then_some("fs/write_text_file without fs.writeTextFile"),
                    AgentRequest::TerminalCreate(_)
                    | AgentRequest::TerminalOutput(_)
                    | AgentRequest::TerminalWaitForExit(_)
                    | AgentRequest::TerminalKill(_)
                    | AgentRequest::TerminalRelease(_) => {
                        (!caps.terminal).then_some("terminal methods without the terminal capability")
                    }
                    _ => None,
                };
                if let Some(detail) = violation {
                    findings.push(
                        ValidationFinding::new(FindingCode::CapabilityViolation, subject(), index)
                            .with_message(detail),
                    );
                }
            }
        }

        // Unknown fields on known payloads.
        let unknown = unknown_field_names(message);
        if !unknown.is_empty() {
            let severity = if self.profile.strict_schema {
                crate::Severity::Warning
            } else {
                crate::Severity::Info
            };
            findings.push(
                ValidationFinding::new(FindingCode::UnknownFields, subject(), index)
                    .with_severity(severity)
                    .with_message(format!("unrecognized fields: {}", unknown.join(", "))),
            );
        }

        // Metadata policy.
        if message.meta().is_some() && !self.profile.metadata.allows_meta() {
            findings.push(
                ValidationFinding::new(FindingCode::MetaDisallowed, subject(), index)
                    .with_message("_meta present under a profile that disallows it"),
            );
        }
        for block in prompt_blocks(message).iter().chain(update_blocks(message)) {
            if let ContentBlock::Other { kind, .. } = block {
                if !self.profile.metadata.allows_content_kind(kind) {
                    findings.push(
                        ValidationFinding::new(
                            FindingCode::ContentKindDisallowed,
                            subject(),
                            index,
                        )
                        .with_message(format!("content kind {kind} is not allowed")),
                    );
                }
            }
        }
    }
}

/// Content blocks of a prompt request, empty for anything else.
fn prompt_blocks(message: &Message) -> &[ContentBlock] {
    match message {
        Message::FromClient(ClientMessage::Request {
            request: ClientRequest::SessionPrompt(p),
            ..
        }) => &p.prompt,
        _ => &[],
    }
}

/// The content block of a streamed chunk update, if any.
fn update_blocks(message: &Message) -> Option<&ContentBlock> {
    match message {
        Message::FromAgent(AgentMessage::Notification {
            notification: AgentNotification::SessionUpdate(p),
        }) => p.update.chunk_content(),
        _ => None,
    }
}

/// Names of unknown fields on the message's own payload.
fn unknown_field_names(message: &Message) -> Vec<String> {
    let keys = |extra: &aci_core::ExtMap| extra.keys().cloned().collect::<Vec<_>>();
    match message {
        Message::FromClient(ClientMessage::Request { request, .. }) => match request {
            ClientRequest::Initialize(p) => keys(&p.extra),
            ClientRequest::Authenticate(p) => keys(&p.extra),
            ClientRequest::SessionNew(p) => keys(&p.extra),
            ClientRequest::SessionLoad(p) => keys(&p.extra),
            ClientRequest::SessionPrompt(p) => keys(&p.extra),
            ClientRequest::SessionSetMode(p) => keys(&p.extra),
            ClientRequest::Ext { .. } => Vec::new(),
        },
        Message::FromClient(ClientMessage::Notification { notification }) => match notification {
            ClientNotification::SessionCancel(p) => keys(&p.extra),
            ClientNotification::Ext { .. } => Vec::new(),
        },
        Message::FromAgent(AgentMessage::Notification { notification }) => match notification {
            AgentNotification::SessionUpdate(p) => keys(&p.extra),
            AgentNotification::Ext { .. } => Vec::new(),
        },
        Message::FromAgent(AgentMessage::Response { response, .. }) => match response {
            AgentResponse::Initialize(r) => keys(&r.extra),
            AgentResponse::Authenticate(r) => keys(&r.extra),
            AgentResponse::SessionNew(r) => keys(&r.extra),
            AgentResponse::SessionLoad(r) => keys(&r.extra),
            AgentResponse::SessionPrompt(r) => keys(&r.extra),
            AgentResponse::SessionSetMode(r) => keys(&r.extra),
            AgentResponse::Ext { .. } => Vec::new(),
        },
        Message::FromAgent(AgentMessage::Request { request, .. }) => match request {
            AgentRequest::ReadTextFile(p) => keys(&p.extra),
            AgentRequest::WriteTextFile(p) => keys(&p.extra),
            AgentRequest::RequestPermission(p) => keys(&p.extra),
            AgentRequest::TerminalCreate(p) => keys(&p.extra),
            AgentRequest::TerminalOutput(p) => keys(&p.extra),
            AgentRequest::TerminalWaitForExit(p) => keys(&p.extra),
            AgentRequest::TerminalKill(p) => keys(&p.extra),
            AgentRequest::TerminalRelease(p) => keys(&p.extra),
            AgentRequest::Ext { .. } => Vec::new(),
        },
        Message::FromClient(ClientMessage::Response { response, .. }) => match response {
            ClientResponse::ReadTextFile(r) => keys(&r.extra),
            ClientResponse::WriteTextFile(r) => keys(&r.extra),
            ClientResponse::RequestPermission(r) => keys(&r.extra),
            ClientResponse::TerminalCreate(r) => keys(&r.extra),
            ClientResponse::TerminalOutput(r) => keys(&r.extra),
            ClientResponse::TerminalWaitForExit(r) => keys(&r.extra),
            ClientResponse::TerminalKill(r) => keys(&r.extra),
            ClientResponse::TerminalRelease(r) => keys(&r.extra),
            ClientResponse::Ext { .. } => Vec::new(),
        },
        Message::FromClient(ClientMessage::Error { .. })
        | Message::FromAgent(AgentMessage::Error { .. }) => Vec::new(),
    }
}

/// Classify a transition error into its finding.
fn finding_for_error(
    error: &ProtocolError,
    message: &Message,
    index: usize,
) -> ValidationFinding {
    let (code, subject) = match error {
        ProtocolError::NotInitialized { .. } => (
            FindingCode::NotInitialized,
            Subject::MessageAt(index, message.method().to_string()),
        ),
        ProtocolError::DuplicateInitialize => (
            FindingCode::DuplicateInitialize,
            Subject::MessageAt(index, message.method().to_string()),
        ),
        ProtocolError::InvalidTransition { .. } => (
            FindingCode::InvalidTransition,
            Subject::MessageAt(index, message.method().to_string()),
        ),
        ProtocolError::UnknownSession { session, .. } => {
            (FindingCode::UnknownSession, Subject::Session(session.clone()))
        }
        ProtocolError::MultiplePromptsInFlight { session, .. } => (
            FindingCode::MultiplePromptsInFlight,
            Subject::Session(session.clone()),
        ),
        ProtocolError::ResultWithoutPrompt { session } => (
            FindingCode::ResultWithoutPrompt,
            Subject::Session(session.clone()),
        ),
        ProtocolError::CancelMismatch { session, turn, .. } => (
            FindingCode::CancelMismatch,
            Subject::PromptTurn(session.clone(), *turn),
        ),
        ProtocolError::PermissionOutsideTurn { session } => (
            FindingCode::PermissionOutsideTurn,
            Subject::Session(session.clone()),
        ),
    };
    ValidationFinding::new(code, subject, index)
        .with_message(error.to_string())
        .with_failure(error.clone())
}
