// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! aci-runtime
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Entry points for embedders: one call per frame, in or out.

use aci_codec::{CodecState, DecodeError};
use aci_core::{Direction, Message};
use aci_protocol::Phase;
use aci_validate::{
    FindingCode, Subject, ValidationFinding, Validator, ValidatorState,
};
use thiserror::Error;

/// One frame at the I/O boundary: the typed message plus, when known, the
/// raw size it occupied on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Raw frame size in bytes, when the transport knows it.
    pub raw_byte_length: Option<u64>,
    /// The typed message.
    pub message: Message,
}

impl Frame {
    /// A frame without size information.
    #[must_use]
    pub fn new(message: Message) -> Self {
        Self {
            raw_byte_length: None,
            message,
        }
    }

    /// A frame with its raw wire size.
    #[must_use]
    pub fn sized(message: Message, raw_byte_length: u64) -> Self {
        Self {
            raw_byte_length: Some(raw_byte_length),
            message,
        }
    }
}

/// A rejected inbound frame: the codec error, paired with the
/// Transport-lane finding that reports it.
///
/// The finding carries the stable `ACP.TRANSPORT.MALFORMED_ENVELOPE` code
/// so embedders can route decode failures through the same
/// pattern-matching they use for every other finding; the original
/// [`DecodeError`] stays available for choosing a JSON-RPC error reply.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct DecodeFailure {
    /// Why the codec rejected the frame.
    pub error: DecodeError,
    /// The Connection-subject finding reporting the rejection.
    pub finding: ValidationFinding,
}

/// What the adapter recommends doing with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Nothing to report; pass it on.
    Deliver,
    /// Advisory findings only; pass it on.
    DeliverWithFindings,
    /// A gating rule fired; reject the frame or hold the send.
    Block,
}

/// The outcome of validating one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    /// Findings for this frame, in lane order.
    pub findings: Vec<ValidationFinding>,
    /// The phase after this frame was processed.
    pub phase: Phase,
    /// The adapter's recommendation.
    pub disposition: Disposition,
}

impl GateOutcome {
    /// Whether any finding gates.
    #[must_use]
    pub fn is_gated(&self) -> bool {
        self.disposition == Disposition::Block
    }
}

/// Adapter wiring codec, state machine, and validator for one connection.
///
/// # Examples
///
/// ```
/// use aci_core::{ClientRequest, ConnectionId, InitializeParams, Message};
/// use aci_protocol::ProtocolSpec;
/// use aci_runtime::{Disposition, Frame, RuntimeAdapter};
/// use aci_validate::{RuntimeProfile, Validator, ValidatorState};
///
/// let adapter = RuntimeAdapter::new(Validator::new(
///     ConnectionId::generate(),
///     ProtocolSpec::default(),
///     RuntimeProfile::default(),
/// ));
/// let state = ValidatorState::new(ProtocolSpec::default().initial());
/// let frame = Frame::new(Message::client_request(
///     1,
///     ClientRequest::Initialize(InitializeParams::default()),
/// ));
/// let (_state, outcome) = adapter.validate_inbound(&state, &frame);
/// assert_eq!(outcome.disposition, Disposition::Deliver);
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeAdapter {
    validator: Validator,
}

impl RuntimeAdapter {
    /// Wrap a configured validator.
    #[must_use]
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    /// The validator driving this adapter.
    #[must_use]
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Validate a frame arriving from the peer.
    ///
    /// The transport ceiling is applied before anything else; the typed
    /// message is processed and returned to the caller either way, so an
    /// embedder can still inspect oversized traffic.
    #[must_use]
    pub fn validate_inbound(
        &self,
        state: &ValidatorState,
        frame: &Frame,
    ) -> (ValidatorState, GateOutcome) {
        let mut findings = self.transport_ceiling(state, frame);
        let (next, step_findings) = self.validator.step(state, &frame.message);
        findings.extend(step_findings);
        sort_by_lane(&mut findings);

        let disposition = disposition_for(&findings);
        tracing::debug!(
            method = frame.message.method(),
            ?disposition,
            "inbound frame validated"
        );
        let phase = next.phase.clone();
        (next, GateOutcome {
            findings,
            phase,
            disposition,
        })
    }

    /// Validate a frame the embedder is about to send.
    ///
    /// Symmetric with [`RuntimeAdapter::validate_inbound`], except that a
    /// gating violation leaves the state untouched: the send should be
    /// blocked, so the protocol never observes the frame.
    #[must_use]
    pub fn validate_outbound(
        &self,
        state: &ValidatorState,
        frame: &Frame,
    ) -> (ValidatorState, GateOutcome) {
        let mut findings = self.transport_ceiling(state, frame);
        let (next, step_findings) = self.validator.step(state, &frame.message);
        findings.extend(step_findings);
        sort_by_lane(&mut findings);

        let disposition = disposition_for(&findings);
        if disposition == Disposition::Block {
            tracing::warn!(
                method = frame.message.method(),
                "outbound frame would violate the protocol; recommending a block"
            );
            let phase = state.phase.clone();
            return (state.clone(), GateOutcome {
                findings,
                phase,
                disposition,
            });
        }

        tracing::debug!(
            method = frame.message.method(),
            ?disposition,
            "outbound frame validated"
        );
        let phase = next.phase.clone();
        (next, GateOutcome {
            findings,
            phase,
            disposition,
        })
    }

    /// Decode a raw inbound frame and validate it in one call.
    ///
    /// The raw byte length is taken from the text itself.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeFailure`] when the text does not decode: the
    /// codec's error plus a gating Transport finding
    /// (`ACP.TRANSPORT.MALFORMED_ENVELOPE`) anchored to the connection.
    /// Neither state advances in that case.
    pub fn decode_inbound(
        &self,
        codec: &CodecState,
        state: &ValidatorState,
        direction: Direction,
        text: &str,
    ) -> Result<(CodecState, ValidatorState, Message, GateOutcome), DecodeFailure> {
        let (codec_next, message) = codec.decode(direction, text).map_err(|error| {
            tracing::warn!(%direction, %error, "inbound frame rejected by the codec");
            DecodeFailure {
                finding: ValidationFinding::new(
                    FindingCode::MalformedEnvelope,
                    Subject::Connection,
                    state.next_index(),
                )
                .with_message(error.to_string()),
                error,
            }
        })?;
        let frame = Frame::sized(message.clone(), text.len() as u64);
        let (state_next, outcome) = self.validate_inbound(state, &frame);
        Ok((codec_next, state_next, message, outcome))
    }

    /// The Connection-subject ceiling check.
    fn transport_ceiling(&self, state: &ValidatorState, frame: &Frame) -> Vec<ValidationFinding> {
        let ceiling = self.validator.profile.max_message_bytes;
        match (frame.raw_byte_length, ceiling) {
            (Some(size), Some(limit)) if size > limit => vec![
                ValidationFinding::new(
                    FindingCode::MaxMessageBytesExceeded,
                    Subject::Connection,
                    state.next_index(),
                )
                .with_message(format!("frame of {size} bytes exceeds the {limit} byte ceiling")),
            ],
            _ => Vec::new(),
        }
    }
}

fn sort_by_lane(findings: &mut [ValidationFinding]) {
    findings.sort_by(|a, b| {
        a.lane
            .cmp(&b.lane)
            .then_with(|| a.code.code().cmp(b.code.code()))
    });
}

fn disposition_for(findings: &[ValidationFinding]) -> Disposition {
    if findings.iter().any(ValidationFinding::is_gating) {
        Disposition::Block
    } else if findings.is_empty() {
        Disposition::Deliver
    } else {
        Disposition::DeliverWithFindings
    }
}
