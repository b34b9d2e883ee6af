// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! aci-codec
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Wire format for ACP connections: one JSON-RPC 2.0 object per frame.

mod decode;
mod encode;
mod state;

use aci_core::{Direction, JsonRpcId};
use thiserror::Error;

pub use state::{CodecState, PendingRequest};

/// Errors produced while decoding a raw frame.
///
/// A decode error never advances codec state: the embedder may drop the
/// frame, answer with a JSON-RPC error, or keep going from the same state.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame is not valid JSON at all.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The frame is valid JSON but not a JSON-RPC 2.0 envelope.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope {
        /// What was wrong with the envelope.
        reason: String,
    },

    /// The `params` (or `result`) of a known method failed to parse.
    #[error("params of {method} do not match the expected shape: {detail}")]
    ParamsShape {
        /// The method whose payload was malformed.
        method: String,
        /// Parser detail.
        detail: String,
    },

    /// A response arrived whose id matches no outstanding request.
    #[error("response id {id} matches no outstanding request")]
    UnmatchedResponse {
        /// The unmatched id.
        id: JsonRpcId,
    },

    /// A request reused an id that is still awaiting a response.
    #[error("request id {id} is already in flight")]
    DuplicateRequestId {
        /// The duplicated id.
        id: JsonRpcId,
    },

    /// A known method arrived from the side that never sends it.
    #[error("method {method} is not sent by the {direction} side")]
    MethodNotApplicableInDirection {
        /// The misdirected method.
        method: String,
        /// The side that sent it.
        direction: Direction,
    },
}

/// Errors produced while encoding a typed message.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The message could not be serialized to JSON.
    #[error("failed to serialize message: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Encoding this request would reuse an id that is still in flight.
    #[error("request id {id} is already in flight")]
    DuplicateRequestId {
        /// The duplicated id.
        id: JsonRpcId,
    },
}
