// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! acp-inspector
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// The typed ACP domain model.
pub use aci_core as domain;

/// Frame codec with request/response correlation.
pub use aci_codec as codec;

/// The protocol state machine.
pub use aci_protocol as protocol;

/// The lane validator.
pub use aci_validate as validation;

/// The I/O-edge adapter.
pub use aci_runtime as runtime;

/// JSONL trace files and replay.
pub use aci_trace as trace;
