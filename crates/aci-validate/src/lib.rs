// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! aci-validate
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Conformance checking for ACP message traces.

mod finding;
mod profile;
mod validator;

pub use finding::{Connection, FindingCode, Lane, Severity, Subject, ValidationFinding};
pub use profile::{MetadataPolicy, RuntimeProfile};
pub use validator::{Clock, TraceEntry, ValidationRun, Validator, ValidatorState};
