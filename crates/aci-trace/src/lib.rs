// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! aci-trace
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Current format: JSONL, one `{ts, direction, json}` object per line.

use std::io::BufRead;

use aci_codec::{CodecState, DecodeError};
use aci_core::{Direction, Message};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors arising while reading or writing trace files.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line failed to parse in strict mode.
    #[error("line {number}: {detail}")]
    Line {
        /// 1-based line number.
        number: usize,
        /// What went wrong with the line.
        detail: String,
    },

    /// Serializing a record failed.
    #[error("failed to serialize record: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// One recorded frame.
///
/// # Examples
///
/// ```
/// use aci_trace::TraceRecord;
///
/// // Aliased direction, millisecond timestamp.
/// let record: TraceRecord = serde_json::from_str(
///     r#"{"ts": 1714564800000, "direction": "c->a", "json": "{}"}"#,
/// ).unwrap();
/// assert_eq!(record.direction, aci_core::Direction::FromClient);
///
/// // Output is canonical.
/// let out = serde_json::to_value(&record).unwrap();
/// assert_eq!(out["direction"], "fromClient");
/// assert_eq!(out["ts"], "2024-05-01T12:00:00.000+00:00");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// When the frame was captured.
    #[serde(with = "ts_format")]
    pub ts: DateTime<Utc>,
    /// Which side sent the frame.
    #[serde(with = "direction_alias")]
    pub direction: Direction,
    /// The raw frame text, verbatim.
    pub json: String,
}

impl TraceRecord {
    /// A record captured now-agnostically at `ts`.
    #[must_use]
    pub fn new(ts: DateTime<Utc>, direction: Direction, json: impl Into<String>) -> Self {
        Self {
            ts,
            direction,
            json: json.into(),
        }
    }
}

/// Timestamps: ISO-8601 strings or unix-millis numbers in, ISO-8601 out.
mod ts_format {
    use super::*;
    use serde::de::Error as _;
    use serde::{Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        ts: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, false))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| D::Error::custom(format!("bad timestamp {s:?}: {e}"))),
            serde_json::Value::Number(n) => n
                .as_i64()
                .and_then(|millis| DateTime::from_timestamp_millis(millis))
                .ok_or_else(|| D::Error::custom(format!("bad unix-millis timestamp {n}"))),
            other => Err(D::Error::custom(format!(
                "timestamp must be a string or a number, got {other}"
            ))),
        }
    }
}

/// Directions: tolerant aliases in, canonical names out.
mod direction_alias {
    use super::*;
    use serde::de::Error as _;
    use serde::{Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        direction: &Direction,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(direction.as_str())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Direction, D::Error> {
        let s = String::deserialize(deserializer)?;
        Direction::parse_alias(&s)
            .ok_or_else(|| D::Error::custom(format!("unknown direction {s:?}")))
    }
}

/// Reads trace files, counting the lines it had to skip.
#[derive(Debug, Clone, Default)]
pub struct TraceReader {
    strict: bool,
    skipped: usize,
}

impl TraceReader {
    /// A tolerant reader: bad lines are counted and skipped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A strict reader: the first bad line fails the read.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            skipped: 0,
        }
    }

    /// Lines skipped so far across all reads.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Read every record from a JSONL string. Blank lines are ignored.
    ///
    /// # Errors
    ///
    /// In strict mode, [`TraceError::Line`] on the first unparseable line.
    pub fn read_str(&mut self, input: &str) -> Result<Vec<TraceRecord>, TraceError> {
        let mut records = Vec::new();
        for (idx, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<TraceRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    if self.strict {
                        return Err(TraceError::Line {
                            number: idx + 1,
                            detail: e.to_string(),
                        });
                    }
                    self.skipped += 1;
                }
            }
        }
        Ok(records)
    }

    /// Read every record from a buffered reader.
    ///
    /// # Errors
    ///
    /// [`TraceError::Io`] on read failure; [`TraceError::Line`] in strict
    /// mode.
    pub fn read(&mut self, reader: impl BufRead) -> Result<Vec<TraceRecord>, TraceError> {
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<TraceRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    if self.strict {
                        return Err(TraceError::Line {
                            number: idx + 1,
                            detail: e.to_string(),
                        });
                    }
                    self.skipped += 1;
                }
            }
        }
        Ok(records)
    }
}

/// Serialize records to JSONL, one canonical line per record.
///
/// # Errors
///
/// [`TraceError::Serialize`] if a record cannot be serialized.
pub fn write_jsonl(records: &[TraceRecord]) -> Result<String, TraceError> {
    let mut out = String::new();
    for record in records {
        let line = serde_json::to_string(record).map_err(TraceError::Serialize)?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// The result of replaying a recorded trace through the codec.
#[derive(Debug)]
pub struct ReplayOutcome {
    /// Messages decoded in order.
    pub messages: Vec<Message>,
    /// Records that failed to decode, with their positions.
    pub errors: Vec<(usize, DecodeError)>,
    /// The codec state after the replay.
    pub codec: CodecState,
}

/// Drive the codec over a recorded trace, recovering the typed message
/// sequence for validation.
///
/// Decode failures are collected, not fatal: the failing record is
/// skipped and the replay continues from the same codec state, which is
/// consistent because failed decodes never advance it.
#[must_use]
pub fn replay(records: &[TraceRecord]) -> ReplayOutcome {
    let mut codec = CodecState::new();
    let mut messages = Vec::new();
    let mut errors = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match codec.decode(record.direction, &record.json) {
            Ok((next, message)) => {
                codec = next;
                messages.push(message);
            }
            Err(e) => errors.push((index, e)),
        }
    }

    ReplayOutcome {
        messages,
        errors,
        codec,
    }
}
