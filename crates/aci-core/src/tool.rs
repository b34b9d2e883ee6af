// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool call reports and incremental updates streamed over `session/update`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ContentBlock, ExtMap, ToolCallId};

/// A tool invocation reported by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Identifier correlating this call with later updates.
    #[serde(rename = "toolCallId")]
    pub id: ToolCallId,
    /// Human-readable description of what the tool is doing.
    pub title: String,
    /// Category of the tool being invoked.
    #[serde(default)]
    pub kind: ToolKind,
    /// Current execution status.
    #[serde(default)]
    pub status: ToolCallStatus,
    /// Content produced by the call so far.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ToolCallContent>,
    /// File locations the call touches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ToolCallLocation>,
    /// Raw input passed to the tool, preserved verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_input: Option<Value>,
    /// Raw output produced by the tool, preserved verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<Value>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

impl ToolCall {
    /// A minimal pending tool call, useful as a starting point.
    #[must_use]
    pub fn new(id: impl Into<ToolCallId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ToolKind::default(),
            status: ToolCallStatus::default(),
            content: Vec::new(),
            locations: Vec::new(),
            raw_input: None,
            raw_output: None,
            extra: ExtMap::new(),
        }
    }
}

/// An incremental update to a previously reported tool call.
///
/// Every field except the id is optional; absent fields are unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallUpdate {
    /// Identifier of the call being updated.
    #[serde(rename = "toolCallId")]
    pub id: ToolCallId,
    /// New title, if changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New kind, if changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ToolKind>,
    /// New status, if changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolCallStatus>,
    /// Replacement content, if changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ToolCallContent>>,
    /// Replacement locations, if changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<ToolCallLocation>>,
    /// Raw input, if newly known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_input: Option<Value>,
    /// Raw output, if newly known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<Value>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

impl ToolCallUpdate {
    /// An update that only changes status.
    #[must_use]
    pub fn status(id: impl Into<ToolCallId>, status: ToolCallStatus) -> Self {
        Self {
            id: id.into(),
            title: None,
            kind: None,
            status: Some(status),
            content: None,
            locations: None,
            raw_input: None,
            raw_output: None,
            extra: ExtMap::new(),
        }
    }
}

/// Execution status of a tool call.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    /// Reported but not yet running (e.g. awaiting permission).
    #[default]
    Pending,
    /// Currently running.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Aborted before completion.
    Cancelled,
}

impl ToolCallStatus {
    /// Whether this status ends the call's lifecycle.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Category of tool behind a call. Drives client-side presentation only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Reads files or data.
    Read,
    /// Edits existing content.
    Edit,
    /// Deletes files or data.
    Delete,
    /// Moves or renames.
    Move,
    /// Searches for information.
    Search,
    /// Runs commands.
    Execute,
    /// Internal reasoning step.
    Think,
    /// Fetches remote data.
    Fetch,
    /// Anything else.
    #[default]
    Other,
}

/// A file location a tool call touches, for follow-along UIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallLocation {
    /// Absolute path being read or written.
    pub path: String,
    /// Optional 1-based line number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Content attached to a tool call report or update.
///
/// Unknown shapes fall through to the raw variant and re-encode verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ToolCallContent {
    /// A recognized, typed content entry.
    Known(KnownToolCallContent),
    /// An unrecognized entry, preserved verbatim.
    Other(Value),
}

/// The typed tool call content shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KnownToolCallContent {
    /// An ordinary content block.
    Content {
        /// The block.
        content: ContentBlock,
    },
    /// A proposed or applied file change.
    #[serde(rename_all = "camelCase")]
    Diff {
        /// Path of the changed file.
        path: String,
        /// Previous contents, absent for file creation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_text: Option<String>,
        /// New contents.
        new_text: String,
    },
    /// Output is being streamed to an embedder terminal.
    #[serde(rename_all = "camelCase")]
    Terminal {
        /// The terminal carrying the output.
        terminal_id: crate::TerminalId,
    },
}
