// SPDX-License-Identifier: MIT OR Apache-2.0
//! Streaming session updates delivered over the `session/update`
//! notification, and the execution plan shape they can carry.
//!
//! Serialization is keyed on the `sessionUpdate` discriminator. Unknown
//! tags are retained verbatim in [`SessionUpdate::Ext`].

use std::borrow::Cow;

use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::content::{split_tag, tag_object};
use crate::{ContentBlock, ExtMap, ModeId, ToolCall, ToolCallUpdate};

/// One streamed increment of session progress.
///
/// # Examples
///
/// ```
/// use aci_core::SessionUpdate;
///
/// let update: SessionUpdate = serde_json::from_str(
///     r#"{"sessionUpdate":"agent_message_chunk","content":{"type":"text","text":"hi"}}"#,
/// ).unwrap();
/// assert!(matches!(update, SessionUpdate::AgentMessageChunk { .. }));
///
/// // Draft update tags flow through unchanged.
/// let raw = r#"{"sessionUpdate":"available_commands_update","commands":[]}"#;
/// let update: SessionUpdate = serde_json::from_str(raw).unwrap();
/// assert!(matches!(update, SessionUpdate::Ext { ref kind, .. } if kind == "available_commands_update"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// A chunk of the user's message echoed back.
    UserMessageChunk {
        /// The chunk contents.
        content: ContentBlock,
        /// Unknown sibling fields, preserved verbatim.
        extra: ExtMap,
    },
    /// A chunk of the agent's response.
    AgentMessageChunk {
        /// The chunk contents.
        content: ContentBlock,
        /// Unknown sibling fields, preserved verbatim.
        extra: ExtMap,
    },
    /// A chunk of the agent's internal reasoning.
    AgentThoughtChunk {
        /// The chunk contents.
        content: ContentBlock,
        /// Unknown sibling fields, preserved verbatim.
        extra: ExtMap,
    },
    /// A new tool call was started.
    ToolCall(ToolCall),
    /// An existing tool call changed.
    ToolCallUpdate(ToolCallUpdate),
    /// The agent published or revised its plan.
    Plan(Plan),
    /// The session switched to a different mode.
    CurrentModeUpdate {
        /// The mode now in effect.
        current_mode_id: ModeId,
        /// Unknown sibling fields, preserved verbatim.
        extra: ExtMap,
    },
    /// An update tag this library does not know (e.g. a draft extension).
    /// The full object, including its `sessionUpdate` field, is preserved.
    Ext {
        /// The value of the `sessionUpdate` discriminator.
        kind: String,
        /// The complete original object.
        payload: Value,
    },
}

impl SessionUpdate {
    /// The `sessionUpdate` discriminator of this update.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::UserMessageChunk { .. } => "user_message_chunk",
            Self::AgentMessageChunk { .. } => "agent_message_chunk",
            Self::AgentThoughtChunk { .. } => "agent_thought_chunk",
            Self::ToolCall(_) => "tool_call",
            Self::ToolCallUpdate(_) => "tool_call_update",
            Self::Plan(_) => "plan",
            Self::CurrentModeUpdate { .. } => "current_mode_update",
            Self::Ext { kind, .. } => kind,
        }
    }

    /// The content blocks this update carries, if it is a chunk.
    #[must_use]
    pub fn chunk_content(&self) -> Option<&ContentBlock> {
        match self {
            Self::UserMessageChunk { content, .. }
            | Self::AgentMessageChunk { content, .. }
            | Self::AgentThoughtChunk { content, .. } => Some(content),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ChunkBody {
    content: ContentBlock,
    #[serde(flatten)]
    extra: ExtMap,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModeBody {
    current_mode_id: ModeId,
    #[serde(flatten)]
    extra: ExtMap,
}

impl Serialize for SessionUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const TAG: &str = "sessionUpdate";
        match self {
            Self::UserMessageChunk { content, extra } => tag_object(
                TAG,
                "user_message_chunk",
                &ChunkBody {
                    content: content.clone(),
                    extra: extra.clone(),
                },
                serializer,
            ),
            Self::AgentMessageChunk { content, extra } => tag_object(
                TAG,
                "agent_message_chunk",
                &ChunkBody {
                    content: content.clone(),
                    extra: extra.clone(),
                },
                serializer,
            ),
            Self::AgentThoughtChunk { content, extra } => tag_object(
                TAG,
                "agent_thought_chunk",
                &ChunkBody {
                    content: content.clone(),
                    extra: extra.clone(),
                },
                serializer,
            ),
            Self::ToolCall(call) => tag_object(TAG, "tool_call", call, serializer),
            Self::ToolCallUpdate(update) => tag_object(TAG, "tool_call_update", update, serializer),
            Self::Plan(plan) => tag_object(TAG, "plan", plan, serializer),
            Self::CurrentModeUpdate {
                current_mode_id,
                extra,
            } => tag_object(
                TAG,
                "current_mode_update",
                &ModeBody {
                    current_mode_id: current_mode_id.clone(),
                    extra: extra.clone(),
                },
                serializer,
            ),
            Self::Ext { payload, .. } => payload.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SessionUpdate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let (kind, rest, original) = split_tag("sessionUpdate", value).map_err(D::Error::custom)?;
        let parsed = match kind.as_str() {
            "user_message_chunk" => {
                serde_json::from_value(rest).map(|b: ChunkBody| Self::UserMessageChunk {
                    content: b.content,
                    extra: b.extra,
                })
            }
            "agent_message_chunk" => {
                serde_json::from_value(rest).map(|b: ChunkBody| Self::AgentMessageChunk {
                    content: b.content,
                    extra: b.extra,
                })
            }
            "agent_thought_chunk" => {
                serde_json::from_value(rest).map(|b: ChunkBody| Self::AgentThoughtChunk {
                    content: b.content,
                    extra: b.extra,
                })
            }
            "tool_call" => serde_json::from_value(rest).map(Self::ToolCall),
            "tool_call_update" => serde_json::from_value(rest).map(Self::ToolCallUpdate),
            "plan" => serde_json::from_value(rest).map(Self::Plan),
            "current_mode_update" => {
                serde_json::from_value(rest).map(|b: ModeBody| Self::CurrentModeUpdate {
                    current_mode_id: b.current_mode_id,
                    extra: b.extra,
                })
            }
            _ => {
                return Ok(Self::Ext {
                    kind,
                    payload: original,
                });
            }
        };
        parsed.map_err(|e| D::Error::custom(format!("session update ({kind}): {e}")))
    }
}

impl JsonSchema for SessionUpdate {
    fn schema_name() -> Cow<'static, str> {
        "SessionUpdate".into()
    }

    fn json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "object",
            "description": "Session update keyed on the `sessionUpdate` field; unknown tags are preserved verbatim",
            "required": ["sessionUpdate"]
        })
    }
}

/// The agent's published execution plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// Plan entries in presentation order.
    pub entries: Vec<PlanEntry>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// One step in an execution plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanEntry {
    /// What this step does, in the agent's words.
    pub content: String,
    /// Relative priority of the step.
    #[serde(default)]
    pub priority: PlanEntryPriority,
    /// Progress of the step.
    #[serde(default)]
    pub status: PlanEntryStatus,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Priority of a plan entry.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PlanEntryPriority {
    /// Must happen.
    High,
    /// Ordinary step.
    #[default]
    Medium,
    /// Nice to have.
    Low,
}

/// Progress of a plan entry.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PlanEntryStatus {
    /// Not started.
    #[default]
    Pending,
    /// Currently underway.
    InProgress,
    /// Done.
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chunk_roundtrip() {
        let update = SessionUpdate::AgentMessageChunk {
            content: ContentBlock::text("partial"),
            extra: ExtMap::new(),
        };
        let json = serde_json::to_string(&update).unwrap();
        let back: SessionUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(update, back);
        assert!(json.contains("\"sessionUpdate\":\"agent_message_chunk\""));
    }

    #[test]
    fn tool_call_update_tag() {
        let raw = r#"{"sessionUpdate":"tool_call_update","toolCallId":"t1","status":"completed"}"#;
        let update: SessionUpdate = serde_json::from_str(raw).unwrap();
        assert!(matches!(update, SessionUpdate::ToolCallUpdate(_)));
        let v1: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_value(&update).unwrap(), v1);
    }

    #[test]
    fn plan_roundtrip() {
        let raw = r#"{"sessionUpdate":"plan","entries":[{"content":"look around","priority":"high","status":"pending"}]}"#;
        let update: SessionUpdate = serde_json::from_str(raw).unwrap();
        let SessionUpdate::Plan(plan) = &update else {
            panic!("expected plan");
        };
        assert_eq!(plan.entries.len(), 1);
        let v1: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_value(&update).unwrap(), v1);
    }

    #[test]
    fn draft_tag_roundtrips_verbatim() {
        let raw = r#"{"sessionUpdate":"available_commands_update","commands":[{"name":"web"}]}"#;
        let update: SessionUpdate = serde_json::from_str(raw).unwrap();
        assert_eq!(update.kind(), "available_commands_update");
        let v1: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_value(&update).unwrap(), v1);
    }

    #[test]
    fn mode_update_roundtrip() {
        let raw = r#"{"sessionUpdate":"current_mode_update","currentModeId":"plan"}"#;
        let update: SessionUpdate = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            &update,
            SessionUpdate::CurrentModeUpdate { current_mode_id, .. }
                if current_mode_id.as_str() == "plan"
        ));
        let v1: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_value(&update).unwrap(), v1);
    }

    #[test]
    fn malformed_known_tag_is_an_error() {
        let raw = r#"{"sessionUpdate":"plan","entries":"not-a-list"}"#;
        assert!(serde_json::from_str::<SessionUpdate>(raw).is_err());
    }
}
