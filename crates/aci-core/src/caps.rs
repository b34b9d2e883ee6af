// SPDX-License-Identifier: MIT OR Apache-2.0
//! Capability advertisements exchanged during initialization.
//!
//! Capability gates are advisory: the validator reports mismatches in the
//! Implementation lane but never rejects traffic over them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{AuthMethodId, ExtMap};

/// Capabilities the client advertises in `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientCapabilities {
    /// File-system methods the agent may call back into.
    #[serde(default)]
    pub fs: FileSystemCapability,
    /// Whether the client exposes the `terminal/*` surface.
    #[serde(default)]
    pub terminal: bool,
    /// Unknown capability fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// File-system methods a client may support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileSystemCapability {
    /// Whether the client handles `fs/read_text_file`.
    #[serde(default)]
    pub read_text_file: bool,
    /// Whether the client handles `fs/write_text_file`.
    #[serde(default)]
    pub write_text_file: bool,
}

/// Capabilities the agent advertises back in the `initialize` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Whether the agent supports `session/load`.
    #[serde(default)]
    pub load_session: bool,
    /// Content modalities accepted inside `session/prompt`.
    #[serde(default)]
    pub prompt_capabilities: PromptCapabilities,
    /// Unknown capability fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Content modalities the agent accepts in prompt requests.
///
/// Text and resource links are the unconditional baseline; everything else
/// must be opted into here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptCapabilities {
    /// Agent accepts image content blocks.
    #[serde(default)]
    pub image: bool,
    /// Agent accepts audio content blocks.
    #[serde(default)]
    pub audio: bool,
    /// Agent accepts embedded resources as prompt context.
    #[serde(default)]
    pub embedded_context: bool,
}

/// One authentication method offered by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthMethod {
    /// Identifier passed back in `authenticate`.
    pub id: AuthMethodId,
    /// Human-readable name.
    pub name: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}
