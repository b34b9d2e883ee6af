// SPDX-License-Identifier: MIT OR Apache-2.0
//! Strictness profiles.
//!
//! A profile is plain data so embedders can load it from their own config
//! files and share one read-only copy across connections.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// How opaque metadata and unknown content kinds are treated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataPolicy {
    /// Flag `_meta` and unknown content kinds.
    Disallow,
    /// Let any opaque payload through untouched.
    #[default]
    AllowOpaque,
    /// Let `_meta` through, but only the listed content kinds.
    AllowKinds(BTreeSet<String>),
}

impl MetadataPolicy {
    /// Whether a content block of `kind` is acceptable.
    ///
    /// Known kinds are always acceptable; this governs the `Other`
    /// escape hatch.
    #[must_use]
    pub fn allows_content_kind(&self, kind: &str) -> bool {
        match self {
            Self::Disallow => false,
            Self::AllowOpaque => true,
            Self::AllowKinds(kinds) => kinds.contains(kind),
        }
    }

    /// Whether opaque `_meta` objects are acceptable.
    #[must_use]
    pub fn allows_meta(&self) -> bool {
        !matches!(self, Self::Disallow)
    }
}

/// Strictness switches for one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeProfile {
    /// Treatment of `_meta` and unknown content kinds.
    #[serde(default)]
    pub metadata: MetadataPolicy,
    /// Ceiling on raw frame size, enforced by the runtime adapter.
    #[serde(default)]
    pub max_message_bytes: Option<u64>,
    /// Whether the ToolSurface lane runs.
    #[serde(default)]
    pub tool_surface_enabled: bool,
    /// Escalate unknown-field findings from Info to Warning.
    #[serde(default)]
    pub strict_schema: bool,
}

impl RuntimeProfile {
    /// The default profile: everything opaque allowed, no size ceiling,
    /// ToolSurface off.
    #[must_use]
    pub fn lenient() -> Self {
        Self::default()
    }

    /// A profile for conformance work: ToolSurface on, strict schema on.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            metadata: MetadataPolicy::AllowOpaque,
            max_message_bytes: None,
            tool_surface_enabled: true,
            strict_schema: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_lenient() {
        let profile = RuntimeProfile::default();
        assert_eq!(profile.metadata, MetadataPolicy::AllowOpaque);
        assert!(profile.max_message_bytes.is_none());
        assert!(!profile.tool_surface_enabled);
        assert!(!profile.strict_schema);
    }

    #[test]
    fn allow_kinds_is_a_closed_list() {
        let policy = MetadataPolicy::AllowKinds(BTreeSet::from(["sensor_frame".to_string()]));
        assert!(policy.allows_content_kind("sensor_frame"));
        assert!(!policy.allows_content_kind("hologram"));
        assert!(policy.allows_meta());
    }

    #[test]
    fn profile_deserializes_from_plain_config() {
        let profile: RuntimeProfile = serde_json::from_str(
            r#"{"maxMessageBytes": 1024, "toolSurfaceEnabled": true}"#,
        )
        .unwrap();
        assert_eq!(profile.max_message_bytes, Some(1024));
        assert!(profile.tool_surface_enabled);
        assert_eq!(profile.metadata, MetadataPolicy::AllowOpaque);
    }
}
