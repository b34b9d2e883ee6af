// SPDX-License-Identifier: MIT OR Apache-2.0
//! Content blocks carried in prompts, message chunks, and tool output.
//!
//! Serialization is keyed on the `type` discriminator field. Known kinds
//! parse strictly into their typed shape; anything else is retained
//! verbatim in [`ContentBlock::Other`] so it survives re-encoding.

use std::borrow::Cow;

use schemars::JsonSchema;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::ExtMap;

/// A typed content block.
///
/// # Examples
///
/// ```
/// use aci_core::ContentBlock;
///
/// let block: ContentBlock = serde_json::from_str(
///     r#"{"type":"text","text":"hello"}"#,
/// ).unwrap();
/// assert!(matches!(block, ContentBlock::Text(ref t) if t.text == "hello"));
///
/// // Unknown kinds round-trip untouched.
/// let raw = r#"{"type":"sensor_frame","payload":[1,2,3]}"#;
/// let block: ContentBlock = serde_json::from_str(raw).unwrap();
/// assert_eq!(block.kind(), "sensor_frame");
/// let v1: serde_json::Value = serde_json::from_str(raw).unwrap();
/// assert_eq!(serde_json::to_value(&block).unwrap(), v1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// Plain text.
    Text(TextContent),
    /// Base64-encoded image data.
    Image(ImageContent),
    /// Base64-encoded audio data.
    Audio(AudioContent),
    /// A link to a resource the agent can fetch on demand.
    ResourceLink(ResourceLink),
    /// Resource contents embedded directly in the message.
    Resource(EmbeddedResource),
    /// A content kind this library does not know. The full object,
    /// including its `type` field, is preserved verbatim.
    Other {
        /// The value of the `type` discriminator (empty if absent).
        kind: String,
        /// The complete original object.
        payload: Value,
    },
}

impl ContentBlock {
    /// Convenience constructor for a plain text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextContent {
            text: text.into(),
            extra: ExtMap::new(),
        })
    }

    /// The `type` discriminator of this block.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Audio(_) => "audio",
            Self::ResourceLink(_) => "resource_link",
            Self::Resource(_) => "resource",
            Self::Other { kind, .. } => kind,
        }
    }
}

/// Plain text content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextContent {
    /// The text.
    pub text: String,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Image content, base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    /// Base64-encoded image bytes.
    pub data: String,
    /// MIME type of the image (e.g. `image/png`).
    pub mime_type: String,
    /// Optional source URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Audio content, base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudioContent {
    /// Base64-encoded audio bytes.
    pub data: String,
    /// MIME type of the audio (e.g. `audio/wav`).
    pub mime_type: String,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// A reference to a resource the receiver can resolve later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLink {
    /// URI of the resource.
    pub uri: String,
    /// Short display name.
    pub name: String,
    /// Optional human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Optional size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Resource contents embedded directly in a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmbeddedResource {
    /// The embedded contents.
    pub resource: ResourceContents,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// The payload of an embedded resource: text or binary, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// URI identifying the resource.
    pub uri: String,
    /// Text contents, if the resource is textual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64-encoded contents, if the resource is binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
    /// Optional MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: ExtMap,
}

/// Serialize `body` as an object and insert the `type` discriminator.
pub(crate) fn tag_object<T: Serialize, S: Serializer>(
    tag_field: &str,
    kind: &str,
    body: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut value = serde_json::to_value(body).map_err(S::Error::custom)?;
    match &mut value {
        Value::Object(map) => {
            map.insert(tag_field.to_string(), Value::String(kind.to_string()));
        }
        _ => return Err(S::Error::custom("tagged body must serialize to an object")),
    }
    value.serialize(serializer)
}

/// Split a raw object into its discriminator value and the remainder.
///
/// Returns the tag (empty string when absent or non-string) and the object
/// with the tag field removed, plus a clone of the original for verbatim
/// retention.
pub(crate) fn split_tag(
    tag_field: &str,
    value: Value,
) -> Result<(String, Value, Value), &'static str> {
    let Value::Object(map) = value else {
        return Err("expected a JSON object");
    };
    let original = Value::Object(map.clone());
    let mut rest = map;
    let kind = match rest.remove(tag_field) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    Ok((kind, Value::Object(rest), original))
}

impl Serialize for ContentBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(c) => tag_object("type", "text", c, serializer),
            Self::Image(c) => tag_object("type", "image", c, serializer),
            Self::Audio(c) => tag_object("type", "audio", c, serializer),
            Self::ResourceLink(c) => tag_object("type", "resource_link", c, serializer),
            Self::Resource(c) => tag_object("type", "resource", c, serializer),
            Self::Other { payload, .. } => payload.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let (kind, rest, original) = split_tag("type", value).map_err(D::Error::custom)?;
        let parsed = match kind.as_str() {
            "text" => serde_json::from_value(rest).map(Self::Text),
            "image" => serde_json::from_value(rest).map(Self::Image),
            "audio" => serde_json::from_value(rest).map(Self::Audio),
            "resource_link" => serde_json::from_value(rest).map(Self::ResourceLink),
            "resource" => serde_json::from_value(rest).map(Self::Resource),
            _ => {
                return Ok(Self::Other {
                    kind,
                    payload: original,
                });
            }
        };
        parsed.map_err(|e| D::Error::custom(format!("content block ({kind}): {e}")))
    }
}

impl JsonSchema for ContentBlock {
    fn schema_name() -> Cow<'static, str> {
        "ContentBlock".into()
    }

    fn json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "object",
            "description": "Content block keyed on the `type` field; unknown kinds are preserved verbatim",
            "required": ["type"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_block_roundtrip() {
        let block = ContentBlock::text("hi there");
        let json = serde_json::to_string(&block).unwrap();
        let back: ContentBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }

    #[test]
    fn known_kind_with_unknown_fields_keeps_them() {
        let raw = r#"{"type":"text","text":"x","confidence":0.9}"#;
        let block: ContentBlock = serde_json::from_str(raw).unwrap();
        let ContentBlock::Text(text) = &block else {
            panic!("expected text block");
        };
        assert!(text.extra.contains_key("confidence"));

        let v1: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_value(&block).unwrap(), v1);
    }

    #[test]
    fn unknown_kind_roundtrips_verbatim() {
        let raw = r#"{"type":"hologram","frames":[{"z":1}],"depth":4}"#;
        let block: ContentBlock = serde_json::from_str(raw).unwrap();
        assert_eq!(block.kind(), "hologram");
        let v1: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_value(&block).unwrap(), v1);
    }

    #[test]
    fn missing_type_becomes_other() {
        let raw = r#"{"text":"untagged"}"#;
        let block: ContentBlock = serde_json::from_str(raw).unwrap();
        assert!(matches!(&block, ContentBlock::Other { kind, .. } if kind.is_empty()));
    }

    #[test]
    fn malformed_known_kind_is_an_error() {
        // text requires a string `text` field
        let raw = r#"{"type":"text","text":17}"#;
        assert!(serde_json::from_str::<ContentBlock>(raw).is_err());
    }

    #[test]
    fn embedded_resource_roundtrip() {
        let raw = r#"{"type":"resource","resource":{"uri":"file:///a.rs","text":"fn main() {}","mimeType":"text/x-rust"}}"#;
        let block: ContentBlock = serde_json::from_str(raw).unwrap();
        let ContentBlock::Resource(res) = &block else {
            panic!("expected embedded resource");
        };
        assert_eq!(res.resource.uri, "file:///a.rs");
        let v1: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_value(&block).unwrap(), v1);
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(serde_json::from_str::<ContentBlock>("\"just text\"").is_err());
        assert!(serde_json::from_str::<ContentBlock>("[1,2]").is_err());
    }
}
