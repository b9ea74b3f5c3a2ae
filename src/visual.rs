//! Visual Mapping (pass-through)
//!
//! A sibling JSON consumed by the external viewer. The core never
//! interprets these fields -- it only carries them from a definition module
//! to the `_gen/<name>/visual.json` output.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    Normal,
    Additive,
    Multiply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMapping {
    pub source_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend: Option<BlendMode>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<ChannelMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ChannelMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ChannelMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<ChannelMapping>,
}
