//! Stream metadata as reported by `ffprobe -show_streams`.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level ffprobe JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub streams: Vec<StreamMetadata>,
}

/// One stream of a probed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamMetadata {
    #[serde(default)]
    pub index: u32,
    /// "video", "audio", "subtitle", "data", ...
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub side_data_list: Vec<SideData>,
}

/// A side-data record attached to a stream.
///
/// Only the type marker is always present; the Dolby Vision fields are filled
/// for configuration records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideData {
    #[serde(default)]
    pub side_data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dv_profile: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dv_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpu_present_flag: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub el_present_flag: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bl_present_flag: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dv_bl_signal_compatibility_id: Option<u8>,
}

impl SideData {
    /// Side-data record carrying only a type marker.
    pub fn of_type(side_data_type: impl Into<String>) -> Self {
        Self {
            side_data_type: Some(side_data_type.into()),
            ..Self::default()
        }
    }
}

impl StreamMetadata {
    pub fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }
}

// ffprobe emits `"side_data_list": null` for some demuxers.
fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<SideData>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<SideData>>::deserialize(deserializer)?.unwrap_or_default())
}
