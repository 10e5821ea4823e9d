use serde::{Deserialize, Serialize};

use super::null_as_default;
use super::vms::string_or_number;

/// A camera in the unified schema, as produced by the server's synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Camera {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "channelID", default, deserialize_with = "null_as_default")]
    pub channel_id: String,
    #[serde(rename = "channelName", default, deserialize_with = "null_as_default")]
    pub channel_name: String,
    #[serde(rename = "ipAddress", default, deserialize_with = "null_as_default")]
    pub ip_address: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub port: String,
    #[serde(rename = "rtspUrl", default, deserialize_with = "null_as_default")]
    pub rtsp_url: String,
    #[serde(rename = "isEnabled", default, deserialize_with = "null_as_default")]
    pub is_enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(rename = "supportsPTZ", default, deserialize_with = "null_as_default")]
    pub supports_ptz: bool,
    #[serde(rename = "supportsAudio", default, deserialize_with = "null_as_default")]
    pub supports_audio: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vms: String,
    #[serde(rename = "originalId", default, deserialize_with = "null_as_default")]
    pub original_id: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Camera {
    /// Case-insensitive substring match on name, channel name and IP address.
    /// `query` is expected to be lowercased already.
    pub fn matches_search(&self, query: &str) -> bool {
        query.is_empty()
            || self.name.to_lowercase().contains(query)
            || self.channel_name.to_lowercase().contains(query)
            || self.ip_address.to_lowercase().contains(query)
    }
}
