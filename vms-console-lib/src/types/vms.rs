use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{null_as_default, VmsType};

/// Accepts `"8002"`, `8002` or `null` and yields the string form.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Vendor specific key/value setting stored alongside a VMS connection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInfoItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl AdditionalInfoItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let now = now_rfc3339();
        Self {
            key: key.into(),
            value: value.into(),
            description: String::new(),
            created_at: Some(now.clone()),
            updated_at: Some(now),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.updated_at = Some(now_rfc3339());
    }

    /// Parses the `key=value` form used on the command line.
    pub fn parse_pair(pair: &str) -> Option<Self> {
        let (key, value) = pair.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self::new(key, value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "type")]
    pub vms_type: VmsType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub port: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_info: Vec<AdditionalInfoItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// POST body for `/v2/vms/config/{type}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VmsConfigUpdate {
    pub username: String,
    pub password: String,
    pub ip: String,
    pub port: String,
    pub additional_info: Vec<AdditionalInfoItem>,
}

impl VmsConfigUpdate {
    /// Starts an update from the stored config. The password is never echoed back by the
    /// server, so it has to be re-entered.
    pub fn from_config(config: &VmsConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: String::new(),
            ip: config.ip.clone(),
            port: config.port.clone(),
            additional_info: config.additional_info.clone(),
        }
    }

    /// Inserts or replaces an additional info entry by key.
    pub fn upsert_info(&mut self, item: AdditionalInfoItem) {
        match self.additional_info.iter_mut().find(|i| i.key == item.key) {
            Some(existing) => {
                existing.set_value(item.value);
                if !item.description.is_empty() {
                    existing.description = item.description;
                }
            }
            None => self.additional_info.push(item),
        }
    }
}
