mod camera;
mod mapping;
mod vms;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub use camera::Camera;
pub use mapping::{
    ChannelIdUpdate, FieldAnalysis, MappingRuleSet, Transformation, TransformationType,
    FORMAT_PLACEHOLDER,
};
pub use vms::{AdditionalInfoItem, VmsConfig, VmsConfigUpdate};

/// Treats an explicit `null` like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Server-defined identifier of a VMS vendor integration, e.g. `emstone`, `naiz` or `dahua`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VmsType(String);

impl VmsType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VmsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VmsType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VmsType {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Response envelope used by every read endpoint: `{ "rows": ... }`.
///
/// A missing or `null` `rows` deserializes to the payload's default value.
#[derive(Debug, Deserialize)]
pub struct Rows<T> {
    rows: Option<T>,
}

impl<T: Default> Rows<T> {
    pub fn into_inner(self) -> T {
        self.rows.unwrap_or_default()
    }
}
