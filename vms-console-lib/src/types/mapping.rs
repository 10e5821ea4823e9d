use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::null_as_default;
use crate::error::ConsoleError;

pub const FORMAT_PLACEHOLDER: &str = "%s";
pub const DEFAULT_SOURCE_DATE_FORMAT: &str = "yyyy-MM-dd";
pub const DEFAULT_TARGET_DATE_FORMAT: &str = "yyyy-MM-dd HH:mm:ss";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformationType {
    #[default]
    DefaultConversion,
    BooleanConversion,
    NumberConversion,
    StringFormat,
    DateFormat,
}

impl TransformationType {
    pub const ALL: [TransformationType; 5] = [
        TransformationType::DefaultConversion,
        TransformationType::BooleanConversion,
        TransformationType::NumberConversion,
        TransformationType::StringFormat,
        TransformationType::DateFormat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformationType::DefaultConversion => "DEFAULT_CONVERSION",
            TransformationType::BooleanConversion => "BOOLEAN_CONVERSION",
            TransformationType::NumberConversion => "NUMBER_CONVERSION",
            TransformationType::StringFormat => "STRING_FORMAT",
            TransformationType::DateFormat => "DATE_FORMAT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransformationType::DefaultConversion => "기본 변환",
            TransformationType::BooleanConversion => "불리언 변환",
            TransformationType::NumberConversion => "숫자 변환",
            TransformationType::StringFormat => "문자열 형식",
            TransformationType::DateFormat => "날짜 형식",
        }
    }

    /// Parameters a freshly selected type starts with.
    pub fn default_parameters(&self) -> BTreeMap<String, String> {
        let mut parameters = BTreeMap::new();
        match self {
            TransformationType::StringFormat => {
                parameters.insert("format".to_string(), FORMAT_PLACEHOLDER.to_string());
            }
            TransformationType::DateFormat => {
                parameters.insert(
                    "sourceFormat".to_string(),
                    DEFAULT_SOURCE_DATE_FORMAT.to_string(),
                );
                parameters.insert(
                    "targetFormat".to_string(),
                    DEFAULT_TARGET_DATE_FORMAT.to_string(),
                );
            }
            _ => {}
        }
        parameters
    }

    /// Parameter names the type requires; other types carry none.
    pub fn required_parameters(&self) -> &'static [&'static str] {
        match self {
            TransformationType::StringFormat => &["format"],
            TransformationType::DateFormat => &["sourceFormat", "targetFormat"],
            _ => &[],
        }
    }
}

impl fmt::Display for TransformationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformationType {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        TransformationType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                ConsoleError::Validation(format!(
                    "Invalid transformation type: {} [Expected: {}]",
                    s,
                    TransformationType::ALL
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// One field transformation rule as exchanged with the mapping endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_field: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_field: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transformation_type: TransformationType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: BTreeMap<String, String>,
}

impl Transformation {
    pub fn new(
        source_field: impl Into<String>,
        target_field: impl Into<String>,
        transformation_type: TransformationType,
    ) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            transformation_type,
            parameters: transformation_type.default_parameters(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRuleSet {
    #[serde(default)]
    pub channel_id_transformation: Option<Transformation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transformations: Vec<Transformation>,
}

impl MappingRuleSet {
    pub fn is_empty(&self) -> bool {
        self.transformations.is_empty()
    }
}

/// Body of the channel-ID rule update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelIdUpdate {
    pub source_field: String,
}

/// A sample document describing a raw vendor schema or the unified schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldAnalysis {
    #[serde(default)]
    pub fields: serde_json::Value,
}
