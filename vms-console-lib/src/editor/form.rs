use std::collections::BTreeMap;

use crate::error::ConsoleError;
use crate::locale::{LocaleTable, MessageKey};
use crate::types::{Transformation, TransformationType, FORMAT_PLACEHOLDER};

const SOURCE_FIELD_LABEL: &str = "소스 필드";
const TARGET_FIELD_LABEL: &str = "대상 필드";
const TRANSFORMATION_TYPE_LABEL: &str = "변환 유형";

/// The add/edit form of a transformation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationForm {
    pub source_field: String,
    pub target_field: String,
    pub transformation_type: Option<TransformationType>,
    pub parameters: BTreeMap<String, String>,
}

impl Default for TransformationForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationForm {
    pub fn new() -> Self {
        let transformation_type = TransformationType::default();
        Self {
            source_field: String::new(),
            target_field: String::new(),
            transformation_type: Some(transformation_type),
            parameters: transformation_type.default_parameters(),
        }
    }

    pub fn from_transformation(transformation: &Transformation) -> Self {
        Self {
            source_field: transformation.source_field.clone(),
            target_field: transformation.target_field.clone(),
            transformation_type: Some(transformation.transformation_type),
            parameters: transformation.parameters.clone(),
        }
    }

    pub fn set_source_field(&mut self, source_field: impl Into<String>) {
        self.source_field = source_field.into();
    }

    pub fn set_target_field(&mut self, target_field: impl Into<String>) {
        self.target_field = target_field.into();
    }

    /// Switching the type discards the previous type's parameters.
    pub fn set_transformation_type(&mut self, transformation_type: TransformationType) {
        self.transformation_type = Some(transformation_type);
        self.parameters = transformation_type.default_parameters();
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Checks required fields and type parameters, producing the rule to submit.
    pub fn validate(&self, locale: &LocaleTable) -> Result<Transformation, ConsoleError> {
        let required = |label: &str| {
            ConsoleError::Validation(locale.format(MessageKey::RequiredField, &[("field", label)]))
        };

        let source_field = self.source_field.trim();
        if source_field.is_empty() {
            return Err(required(SOURCE_FIELD_LABEL));
        }
        let target_field = self.target_field.trim();
        if target_field.is_empty() {
            return Err(required(TARGET_FIELD_LABEL));
        }
        let transformation_type = self
            .transformation_type
            .ok_or_else(|| required(TRANSFORMATION_TYPE_LABEL))?;

        for name in transformation_type.required_parameters() {
            let present = self
                .parameters
                .get(*name)
                .is_some_and(|value| !value.trim().is_empty());
            if !present {
                return Err(ConsoleError::Validation(
                    locale.format(MessageKey::MissingParameter, &[("field", *name)]),
                ));
            }
        }

        if transformation_type == TransformationType::StringFormat {
            let format = self.parameters.get("format").map(String::as_str).unwrap_or("");
            if format.matches(FORMAT_PLACEHOLDER).count() != 1 {
                return Err(ConsoleError::Validation(
                    locale.text(MessageKey::InvalidStringFormat).to_string(),
                ));
            }
        }

        Ok(Transformation {
            source_field: source_field.to_string(),
            target_field: target_field.to_string(),
            transformation_type,
            parameters: self.parameters.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(kind: TransformationType) -> TransformationForm {
        let mut form = TransformationForm::new();
        form.set_source_field("title");
        form.set_target_field("name");
        form.set_transformation_type(kind);
        form
    }

    #[test]
    fn test_new_form_defaults() {
        let form = TransformationForm::new();
        assert_eq!(
            form.transformation_type,
            Some(TransformationType::DefaultConversion)
        );
        assert!(form.parameters.is_empty());
    }

    #[test]
    fn test_required_fields() {
        let locale = LocaleTable::new();
        let mut form = TransformationForm::new();
        form.set_source_field("title");
        form.set_target_field("   ");

        match form.validate(&locale) {
            Err(ConsoleError::Validation(message)) => {
                assert_eq!(message, "대상 필드 항목은 필수입니다.")
            }
            other => panic!("unexpected result: {other:?}"),
        }

        form.set_target_field("name");
        form.transformation_type = None;
        assert!(matches!(
            form.validate(&locale),
            Err(ConsoleError::Validation(_))
        ));
    }

    #[test]
    fn test_type_change_resets_parameters() {
        let mut form = filled(TransformationType::DateFormat);
        form.set_parameter("sourceFormat", "yyyyMMdd");
        form.set_transformation_type(TransformationType::StringFormat);

        assert_eq!(form.parameters.len(), 1);
        assert_eq!(form.parameters["format"], "%s");
    }

    #[test]
    fn test_string_format_placeholder_count() {
        let locale = LocaleTable::new();
        let mut form = filled(TransformationType::StringFormat);

        form.set_parameter("format", "CAM-%s");
        assert_eq!(
            form.validate(&locale).unwrap().parameters["format"],
            "CAM-%s"
        );

        form.set_parameter("format", "CAM");
        assert!(form.validate(&locale).is_err());

        form.set_parameter("format", "%s-%s");
        assert!(form.validate(&locale).is_err());
    }

    #[test]
    fn test_date_format_needs_both_formats() {
        let locale = LocaleTable::new();
        let mut form = filled(TransformationType::DateFormat);
        assert!(form.validate(&locale).is_ok());

        form.set_parameter("targetFormat", "");
        match form.validate(&locale) {
            Err(ConsoleError::Validation(message)) => {
                assert_eq!(message, "targetFormat 매개변수가 필요합니다.")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validate_trims_field_names() {
        let locale = LocaleTable::new();
        let mut form = filled(TransformationType::BooleanConversion);
        form.set_source_field("  enabled ");
        let rule = form.validate(&locale).unwrap();
        assert_eq!(rule.source_field, "enabled");
        assert_eq!(
            rule.transformation_type,
            TransformationType::BooleanConversion
        );
    }
}
