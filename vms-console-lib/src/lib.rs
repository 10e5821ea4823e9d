//! VMS Integration Console Library
//!
//! Administrative client for a VMS integration backend: manages VMS connection configs,
//! browses the unified camera catalog, and edits the per-vendor field mapping rules that
//! turn raw vendor camera payloads into unified cameras.

mod analysis;
mod api;
mod catalog;
mod config;
mod directory;
mod editor;
mod error;
mod locale;
mod token;
mod types;

#[cfg(test)]
mod testing;

pub use analysis::{
    FieldFlattener, PathSeparator, TargetField, TargetFieldOptions, DEFAULT_MAX_DEPTH,
    STANDARD_TARGET_FIELDS,
};
pub use api::{error_message, ApiClient, VmsApi};
pub use catalog::{CameraCatalog, CameraStats};
pub use config::{ConsoleConfig, CONFIG_TEMPLATE, DEFAULT_BASE_URL};
pub use directory::{SyncTarget, VmsDirectory};
pub use editor::{
    render_rules, Confirm, EditorState, LoadedSelection, MappingRuleEditor, PendingSelection,
    TransformationForm,
};
pub use error::{Banner, BannerKind, ConsoleError, FieldAnalysisError};
pub use locale::{LocaleTable, MessageKey};
pub use token::{RequestSlot, RequestToken, RequestTokens};
pub use types::{
    AdditionalInfoItem, Camera, FieldAnalysis, MappingRuleSet, Transformation,
    TransformationType, VmsConfig, VmsConfigUpdate, VmsType,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{init_logging, FakeVmsApi};
    use serde_json::json;
    use std::sync::Arc;
    use tracing::info;

    #[tokio::test]
    async fn test_console_workflow_from_config() {
        init_logging();

        info!("Loading config from template");
        let config = ConsoleConfig::from_content(CONFIG_TEMPLATE).unwrap();
        config.validate().unwrap();

        let api = Arc::new(
            FakeVmsApi::new()
                .with_types(&["dahua"])
                .with_analysis(
                    "dahua",
                    json!({"deviceName": "x", "streams": [{"url": "rtsp://a"}]}),
                )
                .with_unified(json!({"name": "", "vendorExtra": {"zone": "A"}})),
        );
        let mut editor =
            MappingRuleEditor::new(api.clone(), config.locale(), config.flattener().unwrap());

        info!("Selecting first VMS type and analyzing");
        editor.load_vms_types().await.unwrap();
        editor.analyze_unified_structure().await.unwrap();

        assert_eq!(
            editor.source_field_options().unwrap(),
            vec!["deviceName", "streams[0].url"]
        );
        let targets = editor.target_field_options().unwrap();
        assert!(targets.contains("vendorExtra.zone"));
        assert!(targets.is_standard("rtsp_url"));

        let mut form = TransformationForm::new();
        form.set_source_field("streams[0].url");
        form.set_target_field("rtsp_url");
        editor.add_transformation(&form).await.unwrap();

        info!("Rendering rules");
        let rendered = editor.render();
        assert!(rendered.contains("streams[0].url"));
        assert!(rendered.contains("채널 ID 변환이 설정되지 않았습니다."));
    }
}
