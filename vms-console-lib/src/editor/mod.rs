//! Mapping rule editor.
//!
//! Holds the rule set, field analyses and form state for the selected VMS type, and drives
//! the mapping endpoints. Every fetch is tagged with a request token so a response that
//! arrives after a newer selection is dropped instead of overwriting it.

mod form;
mod view;

use std::sync::Arc;

use crate::analysis::{FieldFlattener, TargetFieldOptions};
use crate::api::VmsApi;
use crate::error::{Banner, ConsoleError};
use crate::locale::{LocaleTable, MessageKey};
use crate::token::{RequestSlot, RequestToken, RequestTokens};
use crate::types::{FieldAnalysis, MappingRuleSet, Transformation, VmsType};

pub use form::TransformationForm;
pub use view::render_rules;

/// Asks the user to approve a destructive action.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    AddingTransformation(TransformationForm),
    EditingTransformation {
        index: usize,
        form: TransformationForm,
    },
    ResettingRules,
}

/// Tokens issued for a selection whose fetches have not completed yet.
#[derive(Debug, Clone)]
pub struct PendingSelection {
    pub vms: VmsType,
    rules_token: RequestToken,
    analysis_token: RequestToken,
}

/// Responses of a selection's concurrent fetches.
#[derive(Debug)]
pub struct LoadedSelection {
    pending: PendingSelection,
    rules: Result<MappingRuleSet, ConsoleError>,
    analysis: Result<FieldAnalysis, ConsoleError>,
}

impl PendingSelection {
    /// Fetches the rule set and the vendor field analysis concurrently.
    pub async fn load(self, api: &dyn VmsApi) -> LoadedSelection {
        let (rules, analysis) = tokio::join!(
            api.get_mapping_rules(&self.vms),
            api.analyze_field_structure(&self.vms)
        );
        LoadedSelection {
            pending: self,
            rules,
            analysis,
        }
    }
}

pub struct MappingRuleEditor {
    api: Arc<dyn VmsApi>,
    locale: LocaleTable,
    flattener: FieldFlattener,
    tokens: RequestTokens,
    vms_types: Vec<VmsType>,
    selected: Option<VmsType>,
    rules: MappingRuleSet,
    field_analysis: Option<FieldAnalysis>,
    unified_analysis: Option<FieldAnalysis>,
    state: EditorState,
    banner: Option<Banner>,
}

impl MappingRuleEditor {
    pub fn new(api: Arc<dyn VmsApi>, locale: LocaleTable, flattener: FieldFlattener) -> Self {
        Self {
            api,
            locale,
            flattener,
            tokens: RequestTokens::new(),
            vms_types: Vec::new(),
            selected: None,
            rules: MappingRuleSet::default(),
            field_analysis: None,
            unified_analysis: None,
            state: EditorState::Idle,
            banner: None,
        }
    }

    pub fn vms_types(&self) -> &[VmsType] {
        &self.vms_types
    }

    pub fn selected(&self) -> Option<&VmsType> {
        self.selected.as_ref()
    }

    pub fn rules(&self) -> &MappingRuleSet {
        &self.rules
    }

    pub fn field_analysis(&self) -> Option<&FieldAnalysis> {
        self.field_analysis.as_ref()
    }

    pub fn unified_analysis(&self) -> Option<&FieldAnalysis> {
        self.unified_analysis.as_ref()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn locale(&self) -> &LocaleTable {
        &self.locale
    }

    pub fn render(&self) -> String {
        render_rules(&self.rules, &self.locale)
    }

    fn succeed(&mut self, message: String) {
        tracing::info!("{}", message);
        self.banner = Some(Banner::success(message));
    }

    fn fail(&mut self, key: MessageKey, vars: &[(&str, &str)], error: &ConsoleError) {
        let message = self.locale.failure(key, vars, error);
        tracing::error!("{}", message);
        self.banner = Some(Banner::error(message));
    }

    fn require_selected(&mut self) -> Result<VmsType, ConsoleError> {
        match &self.selected {
            Some(vms) => Ok(vms.clone()),
            None => {
                let message = self.locale.text(MessageKey::SelectVmsType).to_string();
                let err = ConsoleError::InvalidState(message);
                self.banner = Some(Banner::error(err.detail()));
                Err(err)
            }
        }
    }

    fn require_idle(&self, action: &str) -> Result<(), ConsoleError> {
        if self.state == EditorState::Idle {
            Ok(())
        } else {
            Err(ConsoleError::InvalidState(format!(
                "cannot {} while the editor is in state {}",
                action,
                self.state_name()
            )))
        }
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            EditorState::Idle => "Idle",
            EditorState::AddingTransformation(_) => "AddingTransformation",
            EditorState::EditingTransformation { .. } => "EditingTransformation",
            EditorState::ResettingRules => "ResettingRules",
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ConsoleError> {
        let len = self.rules.transformations.len();
        if index < len {
            Ok(())
        } else {
            Err(ConsoleError::InvalidState(format!(
                "transformation index {} is out of range (rules: {})",
                index, len
            )))
        }
    }

    /// Fetches the VMS type list and selects the first type, if any.
    pub async fn load_vms_types(&mut self) -> Result<(), ConsoleError> {
        let token = self.tokens.issue(RequestSlot::VmsTypes);
        let result = self.api.list_vms_types().await;
        let Some(result) = self.tokens.accept(RequestSlot::VmsTypes, token, result) else {
            return Ok(());
        };
        match result {
            Ok(types) => {
                tracing::info!("Loaded {} VMS types", types.len());
                self.vms_types = types;
                match self.vms_types.first().cloned() {
                    Some(first) => self.select_vms_type(first).await,
                    None => Ok(()),
                }
            }
            Err(e) => {
                self.fail(MessageKey::VmsTypesFetchFailed, &[], &e);
                Err(e)
            }
        }
    }

    /// Switches to `vms`, clearing the previous type's rules and analysis, and issues new
    /// request tokens for both fetches.
    pub fn begin_select(&mut self, vms: VmsType) -> PendingSelection {
        tracing::debug!("Selecting VMS type {}", vms);
        self.selected = Some(vms.clone());
        self.rules = MappingRuleSet::default();
        self.field_analysis = None;
        self.state = EditorState::Idle;
        PendingSelection {
            vms,
            rules_token: self.tokens.issue(RequestSlot::Rules),
            analysis_token: self.tokens.issue(RequestSlot::FieldAnalysis),
        }
    }

    /// Applies the responses of a selection whose tokens are still current.
    pub fn finish_select(&mut self, loaded: LoadedSelection) -> Result<(), ConsoleError> {
        let LoadedSelection {
            pending,
            rules,
            analysis,
        } = loaded;
        let vms = pending.vms.as_str();
        let mut first_error = None;

        if let Some(rules) = self
            .tokens
            .accept(RequestSlot::Rules, pending.rules_token, rules)
        {
            match rules {
                Ok(rules) => {
                    tracing::debug!(
                        "Loaded {} transformations for {}",
                        rules.transformations.len(),
                        vms
                    );
                    self.rules = rules;
                }
                Err(e) => {
                    self.fail(MessageKey::MappingRulesFetchFailed, &[("vms", vms)], &e);
                    first_error = Some(e);
                }
            }
        }

        if let Some(analysis) =
            self.tokens
                .accept(RequestSlot::FieldAnalysis, pending.analysis_token, analysis)
        {
            match analysis {
                Ok(analysis) => self.field_analysis = Some(analysis),
                Err(e) => {
                    self.fail(MessageKey::FieldAnalysisFailed, &[("vms", vms)], &e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub async fn select_vms_type(&mut self, vms: VmsType) -> Result<(), ConsoleError> {
        let pending = self.begin_select(vms);
        let loaded = pending.load(self.api.as_ref()).await;
        self.finish_select(loaded)
    }

    pub async fn refresh_rules(&mut self) -> Result<(), ConsoleError> {
        let vms = self.require_selected()?;
        let token = self.tokens.issue(RequestSlot::Rules);
        let result = self.api.get_mapping_rules(&vms).await;
        let Some(result) = self.tokens.accept(RequestSlot::Rules, token, result) else {
            return Ok(());
        };
        match result {
            Ok(rules) => {
                self.rules = rules;
                Ok(())
            }
            Err(e) => {
                self.fail(MessageKey::MappingRulesFetchFailed, &[("vms", vms.as_str())], &e);
                Err(e)
            }
        }
    }

    pub async fn analyze_field_structure(&mut self) -> Result<(), ConsoleError> {
        let vms = self.require_selected()?;
        let token = self.tokens.issue(RequestSlot::FieldAnalysis);
        let result = self.api.analyze_field_structure(&vms).await;
        let Some(result) = self.tokens.accept(RequestSlot::FieldAnalysis, token, result) else {
            return Ok(());
        };
        match result {
            Ok(analysis) => {
                self.field_analysis = Some(analysis);
                self.succeed(
                    self.locale
                        .with_vms(MessageKey::FieldAnalysisCompleted, vms.as_str()),
                );
                Ok(())
            }
            Err(e) => {
                self.fail(MessageKey::FieldAnalysisFailed, &[("vms", vms.as_str())], &e);
                Err(e)
            }
        }
    }

    pub async fn analyze_unified_structure(&mut self) -> Result<(), ConsoleError> {
        let token = self.tokens.issue(RequestSlot::UnifiedAnalysis);
        let result = self.api.analyze_unified_structure().await;
        let Some(result) = self
            .tokens
            .accept(RequestSlot::UnifiedAnalysis, token, result)
        else {
            return Ok(());
        };
        match result {
            Ok(analysis) => {
                self.unified_analysis = Some(analysis);
                self.succeed(
                    self.locale
                        .text(MessageKey::UnifiedAnalysisCompleted)
                        .to_string(),
                );
                Ok(())
            }
            Err(e) => {
                self.fail(MessageKey::UnifiedAnalysisFailed, &[], &e);
                Err(e)
            }
        }
    }

    /// Flattened paths of the selected type's raw field structure.
    pub fn source_field_options(&self) -> Result<Vec<String>, ConsoleError> {
        match &self.field_analysis {
            Some(analysis) => Ok(self.flattener.flatten(&analysis.fields)?),
            None => Ok(Vec::new()),
        }
    }

    /// Flattened paths of the unified camera schema.
    pub fn unified_field_options(&self) -> Result<Vec<String>, ConsoleError> {
        match &self.unified_analysis {
            Some(analysis) => Ok(self.flattener.flatten(&analysis.fields)?),
            None => Ok(Vec::new()),
        }
    }

    /// The standard target fields plus any extra unified-schema paths.
    pub fn target_field_options(&self) -> Result<TargetFieldOptions, ConsoleError> {
        let discovered = self.unified_field_options()?;
        Ok(TargetFieldOptions::standard().with_discovered(discovered))
    }

    pub fn open_add(&mut self) -> Result<(), ConsoleError> {
        self.require_idle("add a transformation")?;
        self.require_selected()?;
        self.state = EditorState::AddingTransformation(TransformationForm::new());
        Ok(())
    }

    pub fn open_edit(&mut self, index: usize) -> Result<(), ConsoleError> {
        self.require_idle("edit a transformation")?;
        self.require_selected()?;
        self.check_index(index)?;
        let form = TransformationForm::from_transformation(&self.rules.transformations[index]);
        self.state = EditorState::EditingTransformation { index, form };
        Ok(())
    }

    /// The open add/edit form.
    pub fn form_mut(&mut self) -> Option<&mut TransformationForm> {
        match &mut self.state {
            EditorState::AddingTransformation(form) => Some(form),
            EditorState::EditingTransformation { form, .. } => Some(form),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        tracing::debug!("Leaving state {}", self.state_name());
        self.state = EditorState::Idle;
    }

    /// Submits the open form. The form closes only when the server accepted the change.
    pub async fn submit(&mut self) -> Result<(), ConsoleError> {
        match self.state.clone() {
            EditorState::AddingTransformation(form) => {
                self.add_transformation(&form).await?;
            }
            EditorState::EditingTransformation { index, form } => {
                self.edit_transformation(index, &form).await?;
            }
            _ => {
                return Err(ConsoleError::InvalidState(format!(
                    "no transformation form is open (state {})",
                    self.state_name()
                )))
            }
        }
        self.state = EditorState::Idle;
        Ok(())
    }

    fn validate_form(&mut self, form: &TransformationForm) -> Result<Transformation, ConsoleError> {
        form.validate(&self.locale).map_err(|e| {
            tracing::warn!("Rejected transformation form: {}", e.detail());
            self.banner = Some(Banner::error(e.detail()));
            e
        })
    }

    /// Reloads rules after a successful mutation and sets the outcome banner. A failed
    /// reload leaves the mutation done but makes the banner an error naming both.
    async fn finish_change(&mut self, message: String) {
        match self.refresh_rules().await {
            Ok(()) => self.succeed(message),
            Err(e) => {
                let reload = self.locale.failure(MessageKey::RulesReloadFailed, &[], &e);
                let message = format!("{} {}", message, reload);
                tracing::error!("{}", message);
                self.banner = Some(Banner::error(message));
            }
        }
    }

    pub async fn add_transformation(
        &mut self,
        form: &TransformationForm,
    ) -> Result<(), ConsoleError> {
        let vms = self.require_selected()?;
        let rule = self.validate_form(form)?;
        tracing::info!(
            "Adding transformation {} -> {} ({}) to {}",
            rule.source_field,
            rule.target_field,
            rule.transformation_type,
            vms
        );
        match self.api.add_transformation(&vms, &rule).await {
            Ok(()) => {
                let message = self
                    .locale
                    .with_vms(MessageKey::TransformationAdded, vms.as_str());
                self.finish_change(message).await;
                Ok(())
            }
            Err(e) => {
                self.fail(MessageKey::TransformationAddFailed, &[], &e);
                Err(e)
            }
        }
    }

    /// Replaces the transformation at `index` by deleting it and adding the new rule.
    ///
    /// If the add fails the original rule is added back; it then sits at the end of the
    /// list. If that also fails the result is [`ConsoleError::PartialFailure`].
    pub async fn edit_transformation(
        &mut self,
        index: usize,
        form: &TransformationForm,
    ) -> Result<(), ConsoleError> {
        let vms = self.require_selected()?;
        let replacement = self.validate_form(form)?;
        self.check_index(index)?;
        let original = self.rules.transformations[index].clone();

        tracing::info!("Replacing transformation {} of {}", index, vms);
        let result =
            replace_transformation(self.api.as_ref(), &vms, index, original, &replacement).await;

        let err = match result {
            Ok(()) => {
                let message = self
                    .locale
                    .with_vms(MessageKey::TransformationUpdated, vms.as_str());
                self.finish_change(message).await;
                return Ok(());
            }
            Err(e) => e,
        };
        // The server list may have changed even though the edit failed.
        if let Err(e) = self.refresh_rules().await {
            tracing::warn!("Reloading mapping rules failed: {}", e);
        }
        let key = match err {
            ConsoleError::PartialFailure { .. } => MessageKey::TransformationEditPartialFailure,
            _ => MessageKey::TransformationEditFailed,
        };
        self.fail(key, &[], &err);
        Err(err)
    }

    /// Deletes the transformation at `index` after confirmation. Returns `false` when the
    /// user declined.
    pub async fn delete_transformation(
        &mut self,
        index: usize,
        confirm: &dyn Confirm,
    ) -> Result<bool, ConsoleError> {
        let vms = self.require_selected()?;
        self.check_index(index)?;
        if !confirm.confirm(self.locale.text(MessageKey::ConfirmDeleteTransformation)) {
            tracing::debug!("Deletion of transformation {} declined", index);
            return Ok(false);
        }

        match self.api.remove_transformation(&vms, index).await {
            Ok(()) => {
                let message = self.locale.with_vms(MessageKey::TransformationDeleted, vms.as_str());
                self.finish_change(message).await;
                Ok(true)
            }
            Err(e) => {
                self.fail(MessageKey::TransformationDeleteFailed, &[], &e);
                Err(e)
            }
        }
    }

    pub fn request_reset(&mut self) -> Result<(), ConsoleError> {
        self.require_idle("reset mapping rules")?;
        self.require_selected()?;
        self.state = EditorState::ResettingRules;
        Ok(())
    }

    pub async fn confirm_reset(&mut self) -> Result<(), ConsoleError> {
        if self.state != EditorState::ResettingRules {
            return Err(ConsoleError::InvalidState(
                "no mapping rule reset was requested".to_string(),
            ));
        }
        let vms = self.require_selected()?;
        tracing::info!("Resetting mapping rules of {}", vms);
        match self.api.reset_mapping_rules(&vms).await {
            Ok(()) => {
                self.state = EditorState::Idle;
                let message = self.locale.with_vms(MessageKey::MappingRulesReset, vms.as_str());
                self.finish_change(message).await;
                Ok(())
            }
            Err(e) => {
                self.fail(MessageKey::MappingRulesResetFailed, &[], &e);
                Err(e)
            }
        }
    }

    /// Request, confirm and perform a reset in one step. Returns `false` when declined.
    pub async fn reset_mapping_rules(&mut self, confirm: &dyn Confirm) -> Result<bool, ConsoleError> {
        self.request_reset()?;
        let vms = self.selected.clone().unwrap_or_default();
        let prompt = self
            .locale
            .with_vms(MessageKey::ConfirmResetMappingRules, vms.as_str());
        if !confirm.confirm(&prompt) {
            self.cancel();
            return Ok(false);
        }
        self.confirm_reset().await?;
        Ok(true)
    }

    pub async fn update_channel_id_transformation(
        &mut self,
        source_field: &str,
    ) -> Result<(), ConsoleError> {
        let vms = self.require_selected()?;
        let source_field = source_field.trim();
        if source_field.is_empty() {
            let err = ConsoleError::Validation(
                self.locale
                    .format(MessageKey::RequiredField, &[("field", "소스 필드")]),
            );
            self.banner = Some(Banner::error(err.detail()));
            return Err(err);
        }

        match self
            .api
            .update_channel_id_transformation(&vms, source_field)
            .await
        {
            Ok(()) => {
                let message = self.locale.with_vms(MessageKey::ChannelIdUpdated, vms.as_str());
                self.finish_change(message).await;
                Ok(())
            }
            Err(e) => {
                self.fail(MessageKey::ChannelIdUpdateFailed, &[], &e);
                Err(e)
            }
        }
    }
}

async fn replace_transformation(
    api: &dyn VmsApi,
    vms: &VmsType,
    index: usize,
    original: Transformation,
    replacement: &Transformation,
) -> Result<(), ConsoleError> {
    api.remove_transformation(vms, index).await?;

    let add_error = match api.add_transformation(vms, replacement).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    tracing::warn!(
        "Adding the replacement for transformation {} failed ({}); restoring the original",
        index,
        add_error
    );
    match api.add_transformation(vms, &original).await {
        Ok(()) => Err(add_error),
        Err(restore_error) => {
            tracing::error!(
                "Restoring transformation {} of {} failed: {}",
                index,
                vms,
                restore_error
            );
            Err(ConsoleError::PartialFailure {
                index,
                original: Box::new(original),
                add_error: Box::new(add_error),
                restore_error: Box::new(restore_error),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PathSeparator;
    use crate::testing::{init_logging, FakeVmsApi};
    use crate::types::TransformationType;
    use serde_json::json;

    fn editor_with(api: Arc<FakeVmsApi>) -> MappingRuleEditor {
        MappingRuleEditor::new(api, LocaleTable::new(), FieldFlattener::default())
    }

    fn three_rules() -> MappingRuleSet {
        MappingRuleSet {
            channel_id_transformation: None,
            transformations: vec![
                Transformation::new("a", "name", TransformationType::DefaultConversion),
                Transformation::new("b", "port", TransformationType::NumberConversion),
                Transformation::new("c", "status", TransformationType::DefaultConversion),
            ],
        }
    }

    fn sources(rules: &MappingRuleSet) -> Vec<&str> {
        rules
            .transformations
            .iter()
            .map(|t| t.source_field.as_str())
            .collect()
    }

    fn form(source: &str, target: &str) -> TransformationForm {
        let mut form = TransformationForm::new();
        form.set_source_field(source);
        form.set_target_field(target);
        form
    }

    #[tokio::test]
    async fn test_load_types_selects_first() {
        init_logging();
        let api = Arc::new(
            FakeVmsApi::new()
                .with_types(&["emstone", "naiz"])
                .with_rules("emstone", three_rules()),
        );
        let mut editor = editor_with(api.clone());

        editor.load_vms_types().await.unwrap();

        assert_eq!(editor.vms_types().len(), 2);
        assert_eq!(editor.selected().unwrap().as_str(), "emstone");
        assert_eq!(editor.rules().transformations.len(), 3);
        assert!(editor.field_analysis().is_some());
    }

    #[tokio::test]
    async fn test_end_to_end_add_from_analysis() {
        init_logging();
        let api = Arc::new(
            FakeVmsApi::new()
                .with_types(&["dahua"])
                .with_analysis("dahua", json!({"name": "x", "channel": {"id": "5"}})),
        );
        let mut editor = editor_with(api.clone());

        editor.select_vms_type("dahua".into()).await.unwrap();
        let options = editor.source_field_options().unwrap();
        assert_eq!(options, vec!["name", "channel.id"]);

        editor.open_add().unwrap();
        let form = editor.form_mut().unwrap();
        form.set_source_field(options[1].clone());
        form.set_target_field("channel_ID");
        editor.submit().await.unwrap();

        assert_eq!(editor.state(), &EditorState::Idle);
        assert_eq!(
            editor.rules().transformations,
            vec![Transformation::new(
                "channel.id",
                "channel_ID",
                TransformationType::DefaultConversion
            )]
        );
        assert_eq!(
            editor.banner().unwrap().message,
            "dahua VMS에 새 변환 규칙이 추가되었습니다."
        );
    }

    #[tokio::test]
    async fn test_source_options_use_configured_separator() {
        let api = Arc::new(
            FakeVmsApi::new().with_analysis("dahua", json!({"channel": {"id": "5"}})),
        );
        let mut editor = MappingRuleEditor::new(
            api,
            LocaleTable::new(),
            FieldFlattener::new(PathSeparator::DASH, 32),
        );
        editor.select_vms_type("dahua".into()).await.unwrap();
        assert_eq!(editor.source_field_options().unwrap(), vec!["channel-id"]);
    }

    #[tokio::test]
    async fn test_empty_target_rejected_without_network_call() {
        init_logging();
        let api = Arc::new(FakeVmsApi::new());
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();
        let calls_before = api.calls().len();

        editor.open_add().unwrap();
        editor.form_mut().unwrap().set_source_field("title");
        let err = editor.submit().await.unwrap_err();

        assert!(matches!(err, ConsoleError::Validation(_)));
        assert_eq!(api.calls().len(), calls_before);
        assert!(matches!(
            editor.state(),
            EditorState::AddingTransformation(_)
        ));
        assert!(editor.banner().unwrap().is_error());
    }

    #[tokio::test]
    async fn test_server_error_keeps_form_open() {
        let api = Arc::new(FakeVmsApi::new());
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();
        api.fail_next_adds(1);

        editor.open_add().unwrap();
        *editor.form_mut().unwrap() = form("title", "name");
        assert!(editor.submit().await.is_err());

        assert!(matches!(
            editor.state(),
            EditorState::AddingTransformation(_)
        ));
        assert_eq!(
            editor.banner().unwrap().message,
            "변환 규칙 추가 중 오류가 발생했습니다: 규칙을 추가할 수 없습니다."
        );
    }

    #[tokio::test]
    async fn test_failed_reload_after_add_is_reported() {
        init_logging();
        let api = Arc::new(FakeVmsApi::new());
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();
        api.fail("get_mapping_rules");

        editor.add_transformation(&form("title", "name")).await.unwrap();

        assert_eq!(api.rules("naiz").transformations.len(), 1);
        assert!(editor.rules().is_empty());
        let banner = editor.banner().unwrap();
        assert!(banner.is_error());
        assert_eq!(
            banner.message,
            "naiz VMS에 새 변환 규칙이 추가되었습니다. 목록 새로고침 실패: get_mapping_rules failed"
        );
    }

    #[tokio::test]
    async fn test_failed_reload_after_delete_is_reported() {
        let api = Arc::new(FakeVmsApi::new().with_rules("naiz", three_rules()));
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();
        api.fail("get_mapping_rules");

        assert!(editor
            .delete_transformation(0, &|_: &str| true)
            .await
            .unwrap());

        assert_eq!(sources(&api.rules("naiz")), vec!["b", "c"]);
        assert_eq!(sources(editor.rules()), vec!["a", "b", "c"]);
        let banner = editor.banner().unwrap();
        assert!(banner.is_error());
        assert!(banner.message.contains("목록 새로고침 실패"));
    }

    #[tokio::test]
    async fn test_delete_shifts_later_rules() {
        init_logging();
        let api = Arc::new(FakeVmsApi::new().with_rules("naiz", three_rules()));
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();

        let deleted = editor
            .delete_transformation(1, &|_: &str| true)
            .await
            .unwrap();

        assert!(deleted);
        assert_eq!(sources(editor.rules()), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_declined_delete_makes_no_call() {
        let api = Arc::new(FakeVmsApi::new().with_rules("naiz", three_rules()));
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();

        let deleted = editor
            .delete_transformation(0, &|_: &str| false)
            .await
            .unwrap();

        assert!(!deleted);
        assert!(!api.calls().contains(&"remove_transformation".to_string()));
        assert_eq!(editor.rules().transformations.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_out_of_range_is_invalid_state() {
        let api = Arc::new(FakeVmsApi::new().with_rules("naiz", three_rules()));
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();

        let err = editor
            .delete_transformation(3, &|_: &str| true)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_edit_replaces_and_appends() {
        let api = Arc::new(FakeVmsApi::new().with_rules("naiz", three_rules()));
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();

        editor.open_edit(0).unwrap();
        editor.form_mut().unwrap().set_source_field("title");
        editor.submit().await.unwrap();

        assert_eq!(sources(editor.rules()), vec!["b", "c", "title"]);
        assert_eq!(editor.state(), &EditorState::Idle);
    }

    #[tokio::test]
    async fn test_edit_failure_restores_original() {
        init_logging();
        let api = Arc::new(FakeVmsApi::new().with_rules("naiz", three_rules()));
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();
        api.fail_next_adds(1);

        let err = editor
            .edit_transformation(1, &form("title", "name"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConsoleError::Api { .. }));
        assert_eq!(sources(editor.rules()), vec!["a", "c", "b"]);
        assert_eq!(api.rules("naiz").transformations.len(), 3);
    }

    #[tokio::test]
    async fn test_edit_failed_restore_is_partial_failure() {
        let api = Arc::new(FakeVmsApi::new().with_rules("naiz", three_rules()));
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();
        api.fail_next_adds(2);

        let err = editor
            .edit_transformation(1, &form("title", "name"))
            .await
            .unwrap_err();

        match err {
            ConsoleError::PartialFailure {
                index, original, ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(original.source_field, "b");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(sources(editor.rules()), vec!["a", "c"]);
        assert!(editor.banner().unwrap().is_error());
    }

    #[tokio::test]
    async fn test_stale_selection_is_discarded() {
        init_logging();
        let api = Arc::new(
            FakeVmsApi::new()
                .with_rules("emstone", three_rules())
                .with_analysis("emstone", json!({"old": 1}))
                .with_analysis("dahua", json!({"new": 1})),
        );
        let mut editor = editor_with(api.clone());

        let first = editor.begin_select("emstone".into());
        let second = editor.begin_select("dahua".into());

        let second_loaded = second.load(api.as_ref()).await;
        editor.finish_select(second_loaded).unwrap();
        let first_loaded = first.load(api.as_ref()).await;
        editor.finish_select(first_loaded).unwrap();

        assert_eq!(editor.selected().unwrap().as_str(), "dahua");
        assert!(editor.rules().is_empty());
        assert_eq!(editor.source_field_options().unwrap(), vec!["new"]);
    }

    #[tokio::test]
    async fn test_analysis_failure_keeps_rules() {
        let api = Arc::new(FakeVmsApi::new().with_rules("naiz", three_rules()));
        api.fail("analyze_field_structure");
        let mut editor = editor_with(api.clone());

        assert!(editor.select_vms_type("naiz".into()).await.is_err());
        assert_eq!(editor.rules().transformations.len(), 3);
        assert!(editor.source_field_options().unwrap().is_empty());
        assert!(editor
            .banner()
            .unwrap()
            .message
            .starts_with("naiz VMS의 필드 구조 분석 중 오류가 발생했습니다"));
    }

    #[tokio::test]
    async fn test_reset_requires_confirmation() {
        let api = Arc::new(FakeVmsApi::new().with_rules("naiz", three_rules()));
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("naiz".into()).await.unwrap();

        assert!(!editor.reset_mapping_rules(&|_: &str| false).await.unwrap());
        assert_eq!(editor.state(), &EditorState::Idle);
        assert_eq!(editor.rules().transformations.len(), 3);

        let prompted = std::sync::Mutex::new(String::new());
        let confirm = |message: &str| {
            *prompted.lock().unwrap() = message.to_string();
            true
        };
        assert!(editor.reset_mapping_rules(&confirm).await.unwrap());
        assert!(editor.rules().is_empty());
        assert!(prompted.lock().unwrap().contains("naiz"));
    }

    #[tokio::test]
    async fn test_confirm_reset_outside_reset_state() {
        let api = Arc::new(FakeVmsApi::new());
        let mut editor = editor_with(api);
        editor.select_vms_type("naiz".into()).await.unwrap();
        assert!(matches!(
            editor.confirm_reset().await,
            Err(ConsoleError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_channel_id_update() {
        let api = Arc::new(FakeVmsApi::new());
        let mut editor = editor_with(api.clone());
        editor.select_vms_type("dahua".into()).await.unwrap();

        assert!(matches!(
            editor.update_channel_id_transformation("  ").await,
            Err(ConsoleError::Validation(_))
        ));

        editor
            .update_channel_id_transformation("channel.id")
            .await
            .unwrap();
        let rule = editor.rules().channel_id_transformation.as_ref().unwrap();
        assert_eq!(rule.source_field, "channel.id");
        assert!(editor.render().starts_with("소스 필드: channel.id"));
    }

    #[tokio::test]
    async fn test_operations_need_selection() {
        let api = Arc::new(FakeVmsApi::new());
        let mut editor = editor_with(api.clone());

        assert!(matches!(
            editor.open_add(),
            Err(ConsoleError::InvalidState(_))
        ));
        assert_eq!(
            editor.banner().unwrap().message,
            "VMS 유형을 선택해주세요."
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_target_options_merge_unified_paths() {
        let api = Arc::new(
            FakeVmsApi::new().with_unified(json!({"name": "", "location": {"floor": 1}})),
        );
        let mut editor = editor_with(api);

        assert_eq!(editor.target_field_options().unwrap().all().len(), 12);
        editor.analyze_unified_structure().await.unwrap();

        let options = editor.target_field_options().unwrap();
        assert_eq!(options.discovered_fields(), &["location.floor".to_string()]);
        assert_eq!(options.all().len(), 13);
    }

    #[tokio::test]
    async fn test_open_edit_twice_is_rejected() {
        let api = Arc::new(FakeVmsApi::new().with_rules("naiz", three_rules()));
        let mut editor = editor_with(api);
        editor.select_vms_type("naiz".into()).await.unwrap();

        editor.open_edit(2).unwrap();
        assert!(editor.open_add().is_err());
        editor.cancel();
        assert!(editor.open_add().is_ok());
    }
}
