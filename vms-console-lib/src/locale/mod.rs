//! User-facing message table.
//!
//! Every banner, prompt and empty-state text goes through [`LocaleTable`]. The built-in
//! strings are Korean; a config file may override any of them by key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ConsoleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKey {
    UnknownError,
    ApiCallFailed,
    VmsTypesFetchFailed,
    VmsDataFetchFailed,
    VmsConfigUpdated,
    VmsConfigUpdateFailed,
    VmsActivated,
    VmsDeactivated,
    VmsActiveUpdateFailed,
    VmsSyncInProgress,
    VmsSyncCompleted,
    VmsSyncFailed,
    AllVmsSyncInProgress,
    AllVmsSyncCompleted,
    AllVmsSyncFailed,
    SyncAlreadyInProgress,
    CamerasFetchFailed,
    CameraSyncInProgress,
    CameraSyncCompleted,
    CameraSyncFailed,
    RawCamerasFetchFailed,
    RawJsonFetchFailed,
    NoData,
    NoCameras,
    MappingRulesFetchFailed,
    RulesReloadFailed,
    FieldAnalysisCompleted,
    FieldAnalysisFailed,
    UnifiedAnalysisCompleted,
    UnifiedAnalysisFailed,
    TransformationAdded,
    TransformationAddFailed,
    TransformationUpdated,
    TransformationEditFailed,
    TransformationEditPartialFailure,
    TransformationDeleted,
    TransformationDeleteFailed,
    MappingRulesReset,
    MappingRulesResetFailed,
    ChannelIdUpdated,
    ChannelIdUpdateFailed,
    ConfirmDeleteTransformation,
    ConfirmResetMappingRules,
    NoTransformations,
    NoChannelIdTransformation,
    ChannelIdSource,
    RequiredField,
    MissingParameter,
    InvalidStringFormat,
    SelectVmsType,
}

impl MessageKey {
    pub fn default_text(&self) -> &'static str {
        match self {
            MessageKey::UnknownError => "알 수 없는 오류가 발생했습니다.",
            MessageKey::ApiCallFailed => "API 호출 실패: {status}",
            MessageKey::VmsTypesFetchFailed => "VMS 유형 정보를 가져오는 중 오류가 발생했습니다.",
            MessageKey::VmsDataFetchFailed => "VMS 데이터를 가져오는 중 오류가 발생했습니다.",
            MessageKey::VmsConfigUpdated => "{vms} VMS 설정이 저장되었습니다.",
            MessageKey::VmsConfigUpdateFailed => "VMS 설정 저장 중 오류가 발생했습니다",
            MessageKey::VmsActivated => "{vms} VMS가 활성화되었습니다.",
            MessageKey::VmsDeactivated => "{vms} VMS가 비활성화되었습니다.",
            MessageKey::VmsActiveUpdateFailed => "VMS 활성화 상태 변경 중 오류가 발생했습니다",
            MessageKey::VmsSyncInProgress => "{vms} VMS 동기화 중...",
            MessageKey::VmsSyncCompleted => "{vms} VMS 동기화가 완료되었습니다.",
            MessageKey::VmsSyncFailed => "{vms} VMS 동기화 중 오류가 발생했습니다",
            MessageKey::AllVmsSyncInProgress => "모든 VMS 동기화 중...",
            MessageKey::AllVmsSyncCompleted => "모든 VMS 동기화가 완료되었습니다.",
            MessageKey::AllVmsSyncFailed => "동기화 중 오류가 발생했습니다",
            MessageKey::SyncAlreadyInProgress => "{vms} 동기화가 이미 진행 중입니다.",
            MessageKey::CamerasFetchFailed => "카메라 정보를 가져오는 중 오류가 발생했습니다.",
            MessageKey::CameraSyncInProgress => "{vms} VMS 카메라 동기화 중...",
            MessageKey::CameraSyncCompleted => "{vms} VMS 카메라 동기화가 완료되었습니다.",
            MessageKey::CameraSyncFailed => "카메라 동기화 중 오류가 발생했습니다",
            MessageKey::RawCamerasFetchFailed => "카메라 데이터를 불러오는 중 오류가 발생했습니다.",
            MessageKey::RawJsonFetchFailed => "원본 JSON 데이터를 불러오는 중 오류가 발생했습니다.",
            MessageKey::NoData => "데이터가 없습니다.",
            MessageKey::NoCameras => "표시할 카메라가 없습니다.",
            MessageKey::MappingRulesFetchFailed => {
                "{vms} VMS의 매핑 규칙을 가져오는 중 오류가 발생했습니다."
            }
            MessageKey::RulesReloadFailed => "목록 새로고침 실패",
            MessageKey::FieldAnalysisCompleted => "{vms} VMS의 필드 구조 분석이 완료되었습니다.",
            MessageKey::FieldAnalysisFailed => "{vms} VMS의 필드 구조 분석 중 오류가 발생했습니다.",
            MessageKey::UnifiedAnalysisCompleted => "통합 카메라 필드 구조 분석이 완료되었습니다.",
            MessageKey::UnifiedAnalysisFailed => "통합 카메라 필드 구조 분석 중 오류가 발생했습니다.",
            MessageKey::TransformationAdded => "{vms} VMS에 새 변환 규칙이 추가되었습니다.",
            MessageKey::TransformationAddFailed => "변환 규칙 추가 중 오류가 발생했습니다",
            MessageKey::TransformationUpdated => "{vms} VMS의 변환 규칙이 수정되었습니다.",
            MessageKey::TransformationEditFailed => "변환 규칙 수정 중 오류가 발생했습니다",
            MessageKey::TransformationEditPartialFailure => {
                "변환 규칙 수정이 부분적으로 실패했습니다. 매핑 규칙 상태가 일관되지 않을 수 있습니다"
            }
            MessageKey::TransformationDeleted => "{vms} VMS의 변환 규칙이 삭제되었습니다.",
            MessageKey::TransformationDeleteFailed => "변환 규칙 삭제 중 오류가 발생했습니다",
            MessageKey::MappingRulesReset => "{vms} VMS의 매핑 규칙이 초기화되었습니다.",
            MessageKey::MappingRulesResetFailed => "매핑 규칙 초기화 중 오류가 발생했습니다",
            MessageKey::ChannelIdUpdated => "{vms} VMS의 채널 ID 변환 규칙이 변경되었습니다.",
            MessageKey::ChannelIdUpdateFailed => "채널 ID 변환 규칙 변경 중 오류가 발생했습니다",
            MessageKey::ConfirmDeleteTransformation => "정말로 이 변환 규칙을 삭제하시겠습니까?",
            MessageKey::ConfirmResetMappingRules => {
                "정말로 {vms} VMS의 모든 매핑 규칙을 초기화하시겠습니까? 이 작업은 되돌릴 수 없으며, 모든 변환 규칙이 삭제됩니다."
            }
            MessageKey::NoTransformations => "등록된 필드 변환 규칙이 없습니다.",
            MessageKey::NoChannelIdTransformation => "채널 ID 변환이 설정되지 않았습니다.",
            MessageKey::ChannelIdSource => "소스 필드: {field}",
            MessageKey::RequiredField => "{field} 항목은 필수입니다.",
            MessageKey::MissingParameter => "{field} 매개변수가 필요합니다.",
            MessageKey::InvalidStringFormat => {
                "문자열 형식에는 %s가 정확히 한 번 포함되어야 합니다."
            }
            MessageKey::SelectVmsType => "VMS 유형을 선택해주세요.",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocaleTable {
    overrides: HashMap<MessageKey, String>,
}

impl LocaleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: HashMap<MessageKey, String>) -> Self {
        Self { overrides }
    }

    pub fn text(&self, key: MessageKey) -> &str {
        self.overrides
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.default_text())
    }

    /// Looks up `key` and substitutes `{name}` placeholders.
    pub fn format(&self, key: MessageKey, vars: &[(&str, &str)]) -> String {
        vars.iter()
            .fold(self.text(key).to_string(), |message, (name, value)| {
                message.replace(&format!("{{{}}}", name), value)
            })
    }

    pub fn with_vms(&self, key: MessageKey, vms: &str) -> String {
        self.format(key, &[("vms", vms)])
    }

    /// Error banner text: the action context followed by the error detail.
    pub fn failure(&self, key: MessageKey, vars: &[(&str, &str)], error: &ConsoleError) -> String {
        let context = self.format(key, vars);
        let detail = error.detail();
        if detail.is_empty() {
            context
        } else {
            format!("{}: {}", context.trim_end_matches('.'), detail)
        }
    }
}
