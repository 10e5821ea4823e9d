//! In-memory [`VmsApi`] used by controller tests. Removing a transformation shifts later
//! ones down and adding appends, matching the server.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, Once};

use crate::api::VmsApi;
use crate::error::ConsoleError;
use crate::types::{
    Camera, FieldAnalysis, MappingRuleSet, Transformation, TransformationType, VmsConfig,
    VmsConfigUpdate, VmsType,
};

static INIT: Once = Once::new();

pub(crate) fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    });
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub types: Vec<VmsType>,
    pub configs: Vec<VmsConfig>,
    pub rules: HashMap<VmsType, MappingRuleSet>,
    pub analyses: HashMap<VmsType, FieldAnalysis>,
    pub unified: FieldAnalysis,
    pub cameras: Vec<Camera>,
    pub raw: HashMap<VmsType, Vec<Value>>,
    pub calls: Vec<String>,
    /// Operations that answer with a server error.
    pub failing: HashSet<&'static str>,
    /// Number of upcoming `add_transformation` calls that fail.
    pub add_failures: usize,
}

#[derive(Debug, Default)]
pub(crate) struct FakeVmsApi {
    pub state: Mutex<FakeState>,
}

fn server_error(message: &str) -> ConsoleError {
    ConsoleError::Api {
        status: 500,
        message: message.to_string(),
    }
}

impl FakeVmsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(self, types: &[&str]) -> Self {
        self.state.lock().unwrap().types = types.iter().map(|t| VmsType::from(*t)).collect();
        self
    }

    pub fn with_rules(self, vms: &str, rules: MappingRuleSet) -> Self {
        self.state.lock().unwrap().rules.insert(vms.into(), rules);
        self
    }

    pub fn with_analysis(self, vms: &str, fields: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .analyses
            .insert(vms.into(), FieldAnalysis { fields });
        self
    }

    pub fn with_unified(self, fields: Value) -> Self {
        self.state.lock().unwrap().unified = FieldAnalysis { fields };
        self
    }

    pub fn with_configs(self, configs: Vec<VmsConfig>) -> Self {
        self.state.lock().unwrap().configs = configs;
        self
    }

    pub fn with_cameras(self, cameras: Vec<Camera>) -> Self {
        self.state.lock().unwrap().cameras = cameras;
        self
    }

    pub fn with_raw(self, vms: &str, rows: Vec<Value>) -> Self {
        self.state.lock().unwrap().raw.insert(vms.into(), rows);
        self
    }

    pub fn fail(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    pub fn fail_next_adds(&self, count: usize) {
        self.state.lock().unwrap().add_failures = count;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn rules(&self, vms: &str) -> MappingRuleSet {
        self.state
            .lock()
            .unwrap()
            .rules
            .get(&VmsType::from(vms))
            .cloned()
            .unwrap_or_default()
    }

    fn begin(&self, operation: &'static str) -> Result<std::sync::MutexGuard<'_, FakeState>, ConsoleError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(operation.to_string());
        if state.failing.contains(operation) {
            return Err(server_error(&format!("{} failed", operation)));
        }
        Ok(state)
    }
}

#[async_trait]
impl VmsApi for FakeVmsApi {
    async fn list_vms_types(&self) -> Result<Vec<VmsType>, ConsoleError> {
        Ok(self.begin("list_vms_types")?.types.clone())
    }

    async fn list_vms_configs(&self) -> Result<Vec<VmsConfig>, ConsoleError> {
        Ok(self.begin("list_vms_configs")?.configs.clone())
    }

    async fn get_vms_config(&self, vms: &VmsType) -> Result<VmsConfig, ConsoleError> {
        let state = self.begin("get_vms_config")?;
        state
            .configs
            .iter()
            .find(|c| &c.vms_type == vms)
            .cloned()
            .ok_or_else(|| server_error("VMS 설정을 찾을 수 없습니다."))
    }

    async fn update_vms_config(
        &self,
        vms: &VmsType,
        update: &VmsConfigUpdate,
    ) -> Result<(), ConsoleError> {
        let mut state = self.begin("update_vms_config")?;
        let config = state
            .configs
            .iter_mut()
            .find(|c| &c.vms_type == vms)
            .ok_or_else(|| server_error("VMS 설정을 찾을 수 없습니다."))?;
        config.username = update.username.clone();
        config.ip = update.ip.clone();
        config.port = update.port.clone();
        config.additional_info = update.additional_info.clone();
        Ok(())
    }

    async fn set_vms_active(&self, vms: &VmsType, active: bool) -> Result<(), ConsoleError> {
        let mut state = self.begin("set_vms_active")?;
        if let Some(config) = state.configs.iter_mut().find(|c| &c.vms_type == vms) {
            config.is_active = active;
        }
        Ok(())
    }

    async fn sync_vms(&self, _vms: &VmsType) -> Result<(), ConsoleError> {
        self.begin("sync_vms").map(|_| ())
    }

    async fn sync_all_vms(&self) -> Result<(), ConsoleError> {
        self.begin("sync_all_vms").map(|_| ())
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>, ConsoleError> {
        Ok(self.begin("list_cameras")?.cameras.clone())
    }

    async fn list_cameras_by_type(&self, vms: &VmsType) -> Result<Vec<Camera>, ConsoleError> {
        let state = self.begin("list_cameras_by_type")?;
        Ok(state
            .cameras
            .iter()
            .filter(|c| c.vms == vms.as_str())
            .cloned()
            .collect())
    }

    async fn sync_cameras(&self, _vms: &VmsType) -> Result<(), ConsoleError> {
        self.begin("sync_cameras").map(|_| ())
    }

    async fn list_raw_cameras_by_type(&self, vms: &VmsType) -> Result<Vec<Value>, ConsoleError> {
        let state = self.begin("list_raw_cameras_by_type")?;
        Ok(state.raw.get(vms).cloned().unwrap_or_default())
    }

    async fn list_raw_json_by_type(&self, vms: &VmsType) -> Result<Vec<Value>, ConsoleError> {
        let state = self.begin("list_raw_json_by_type")?;
        Ok(state.raw.get(vms).cloned().unwrap_or_default())
    }

    async fn get_mapping_rules(&self, vms: &VmsType) -> Result<MappingRuleSet, ConsoleError> {
        let state = self.begin("get_mapping_rules")?;
        Ok(state.rules.get(vms).cloned().unwrap_or_default())
    }

    async fn add_transformation(
        &self,
        vms: &VmsType,
        transformation: &Transformation,
    ) -> Result<(), ConsoleError> {
        let mut state = self.begin("add_transformation")?;
        if state.add_failures > 0 {
            state.add_failures -= 1;
            return Err(server_error("규칙을 추가할 수 없습니다."));
        }
        state
            .rules
            .entry(vms.clone())
            .or_default()
            .transformations
            .push(transformation.clone());
        Ok(())
    }

    async fn update_channel_id_transformation(
        &self,
        vms: &VmsType,
        source_field: &str,
    ) -> Result<(), ConsoleError> {
        let mut state = self.begin("update_channel_id_transformation")?;
        state.rules.entry(vms.clone()).or_default().channel_id_transformation = Some(
            Transformation::new(source_field, "channel_ID", TransformationType::DefaultConversion),
        );
        Ok(())
    }

    async fn remove_transformation(
        &self,
        vms: &VmsType,
        index: usize,
    ) -> Result<(), ConsoleError> {
        let mut state = self.begin("remove_transformation")?;
        let rules = state.rules.entry(vms.clone()).or_default();
        if index >= rules.transformations.len() {
            return Err(ConsoleError::Api {
                status: 400,
                message: "잘못된 인덱스입니다.".to_string(),
            });
        }
        rules.transformations.remove(index);
        Ok(())
    }

    async fn reset_mapping_rules(&self, vms: &VmsType) -> Result<(), ConsoleError> {
        let mut state = self.begin("reset_mapping_rules")?;
        state.rules.insert(vms.clone(), MappingRuleSet::default());
        Ok(())
    }

    async fn analyze_field_structure(&self, vms: &VmsType) -> Result<FieldAnalysis, ConsoleError> {
        let state = self.begin("analyze_field_structure")?;
        Ok(state.analyses.get(vms).cloned().unwrap_or_default())
    }

    async fn analyze_unified_structure(&self) -> Result<FieldAnalysis, ConsoleError> {
        Ok(self.begin("analyze_unified_structure")?.unified.clone())
    }
}
