mod client;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ConsoleError;
use crate::types::{
    Camera, FieldAnalysis, MappingRuleSet, Transformation, VmsConfig, VmsConfigUpdate, VmsType,
};

pub use client::{error_message, ApiClient};

/// The VMS integration API consumed by the console.
///
/// [`ApiClient`] is the HTTP implementation; controllers only see this trait.
#[async_trait]
pub trait VmsApi: Send + Sync {
    async fn list_vms_types(&self) -> Result<Vec<VmsType>, ConsoleError>;

    async fn list_vms_configs(&self) -> Result<Vec<VmsConfig>, ConsoleError>;

    async fn get_vms_config(&self, vms: &VmsType) -> Result<VmsConfig, ConsoleError>;

    async fn update_vms_config(
        &self,
        vms: &VmsType,
        update: &VmsConfigUpdate,
    ) -> Result<(), ConsoleError>;

    async fn set_vms_active(&self, vms: &VmsType, active: bool) -> Result<(), ConsoleError>;

    async fn sync_vms(&self, vms: &VmsType) -> Result<(), ConsoleError>;

    async fn sync_all_vms(&self) -> Result<(), ConsoleError>;

    async fn list_cameras(&self) -> Result<Vec<Camera>, ConsoleError>;

    async fn list_cameras_by_type(&self, vms: &VmsType) -> Result<Vec<Camera>, ConsoleError>;

    async fn sync_cameras(&self, vms: &VmsType) -> Result<(), ConsoleError>;

    async fn list_raw_cameras_by_type(&self, vms: &VmsType) -> Result<Vec<Value>, ConsoleError>;

    async fn list_raw_json_by_type(&self, vms: &VmsType) -> Result<Vec<Value>, ConsoleError>;

    async fn get_mapping_rules(&self, vms: &VmsType) -> Result<MappingRuleSet, ConsoleError>;

    async fn add_transformation(
        &self,
        vms: &VmsType,
        transformation: &Transformation,
    ) -> Result<(), ConsoleError>;

    async fn update_channel_id_transformation(
        &self,
        vms: &VmsType,
        source_field: &str,
    ) -> Result<(), ConsoleError>;

    async fn remove_transformation(&self, vms: &VmsType, index: usize)
        -> Result<(), ConsoleError>;

    async fn reset_mapping_rules(&self, vms: &VmsType) -> Result<(), ConsoleError>;

    async fn analyze_field_structure(&self, vms: &VmsType) -> Result<FieldAnalysis, ConsoleError>;

    async fn analyze_unified_structure(&self) -> Result<FieldAnalysis, ConsoleError>;
}
