//! VMS connection directory: types, stored connection configs, activation and server-side
//! synchronization.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::api::VmsApi;
use crate::error::{Banner, ConsoleError};
use crate::locale::{LocaleTable, MessageKey};
use crate::token::{RequestSlot, RequestTokens};
use crate::types::{VmsConfig, VmsConfigUpdate, VmsType};

/// What a synchronization runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncTarget {
    All,
    Vms(VmsType),
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncTarget::All => f.write_str("all"),
            SyncTarget::Vms(vms) => write!(f, "{}", vms),
        }
    }
}

/// Synchronizations that have started and not yet finished.
#[derive(Debug, Default)]
pub struct SyncTracker {
    in_flight: HashSet<SyncTarget>,
}

impl SyncTracker {
    /// A per-type target is busy while it or a sync of everything runs; `All` is busy
    /// while anything runs.
    pub fn is_syncing(&self, target: &SyncTarget) -> bool {
        match target {
            SyncTarget::All => !self.in_flight.is_empty(),
            SyncTarget::Vms(_) => {
                self.in_flight.contains(target) || self.in_flight.contains(&SyncTarget::All)
            }
        }
    }

    pub fn start(&mut self, target: SyncTarget) -> bool {
        if self.is_syncing(&target) {
            return false;
        }
        self.in_flight.insert(target)
    }

    pub fn finish(&mut self, target: &SyncTarget) {
        self.in_flight.remove(target);
    }
}

fn validate_port(port: &str) -> bool {
    matches!(port.trim().parse::<u16>(), Ok(p) if p > 0)
}

pub struct VmsDirectory {
    api: Arc<dyn VmsApi>,
    locale: LocaleTable,
    tokens: RequestTokens,
    types: Vec<VmsType>,
    configs: Vec<VmsConfig>,
    syncs: SyncTracker,
    banner: Option<Banner>,
}

impl VmsDirectory {
    pub fn new(api: Arc<dyn VmsApi>, locale: LocaleTable) -> Self {
        Self {
            api,
            locale,
            tokens: RequestTokens::new(),
            types: Vec::new(),
            configs: Vec::new(),
            syncs: SyncTracker::default(),
            banner: None,
        }
    }

    pub fn types(&self) -> &[VmsType] {
        &self.types
    }

    pub fn configs(&self) -> &[VmsConfig] {
        &self.configs
    }

    pub fn config(&self, vms: &VmsType) -> Option<&VmsConfig> {
        self.configs.iter().find(|c| &c.vms_type == vms)
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn is_syncing(&self, target: &SyncTarget) -> bool {
        self.syncs.is_syncing(target)
    }

    fn fail(&mut self, key: MessageKey, vars: &[(&str, &str)], error: &ConsoleError) {
        let message = self.locale.failure(key, vars, error);
        tracing::error!("{}", message);
        self.banner = Some(Banner::error(message));
    }

    fn succeed(&mut self, message: String) {
        tracing::info!("{}", message);
        self.banner = Some(Banner::success(message));
    }

    /// Fetches the type list and stored configs concurrently. Each response is applied on
    /// its own; the first failure is returned.
    pub async fn refresh(&mut self) -> Result<(), ConsoleError> {
        let types_token = self.tokens.issue(RequestSlot::VmsTypes);
        let configs_token = self.tokens.issue(RequestSlot::VmsConfigs);
        let (types, configs) =
            tokio::join!(self.api.list_vms_types(), self.api.list_vms_configs());
        let mut first_error = None;

        if let Some(types) = self.tokens.accept(RequestSlot::VmsTypes, types_token, types) {
            match types {
                Ok(types) => self.types = types,
                Err(e) => {
                    self.fail(MessageKey::VmsTypesFetchFailed, &[], &e);
                    first_error = Some(e);
                }
            }
        }
        if let Some(configs) = self
            .tokens
            .accept(RequestSlot::VmsConfigs, configs_token, configs)
        {
            match configs {
                Ok(configs) => self.configs = configs,
                Err(e) => {
                    self.fail(MessageKey::VmsDataFetchFailed, &[], &e);
                    first_error.get_or_insert(e);
                }
            }
        }
        tracing::debug!(
            "Loaded {} VMS types and {} configs",
            self.types.len(),
            self.configs.len()
        );
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Fetches one stored config without touching the cached list.
    pub async fn fetch_config(&mut self, vms: &VmsType) -> Result<VmsConfig, ConsoleError> {
        self.api.get_vms_config(vms).await.map_err(|e| {
            self.fail(MessageKey::VmsDataFetchFailed, &[], &e);
            e
        })
    }

    pub async fn update_config(
        &mut self,
        vms: &VmsType,
        update: &VmsConfigUpdate,
    ) -> Result<(), ConsoleError> {
        let required = |field: &str| {
            ConsoleError::Validation(
                self.locale
                    .format(MessageKey::RequiredField, &[("field", field)]),
            )
        };
        let invalid = if update.ip.trim().is_empty() {
            Some(required("IP"))
        } else if update.port.trim().is_empty() {
            Some(required("포트"))
        } else if !validate_port(&update.port) {
            Some(ConsoleError::Validation(format!(
                "포트는 1-65535 범위의 숫자여야 합니다: {}",
                update.port
            )))
        } else {
            None
        };
        if let Some(err) = invalid {
            self.banner = Some(Banner::error(err.detail()));
            return Err(err);
        }

        tracing::info!("Updating connection config of {}", vms);
        match self.api.update_vms_config(vms, update).await {
            Ok(()) => {
                self.succeed(self.locale.with_vms(MessageKey::VmsConfigUpdated, vms.as_str()));
                if let Err(e) = self.refresh().await {
                    tracing::warn!("Reloading VMS configs failed: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                self.fail(MessageKey::VmsConfigUpdateFailed, &[], &e);
                Err(e)
            }
        }
    }

    pub async fn set_active(&mut self, vms: &VmsType, active: bool) -> Result<(), ConsoleError> {
        tracing::info!("Setting {} active={}", vms, active);
        match self.api.set_vms_active(vms, active).await {
            Ok(()) => {
                if let Some(config) = self.configs.iter_mut().find(|c| &c.vms_type == vms) {
                    config.is_active = active;
                }
                let key = if active {
                    MessageKey::VmsActivated
                } else {
                    MessageKey::VmsDeactivated
                };
                self.succeed(self.locale.with_vms(key, vms.as_str()));
                Ok(())
            }
            Err(e) => {
                self.fail(MessageKey::VmsActiveUpdateFailed, &[], &e);
                Err(e)
            }
        }
    }

    /// Flips the active flag of a loaded config and returns the new value.
    pub async fn toggle_active(&mut self, vms: &VmsType) -> Result<bool, ConsoleError> {
        let current = match self.config(vms) {
            Some(config) => config.is_active,
            None => {
                return Err(ConsoleError::InvalidState(format!(
                    "no stored config for VMS type {}",
                    vms
                )))
            }
        };
        self.set_active(vms, !current).await?;
        Ok(!current)
    }

    /// Marks `target` as syncing and shows the in-progress banner. A target that is already
    /// syncing is rejected.
    pub fn begin_sync(&mut self, target: SyncTarget) -> Result<SyncTarget, ConsoleError> {
        let label = target.to_string();
        if !self.syncs.start(target.clone()) {
            let err = ConsoleError::InvalidState(
                self.locale
                    .with_vms(MessageKey::SyncAlreadyInProgress, &label),
            );
            self.banner = Some(Banner::error(err.detail()));
            return Err(err);
        }
        let message = match &target {
            SyncTarget::All => self.locale.text(MessageKey::AllVmsSyncInProgress).to_string(),
            SyncTarget::Vms(vms) => self.locale.with_vms(MessageKey::VmsSyncInProgress, vms.as_str()),
        };
        tracing::info!("{}", message);
        self.banner = Some(Banner::info(message));
        Ok(target)
    }

    pub fn finish_sync(
        &mut self,
        target: &SyncTarget,
        result: Result<(), ConsoleError>,
    ) -> Result<(), ConsoleError> {
        self.syncs.finish(target);
        match (target, result) {
            (SyncTarget::All, Ok(())) => {
                self.succeed(self.locale.text(MessageKey::AllVmsSyncCompleted).to_string());
                Ok(())
            }
            (SyncTarget::Vms(vms), Ok(())) => {
                self.succeed(self.locale.with_vms(MessageKey::VmsSyncCompleted, vms.as_str()));
                Ok(())
            }
            (SyncTarget::All, Err(e)) => {
                self.fail(MessageKey::AllVmsSyncFailed, &[], &e);
                Err(e)
            }
            (SyncTarget::Vms(vms), Err(e)) => {
                self.fail(MessageKey::VmsSyncFailed, &[("vms", vms.as_str())], &e);
                Err(e)
            }
        }
    }

    pub async fn synchronize(&mut self, vms: &VmsType) -> Result<(), ConsoleError> {
        let target = self.begin_sync(SyncTarget::Vms(vms.clone()))?;
        let result = self.api.sync_vms(vms).await;
        self.finish_sync(&target, result)?;
        if let Err(e) = self.refresh().await {
            tracing::warn!("Reloading VMS configs after sync failed: {}", e);
        }
        Ok(())
    }

    pub async fn synchronize_all(&mut self) -> Result<(), ConsoleError> {
        let target = self.begin_sync(SyncTarget::All)?;
        let result = self.api.sync_all_vms().await;
        self.finish_sync(&target, result)?;
        if let Err(e) = self.refresh().await {
            tracing::warn!("Reloading VMS configs after sync failed: {}", e);
        }
        Ok(())
    }
}
