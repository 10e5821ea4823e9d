//! Unified camera catalog with local search and VMS filtering, per-type synchronization,
//! statistics, raw payload inspection and CSV export.

use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use crate::api::VmsApi;
use crate::error::{Banner, ConsoleError};
use crate::locale::{LocaleTable, MessageKey};
use crate::token::{RequestSlot, RequestTokens};
use crate::types::{Camera, VmsType};

const CSV_HEADERS: [&str; 13] = [
    "id",
    "name",
    "channelID",
    "channelName",
    "ipAddress",
    "port",
    "rtspUrl",
    "isEnabled",
    "status",
    "supportsPTZ",
    "supportsAudio",
    "vms",
    "originalId",
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CameraStats {
    pub total: usize,
    pub by_vms: BTreeMap<String, usize>,
}

impl CameraStats {
    pub fn from_cameras<'a>(cameras: impl IntoIterator<Item = &'a Camera>) -> Self {
        let mut stats = CameraStats::default();
        for camera in cameras {
            stats.total += 1;
            *stats.by_vms.entry(camera.vms.clone()).or_insert(0) += 1;
        }
        stats
    }
}

pub struct CameraCatalog {
    api: Arc<dyn VmsApi>,
    locale: LocaleTable,
    tokens: RequestTokens,
    cameras: Vec<Camera>,
    scope: Option<VmsType>,
    search: String,
    vms_filter: Option<VmsType>,
    syncing: Option<VmsType>,
    banner: Option<Banner>,
}

impl CameraCatalog {
    pub fn new(api: Arc<dyn VmsApi>, locale: LocaleTable) -> Self {
        Self {
            api,
            locale,
            tokens: RequestTokens::new(),
            cameras: Vec::new(),
            scope: None,
            search: String::new(),
            vms_filter: None,
            syncing: None,
            banner: None,
        }
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn syncing(&self) -> Option<&VmsType> {
        self.syncing.as_ref()
    }

    pub fn is_syncing(&self, vms: &VmsType) -> bool {
        self.syncing.as_ref() == Some(vms)
    }

    fn fail(&mut self, key: MessageKey, vars: &[(&str, &str)], error: &ConsoleError) {
        let message = self.locale.failure(key, vars, error);
        tracing::error!("{}", message);
        self.banner = Some(Banner::error(message));
    }

    /// Loads the cameras of one VMS type, or every camera when `vms` is `None`.
    pub async fn refresh(&mut self, vms: Option<&VmsType>) -> Result<(), ConsoleError> {
        self.scope = vms.cloned();
        let token = self.tokens.issue(RequestSlot::Cameras);
        let result = match vms {
            Some(vms) => self.api.list_cameras_by_type(vms).await,
            None => self.api.list_cameras().await,
        };
        let Some(result) = self.tokens.accept(RequestSlot::Cameras, token, result) else {
            return Ok(());
        };
        match result {
            Ok(cameras) => {
                tracing::info!("Loaded {} cameras", cameras.len());
                self.cameras = cameras;
                Ok(())
            }
            Err(e) => {
                self.fail(MessageKey::CamerasFetchFailed, &[], &e);
                Err(e)
            }
        }
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn set_vms_filter(&mut self, vms: Option<VmsType>) {
        self.vms_filter = vms;
    }

    /// Loaded cameras matching the search text and the VMS filter.
    pub fn filtered(&self) -> Vec<&Camera> {
        let query = self.search.trim().to_lowercase();
        self.cameras
            .iter()
            .filter(|camera| camera.matches_search(&query))
            .filter(|camera| match &self.vms_filter {
                Some(vms) => camera.vms == vms.as_str(),
                None => true,
            })
            .collect()
    }

    /// Total and per-VMS counts over every loaded camera, ignoring filters.
    pub fn stats(&self) -> CameraStats {
        CameraStats::from_cameras(&self.cameras)
    }

    /// Asks the server to re-import the cameras of `vms`, then reloads the current scope.
    pub async fn synchronize(&mut self, vms: &VmsType) -> Result<(), ConsoleError> {
        if let Some(current) = &self.syncing {
            let err = ConsoleError::InvalidState(
                self.locale
                    .with_vms(MessageKey::SyncAlreadyInProgress, current.as_str()),
            );
            self.banner = Some(Banner::error(err.detail()));
            return Err(err);
        }

        self.syncing = Some(vms.clone());
        let pending = self
            .locale
            .with_vms(MessageKey::CameraSyncInProgress, vms.as_str());
        tracing::info!("{}", pending);
        self.banner = Some(Banner::info(pending));

        let result = self.api.sync_cameras(vms).await;
        self.syncing = None;

        match result {
            Ok(()) => {
                let message = self
                    .locale
                    .with_vms(MessageKey::CameraSyncCompleted, vms.as_str());
                tracing::info!("{}", message);
                self.banner = Some(Banner::success(message));
                let scope = self.scope.clone();
                if let Err(e) = self.refresh(scope.as_ref()).await {
                    tracing::warn!("Reloading cameras after sync failed: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                self.fail(MessageKey::CameraSyncFailed, &[], &e);
                Err(e)
            }
        }
    }

    /// Raw vendor camera records of `vms`.
    pub async fn raw_cameras(&mut self, vms: &VmsType) -> Result<Vec<Value>, ConsoleError> {
        match self.api.list_raw_cameras_by_type(vms).await {
            Ok(rows) => {
                if rows.is_empty() {
                    self.banner = Some(Banner::info(self.locale.text(MessageKey::NoData)));
                }
                Ok(rows)
            }
            Err(e) => {
                self.fail(MessageKey::RawCamerasFetchFailed, &[], &e);
                Err(e)
            }
        }
    }

    /// Unprocessed JSON documents received from `vms`.
    pub async fn raw_json(&mut self, vms: &VmsType) -> Result<Vec<Value>, ConsoleError> {
        match self.api.list_raw_json_by_type(vms).await {
            Ok(rows) => {
                if rows.is_empty() {
                    self.banner = Some(Banner::info(self.locale.text(MessageKey::NoData)));
                }
                Ok(rows)
            }
            Err(e) => {
                self.fail(MessageKey::RawJsonFetchFailed, &[], &e);
                Err(e)
            }
        }
    }

    /// Writes the filtered cameras as CSV and returns the number of rows written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, ConsoleError> {
        let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
        csv_writer.write_record(CSV_HEADERS)?;

        let cameras = self.filtered();
        for camera in &cameras {
            csv_writer.write_record([
                camera.id.as_str(),
                camera.name.as_str(),
                camera.channel_id.as_str(),
                camera.channel_name.as_str(),
                camera.ip_address.as_str(),
                camera.port.as_str(),
                camera.rtsp_url.as_str(),
                if camera.is_enabled { "true" } else { "false" },
                camera.status.as_str(),
                if camera.supports_ptz { "true" } else { "false" },
                if camera.supports_audio { "true" } else { "false" },
                camera.vms.as_str(),
                camera.original_id.as_str(),
            ])?;
        }
        csv_writer.flush()?;
        tracing::info!("Exported {} cameras to CSV", cameras.len());
        Ok(cameras.len())
    }
}
