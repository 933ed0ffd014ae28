use std::sync::Arc;

use tracing::{debug, warn};
use ufanet_api::{Camera, UfanetClient, jwt};

use super::{DeviceInfo, Entity, EntityKind};
use crate::account::Account;
use crate::store::StoreSink;

/// One camera feed. Every camera offers a live stream.
///
/// Holds its own copy of the camera record. Before handing out a URL the
/// streaming token is checked and, if expiring, the record is replaced
/// from a fresh listing. A failed refresh keeps the stale record.
#[derive(Debug, Clone)]
pub struct CameraEntity {
    unique_id: String,
    name: String,
    device: DeviceInfo,
    client: Arc<UfanetClient>,
    sink: StoreSink,
    camera: Camera,
    token_exp: Option<i64>,
}

impl CameraEntity {
    pub fn new(account: &Account, camera: Camera) -> Self {
        Self {
            unique_id: format!("{}_{}", account.contract(), camera.number),
            name: camera.display_name().to_owned(),
            device: account.device_info(),
            client: Arc::clone(account.client()),
            sink: account.sink().clone(),
            token_exp: camera.token_exp(),
            camera,
        }
    }

    /// The currently cached camera record.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn number(&self) -> &str {
        &self.camera.number
    }

    /// RTSP URL, refreshing the streaming token first if it is expiring.
    pub async fn stream_source(&mut self) -> String {
        self.refresh_if_expiring().await;
        self.camera.stream_url()
    }

    /// JPEG snapshot, or `None` when the camera has no screenshot server
    /// or the fetch fails for any reason.
    pub async fn camera_image(&mut self) -> Option<Vec<u8>> {
        self.camera.snapshot_url()?;
        self.refresh_if_expiring().await;
        let url = self.camera.snapshot_url()?;

        match self.client.fetch_snapshot(&url).await {
            Ok(image) => image,
            Err(e) => {
                debug!(camera = %self.camera.number, error = %e, "snapshot fetch failed");
                None
            }
        }
    }

    async fn refresh_if_expiring(&mut self) {
        if !jwt::is_expiring(self.token_exp) {
            return;
        }
        debug!(camera = %self.camera.number, "streaming token expiring, refreshing");

        let cameras = match self.client.list_cameras(&self.sink).await {
            Ok(cameras) => cameras,
            Err(e) => {
                warn!(camera = %self.camera.number, error = %e, "camera refresh failed, keeping stale URL");
                return;
            }
        };

        match cameras.into_iter().find(|c| c.number == self.camera.number) {
            Some(fresh) => {
                self.token_exp = fresh.token_exp();
                self.camera = fresh;
            }
            None => {
                warn!(camera = %self.camera.number, "camera missing from refreshed list, keeping stale URL");
            }
        }
    }
}

impl Entity for CameraEntity {
    fn kind(&self) -> EntityKind {
        EntityKind::Camera
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.device
    }
}
