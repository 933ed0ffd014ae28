use std::sync::Arc;

use tracing::{info, warn};
use ufanet_api::UfanetClient;

use super::{DeviceInfo, Entity, EntityKind};
use crate::account::{Account, IntercomEntry};
use crate::error::CoreError;
use crate::store::StoreSink;

/// Momentary "open door" action for one intercom.
#[derive(Debug, Clone)]
pub struct DoorButton {
    unique_id: String,
    name: String,
    intercom_id: i64,
    device: DeviceInfo,
    client: Arc<UfanetClient>,
    sink: StoreSink,
}

impl DoorButton {
    pub fn new(account: &Account, intercom: &IntercomEntry) -> Self {
        Self {
            unique_id: format!("{}_{}_open", account.contract(), intercom.id),
            name: intercom.name.clone(),
            intercom_id: intercom.id,
            device: account.device_info(),
            client: Arc::clone(account.client()),
            sink: account.sink().clone(),
        }
    }

    pub fn intercom_id(&self) -> i64 {
        self.intercom_id
    }

    /// Send the open command. Returns what the backend acknowledged;
    /// a `false` is logged but is not an error.
    pub async fn press(&self) -> Result<bool, CoreError> {
        let opened = self.client.open_intercom(self.intercom_id, &self.sink).await?;
        if opened {
            info!(intercom = self.intercom_id, name = %self.name, "door opened");
        } else {
            warn!(intercom = self.intercom_id, name = %self.name, "door did not report success");
        }
        Ok(opened)
    }
}

impl Entity for DoorButton {
    fn kind(&self) -> EntityKind {
        EntityKind::Button
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

    fn icon(&self) -> Option<&str> {
        Some("mdi:door")
    }
}
