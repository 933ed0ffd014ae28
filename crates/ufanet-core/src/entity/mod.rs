// ── Entities ──
//
// Front-end-neutral view of what an account exposes: things with a stable
// id, a name, and a parent device. Hosts map these onto their own
// button/camera abstractions; the CLI prints and drives them directly.

mod button;
mod camera;

pub use button::DoorButton;
pub use camera::CameraEntity;

use serde::Serialize;

/// What kind of entity this is, for hosts that dispatch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Button,
    Camera,
}

/// The device an entity belongs to. Every entity of one account shares
/// the same device, identified by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// `(domain, contract)`.
    pub identifier: (String, String),
    pub name: String,
    pub manufacturer: String,
}

impl DeviceInfo {
    pub fn for_contract(contract: &str) -> Self {
        Self {
            identifier: (crate::DOMAIN.to_owned(), contract.to_owned()),
            name: contract.to_owned(),
            manufacturer: crate::MANUFACTURER.to_owned(),
        }
    }
}

/// A displayable device endpoint.
pub trait Entity {
    fn kind(&self) -> EntityKind;

    /// Stable across restarts; never reused for another entity.
    fn unique_id(&self) -> &str;

    fn name(&self) -> &str;

    fn device_info(&self) -> &DeviceInfo;

    fn icon(&self) -> Option<&str> {
        None
    }
}
