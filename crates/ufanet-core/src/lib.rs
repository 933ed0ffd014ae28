//! Entity layer between `ufanet-api` and front ends (CLI, home-automation hosts).
//!
//! - **[`Account`]**: per-contract context: one shared [`UfanetClient`],
//!   the setup-time [`AccountEntry`], and the [`CredentialStore`] that
//!   refreshed tokens are written back to. [`AccountRegistry`] owns the
//!   accounts and ties their lifetime to setup/removal.
//!
//! - **Entities** ([`entity`]): [`DoorButton`] opens one intercom;
//!   [`CameraEntity`] serves RTSP stream and JPEG snapshot URLs, refreshing
//!   its streaming token on demand and falling back to stale URLs when
//!   that fails.
//!
//! - **Setup** ([`setup`]): credential validation and re-authentication,
//!   reduced to structured outcomes.
//!
//! [`UfanetClient`]: ufanet_api::UfanetClient

pub mod account;
pub mod config;
pub mod entity;
pub mod error;
pub mod setup;
pub mod store;

pub use account::{Account, AccountEntry, AccountRegistry, IntercomEntry};
pub use config::AccountConfig;
pub use entity::{CameraEntity, DeviceInfo, DoorButton, Entity, EntityKind};
pub use error::CoreError;
pub use setup::SetupError;
pub use store::{CredentialStore, MemoryStore, StoreError, StoreSink, StoredCredentials};
pub use ufanet_api::{Camera, DEFAULT_BASE_URL, Intercom};

/// Integration domain used in device identifiers.
pub const DOMAIN: &str = "ufanet";

/// Manufacturer reported for every device.
pub const MANUFACTURER: &str = "Ufanet";
