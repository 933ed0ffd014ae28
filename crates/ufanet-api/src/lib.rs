// ufanet-api: Async Rust client for the Ufanet intercom/camera cloud API

pub mod auth;
pub mod client;
pub mod error;
pub mod jwt;
pub mod models;
pub mod transport;

mod cameras;
mod intercoms;

pub use auth::{CredentialSink, NoopSink};
pub use client::{ApiRequest, DEFAULT_BASE_URL, Payload, UfanetClient, UfanetClientBuilder};
pub use error::{Error, ErrorKind};
pub use models::{Camera, Intercom};
pub use transport::TransportConfig;
