// ── Runtime account configuration ──
//
// Describes *how* to reach the backend for one contract. Never touches
// disk: the CLI (or a host) builds an `AccountConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use ufanet_api::transport::DEFAULT_TIMEOUT;
use ufanet_api::{DEFAULT_BASE_URL, TransportConfig, UfanetClient, UfanetClientBuilder};

use crate::store::StoredCredentials;

/// Connection settings for a single contract.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Vendor account identifier.
    pub contract: String,
    /// API root (defaults to the production backend).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Password from the host's own configuration. Takes priority over
    /// the one in the credential record.
    pub password: Option<SecretString>,
}

impl AccountConfig {
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
            password: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Client builder with no credentials attached yet.
    pub fn client_builder(&self) -> UfanetClientBuilder {
        UfanetClient::builder(self.contract.clone())
            .base_url(self.base_url.clone())
            .transport(TransportConfig::default().with_timeout(self.timeout))
    }

    /// Client builder seeded from a persisted credential record.
    pub fn restore(&self, stored: &StoredCredentials) -> UfanetClientBuilder {
        let mut builder = self.client_builder();
        let password = self
            .password
            .clone()
            .or_else(|| stored.password.clone().map(SecretString::from));
        if let Some(password) = password {
            builder = builder.password(password);
        }
        if let Some(ref token) = stored.refresh_token {
            builder = builder.refresh_token(SecretString::from(token.clone()), stored.refresh_exp);
        }
        builder
    }
}
