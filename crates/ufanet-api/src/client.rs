// Ufanet cloud HTTP client
//
// Wraps `reqwest::Client` with JWT bearer auth, a single refresh-and-retry
// after a 401, and lenient body decoding. Token lifecycle lives in
// `auth.rs`; endpoint groups (intercoms, cameras) are implemented as
// inherent methods in sibling modules.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{CredentialSink, TokenState};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://dom.ufanet.ru/";

// ── Payload ──────────────────────────────────────────────────────────

/// A successful response body.
///
/// Not every vendor endpoint answers with strict JSON, so bodies that fail
/// to parse are handed back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

// ── Request description ──────────────────────────────────────────────

/// One API call: method, path relative to the base URL, optional JSON body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Value>,
    requires_auth: bool,
    timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            requires_auth: true,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).json(body)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Send without the `Authorization` header (and without 401 retry).
    pub fn without_auth(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Override the client's default timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Token-managed client for one Ufanet account ("contract").
///
/// Holds the access/refresh token pair in memory and obtains or refreshes
/// tokens before each authenticated call. Safe to share behind an `Arc`:
/// token state sits behind a mutex that is never held across an await.
pub struct UfanetClient {
    pub(crate) http: reqwest::Client,
    base_url: Url,
    pub(crate) contract: String,
    pub(crate) password: Option<SecretString>,
    timeout: Duration,
    tokens: Mutex<TokenState>,
}

impl std::fmt::Debug for UfanetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UfanetClient")
            .field("base_url", &self.base_url.as_str())
            .field("contract", &self.contract)
            .field("has_password", &self.password.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`UfanetClient`].
#[derive(Debug)]
pub struct UfanetClientBuilder {
    contract: String,
    password: Option<SecretString>,
    refresh_token: Option<SecretString>,
    refresh_exp: Option<i64>,
    base_url: String,
    transport: TransportConfig,
    http: Option<reqwest::Client>,
}

impl UfanetClientBuilder {
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            password: None,
            refresh_token: None,
            refresh_exp: None,
            base_url: DEFAULT_BASE_URL.into(),
            transport: TransportConfig::default(),
            http: None,
        }
    }

    /// Password used for full login when no refresh token is usable.
    pub fn password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Refresh token restored from storage.
    pub fn refresh_token(mut self, token: SecretString, exp: Option<i64>) -> Self {
        self.refresh_token = Some(token);
        self.refresh_exp = exp;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Use a pre-built `reqwest::Client` instead of building one from the
    /// transport config.
    pub fn http(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<UfanetClient, Error> {
        let http = match self.http {
            Some(http) => http,
            None => self.transport.build_client()?,
        };

        Ok(UfanetClient {
            http,
            base_url: normalize_base_url(&self.base_url)?,
            contract: self.contract,
            password: self.password,
            timeout: self.transport.timeout,
            tokens: Mutex::new(TokenState::restored(self.refresh_token, self.refresh_exp)),
        })
    }
}

/// Parse the API root, forcing a trailing slash so relative joins keep it.
fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl UfanetClient {
    pub fn builder(contract: impl Into<String>) -> UfanetClientBuilder {
        UfanetClientBuilder::new(contract)
    }

    /// The account identifier this client acts for.
    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn tokens(&self) -> MutexGuard<'_, TokenState> {
        self.tokens.lock().expect("token lock poisoned")
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    fn bearer_header(&self) -> Result<Option<HeaderValue>, Error> {
        let Some(token) = self.tokens().access.clone() else {
            return Ok(None);
        };
        let mut value = HeaderValue::from_str(&format!("JWT {}", token.expose_secret()))
            .map_err(|e| Error::auth(format!("invalid access token header value: {e}")))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Issue one HTTP call and read the whole body.
    async fn send(&self, req: &ApiRequest, url: &Url) -> Result<(StatusCode, String), Error> {
        let mut builder = self
            .http
            .request(req.method.clone(), url.clone())
            .timeout(req.timeout.unwrap_or(self.timeout));

        if let Some(ref body) = req.body {
            builder = builder.json(body);
        }
        if req.requires_auth {
            if let Some(value) = self.bearer_header()? {
                builder = builder.header(AUTHORIZATION, value);
            }
        }

        let resp = builder.send().await.map_err(Error::from_transport)?;
        let status = resp.status();
        let text = resp.text().await.map_err(Error::from_transport)?;
        trace!(%status, len = text.len(), "response received");
        Ok((status, text))
    }

    /// Send a request, refreshing the access token and retrying exactly
    /// once if an authenticated call comes back 401.
    ///
    /// Any status >= 400 on the final attempt becomes [`Error::Api`].
    pub async fn request(
        &self,
        req: &ApiRequest,
        sink: &dyn CredentialSink,
    ) -> Result<Payload, Error> {
        let url = self.url(&req.path)?;
        debug!("{} {}", req.method, url);

        let (status, text) = self.send(req, &url).await?;

        if status == StatusCode::UNAUTHORIZED && req.requires_auth {
            debug!(path = %req.path, "access token rejected, refreshing and retrying once");
            self.refresh_access_token(sink).await?;
            let (status, text) = self.send(req, &url).await?;
            return into_payload(status, text);
        }

        into_payload(status, text)
    }

    /// Unauthenticated token exchange (login / refresh).
    ///
    /// The backend rejects bad passwords and stale refresh tokens with
    /// 400/401/403; those surface as authentication errors so callers can
    /// fall back to the next credential.
    pub(crate) async fn exchange(&self, req: &ApiRequest) -> Result<Payload, Error> {
        let url = self.url(&req.path)?;
        debug!("{} {}", req.method, url);

        let (status, text) = self.send(req, &url).await?;
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(Error::auth(format!(
                "HTTP {status}: {}",
                crate::error::preview(&text)
            )));
        }
        into_payload(status, text)
    }

    /// Make sure a usable access token is held, then send `req`. If the
    /// call still ends in an authentication error, log in with the
    /// password and send it one more time.
    pub(crate) async fn request_with_relogin(
        &self,
        req: &ApiRequest,
        sink: &dyn CredentialSink,
    ) -> Result<Payload, Error> {
        self.ensure_valid_access(sink).await?;
        match self.request(req, sink).await {
            Err(err) if err.is_auth() => {
                debug!(path = %req.path, error = %err, "request unauthorized, logging in again");
                self.login(sink).await?;
                self.request(req, sink).await
            }
            other => other,
        }
    }
}

fn into_payload(status: StatusCode, text: String) -> Result<Payload, Error> {
    if status.as_u16() >= 400 {
        return Err(Error::Api {
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(Payload::parse(text))
}
