// Token lifecycle
//
// Access tokens are short-lived JWTs held only in memory. Refresh tokens
// outlive the process: whenever a login or refresh exchange hands out a new
// one, the caller's `CredentialSink` is told so it can persist it.
//
// Fallback order before each authenticated call:
//   cached access token -> refresh exchange -> password login -> give up.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{ApiRequest, UfanetClient};
use crate::error::Error;
use crate::jwt;

const LOGIN_PATH: &str = "api/v1/auth/auth_by_contract/";
const REFRESH_PATH: &str = "api/v1/auth/refresh/";

// ── CredentialSink ───────────────────────────────────────────────────

/// Receives every refresh token the backend issues.
///
/// Implementations persist the token so a later process can resume
/// without the password. Called synchronously after the client's own
/// state is updated.
pub trait CredentialSink: Send + Sync {
    fn tokens_refreshed(&self, refresh_token: &SecretString, refresh_exp: Option<i64>);
}

impl<F> CredentialSink for F
where
    F: Fn(&SecretString, Option<i64>) + Send + Sync,
{
    fn tokens_refreshed(&self, refresh_token: &SecretString, refresh_exp: Option<i64>) {
        (self)(refresh_token, refresh_exp);
    }
}

/// Sink that discards refreshed tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl CredentialSink for NoopSink {
    fn tokens_refreshed(&self, _refresh_token: &SecretString, _refresh_exp: Option<i64>) {}
}

// ── Token state ──────────────────────────────────────────────────────

/// In-memory token pair. At most one access token is held at a time.
#[derive(Debug, Default)]
pub(crate) struct TokenState {
    pub(crate) access: Option<SecretString>,
    pub(crate) access_exp: Option<i64>,
    pub(crate) refresh: Option<SecretString>,
    pub(crate) refresh_exp: Option<i64>,
}

impl TokenState {
    pub(crate) fn restored(refresh: Option<SecretString>, refresh_exp: Option<i64>) -> Self {
        Self {
            refresh,
            refresh_exp,
            ..Self::default()
        }
    }

    fn has_fresh_access(&self) -> bool {
        self.access.is_some() && !jwt::is_expiring(self.access_exp)
    }

    /// A refresh token worth trying: present, and either of unknown expiry
    /// or not yet expiring.
    fn usable_refresh(&self) -> Option<SecretString> {
        let token = self.refresh.as_ref()?;
        (self.refresh_exp.is_none() || !jwt::is_expiring(self.refresh_exp)).then(|| token.clone())
    }
}

/// Tokens handed out by a login or refresh exchange.
struct TokenGrant {
    access: SecretString,
    refresh: SecretString,
    refresh_exp: Option<i64>,
}

impl TokenGrant {
    /// Read `{access, refresh, exp}`. Both tokens must be non-empty strings.
    fn from_json(value: &Value) -> Option<Self> {
        let non_empty = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(|s| SecretString::from(s.to_owned()))
        };
        Some(Self {
            access: non_empty("access")?,
            refresh: non_empty("refresh")?,
            refresh_exp: value.get("exp").and_then(jwt::epoch_seconds),
        })
    }
}

// ── Auth flows ───────────────────────────────────────────────────────

impl UfanetClient {
    /// Guarantee a usable access token before an authenticated call.
    ///
    /// No network traffic when a non-expiring access token is cached.
    /// Otherwise tries the refresh token, then the password. Fails with
    /// [`Error::Authentication`] when neither path is available, meaning
    /// the password has to be entered again.
    pub async fn ensure_valid_access(&self, sink: &dyn CredentialSink) -> Result<(), Error> {
        let refresh = {
            let tokens = self.tokens();
            if tokens.has_fresh_access() {
                return Ok(());
            }
            tokens.usable_refresh()
        };

        if let Some(refresh) = refresh {
            match self.refresh_with(&refresh, sink).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_auth() => {
                    debug!(error = %err, "refresh token rejected, falling back to password");
                }
                Err(err) => return Err(err),
            }
        }

        if self.password.is_some() {
            return self.login(sink).await;
        }

        Err(Error::auth(
            "No valid token available. Please reconfigure the integration.",
        ))
    }

    /// Full login with contract + password.
    pub(crate) async fn login(&self, sink: &dyn CredentialSink) -> Result<(), Error> {
        let Some(ref password) = self.password else {
            return Err(Error::auth(
                "Refresh token expired. Please reconfigure the integration.",
            ));
        };

        debug!(contract = %self.contract, "logging in with contract credentials");
        let body = json!({
            "contract": self.contract,
            "password": password.expose_secret(),
        });
        let payload = self
            .exchange(&ApiRequest::post(LOGIN_PATH, body).without_auth())
            .await?;

        let grant = payload
            .as_json()
            .and_then(|v| v.get("token"))
            .and_then(TokenGrant::from_json)
            .ok_or_else(|| Error::auth("No token in response"))?;

        self.install(grant, sink);
        debug!("login successful");
        Ok(())
    }

    /// Exchange the held refresh token for a new token pair.
    pub(crate) async fn refresh_access_token(&self, sink: &dyn CredentialSink) -> Result<(), Error> {
        let refresh = self
            .tokens()
            .refresh
            .clone()
            .ok_or_else(|| Error::auth("No refresh token available"))?;
        self.refresh_with(&refresh, sink).await
    }

    async fn refresh_with(&self, refresh: &SecretString, sink: &dyn CredentialSink) -> Result<(), Error> {
        debug!("refreshing access token");
        let body = json!({ "token": refresh.expose_secret() });
        let payload = self
            .exchange(&ApiRequest::post(REFRESH_PATH, body).without_auth())
            .await?;

        let value = match payload.as_json() {
            Some(value) if value.is_object() => value,
            _ => return Err(Error::auth("Invalid refresh response")),
        };
        let grant = TokenGrant::from_json(value).ok_or_else(|| Error::auth("Refresh failed"))?;

        self.install(grant, sink);
        debug!("access token refreshed");
        Ok(())
    }

    /// Replace all token state, then report the new refresh token.
    fn install(&self, grant: TokenGrant, sink: &dyn CredentialSink) {
        let access_exp = jwt::extract_exp(grant.access.expose_secret());
        {
            let mut tokens = self.tokens();
            tokens.access = Some(grant.access);
            tokens.access_exp = access_exp;
            tokens.refresh = Some(grant.refresh.clone());
            tokens.refresh_exp = grant.refresh_exp;
        }
        debug!(?access_exp, refresh_exp = ?grant.refresh_exp, "token state updated");
        sink.tokens_refreshed(&grant.refresh, grant.refresh_exp);
    }
}
