use thiserror::Error;

/// Top-level error type for the `ufanet-api` crate.
///
/// Every variant falls into one of two [`ErrorKind`]s: authentication
/// (no usable credential path, the account must be reconfigured) or a
/// generic API failure (non-2xx response or transport fault).
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// No token could be obtained, or the backend rejected the credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── API ─────────────────────────────────────────────────────────
    /// The backend answered with HTTP status >= 400.
    #[error("API error (HTTP {status}): {}", preview(.body))]
    Api { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Coarse classification used by callers to pick a recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reconfiguration (re-entering the password) is required.
    Authentication,
    /// Anything else: bad status, transport fault, malformed URL.
    Api,
}

impl Error {
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Remap a lower-level transport failure. A 401 carried by the
    /// transport error is an authentication failure; everything else
    /// stays a transport (generic API) error.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            Self::auth(err.to_string())
        } else {
            Self::Transport(err)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Api { .. } | Self::Transport(_) | Self::InvalidUrl(_) => ErrorKind::Api,
        }
    }

    /// Returns `true` if re-entering the password might resolve this error.
    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    /// Returns `true` if the request ran out of its time budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Returns `true` if the connection could not be established.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }

    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_are_not_auth() {
        let err = Error::Api {
            status: 401,
            body: "nope".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(401));
        assert!(!err.is_auth());
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "ошибка".repeat(100);
        assert_eq!(preview(&body).chars().count(), 200);
    }
}
