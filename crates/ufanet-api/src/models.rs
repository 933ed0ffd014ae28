// Vendor response shapes and the read-only records built from them.
//
// Raw records are deserialized one at a time so a single malformed entry
// is dropped instead of failing the whole listing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::jwt;

// ── Intercom ─────────────────────────────────────────────────────────

/// An intercom the account has access to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Intercom {
    pub id: i64,
    pub role_name: Option<String>,
    pub string_view: Option<String>,
    pub custom_name: Option<String>,
    pub address: Option<String>,
}

impl Intercom {
    /// Human-facing label: role name, then string view, then custom name.
    pub fn display_name(&self) -> String {
        [&self.role_name, &self.string_view, &self.custom_name]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Intercom {}", self.id))
    }
}

#[derive(Deserialize)]
struct RawIntercom {
    id: i64,
    #[serde(default, deserialize_with = "lenient")]
    role: Option<RawRole>,
    #[serde(default, deserialize_with = "lenient")]
    string_view: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    custom_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    address: Option<String>,
}

#[derive(Deserialize)]
struct RawRole {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
}

impl From<RawIntercom> for Intercom {
    fn from(raw: RawIntercom) -> Self {
        Self {
            id: raw.id,
            role_name: raw.role.and_then(|r| r.name),
            string_view: raw.string_view,
            custom_name: raw.custom_name,
            address: raw.address,
        }
    }
}

/// Map `GET api/v0/skud/shared/` output. Non-list payloads yield nothing.
pub(crate) fn intercoms_from_json(data: Option<Value>) -> Vec<Intercom> {
    let Some(Value::Array(items)) = data else {
        debug!("intercom listing is not a list, treating as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawIntercom>(item) {
            Ok(raw) => Some(Intercom::from(raw)),
            Err(e) => {
                debug!(error = %e, "skipping malformed intercom record");
                None
            }
        })
        .collect()
}

// ── Camera ───────────────────────────────────────────────────────────

/// A camera feed with its short-lived streaming token.
///
/// The streaming token expires independently of the account's access
/// token, so records must be re-fetched periodically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Camera {
    pub number: String,
    pub title: Option<String>,
    pub address: Option<String>,
    pub domain: String,
    pub token: String,
    pub screenshot_domain: Option<String>,
}

impl Camera {
    /// `rtsp://{domain}/{number}?token={token}`
    pub fn stream_url(&self) -> String {
        format!("rtsp://{}/{}?token={}", self.domain, self.number, self.token)
    }

    /// `https://{screenshot_domain}/api/v0/screenshots/{number}~600.jpg?token={token}`,
    /// when the camera advertises a screenshot server.
    pub fn snapshot_url(&self) -> Option<String> {
        self.screenshot_domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|domain| {
                format!(
                    "https://{domain}/api/v0/screenshots/{}~600.jpg?token={}",
                    self.number, self.token
                )
            })
    }

    /// Expiry of the streaming token, if it can be read.
    pub fn token_exp(&self) -> Option<i64> {
        jwt::extract_exp(&self.token)
    }

    /// Title, then address, then the camera number.
    pub fn display_name(&self) -> &str {
        [&self.title, &self.address]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or(self.number.as_str())
    }
}

#[derive(Deserialize)]
struct RawCamera {
    #[serde(default, deserialize_with = "string_or_number")]
    number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    address: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    token_l: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    servers: Option<RawServers>,
}

#[derive(Deserialize)]
struct RawServers {
    #[serde(default, deserialize_with = "lenient")]
    domain: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    screenshot_domain: Option<String>,
}

impl RawCamera {
    /// `None` unless domain, number and streaming token are all present.
    fn into_camera(self) -> Option<Camera> {
        let present = |s: Option<String>| s.filter(|s| !s.is_empty());
        let servers = self.servers?;
        Some(Camera {
            number: present(self.number)?,
            title: self.title,
            address: self.address,
            domain: present(servers.domain)?,
            token: present(self.token_l)?,
            screenshot_domain: servers.screenshot_domain,
        })
    }
}

/// Optional fields of the wrong shape read as absent instead of failing
/// the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| serde_json::from_value(v).ok()))
}

/// Camera numbers are usually strings, occasionally bare integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Map `GET api/v1/cctv` output, silently dropping entries without a
/// streaming domain, number, or token. Order of the rest is preserved.
pub(crate) fn cameras_from_json(data: Option<Value>) -> Vec<Camera> {
    let Some(Value::Array(items)) = data else {
        debug!("camera listing is not a list, treating as empty");
        return Vec::new();
    };
    debug!(count = items.len(), "camera results");

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawCamera>(item).ok())
        .filter_map(RawCamera::into_camera)
        .collect()
}

/// Loose truthiness for `{"result": ...}` style acknowledgements.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
