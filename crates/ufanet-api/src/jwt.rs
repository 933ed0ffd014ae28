// Unverified JWT inspection
//
// Access tokens and per-camera streaming tokens are compact JWTs. We only
// need their `exp` claim to decide when to refresh, so the signature is
// never checked. Anything that fails to decode means "expiry unknown".

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::Utc;
use serde_json::Value;

/// JWT segments are unpadded base64url; accept padded ones too.
const SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A token is treated as expiring this many seconds before its `exp`.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Extract the `exp` claim (epoch seconds) from a compact JWT.
///
/// Returns `None` for anything other than three dot-separated segments,
/// an undecodable payload, non-JSON payload, or a missing/non-numeric claim.
pub fn extract_exp(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (Some(_), Some(payload), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let bytes = SEGMENT.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp").and_then(epoch_seconds)
}

/// Is a token with expiry `exp` about to expire right now?
///
/// Unknown expiry always counts as expiring.
pub fn is_expiring(exp: Option<i64>) -> bool {
    is_expiring_at(exp, Utc::now().timestamp())
}

/// [`is_expiring`] against an explicit clock reading.
pub fn is_expiring_at(exp: Option<i64>, now: i64) -> bool {
    match exp {
        None => true,
        Some(exp) => now >= exp.saturating_sub(EXPIRY_SKEW_SECS),
    }
}

/// Read an epoch-seconds value that may arrive as an integer, a float,
/// or a numeric string.
pub(crate) fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(truncate)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn truncate(secs: f64) -> i64 {
    secs.trunc() as i64
}
