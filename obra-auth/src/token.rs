//! Token pair and unverified JWT claim inspection.
//!
//! The client never checks signatures; that is the server's job. It only
//! reads `exp` so it can refresh before a request would bounce.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SessionError, SessionResult};

/// What `auth/jwt/create/` returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// What `auth/jwt/refresh/` returns. Servers that rotate refresh tokens
/// include a new one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshedToken {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub jti: Option<String>,
}

impl Claims {
    /// Read the payload segment of a JWT without verifying it.
    pub fn decode_unverified(token: &str) -> SessionResult<Self> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (segments.next(), segments.next(), segments.next(), segments.next())
        else {
            return Err(SessionError::invalid_token("expected three segments"));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| SessionError::invalid_token(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SessionError::invalid_token(e.to_string()))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Expired, or expiring within `skew` of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, skew: std::time::Duration) -> bool {
        let skew = ChronoDuration::from_std(skew).unwrap_or_else(|_| ChronoDuration::zero());
        match self.expires_at() {
            Some(at) => at <= now + skew,
            None => true,
        }
    }

    pub fn is_access(&self) -> bool {
        self.token_type.as_deref().map(|t| t == "access").unwrap_or(true)
    }
}

#[cfg(test)]
pub(crate) fn fake_jwt(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{payload}.signature")
}
