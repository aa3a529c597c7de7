// Authentication options and configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use obra_core::config::{AUTH_EXPIRY_SKEW, AUTH_STORAGE_PATH};
use obra_core::ObraConfigSnapshot;

/// Endpoint paths, relative to the API base URL.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthEndpoints {
    /// Exchange credentials for a token pair
    pub login: String,
    /// Check an access token
    pub verify: String,
    /// Trade a refresh token for a new access token
    pub refresh: String,
    /// Current user profile
    pub me: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "auth/jwt/create/".to_string(),
            verify: "auth/jwt/verify/".to_string(),
            refresh: "auth/jwt/refresh/".to_string(),
            me: "auth/users/me/".to_string(),
        }
    }
}

impl AuthEndpoints {
    /// True when `path` is one of the token endpoints; a 401 from those is a
    /// bad credential, not an expired session.
    pub fn is_token_endpoint(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        [&self.login, &self.verify, &self.refresh]
            .iter()
            .any(|endpoint| path.starts_with(endpoint.trim_start_matches('/')))
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, path) in [
            ("login", &self.login),
            ("verify", &self.verify),
            ("refresh", &self.refresh),
            ("me", &self.me),
        ] {
            if path.trim().is_empty() {
                return Err(format!("Auth endpoint '{}' cannot be empty", name));
            }
            if path.starts_with("http://") || path.starts_with("https://") {
                return Err(format!("Auth endpoint '{}' must be relative to the API base URL", name));
            }
        }
        Ok(())
    }
}

/// Main authentication configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthOptions {
    pub endpoints: AuthEndpoints,
    /// Refresh this long before the access token actually expires
    #[serde(with = "humantime_serde")]
    pub expiry_skew: Duration,
    /// Where `FileTokenStorage` keeps the tokens; `None` keeps them in memory
    pub storage_path: Option<String>,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            endpoints: AuthEndpoints::default(),
            expiry_skew: Duration::from_secs(30),
            storage_path: None,
        }
    }
}

impl AuthOptions {
    pub fn validate(&self) -> Result<(), String> {
        self.endpoints
            .validate()
            .map_err(|e| format!("Endpoint validation failed: {}", e))?;

        if self.expiry_skew > Duration::from_secs(3600) {
            return Err("Expiry skew must not exceed one hour".to_string());
        }

        if let Some(path) = &self.storage_path {
            if path.trim().is_empty() {
                return Err("Token storage path cannot be empty if specified".to_string());
            }
        }

        Ok(())
    }

    /// Read `auth.*` keys from a config snapshot, falling back to defaults.
    pub fn from_config(config: &ObraConfigSnapshot) -> Self {
        let defaults = Self::default();
        Self {
            endpoints: defaults.endpoints,
            expiry_skew: config
                .get_duration(AUTH_EXPIRY_SKEW)
                .unwrap_or(defaults.expiry_skew),
            storage_path: config.get_string(AUTH_STORAGE_PATH),
        }
    }

    pub fn builder() -> AuthOptionsBuilder {
        AuthOptionsBuilder::new()
    }
}

/// Builder for creating AuthOptions
#[derive(Debug, Default)]
pub struct AuthOptionsBuilder {
    options: AuthOptions,
}

impl AuthOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login_path<S: Into<String>>(mut self, path: S) -> Self {
        self.options.endpoints.login = path.into();
        self
    }

    pub fn verify_path<S: Into<String>>(mut self, path: S) -> Self {
        self.options.endpoints.verify = path.into();
        self
    }

    pub fn refresh_path<S: Into<String>>(mut self, path: S) -> Self {
        self.options.endpoints.refresh = path.into();
        self
    }

    pub fn me_path<S: Into<String>>(mut self, path: S) -> Self {
        self.options.endpoints.me = path.into();
        self
    }

    pub fn expiry_skew(mut self, skew: Duration) -> Self {
        self.options.expiry_skew = skew;
        self
    }

    pub fn storage_path<S: Into<String>>(mut self, path: S) -> Self {
        self.options.storage_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<AuthOptions, String> {
        self.options.validate()?;
        Ok(self.options)
    }
}
