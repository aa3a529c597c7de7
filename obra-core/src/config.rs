//! # Obra Configuration
//!
//! A minimal string key/value store. Every setting the client stack reads
//! lives under a dotted key:
//!
//! ```rust
//! use obra_core::ObraConfig;
//! let mut config = ObraConfig::with_defaults();
//!
//! config.set("paginate.default", "25");
//! assert_eq!(config.get("paginate.default"), Some("25"));
//! ```
//!
//! ## Environment overrides
//! `load_env` maps prefixed variables onto keys, with a double underscore
//! standing for a dot:
//!
//! ```bash
//! export OBRA__API__BASE_URL=https://api.example.com/api/
//! ```
//!
//! becomes `api.base_url`.

use std::collections::HashMap;
use std::time::Duration;

pub const API_BASE_URL: &str = "api.base_url";
pub const API_TIMEOUT: &str = "api.timeout";
pub const AUTH_STORAGE_PATH: &str = "auth.storage_path";
pub const AUTH_EXPIRY_SKEW: &str = "auth.expiry_skew";
pub const MEDIA_MAX_FILE_BYTES: &str = "media.max_file_bytes";
pub const PAGINATE_DEFAULT: &str = "paginate.default";
pub const PAGINATE_MAX: &str = "paginate.max";

#[derive(Debug, Default, Clone)]
pub struct ObraConfig {
    values: HashMap<String, String>,
}

impl ObraConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Store pre-filled with the values the client falls back to.
    pub fn with_defaults() -> Self {
        let mut config = Self::new();
        config.set(API_BASE_URL, "http://127.0.0.1:8000/api/");
        config.set(API_TIMEOUT, "10s");
        config.set(AUTH_EXPIRY_SKEW, "30s");
        config.set(MEDIA_MAX_FILE_BYTES, (50u64 * 1024 * 1024).to_string());
        config.set(PAGINATE_DEFAULT, "10");
        config.set(PAGINATE_MAX, "100");
        config
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Apply every `PREFIX...` environment variable as an override.
    ///
    /// Returns how many keys were set.
    pub fn load_env(&mut self, prefix: &str) -> usize {
        self.load_pairs(std::env::vars(), prefix)
    }

    fn load_pairs<I>(&mut self, vars: I, prefix: &str) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut applied = 0;
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                if normalized.is_empty() {
                    continue;
                }
                self.set(normalized, value);
                applied += 1;
            }
        }
        applied
    }

    pub fn snapshot(&self) -> ObraConfigSnapshot {
        ObraConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObraConfigSnapshot {
    map: HashMap<String, String>,
}

impl ObraConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }

    /// Durations accept humantime strings (`10s`, `1m 30s`) or plain seconds.
    pub fn get_duration(&self, key: &str) -> Option<Duration> {
        let raw = self.get(key)?.trim();
        if let Ok(secs) = raw.parse::<u64>() {
            return Some(Duration::from_secs(secs));
        }
        humantime::parse_duration(raw).ok()
    }
}
