//! Startup configuration for the hosted store.
//!
//! Both values are required and read exactly once, at process init. A missing
//! value is a [`ConfigError`] the binary should treat as fatal.

use std::env;
use std::fmt::{Debug, Formatter};

use crate::ConfigError;

/// Environment variable holding the store endpoint, e.g. `https://xyz.supabase.co`.
pub const STORE_URL_VAR: &str = "SUPABASE_URL";
/// Environment variable holding the store access key.
pub const STORE_KEY_VAR: &str = "SUPABASE_KEY";

/// Validated connection settings for [`SupabaseStore`](crate::SupabaseStore).
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    url: String,
    api_key: String,
}

impl StoreConfig {
    /// Build a config, validating the endpoint and trimming a trailing `/`.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(ConfigError::Missing(STORE_URL_VAR));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl(url.to_owned()));
        }

        let api_key = api_key.into();
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::Missing(STORE_KEY_VAR));
        }

        Ok(Self {
            url: url.to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    /// Read `SUPABASE_URL` and `SUPABASE_KEY` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read both values through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(STORE_URL_VAR).ok_or(ConfigError::Missing(STORE_URL_VAR))?;
        let api_key = lookup(STORE_KEY_VAR).ok_or(ConfigError::Missing(STORE_KEY_VAR))?;
        Self::new(url, api_key)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// REST endpoint for one table.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.url)
    }
}

impl Debug for StoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
