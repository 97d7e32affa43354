//! Backend configuration resolved from the environment.
//!
//! Each backend is all-or-nothing: no variables means "not configured",
//! a partial set is an error naming the missing variables.

use std::env;
use std::time::Duration;

use crate::db::SyncConfig;
use crate::error::{Error, Result};
use crate::storage::R2Config;
use crate::util::{is_http_url, normalize_text_option};

const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
const ENV_TURSO_DATABASE_URL: &str = "TURSO_DATABASE_URL";
const ENV_TURSO_AUTH_TOKEN: &str = "TURSO_AUTH_TOKEN";
const ENV_TURSO_SYNC_INTERVAL_SECS: &str = "TURSO_SYNC_INTERVAL_SECS";

/// Public Supabase project endpoint and anon key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        Self::from_parts(lookup(ENV_SUPABASE_URL), lookup(ENV_SUPABASE_ANON_KEY))
    }

    /// Build from optional values, e.g. a CLI profile merged with the env.
    pub fn from_parts(url: Option<String>, anon_key: Option<String>) -> Result<Option<Self>> {
        let url = normalize_text_option(url);
        let anon_key = normalize_text_option(anon_key);

        match (url, anon_key) {
            (None, None) => Ok(None),
            (Some(url), Some(anon_key)) => {
                if !is_http_url(&url) {
                    return Err(Error::Configuration(format!(
                        "{ENV_SUPABASE_URL} must include http:// or https://"
                    )));
                }
                Ok(Some(Self { url, anon_key }))
            }
            (None, Some(_)) => Err(Error::Configuration(format!(
                "Supabase configuration is incomplete. Missing: {ENV_SUPABASE_URL}"
            ))),
            (Some(_), None) => Err(Error::Configuration(format!(
                "Supabase configuration is incomplete. Missing: {ENV_SUPABASE_ANON_KEY}"
            ))),
        }
    }
}

/// Everything needed to reach the hosted backends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    pub supabase: Option<SupabaseConfig>,
    pub r2: Option<R2Config>,
    pub sync: Option<SyncConfig>,
}

impl BackendConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            supabase: SupabaseConfig::from_lookup(&lookup)?,
            r2: R2Config::from_lookup(&lookup)?,
            sync: parse_sync_config(&lookup)?,
        })
    }
}

fn parse_sync_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<SyncConfig>> {
    let url = normalize_text_option(lookup(ENV_TURSO_DATABASE_URL));
    let token = normalize_text_option(lookup(ENV_TURSO_AUTH_TOKEN));

    let (url, token) = match (url, token) {
        (None, None) => return Ok(None),
        (Some(url), Some(token)) => (url, token),
        (None, Some(_)) => {
            return Err(Error::Configuration(format!(
                "Sync configuration is incomplete. Missing: {ENV_TURSO_DATABASE_URL}"
            )))
        }
        (Some(_), None) => {
            return Err(Error::Configuration(format!(
                "Sync configuration is incomplete. Missing: {ENV_TURSO_AUTH_TOKEN}"
            )))
        }
    };

    let mut config = SyncConfig::new(url, token);
    if let Some(raw) = normalize_text_option(lookup(ENV_TURSO_SYNC_INTERVAL_SECS)) {
        let seconds = raw.parse::<u64>().map_err(|_| {
            Error::Configuration(format!(
                "{ENV_TURSO_SYNC_INTERVAL_SECS} must be a whole number of seconds"
            ))
        })?;
        config = if seconds == 0 {
            config.without_auto_sync()
        } else {
            config.with_sync_interval(Duration::from_secs(seconds))
        };
    }
    Ok(Some(config))
}
