//! TOML configuration for the stream client.
//!
//! The file mirrors the provider-parameter layout the deployment uses:
//!
//! ```toml
//! bearer_token = "AAAA..."          # optional; BEARER_TOKEN env var wins
//!
//! [general]
//! endpoint = "https://api.example.com/2/events/stream"
//! rules_endpoint = "https://api.example.com/2/events/stream/rules"
//!
//! [query_parameters]
//! "event.fields" = "id,text,created_at"
//!
//! [[rules]]
//! value = "context:12.731226203856637952 lang:en"
//! tag = "Man City"
//! ```

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::rules::RuleSpec;

/// Environment variable consulted before the config file's `bearer_token`.
pub const BEARER_TOKEN_VAR: &str = "BEARER_TOKEN";

/// Endpoint URLs, under the `[general]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct General {
    /// Long-poll stream endpoint.
    pub endpoint: String,
    /// Rules endpoint (list / batch-delete / create).
    pub rules_endpoint: String,
}

/// Full client configuration. Loaded once at startup, immutable afterward.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    /// Free-form query parameters appended to the stream GET.
    #[serde(default)]
    pub query_parameters: BTreeMap<String, String>,
    /// Credential fallback when the environment variable is not set.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Desired filter rules installed by the reset protocol at startup.
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl Config {
    /// Read and parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Config, Error> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Resolve the bearer credential: `BEARER_TOKEN` from the environment,
    /// falling back to the `bearer_token` key in the file.
    ///
    /// An empty string from either source is returned as-is; the provider
    /// rejects it on the first call.
    pub fn resolve_token(&self) -> Result<String, Error> {
        resolve_token_from(env::var(BEARER_TOKEN_VAR).ok(), self.bearer_token.as_deref())
    }
}

fn resolve_token_from(env: Option<String>, file: Option<&str>) -> Result<String, Error> {
    env.or_else(|| file.map(str::to_string)).ok_or_else(|| {
        Error::Config(format!(
            "no bearer token: set {} or add bearer_token to the config file",
            BEARER_TOKEN_VAR
        ))
    })
}
