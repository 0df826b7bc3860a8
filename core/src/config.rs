//! Client configuration.
//!
//! A `ClientConfig` is either deserialized from the caller's own settings
//! (camelCase keys, matching the server's JSON style) or read from the
//! environment with `from_env`.

use serde::Deserialize;
use thiserror::Error;

use crate::client::GuacamoleClient;

const URL_VAR: &str = "GUACAMOLE_URL";
const VALIDATE_CERTS_VAR: &str = "GUACAMOLE_VALIDATE_CERTS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has invalid boolean value {value:?}")]
    InvalidBool { name: &'static str, value: String },
}

/// Where the server lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_validate_certs")]
    pub validate_certs: bool,
}

fn default_validate_certs() -> bool {
    true
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(URL_VAR).ok_or(ConfigError::Missing(URL_VAR))?;
        let validate_certs = match lookup(VALIDATE_CERTS_VAR) {
            Some(value) => parse_bool(VALIDATE_CERTS_VAR, &value)?,
            None => default_validate_certs(),
        };
        Ok(Self {
            base_url,
            validate_certs,
        })
    }

    pub fn into_client(self) -> GuacamoleClient {
        GuacamoleClient::new(&self.base_url).with_validate_certs(self.validate_certs)
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}
