//! Client configuration.

use serde::{Deserialize, Serialize};

use crate::envelope::Credentials;

pub const DEFAULT_API_URL: &str = "https://api.netki.com";

pub const API_URL_ENV: &str = "WALLETNAME_API_URL";
pub const API_KEY_ENV: &str = "WALLETNAME_API_KEY";
pub const PARTNER_ID_ENV: &str = "WALLETNAME_PARTNER_ID";

/// Where the directory service lives and who is calling it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://api.netki.com`. A trailing slash is ignored.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            partner_id: None,
        }
    }
}

impl ClientConfig {
    /// Partner configuration against the default API URL.
    ///
    /// Arguments follow the same order as [`Credentials::new`].
    pub fn new(api_key: impl Into<String>, partner_id: impl Into<String>) -> Self {
        Self {
            api_url: default_api_url(),
            api_key: Some(api_key.into()),
            partner_id: Some(partner_id.into()),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Read `WALLETNAME_API_URL`, `WALLETNAME_API_KEY` and
    /// `WALLETNAME_PARTNER_ID`. Unset or empty variables fall back to the
    /// defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            api_url: read(API_URL_ENV).unwrap_or_else(default_api_url),
            api_key: read(API_KEY_ENV),
            partner_id: read(PARTNER_ID_ENV),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            api_key: self.api_key.clone(),
            partner_id: self.partner_id.clone(),
        }
    }
}
