use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// Default delay between consecutive commands sent to one bridge
pub const DEFAULT_COMMAND_PACING_MS: u64 = 100;

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct HueTrayConfig {
    #[serde(default = "default_command_pacing_ms")]
    pub command_pacing_ms: u64,
}

impl Default for HueTrayConfig {
    fn default() -> Self {
        Self {
            command_pacing_ms: DEFAULT_COMMAND_PACING_MS,
        }
    }
}

const fn default_command_pacing_ms() -> u64 {
    DEFAULT_COMMAND_PACING_MS
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct BridgeServer {
    /// Host name or ip address of the bridge, optionally with a port
    pub address: String,
    /// Application key, sent as `hue-application-key`
    pub username: String,
    /// Display name, defaults to the config key
    pub name: Option<String>,
    pub disable_tls_verify: Option<bool>,
}

impl BridgeServer {
    /// Bridges present self-signed certificates, so verification is off
    /// unless explicitly requested.
    #[must_use]
    pub fn tls_verify_disabled(&self) -> bool {
        self.disable_tls_verify.unwrap_or(true)
    }

    #[must_use]
    pub fn base_url(&self) -> Option<Url> {
        let address = self.address.trim().trim_end_matches('/');
        if address.is_empty() {
            return None;
        }

        if address.contains("://") {
            Url::parse(address).ok()
        } else {
            Url::parse(&format!("https://{address}")).ok()
        }
    }

    #[must_use]
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, Eq, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub huetray: HueTrayConfig,
    #[serde(default)]
    pub bridges: BTreeMap<String, BridgeServer>,
}

impl AppConfig {
    #[must_use]
    pub fn has_bridges(&self) -> bool {
        !self.bridges.is_empty()
    }
}
