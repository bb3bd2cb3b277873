use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Where read and write calls go and which contract they target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RemoteConfig {
    /// Base URL of the node API serving read calls and broadcasts.
    #[serde(default = "default_url")]
    pub url: Url,
    #[serde(default = "default_contract_address")]
    pub contract_address: String,
    #[serde(default = "default_contract_name")]
    pub contract_name: String,
    /// Principal used as the caller of read calls when none is given.
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default = "default_request_timeout_millis")]
    pub request_timeout_millis: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            contract_address: default_contract_address(),
            contract_name: default_contract_name(),
            sender: None,
            request_timeout_millis: default_request_timeout_millis(),
        }
    }
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_millis)
    }

    /// The principal read calls are issued as.
    pub fn default_sender(&self) -> &str {
        self.sender.as_deref().unwrap_or(&self.contract_address)
    }
}

fn default_url() -> Url {
    Url::parse("http://127.0.0.1:3999/").expect("default url is valid")
}

fn default_contract_address() -> String {
    "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM".to_string()
}

fn default_contract_name() -> String {
    "story-chain".to_string()
}

fn default_request_timeout_millis() -> u64 {
    10_000
}
