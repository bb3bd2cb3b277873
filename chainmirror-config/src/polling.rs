use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PollingConfig {
    /// Determines how frequently entities are refreshed while in foreground.
    #[serde(default = "default_interval_millis")]
    pub interval_millis: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_millis: default_interval_millis(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_millis)
    }
}

fn default_interval_millis() -> u64 {
    30_000
}
