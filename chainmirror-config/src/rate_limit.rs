use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One budget shared by every read call the process makes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RateLimitConfig {
    /// Length of the trailing admission window.
    #[serde(default = "default_window_millis")]
    pub window_millis: u64,
    /// Maximum number of admissions inside one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    /// Pause after every executed request, regardless of outcome.
    #[serde(default = "default_inter_request_delay_millis")]
    pub inter_request_delay_millis: u64,
    /// Added to the computed wait when the window is full.
    #[serde(default = "default_safety_margin_millis")]
    pub safety_margin_millis: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_millis: default_window_millis(),
            max_requests: default_max_requests(),
            inter_request_delay_millis: default_inter_request_delay_millis(),
            safety_margin_millis: default_safety_margin_millis(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_millis)
    }

    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_millis)
    }

    pub fn safety_margin(&self) -> Duration {
        Duration::from_millis(self.safety_margin_millis)
    }
}

fn default_window_millis() -> u64 {
    60_000
}

fn default_max_requests() -> usize {
    40
}

fn default_inter_request_delay_millis() -> u64 {
    100
}

fn default_safety_margin_millis() -> u64 {
    50
}
