use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};

mod cache;
mod errors;
mod metrics;
mod polling;
mod rate_limit;
mod remote;
mod storage;
mod sync;
mod transactions;

pub use cache::*;
pub use errors::*;
pub use metrics::*;
pub use polling::*;
pub use rate_limit::*;
pub use remote::*;
pub use storage::*;
pub use sync::*;
pub use transactions::*;

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ChainMirrorConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub transactions: TransactionsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl ChainMirrorConfig {
    pub fn try_load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let toml = fs::read_to_string(path)?;
        Self::try_load_from_toml(&toml)
    }

    pub fn try_load_from_toml(toml: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would stall the scheduler or the polling loop.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Invalid(
                "rate-limit.max-requests must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit.window_millis == 0 {
            return Err(ConfigError::Invalid(
                "rate-limit.window-millis must be greater than 0".to_string(),
            ));
        }
        if self.remote.request_timeout_millis == 0 {
            return Err(ConfigError::Invalid(
                "remote.request-timeout-millis must be greater than 0"
                    .to_string(),
            ));
        }
        if self.polling.interval_millis == 0 {
            return Err(ConfigError::Invalid(
                "polling.interval-millis must be greater than 0".to_string(),
            ));
        }
        if self.cache.namespace.is_empty() {
            return Err(ConfigError::Invalid(
                "cache.namespace must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ChainMirrorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match toml::to_string_pretty(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = ChainMirrorConfig::try_load_from_toml("").unwrap();
        assert_eq!(config, ChainMirrorConfig::default());
        assert_eq!(config.rate_limit.max_requests, 40);
        assert_eq!(config.rate_limit.window_millis, 60_000);
        assert_eq!(config.cache.default_ttl_millis, 300_000);
        assert_eq!(config.polling.interval_millis, 30_000);
        assert_eq!(config.transactions.retention_days, 7);
    }

    #[test]
    fn test_display_round_trips() {
        let config = ChainMirrorConfig::default();
        let reparsed =
            ChainMirrorConfig::try_load_from_toml(&config.to_string()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_zero_max_requests_is_rejected() {
        let res = ChainMirrorConfig::try_load_from_toml(
            "[rate-limit]\nmax-requests = 0\n",
        );
        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let res = ChainMirrorConfig::try_load_from_toml(
            "[cache]\nnot-a-field = 1\n",
        );
        assert!(matches!(res, Err(ConfigError::Toml(_))));
    }
}
