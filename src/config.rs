use serde::{Deserialize, Serialize};
use std::fs;

use anyhow::{Context, Result};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL for the payout store
    pub postgres_url: String,
    #[serde(default)]
    pub worker: WorkerSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Executor tuning, mirrored into `ExecutorConfig` at startup
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerSettings {
    pub concurrency: usize,
    pub chunk_size: i64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            chunk_size: 100,
        }
    }
}

impl AppConfig {
    /// Load config from YAML file based on environment
    pub fn load(env: &str) -> Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config: Self =
            serde_yaml::from_str(&content).context("Failed to parse config yaml")?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Environment variables take precedence over YAML config.
    ///
    /// Supported overrides:
    /// - PAYOUT_GATEWAY_PORT: Gateway port (u16)
    /// - PAYOUT_GATEWAY_HOST: Gateway host (String)
    /// - PAYOUT_POSTGRES_URL: PostgreSQL connection URL
    /// - PAYOUT_LOG_LEVEL: Log level (trace/debug/info/warn/error)
    /// - PAYOUT_WORKER_CONCURRENCY: Worker pool size
    /// - PAYOUT_WORKER_CHUNK_SIZE: Payouts pulled per iteration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PAYOUT_GATEWAY_PORT")
            && let Ok(p) = port.parse::<u16>()
        {
            tracing::info!("Config override: gateway.port = {} (from PAYOUT_GATEWAY_PORT)", p);
            self.gateway.port = p;
        }
        if let Ok(host) = std::env::var("PAYOUT_GATEWAY_HOST") {
            tracing::info!("Config override: gateway.host = {} (from PAYOUT_GATEWAY_HOST)", host);
            self.gateway.host = host;
        }

        if let Ok(url) = std::env::var("PAYOUT_POSTGRES_URL") {
            tracing::info!("Config override: postgres_url = [REDACTED] (from PAYOUT_POSTGRES_URL)");
            self.postgres_url = url;
        }

        if let Ok(level) = std::env::var("PAYOUT_LOG_LEVEL") {
            tracing::info!("Config override: log_level = {} (from PAYOUT_LOG_LEVEL)", level);
            self.log_level = level;
        }

        if let Ok(concurrency) = std::env::var("PAYOUT_WORKER_CONCURRENCY")
            && let Ok(c) = concurrency.parse::<usize>()
        {
            tracing::info!(
                "Config override: worker.concurrency = {} (from PAYOUT_WORKER_CONCURRENCY)",
                c
            );
            self.worker.concurrency = c;
        }
        if let Ok(chunk) = std::env::var("PAYOUT_WORKER_CHUNK_SIZE")
            && let Ok(c) = chunk.parse::<i64>()
        {
            tracing::info!(
                "Config override: worker.chunk_size = {} (from PAYOUT_WORKER_CHUNK_SIZE)",
                c
            );
            self.worker.chunk_size = c;
        }
    }

    /// Validate configuration at startup
    pub fn validate(&self) -> Result<()> {
        if self.gateway.port == 0 {
            anyhow::bail!("Invalid gateway.port: must be > 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log_level '{}': must be one of {:?}",
                self.log_level,
                valid_levels
            );
        }

        if self.postgres_url.is_empty() {
            anyhow::bail!("postgres_url must be set");
        }

        if self.worker.concurrency == 0 {
            anyhow::bail!("Invalid worker.concurrency: must be > 0");
        }
        if self.worker.chunk_size <= 0 {
            anyhow::bail!("Invalid worker.chunk_size: must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "payout-engine.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            enable_tracing: true,
            gateway: GatewayConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            postgres_url: "postgres://localhost/payouts".to_string(),
            worker: WorkerSettings::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = base_config();
        config.gateway.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = base_config();
        config.log_level = "noisy".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = base_config();
        config.worker.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_worker_settings_default() {
        let settings = WorkerSettings::default();
        assert_eq!(settings.concurrency, 10);
        assert_eq!(settings.chunk_size, 100);
    }
}
