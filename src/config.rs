use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for mintflow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MintflowConfig {
    /// Ledger endpoint settings
    pub ledger: LedgerConfig,
    /// Default amounts for the canonical lifecycle run
    pub workflow: WorkflowPlanConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// Cluster name, used in explorer links
    pub cluster: String,
    /// Explorer base URL for per-step verification links
    pub explorer_base: String,
    /// Per-step confirmation timeout
    pub step_timeout_seconds: u64,
    /// Simulated latency of the in-memory ledger
    pub simulated_latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowPlanConfig {
    /// Mint precision
    pub decimals: u8,
    /// Human amount minted to the owner account
    pub mint_amount: String,
    /// Human allowance approved for the delegate
    pub approve_amount: String,
    /// Human amount the delegate transfers to the receiver
    pub transfer_amount: String,
    /// Human amount burned from the owner account at the end
    pub burn_amount: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Enable structured tracing output
    pub tracing_enabled: bool,
    /// Log level
    pub log_level: String,
    /// Log accumulated ledger metrics after a run
    pub metrics_enabled: bool,
}

impl Default for MintflowConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig {
                cluster: "devnet".to_string(),
                explorer_base: "https://explorer.solana.com".to_string(),
                step_timeout_seconds: 30,
                simulated_latency_ms: 25,
            },
            workflow: WorkflowPlanConfig {
                decimals: 2,
                mint_amount: "100".to_string(),
                approve_amount: "50".to_string(),
                transfer_amount: "50".to_string(),
                burn_amount: "25".to_string(),
            },
            observability: ObservabilityConfig {
                tracing_enabled: true,
                log_level: "info".to_string(),
                metrics_enabled: true,
            },
        }
    }
}

impl MintflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (mintflow.toml)
    /// 3. Environment variables (prefixed with MINTFLOW__)
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&MintflowConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if Path::new("mintflow.toml").exists() {
            builder = builder.add_source(File::with_name("mintflow"));
        }

        builder = builder.add_source(
            Environment::with_prefix("MINTFLOW")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut mintflow_config: MintflowConfig = config.try_deserialize()?;

        // Shorthand override for the cluster name
        if let Ok(cluster) = std::env::var("MINTFLOW_CLUSTER") {
            mintflow_config.ledger.cluster = cluster;
        }

        Ok(mintflow_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<MintflowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = MintflowConfig::load_env_file();
        MintflowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static MintflowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_lifecycle() {
        let cfg = MintflowConfig::default();
        assert_eq!(cfg.workflow.decimals, 2);
        assert_eq!(cfg.workflow.mint_amount, "100");
        assert_eq!(cfg.workflow.approve_amount, "50");
        assert_eq!(cfg.workflow.burn_amount, "25");
        assert_eq!(cfg.ledger.cluster, "devnet");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mintflow.toml");
        let cfg = MintflowConfig::default();
        cfg.save_to_file(&path).expect("save");

        let raw = std::fs::read_to_string(&path).expect("read");
        let parsed: MintflowConfig = toml::from_str(&raw).expect("parse");
        assert_eq!(parsed.ledger.step_timeout_seconds, cfg.ledger.step_timeout_seconds);
        assert_eq!(parsed.workflow.mint_amount, cfg.workflow.mint_amount);
    }
}
