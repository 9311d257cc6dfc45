//! Node configuration with TOML file support.

use ptn_jury::JuryConfig;
use ptn_txpool::TxPoolConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::NodeError;

/// Configuration for a PTN node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for ledger storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Transaction pool settings.
    #[serde(default)]
    pub txpool: TxPoolConfig,

    /// Contract processor settings.
    #[serde(default)]
    pub jury: JurySettings,
}

/// Contract processor section of the node configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JurySettings {
    #[serde(default = "default_election_num")]
    pub election_num: usize,

    #[serde(default = "default_contract_sig_num")]
    pub contract_sig_num: usize,

    #[serde(default = "default_max_concurrent_executions")]
    pub max_concurrent_executions: usize,

    #[serde(default = "default_execution_timeout_secs")]
    pub execution_timeout_secs: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./ptn_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_election_num() -> usize {
    3
}

fn default_contract_sig_num() -> usize {
    3
}

fn default_max_concurrent_executions() -> usize {
    4
}

fn default_execution_timeout_secs() -> u64 {
    30
}

impl Default for JurySettings {
    fn default() -> Self {
        Self {
            election_num: default_election_num(),
            contract_sig_num: default_contract_sig_num(),
            max_concurrent_executions: default_max_concurrent_executions(),
            execution_timeout_secs: default_execution_timeout_secs(),
        }
    }
}

impl JurySettings {
    pub fn to_jury_config(&self) -> JuryConfig {
        JuryConfig {
            election_num: self.election_num,
            contract_sig_num: self.contract_sig_num,
            max_concurrent_executions: self.max_concurrent_executions,
            execution_timeout_secs: self.execution_timeout_secs,
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            txpool: TxPoolConfig::default(),
            jury: JurySettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.log_format, config.log_format);
        assert_eq!(parsed.jury.election_num, config.jury.election_num);
        assert_eq!(parsed.txpool.global_slots, config.txpool.global_slots);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.log_format, "human");
        assert_eq!(config.jury.contract_sig_num, 3);
        assert_eq!(config.txpool.price_bump, 10);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            log_level = "debug"

            [txpool]
            global_slots = 128

            [jury]
            election_num = 5
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.txpool.global_slots, 128);
        assert_eq!(config.jury.election_num, 5);
        assert_eq!(config.jury.contract_sig_num, 3); // default
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/ptn.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
