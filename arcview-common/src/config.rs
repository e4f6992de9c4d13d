//! Configuration loading and network selection
//!
//! Resolution priority:
//! 1. Command-line argument (config path, gateway override)
//! 2. Environment variables (`ARCVIEW_*`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing TOML file is never fatal: a warning is logged and defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Default IPFS gateway prefix used to rewrite `ipfs://` locators
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Default algod endpoints
pub const DEFAULT_ALGOD_MAINNET: &str = "https://mainnet-api.algonode.cloud";
pub const DEFAULT_ALGOD_TESTNET: &str = "https://testnet-api.algonode.cloud";

/// Default indexer endpoints
pub const DEFAULT_INDEXER_MAINNET: &str = "https://mainnet-idx.algonode.cloud";
pub const DEFAULT_INDEXER_TESTNET: &str = "https://testnet-idx.algonode.cloud";

/// Default timeout for every outbound HTTP request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Environment variable names
pub const ENV_CONFIG_PATH: &str = "ARCVIEW_CONFIG";
pub const ENV_NETWORK: &str = "ARCVIEW_NETWORK";
pub const ENV_IPFS_GATEWAY: &str = "ARCVIEW_IPFS_GATEWAY";
pub const ENV_ALGOD_TOKEN: &str = "ARCVIEW_ALGOD_TOKEN";

/// Ledger environment selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    MainNet,
    TestNet,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::MainNet => write!(f, "mainnet"),
            Network::TestNet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::MainNet),
            "testnet" => Ok(Network::TestNet),
            other => Err(Error::InvalidInput(format!(
                "unknown network '{}' (expected mainnet or testnet)",
                other
            ))),
        }
    }
}

/// Top-level configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Network used when the caller does not pick one
    #[serde(default)]
    pub network: Network,

    /// Gateway prefix for `ipfs://` locators
    #[serde(default = "default_ipfs_gateway")]
    pub ipfs_gateway: String,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub algod: AlgodConfig,

    #[serde(default)]
    pub indexer: IndexerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            ipfs_gateway: default_ipfs_gateway(),
            request_timeout_secs: default_request_timeout_secs(),
            algod: AlgodConfig::default(),
            indexer: IndexerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Ledger (algod) endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgodConfig {
    #[serde(default = "default_algod_mainnet")]
    pub mainnet: String,
    #[serde(default = "default_algod_testnet")]
    pub testnet: String,
    /// Optional `X-Algo-API-Token` header value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for AlgodConfig {
    fn default() -> Self {
        Self {
            mainnet: default_algod_mainnet(),
            testnet: default_algod_testnet(),
            token: None,
        }
    }
}

impl AlgodConfig {
    pub fn base_url(&self, network: Network) -> &str {
        match network {
            Network::MainNet => &self.mainnet,
            Network::TestNet => &self.testnet,
        }
    }
}

/// Transaction-log (indexer) endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerConfig {
    #[serde(default = "default_indexer_mainnet")]
    pub mainnet: String,
    #[serde(default = "default_indexer_testnet")]
    pub testnet: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            mainnet: default_indexer_mainnet(),
            testnet: default_indexer_testnet(),
        }
    }
}

impl IndexerConfig {
    pub fn base_url(&self, network: Network) -> &str {
        match network {
            Network::MainNet => &self.mainnet,
            Network::TestNet => &self.testnet,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_ipfs_gateway() -> String {
    DEFAULT_IPFS_GATEWAY.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_algod_mainnet() -> String {
    DEFAULT_ALGOD_MAINNET.to_string()
}

fn default_algod_testnet() -> String {
    DEFAULT_ALGOD_TESTNET.to_string()
}

fn default_indexer_mainnet() -> String {
    DEFAULT_INDEXER_MAINNET.to_string()
}

fn default_indexer_testnet() -> String {
    DEFAULT_INDEXER_TESTNET.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load configuration from a TOML file
    ///
    /// A missing file yields defaults (with a warning). A file that exists but
    /// cannot be read or parsed is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                path = %path.display(),
                "Config file not found, using compiled defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply `ARCVIEW_*` environment overrides on top of file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(network) = std::env::var(ENV_NETWORK) {
            self.network = network.parse()?;
        }

        if let Ok(gateway) = std::env::var(ENV_IPFS_GATEWAY) {
            if !gateway.trim().is_empty() {
                self.ipfs_gateway = gateway;
            }
        }

        if let Ok(token) = std::env::var(ENV_ALGOD_TOKEN) {
            if !token.trim().is_empty() {
                self.algod.token = Some(token);
            }
        }

        Ok(())
    }
}

/// Resolves which config file to read and produces the effective configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Config file location: CLI argument, then `ARCVIEW_CONFIG`, then the
    /// platform config directory
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path()
    }

    /// Load the config file (if any) and apply environment overrides
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match self.config_path() {
            Some(path) => TomlConfig::load(&path)?,
            None => {
                warn!("Could not determine config directory, using compiled defaults");
                TomlConfig::default()
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }
}

/// `<config_dir>/arcview/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("arcview").join("config.toml"))
}

/// Write configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, content)?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parse() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::MainNet);
        assert_eq!("TestNet".parse::<Network>().unwrap(), Network::TestNet);
        assert!(matches!(
            "betanet".parse::<Network>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_endpoint_selection() {
        let config = TomlConfig::default();
        assert_eq!(config.algod.base_url(Network::MainNet), DEFAULT_ALGOD_MAINNET);
        assert_eq!(config.indexer.base_url(Network::TestNet), DEFAULT_INDEXER_TESTNET);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            network = "testnet"

            [indexer]
            testnet = "http://localhost:8980"
            "#,
        )
        .unwrap();

        assert_eq!(config.network, Network::TestNet);
        assert_eq!(config.ipfs_gateway, DEFAULT_IPFS_GATEWAY);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.indexer.testnet, "http://localhost:8980");
        assert_eq!(config.indexer.mainnet, DEFAULT_INDEXER_MAINNET);
        assert_eq!(config.logging.level, "info");
    }
}
