//! Client configuration, loaded once at startup.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use trustvote_interface::services::contract::TxHash;
use trustvote_interface::AccountAddress;
pub use trustvote_pinata_adapter::PinataConfig;

use crate::slider::DEFAULT_PAGE_SIZE;

/// Chain the contract is deployed on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainConfig {
    /// EIP-155 chain id.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Block explorer base URL.
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
}

const fn default_chain_id() -> u64 {
    50002
}

fn default_explorer_url() -> String {
    "https://pharosscan.xyz/".into()
}

/// Photo storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Pinata credentials and endpoints.
    #[serde(flatten)]
    pub pinata: PinataConfig,
    /// Shown for candidates whose photo cannot be resolved.
    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: String,
}

fn default_placeholder_url() -> String {
    "/placeholder.png".into()
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Elections per dashboard page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Address of the TrustVote contract. Required to create elections.
    #[serde(default)]
    pub contract_address: Option<AccountAddress>,
    /// Chain configuration.
    pub chain: ChainConfig,
    /// Photo storage configuration.
    pub storage: StorageConfig,
    /// Presentation settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

impl ClientConfig {
    /// Explorer link for a transaction.
    pub fn explorer_tx_url(&self, tx_hash: &TxHash) -> String {
        format!(
            "{}/tx/{}",
            self.chain.explorer_url.trim_end_matches('/'),
            tx_hash
        )
    }
}

/// Reads a TOML file into `R`.
pub fn from_toml_path<P: AsRef<Path>, R: DeserializeOwned>(path: P) -> anyhow::Result<R> {
    let path = path.as_ref();
    let mut contents = String::new();
    {
        let mut file =
            File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
        file.read_to_string(&mut contents)?;
    }

    let result: R =
        toml::from_str(&contents).with_context(|| format!("Invalid TOML in {}", path.display()))?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_config_from(content: &str) -> NamedTempFile {
        let mut config_file = NamedTempFile::new().unwrap();
        config_file.write_all(content.as_bytes()).unwrap();
        config_file
    }

    #[test]
    fn test_correct_config() {
        let config = r#"
            contract_address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
            [chain]
            chain_id = 31337
            rpc_url = "http://localhost:8545"
            [storage]
            pinata_jwt = "SECRET_JWT"
            gateway_url = "https://example.mypinata.cloud"
            timeout_seconds = 10
            [display]
            page_size = 4
        "#;

        let config_file = create_config_from(config);

        let config: ClientConfig = from_toml_path(config_file.path()).unwrap();
        let expected = ClientConfig {
            contract_address: Some(
                "0x5fbdb2315678afecb367f032d93f642f64180aa3"
                    .parse()
                    .unwrap(),
            ),
            chain: ChainConfig {
                chain_id: 31337,
                rpc_url: "http://localhost:8545".to_string(),
                explorer_url: "https://pharosscan.xyz/".to_string(),
            },
            storage: StorageConfig {
                pinata: PinataConfig {
                    pinata_jwt: "SECRET_JWT".to_string(),
                    upload_url: "https://uploads.pinata.cloud/v3/files".to_string(),
                    gateway_url: "https://example.mypinata.cloud".to_string(),
                    timeout_seconds: 10,
                },
                placeholder_url: "/placeholder.png".to_string(),
            },
            display: DisplayConfig { page_size: 4 },
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_minimal_config_uses_pharos_defaults() {
        let config = r#"
            [chain]
            rpc_url = "https://rpc.example"
            [storage]
            pinata_jwt = "SECRET_JWT"
        "#;

        let config_file = create_config_from(config);
        let config: ClientConfig = from_toml_path(config_file.path()).unwrap();
        assert_eq!(config.chain.chain_id, 50002);
        assert_eq!(config.contract_address, None);
        assert_eq!(config.display.page_size, 3);
        assert_eq!(
            config.explorer_tx_url(&TxHash([0xab; 32])),
            format!("https://pharosscan.xyz/tx/0x{}", "ab".repeat(32))
        );
    }

    #[test]
    fn test_missing_file() {
        let err = from_toml_path::<_, ClientConfig>("/nonexistent/trustvote.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/trustvote.toml"));
    }
}
