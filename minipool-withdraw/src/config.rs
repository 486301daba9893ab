use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use minipool_eth_client::client::ChainParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use web3::types::Address;

use crate::error::{Error, Result};

/// Prefix of environment variables that override the configuration file
pub const ENV_PREFIX: &str = "MINIPOOL_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// JSON-RPC endpoint of the execution client
    pub node_url: String,
    /// Address of the RocketStorage contract
    pub rocket_storage_address: Address,
    pub node_account: Address,
    /// File with the hex encoded private key of `node_account`
    pub node_key_path: PathBuf,
    pub confirmations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            node_url: "http://127.0.0.1:8545".to_owned(),
            rocket_storage_address: Address::zero(),
            node_account: Address::zero(),
            node_key_path: PathBuf::from("node.key"),
            confirmations: 1,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file at `path` (may be absent), then `MINIPOOL_*` variables
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config: Config = Config::figment(path).extract()?;
        Ok(config)
    }

    /// Rejects settings that have no usable default
    pub fn validate(&self) -> Result<()> {
        if self.rocket_storage_address.is_zero() {
            return Err(Error::MissingSetting("rocket_storage_address"));
        }
        if self.node_account.is_zero() {
            return Err(Error::MissingSetting("node_account"));
        }
        Ok(())
    }

    pub fn chain_params(&self) -> ChainParams {
        ChainParams {
            node_url: self.node_url.clone(),
            rocket_storage: self.rocket_storage_address,
            node_account: self.node_account,
            node_key_path: self.node_key_path.clone(),
            confirmations: self.confirmations,
        }
    }
}
