use secp256k1::SecretKey;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use web3::signing::{Key, SecretKeyRef};
use web3::types::Address;

use crate::client::{Error, Result};

/// Transaction signer of the node account
pub struct NodeSigner {
    key: SecretKey,
    address: Address,
}

impl NodeSigner {
    /// Parses a hex encoded private key, with or without `0x` prefix
    pub fn from_hex(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let key = SecretKey::from_str(hex)?;
        let address = SecretKeyRef::new(&key).address();
        Ok(NodeSigner { key, address })
    }

    /// Reads the key file and checks that it belongs to the node account
    pub fn load(path: &Path, node_account: Address) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::KeyFile {
            path: path.to_path_buf(),
            source,
        })?;
        let signer = NodeSigner::from_hex(&contents)?;
        if signer.address != node_account {
            return Err(Error::KeyMismatch {
                expected: node_account,
                found: signer.address,
            });
        }
        Ok(signer)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn key(&self) -> SecretKeyRef<'_> {
        SecretKeyRef::new(&self.key)
    }
}

impl fmt::Debug for NodeSigner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NodeSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
