use thiserror::Error;
use web3::types::Address;

/// Error of a chain collaborator with its concrete type erased
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error checking node withdrawals enabled status: {0}")]
    NetworkQuery(BoxError),
    #[error("Error getting node minipool addresses: {0}")]
    AddressLookup(BoxError),
    #[error("Error getting status of minipool {address:?}: {source}")]
    StatusFetch { address: Address, source: BoxError },
    #[error("Invalid minipool selection `{0}`")]
    InvalidSelection(String),
    #[error("Invalid selection pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Console error: {0}")]
    Console(#[from] std::io::Error),
    #[error("Console input closed before a minipool was selected")]
    InputClosed,
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),
    #[error("Setting `{0}` is not configured")]
    MissingSetting(&'static str),
    #[error("Chain error: {0}")]
    Chain(#[from] minipool_eth_client::client::Error),
    #[error("{0}")]
    Withdrawals(String),
    #[error("Withdrawal aborted")]
    Aborted,
}

/// Alias for a `Result` with the error type `self::Error`.
pub type Result<T> = std::result::Result<T, Error>;
