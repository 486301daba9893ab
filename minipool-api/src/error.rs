use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single minipool withdrawal. Never aborts processing of other minipools.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalError {
    #[error("Error creating transactor: {0}")]
    SignerAcquisition(String),
    #[error("Error withdrawing deposit: {0}")]
    Transaction(String),
    /// The transaction is confirmed, but its event could not be decoded
    #[error("Error retrieving node deposit withdrawal event: {0}")]
    EventDecode(String),
    /// The transaction is confirmed, but emitted no withdrawal event
    #[error("Could not retrieve node deposit withdrawal event")]
    EventMissing,
}

impl WithdrawalError {
    /// Whether the withdrawal transaction reached the chain despite the error
    pub fn is_confirmed(&self) -> bool {
        matches!(
            self,
            WithdrawalError::EventDecode(_) | WithdrawalError::EventMissing
        )
    }
}
