use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use web3::types::Address;

/// Lifecycle state of a minipool contract, as reported by its `getStatus()` method
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MinipoolState {
    /// Node deposit is made, but the contract is not active yet
    Initialized,
    Prelaunch,
    Staking,
    LoggedOut,
    Withdrawn,
    /// The minipool was not launched in time
    TimedOut,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StateError {
    #[error("Unknown minipool status code `{0}`")]
    UnknownCode(u64),
}

impl MinipoolState {
    pub fn code(&self) -> u64 {
        match self {
            MinipoolState::Initialized => 0,
            MinipoolState::Prelaunch => 1,
            MinipoolState::Staking => 2,
            MinipoolState::LoggedOut => 3,
            MinipoolState::Withdrawn => 4,
            MinipoolState::TimedOut => 5,
        }
    }

    /// States in which an existing node deposit can be reclaimed
    pub fn allows_withdrawal(&self) -> bool {
        matches!(
            self,
            MinipoolState::Initialized | MinipoolState::Withdrawn | MinipoolState::TimedOut
        )
    }
}

impl TryFrom<u64> for MinipoolState {
    type Error = StateError;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MinipoolState::Initialized),
            1 => Ok(MinipoolState::Prelaunch),
            2 => Ok(MinipoolState::Staking),
            3 => Ok(MinipoolState::LoggedOut),
            4 => Ok(MinipoolState::Withdrawn),
            5 => Ok(MinipoolState::TimedOut),
            other => Err(StateError::UnknownCode(other)),
        }
    }
}

impl fmt::Display for MinipoolState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MinipoolState::Initialized => write!(f, "Initialized"),
            MinipoolState::Prelaunch => write!(f, "Prelaunch"),
            MinipoolState::Staking => write!(f, "Staking"),
            MinipoolState::LoggedOut => write!(f, "Logged Out"),
            MinipoolState::Withdrawn => write!(f, "Withdrawn"),
            MinipoolState::TimedOut => write!(f, "Timed Out"),
        }
    }
}

/// Snapshot of a single minipool taken at query time
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MinipoolStatus {
    /// Minipool contract address
    pub address: Address,
    pub state: MinipoolState,
    /// Node deposit is still held by the minipool
    pub deposit_exists: bool,
}

impl MinipoolStatus {
    pub fn is_withdrawable(&self) -> bool {
        self.deposit_exists && self.state.allows_withdrawal()
    }

    /// Human readable state used in selection menus
    pub fn label(&self) -> String {
        self.state.to_string()
    }
}
