use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use web3::types::{Address, U256};

use crate::domain::address::to_checksum;
use crate::domain::units::format_eth;
use crate::error::WithdrawalError;

/// `NodeWithdrawal` event emitted by a minipool when the node deposit is returned
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NodeWithdrawal {
    /// Receiver of the funds
    pub to: Address,
    /// Returned ether, wei
    pub ether_amount: U256,
    /// Returned rETH, wei
    pub staked_token_amount: U256,
    /// Returned RPL, wei
    pub reward_token_amount: U256,
    pub created_at: DateTime<Utc>,
}

impl NodeWithdrawal {
    /// Human readable confirmation line for the operator
    pub fn describe(&self, minipool: &Address) -> String {
        format!(
            "Successfully withdrew deposit of {} ETH, {} rETH and {} RPL from minipool {}",
            format_eth(self.ether_amount),
            format_eth(self.staked_token_amount),
            format_eth(self.reward_token_amount),
            to_checksum(minipool)
        )
    }
}

/// Result of processing one selected minipool
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WithdrawalOutcome {
    pub address: Address,
    pub result: Result<NodeWithdrawal, WithdrawalError>,
}

impl WithdrawalOutcome {
    pub fn success(address: Address, withdrawal: NodeWithdrawal) -> Self {
        WithdrawalOutcome {
            address,
            result: Ok(withdrawal),
        }
    }

    pub fn failure(address: Address, error: WithdrawalError) -> Self {
        WithdrawalOutcome {
            address,
            result: Err(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn withdrawal(&self) -> Option<&NodeWithdrawal> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&WithdrawalError> {
        self.result.as_ref().err()
    }
}

/// Reason the operation stopped before any transaction was sent. None of them is an error.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum EarlyExit {
    WithdrawalsDisabled,
    NoneAvailable,
    NoneSelected,
}

impl fmt::Display for EarlyExit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EarlyExit::WithdrawalsDisabled => {
                write!(f, "Node withdrawals are currently disabled in Rocket Pool")
            }
            EarlyExit::NoneAvailable => {
                write!(f, "No minipools are currently available for withdrawal")
            }
            EarlyExit::NoneSelected => write!(f, "No minipools to withdraw"),
        }
    }
}

pub const FAILURE_REPORT_HEADER: &str = "Error withdrawing deposits from one or more minipools:";

/// Combined outcome of one withdrawal invocation
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    pub early_exit: Option<EarlyExit>,
    /// Outcomes in processing order
    pub outcomes: Vec<WithdrawalOutcome>,
}

impl AggregateResult {
    pub fn new() -> Self {
        AggregateResult::default()
    }

    pub fn early(exit: EarlyExit) -> Self {
        AggregateResult {
            early_exit: Some(exit),
            outcomes: vec![],
        }
    }

    pub fn push(&mut self, outcome: WithdrawalOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(WithdrawalOutcome::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Address, &WithdrawalError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error().map(|e| (&o.address, e)))
    }

    pub fn successes(&self) -> impl Iterator<Item = (&Address, &NodeWithdrawal)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.withdrawal().map(|w| (&o.address, w)))
    }

    /// Multi-line report listing every failed minipool, `None` if all succeeded
    pub fn failure_report(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        let mut lines = vec![FAILURE_REPORT_HEADER.to_owned()];
        for (address, error) in self.failures() {
            lines.push(format!("Minipool {}: {}", to_checksum(address), error));
        }
        Some(lines.join("\n"))
    }
}
