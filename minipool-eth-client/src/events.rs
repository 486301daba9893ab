use chrono::prelude::*;
use minipool_api::domain::NodeWithdrawal;
use web3::ethabi::{self, RawLog, Token};
use web3::types::{Address, Log, U256};

use crate::client::{Error, Result};

pub const NODE_WITHDRAWAL_EVENT: &str = "NodeWithdrawal";

/// Decodes all `NodeWithdrawal` events emitted by `minipool` among the logs.
/// Logs of other contracts and other events are skipped.
pub fn decode_node_withdrawals(
    minipool_abi: &ethabi::Contract,
    logs: &[Log],
    minipool: Address,
) -> Result<Vec<NodeWithdrawal>> {
    let event = minipool_abi.event(NODE_WITHDRAWAL_EVENT)?;
    let signature = event.signature();
    logs.iter()
        .filter(|log| log.address == minipool && log.topics.first() == Some(&signature))
        .map(|log| -> Result<NodeWithdrawal> {
            let parsed = event.parse_log(RawLog {
                topics: log.topics.clone(),
                data: log.data.0.clone(),
            })?;
            node_withdrawal(parsed)
        })
        .collect()
}

fn node_withdrawal(log: ethabi::Log) -> Result<NodeWithdrawal> {
    let param = |name: &str| -> Result<Token> {
        log.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.clone())
            .ok_or_else(|| Error::Event(format!("missing `{name}` parameter")))
    };
    let uint = |name: &str| -> Result<U256> {
        param(name)?
            .into_uint()
            .ok_or_else(|| Error::Event(format!("`{name}` is not an uint")))
    };
    let to = param("to")?
        .into_address()
        .ok_or_else(|| Error::Event("`to` is not an address".to_owned()))?;
    Ok(NodeWithdrawal {
        to,
        ether_amount: uint("etherAmount")?,
        staked_token_amount: uint("rethAmount")?,
        reward_token_amount: uint("rplAmount")?,
        created_at: timestamp(uint("created")?)?,
    })
}

fn timestamp(value: U256) -> Result<DateTime<Utc>> {
    if value > U256::from(i64::MAX as u64) {
        return Err(Error::Event(format!("timestamp {value} is out of range")));
    }
    Utc.timestamp_opt(value.low_u64() as i64, 0)
        .single()
        .ok_or_else(|| Error::Event(format!("timestamp {value} is out of range")))
}
