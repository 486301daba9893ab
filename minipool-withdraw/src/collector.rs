use futures::stream::{FuturesUnordered, StreamExt};
use log::*;
use minipool_api::chain::MinipoolChain;
use minipool_api::domain::MinipoolStatus;
use web3::types::Address;

use crate::error::{Error, Result};

/// Queries the status of every address concurrently.
///
/// The result has one status per address, in the order of `addresses`. The
/// first failing query fails the whole collection and drops the queries that
/// are still running, so no partial list is ever returned.
pub async fn collect_statuses<C: MinipoolChain>(
    chain: &C,
    addresses: &[Address],
) -> Result<Vec<MinipoolStatus>> {
    let mut pending: FuturesUnordered<_> = addresses
        .iter()
        .enumerate()
        .map(|(slot, address)| async move {
            let res = chain.minipool_status(*address).await;
            (slot, *address, res)
        })
        .collect();
    let mut slots: Vec<Option<MinipoolStatus>> = vec![None; addresses.len()];
    while let Some((slot, address, res)) = pending.next().await {
        match res {
            Ok(status) => slots[slot] = Some(status),
            Err(e) => {
                debug!(
                    "Status query of {:?} failed, cancelling {} outstanding queries",
                    address,
                    pending.len()
                );
                return Err(Error::StatusFetch {
                    address,
                    source: Box::new(e),
                });
            }
        }
    }
    Ok(slots.into_iter().flatten().collect())
}
