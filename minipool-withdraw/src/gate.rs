use log::*;
use minipool_api::chain::MinipoolChain;

use crate::error::{Error, Result};

/// Asks the network whether node deposits can be withdrawn right now
pub async fn withdrawals_enabled<C: MinipoolChain>(chain: &C) -> Result<bool> {
    let enabled = chain
        .withdrawals_enabled()
        .await
        .map_err(|e| Error::NetworkQuery(Box::new(e)))?;
    debug!("Node withdrawals enabled: {}", enabled);
    Ok(enabled)
}
