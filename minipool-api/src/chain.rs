use async_trait::async_trait;
use web3::types::Address;

use crate::domain::{MinipoolStatus, NodeWithdrawal};

/// Chain capabilities consumed by the withdrawal flow.
///
/// Read-only queries may run concurrently, so implementations must tolerate
/// parallel calls of [`MinipoolChain::minipool_status`]. Signing methods are
/// always called sequentially.
#[async_trait]
pub trait MinipoolChain: Send + Sync {
    /// Transaction signer bound to the node account
    type Signer: Send + Sync;
    /// Confirmation receipt of a submitted transaction
    type Receipt: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether node deposit withdrawals are currently permitted
    async fn withdrawals_enabled(&self) -> Result<bool, Self::Error>;

    /// Addresses of all minipools owned by the node
    async fn minipool_addresses(&self, node: Address) -> Result<Vec<Address>, Self::Error>;

    async fn minipool_status(&self, minipool: Address) -> Result<MinipoolStatus, Self::Error>;

    async fn acquire_signer(&self) -> Result<Self::Signer, Self::Error>;

    /// Sends the deposit withdrawal transaction and waits for its confirmation
    async fn submit_withdrawal(
        &self,
        signer: &Self::Signer,
        minipool: Address,
    ) -> Result<Self::Receipt, Self::Error>;

    /// Extracts `NodeWithdrawal` events emitted by the minipool from the receipt
    fn decode_withdrawal_events(
        &self,
        receipt: &Self::Receipt,
        minipool: Address,
    ) -> Result<Vec<NodeWithdrawal>, Self::Error>;
}
