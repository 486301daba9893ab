use async_trait::async_trait;
use futures::future::{try_join, try_join_all};
use log::*;
use minipool_api::chain::MinipoolChain;
use minipool_api::domain::{MinipoolState, MinipoolStatus, NodeWithdrawal, StateError};
use std::path::PathBuf;
use thiserror::Error;
use web3::contract::{Contract, Options};
use web3::transports::Http;
use web3::types::{Address, TransactionReceipt, H256, U256, U64};
use web3::{ethabi, Web3};

use crate::contracts::{node_minipools_key, RocketContracts, NODE_CONTRACT_ABI};
use crate::events::decode_node_withdrawals;
use crate::signer::NodeSigner;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Node transport error: {0}")]
    Web3(#[from] web3::Error),
    #[error("Contract call error: {0}")]
    Contract(#[from] web3::contract::Error),
    #[error("ABI encoding/decoding error: {0}")]
    Abi(#[from] ethabi::Error),
    #[error("Contract {0} is not deployed")]
    ContractMissing(String),
    #[error("Node {0:?} is not registered")]
    NotRegistered(Address),
    #[error("Minipool {0:?} status: {1}")]
    State(Address, StateError),
    #[error("Failed to read node key {path}: {source}")]
    KeyFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid node key: {0}")]
    Key(#[from] secp256k1::Error),
    #[error("Node key belongs to {found:?}, expected node account {expected:?}")]
    KeyMismatch { expected: Address, found: Address },
    #[error("Transaction {0:?} reverted")]
    Reverted(H256),
    #[error("Invalid withdrawal event: {0}")]
    Event(String),
    #[error("Minipool count {0} is out of range")]
    Count(U256),
}

/// Alias for a `Result` with the error type `self::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Connection parameters of [`EthChain`]
#[derive(Debug, Clone)]
pub struct ChainParams {
    /// JSON-RPC endpoint of the execution client
    pub node_url: String,
    /// RocketStorage contract, the registry of all network contracts
    pub rocket_storage: Address,
    pub node_account: Address,
    /// File holding the hex encoded private key of the node account
    pub node_key_path: PathBuf,
    /// Blocks to wait after a transaction is mined
    pub confirmations: usize,
}

/// Rocket Pool network accessed through an execution client
pub struct EthChain {
    web3: Web3<Http>,
    contracts: RocketContracts<Http>,
    node_contract: Contract<Http>,
    params: ChainParams,
}

impl EthChain {
    /// Loads network contracts and checks that the node is registered
    pub async fn connect(params: ChainParams) -> Result<Self> {
        let transport = Http::new(&params.node_url)?;
        let web3 = Web3::new(transport);
        let contracts = RocketContracts::load(&web3, params.rocket_storage).await?;
        let node_contract_address: Address = contracts
            .node_api
            .query(
                "getContract",
                (params.node_account,),
                None,
                Options::default(),
                None,
            )
            .await?;
        if node_contract_address.is_zero() {
            return Err(Error::NotRegistered(params.node_account));
        }
        info!(
            "Node {:?} uses node contract {:?}",
            params.node_account, node_contract_address
        );
        let node_contract = Contract::from_json(web3.eth(), node_contract_address, NODE_CONTRACT_ABI)?;
        Ok(EthChain {
            web3,
            contracts,
            node_contract,
            params,
        })
    }
}

#[async_trait]
impl MinipoolChain for EthChain {
    type Signer = NodeSigner;
    type Receipt = TransactionReceipt;
    type Error = Error;

    async fn withdrawals_enabled(&self) -> Result<bool> {
        let allowed: bool = self
            .contracts
            .node_settings
            .query("getWithdrawalAllowed", (), None, Options::default(), None)
            .await?;
        Ok(allowed)
    }

    async fn minipool_addresses(&self, node: Address) -> Result<Vec<Address>> {
        let storage = &self.contracts.address_set_storage;
        let key = node_minipools_key(&node);
        let count: U256 = storage
            .query("getCount", (key,), None, Options::default(), None)
            .await?;
        debug!("Node {:?} has {} minipools", node, count);
        let items = (0..minipool_count(count)?).map(|i| {
            storage.query("getItem", (key, U256::from(i)), None, Options::default(), None)
        });
        let addresses: Vec<Address> = try_join_all(items).await?;
        Ok(addresses)
    }

    async fn minipool_status(&self, minipool: Address) -> Result<MinipoolStatus> {
        let contract = self.contracts.minipool(&self.web3, minipool);
        let status_fut = contract.query("getStatus", (), None, Options::default(), None);
        let deposit_fut = contract.query("getNodeDepositExists", (), None, Options::default(), None);
        let (code, deposit_exists): (U256, bool) = try_join(status_fut, deposit_fut).await?;
        let state = MinipoolState::try_from(code.low_u64())
            .map_err(|e| Error::State(minipool, e))?;
        Ok(MinipoolStatus {
            address: minipool,
            state,
            deposit_exists,
        })
    }

    async fn acquire_signer(&self) -> Result<NodeSigner> {
        NodeSigner::load(&self.params.node_key_path, self.params.node_account)
    }

    async fn submit_withdrawal(
        &self,
        signer: &NodeSigner,
        minipool: Address,
    ) -> Result<TransactionReceipt> {
        let receipt = self
            .node_contract
            .signed_call_with_confirmations(
                "withdrawMinipoolDeposit",
                (minipool,),
                Options::default(),
                self.params.confirmations,
                signer.key(),
            )
            .await?;
        debug!(
            "Withdrawal from {:?} mined in {:?}",
            minipool, receipt.transaction_hash
        );
        if receipt.status == Some(U64::zero()) {
            return Err(Error::Reverted(receipt.transaction_hash));
        }
        Ok(receipt)
    }

    fn decode_withdrawal_events(
        &self,
        receipt: &TransactionReceipt,
        minipool: Address,
    ) -> Result<Vec<NodeWithdrawal>> {
        decode_node_withdrawals(&self.contracts.minipool_abi, &receipt.logs, minipool)
    }
}

fn minipool_count(count: U256) -> Result<u64> {
    if count > U256::from(u64::MAX) {
        return Err(Error::Count(count));
    }
    Ok(count.low_u64())
}
