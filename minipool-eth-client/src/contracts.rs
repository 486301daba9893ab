use log::*;
use web3::contract::{Contract, Options};
use web3::signing::keccak256;
use web3::types::{Address, H256};
use web3::{ethabi, Transport, Web3};

use crate::client::{Error, Result};

pub const ROCKET_STORAGE_ABI: &[u8] = include_bytes!("../abi/RocketStorage.json");
pub const NODE_API_ABI: &[u8] = include_bytes!("../abi/RocketNodeAPI.json");
pub const NODE_SETTINGS_ABI: &[u8] = include_bytes!("../abi/RocketNodeSettings.json");
pub const ADDRESS_SET_STORAGE_ABI: &[u8] = include_bytes!("../abi/AddressSetStorage.json");
pub const MINIPOOL_ABI: &[u8] = include_bytes!("../abi/RocketMinipool.json");
pub const NODE_CONTRACT_ABI: &[u8] = include_bytes!("../abi/RocketNodeContract.json");

/// Storage key under which RocketStorage keeps the address of a named contract
pub fn contract_name_key(name: &str) -> H256 {
    H256::from(keccak256(&[b"contract.name".as_slice(), name.as_bytes()].concat()))
}

/// Address set key that lists active minipools of the node
pub fn node_minipools_key(node: &Address) -> H256 {
    H256::from(keccak256(
        &[b"minipools.active.node".as_slice(), node.as_bytes()].concat(),
    ))
}

/// Network contracts the withdrawal flow talks to
pub struct RocketContracts<T: Transport> {
    pub node_api: Contract<T>,
    pub node_settings: Contract<T>,
    pub address_set_storage: Contract<T>,
    /// Shared by every minipool contract
    pub minipool_abi: ethabi::Contract,
}

impl<T: Transport> RocketContracts<T> {
    pub async fn load(web3: &Web3<T>, rocket_storage: Address) -> Result<Self> {
        let storage = Contract::from_json(web3.eth(), rocket_storage, ROCKET_STORAGE_ABI)?;
        let node_api = load_network_contract(web3, &storage, "rocketNodeAPI", NODE_API_ABI).await?;
        let node_settings =
            load_network_contract(web3, &storage, "rocketNodeSettings", NODE_SETTINGS_ABI).await?;
        let address_set_storage = load_network_contract(
            web3,
            &storage,
            "utilAddressSetStorage",
            ADDRESS_SET_STORAGE_ABI,
        )
        .await?;
        let minipool_abi = ethabi::Contract::load(MINIPOOL_ABI)?;
        Ok(RocketContracts {
            node_api,
            node_settings,
            address_set_storage,
            minipool_abi,
        })
    }

    pub fn minipool(&self, web3: &Web3<T>, address: Address) -> Contract<T> {
        Contract::new(web3.eth(), address, self.minipool_abi.clone())
    }
}

async fn load_network_contract<T: Transport>(
    web3: &Web3<T>,
    storage: &Contract<T>,
    name: &str,
    abi: &[u8],
) -> Result<Contract<T>> {
    let address: Address = storage
        .query(
            "getAddress",
            (contract_name_key(name),),
            None,
            Options::default(),
            None,
        )
        .await?;
    if address.is_zero() {
        return Err(Error::ContractMissing(name.to_owned()));
    }
    debug!("Loaded contract {name} at {:?}", address);
    Ok(Contract::from_json(web3.eth(), address, abi)?)
}
