use minipool_api::domain::MinipoolState;
use web3::types::Address;

use crate::chain::MockChain;

pub fn node_account() -> Address {
    Address::from_low_u64_be(0xdead)
}

/// Deterministic address of the n-th test minipool
pub fn minipool_address(n: u64) -> Address {
    Address::from_low_u64_be(0x1000 + n)
}

/// Registers minipools with the given states, all holding a node deposit.
/// Returns their addresses in creation order.
pub fn add_minipools(chain: &MockChain, states: &[MinipoolState]) -> Vec<Address> {
    states
        .iter()
        .enumerate()
        .map(|(i, state)| {
            let address = minipool_address(i as u64);
            chain.add_minipool(address, *state, true);
            address
        })
        .collect()
}

/// Node that has just created `count` minipools. They wait for launch and
/// have nothing to withdraw yet.
pub fn fresh_node(chain: &MockChain, count: usize) -> Vec<Address> {
    add_minipools(chain, &vec![MinipoolState::Prelaunch; count])
}
