use async_trait::async_trait;
use chrono::prelude::*;
use log::*;
use minipool_api::chain::MinipoolChain;
use minipool_api::domain::{ether, MinipoolState, MinipoolStatus, NodeWithdrawal};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use web3::types::{Address, U256};

use crate::helpers::node_account;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    #[error("Node query failed: {0}")]
    Query(String),
    #[error("Signer unavailable")]
    Signer,
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error("Malformed event data")]
    Event,
}

/// Signer handed out by [`MockChain`], remembers its sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSigner(pub usize);

/// Receipt of a mocked withdrawal transaction
#[derive(Debug, Clone)]
pub struct MockReceipt {
    pub minipool: Address,
    pub events: Vec<NodeWithdrawal>,
    pub malformed: bool,
}

#[derive(Debug, Default)]
struct MockState {
    withdrawals_enabled: bool,
    withdrawals_query_fails: bool,
    address_lookup_fails: bool,
    minipools: Vec<MinipoolStatus>,
    status_delays: HashMap<Address, Duration>,
    failing_status: HashSet<Address>,
    failing_signer_calls: HashSet<usize>,
    failing_submissions: HashSet<Address>,
    missing_events: HashSet<Address>,
    malformed_events: HashSet<Address>,
    signer_calls: usize,
    status_queries: Vec<Address>,
    submitted: Vec<(MockSigner, Address)>,
}

/// In-memory Rocket Pool network with scriptable failures
#[derive(Debug, Default)]
pub struct MockChain {
    state: Mutex<MockState>,
    in_flight: Arc<AtomicUsize>,
    completed: AtomicUsize,
}

/// Tracks a status query that has started but not finished yet
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        InFlight(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockChain {
    pub fn new() -> Self {
        let chain = MockChain::default();
        chain.lock().withdrawals_enabled = true;
        chain
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_minipool(&self, address: Address, state: MinipoolState, deposit_exists: bool) {
        self.lock().minipools.push(MinipoolStatus {
            address,
            state,
            deposit_exists,
        });
    }

    pub fn set_withdrawals_enabled(&self, enabled: bool) {
        self.lock().withdrawals_enabled = enabled;
    }

    pub fn fail_withdrawals_query(&self) {
        self.lock().withdrawals_query_fails = true;
    }

    pub fn fail_address_lookup(&self) {
        self.lock().address_lookup_fails = true;
    }

    pub fn delay_status(&self, minipool: Address, delay: Duration) {
        self.lock().status_delays.insert(minipool, delay);
    }

    pub fn fail_status(&self, minipool: Address) {
        self.lock().failing_status.insert(minipool);
    }

    /// Fails the n-th (0-based) signer acquisition
    pub fn fail_signer_call(&self, call: usize) {
        self.lock().failing_signer_calls.insert(call);
    }

    pub fn fail_submission(&self, minipool: Address) {
        self.lock().failing_submissions.insert(minipool);
    }

    /// The transaction succeeds, but emits no withdrawal event
    pub fn omit_event(&self, minipool: Address) {
        self.lock().missing_events.insert(minipool);
    }

    /// The transaction succeeds, but its event cannot be decoded
    pub fn malform_event(&self, minipool: Address) {
        self.lock().malformed_events.insert(minipool);
    }

    /// Minipools withdrawn so far, in submission order
    pub fn submitted(&self) -> Vec<Address> {
        self.lock().submitted.iter().map(|(_, a)| *a).collect()
    }

    pub fn signers_used(&self) -> Vec<MockSigner> {
        self.lock().submitted.iter().map(|(s, _)| *s).collect()
    }

    pub fn signer_calls(&self) -> usize {
        self.lock().signer_calls
    }

    /// Status queries started so far, in start order
    pub fn status_queries(&self) -> Vec<Address> {
        self.lock().status_queries.clone()
    }

    /// Status queries that ran to completion
    pub fn completed_status_queries(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Status queries started but neither finished nor dropped
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn status_of(&self, minipool: Address) -> Option<MinipoolStatus> {
        self.lock()
            .minipools
            .iter()
            .find(|s| s.address == minipool)
            .cloned()
    }
}

/// Event the mock emits for a successful withdrawal
pub fn mock_withdrawal(node: Address) -> NodeWithdrawal {
    NodeWithdrawal {
        to: node,
        ether_amount: ether(16),
        staked_token_amount: U256::zero(),
        reward_token_amount: ether(1),
        created_at: Utc
            .timestamp_opt(1_600_000_000, 0)
            .single()
            .unwrap_or_else(Utc::now),
    }
}

#[async_trait]
impl MinipoolChain for MockChain {
    type Signer = MockSigner;
    type Receipt = MockReceipt;
    type Error = MockError;

    async fn withdrawals_enabled(&self) -> Result<bool, MockError> {
        let state = self.lock();
        if state.withdrawals_query_fails {
            return Err(MockError::Query("getWithdrawalAllowed".to_owned()));
        }
        Ok(state.withdrawals_enabled)
    }

    async fn minipool_addresses(&self, _node: Address) -> Result<Vec<Address>, MockError> {
        let state = self.lock();
        if state.address_lookup_fails {
            return Err(MockError::Query("getCount".to_owned()));
        }
        Ok(state.minipools.iter().map(|s| s.address).collect())
    }

    async fn minipool_status(&self, minipool: Address) -> Result<MinipoolStatus, MockError> {
        let _guard = InFlight::enter(&self.in_flight);
        let delay = {
            let mut state = self.lock();
            state.status_queries.push(minipool);
            state.status_delays.get(&minipool).cloned()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let res = {
            let state = self.lock();
            if state.failing_status.contains(&minipool) {
                Err(MockError::Query(format!("getStatus {:?}", minipool)))
            } else {
                state
                    .minipools
                    .iter()
                    .find(|s| s.address == minipool)
                    .cloned()
                    .ok_or_else(|| MockError::Query(format!("no contract at {:?}", minipool)))
            }
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        debug!("Mock status query for {:?} finished", minipool);
        res
    }

    async fn acquire_signer(&self) -> Result<MockSigner, MockError> {
        let mut state = self.lock();
        let call = state.signer_calls;
        state.signer_calls += 1;
        if state.failing_signer_calls.contains(&call) {
            return Err(MockError::Signer);
        }
        Ok(MockSigner(call))
    }

    async fn submit_withdrawal(
        &self,
        signer: &MockSigner,
        minipool: Address,
    ) -> Result<MockReceipt, MockError> {
        let mut state = self.lock();
        if state.failing_submissions.contains(&minipool) {
            return Err(MockError::Rejected(format!("{:?}", minipool)));
        }
        state.submitted.push((*signer, minipool));
        if let Some(status) = state.minipools.iter_mut().find(|s| s.address == minipool) {
            status.deposit_exists = false;
        }
        let events = if state.missing_events.contains(&minipool) {
            vec![]
        } else {
            vec![mock_withdrawal(node_account())]
        };
        Ok(MockReceipt {
            minipool,
            events,
            malformed: state.malformed_events.contains(&minipool),
        })
    }

    fn decode_withdrawal_events(
        &self,
        receipt: &MockReceipt,
        minipool: Address,
    ) -> Result<Vec<NodeWithdrawal>, MockError> {
        if receipt.malformed {
            return Err(MockError::Event);
        }
        if receipt.minipool != minipool {
            return Ok(vec![]);
        }
        Ok(receipt.events.clone())
    }
}
