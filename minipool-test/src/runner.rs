use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use web3::types::Address;

use crate::chain::MockChain;
use crate::helpers::node_account;

pub struct TestEnv {
    pub chain: MockChain,
    pub node: Address,
}

impl TestEnv {
    pub fn new() -> Self {
        TestEnv {
            chain: MockChain::new(),
            node: node_account(),
        }
    }
}

pub async fn run_test<F, Fut>(test_body: F)
where
    F: FnOnce(TestEnv) -> Fut,
    Fut: Future<Output = ()>,
{
    let _ = env_logger::builder().is_test(true).try_init();
    let res = AssertUnwindSafe(test_body(TestEnv::new()))
        .catch_unwind()
        .await;
    assert!(res.is_ok());
}
