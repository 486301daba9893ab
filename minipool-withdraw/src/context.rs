use futures::future::AbortHandle;
use log::*;
use std::io::Write;
use tokio::io::AsyncBufRead;
use web3::types::Address;

use crate::console::Console;

/// Everything one withdrawal invocation works with. Passed explicitly to the
/// orchestrator; dropping it flushes the console.
pub struct WithdrawContext<C, R: AsyncBufRead + Unpin, W: Write> {
    pub chain: C,
    /// Node whose minipools are withdrawn
    pub node_account: Address,
    pub console: Console<R, W>,
    /// Operator interrupt, e.g. Ctrl-C
    abort: Option<AbortHandle>,
}

impl<C, R: AsyncBufRead + Unpin, W: Write> WithdrawContext<C, R, W> {
    pub fn new(chain: C, node_account: Address, console: Console<R, W>) -> Self {
        debug!("Opened withdrawal context of node {:?}", node_account);
        WithdrawContext {
            chain,
            node_account,
            console,
            abort: None,
        }
    }

    /// Makes the run stop before sending transactions once `handle` is aborted
    pub fn with_abort(mut self, handle: AbortHandle) -> Self {
        self.abort = Some(handle);
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.as_ref().map_or(false, AbortHandle::is_aborted)
    }
}

impl<C, R: AsyncBufRead + Unpin, W: Write> Drop for WithdrawContext<C, R, W> {
    fn drop(&mut self) {
        if let Err(e) = self.console.flush() {
            error!("Failed to flush console: {}", e);
        }
        debug!("Closed withdrawal context of node {:?}", self.node_account);
    }
}
