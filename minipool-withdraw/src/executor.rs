use log::*;
use minipool_api::chain::MinipoolChain;
use minipool_api::domain::{to_checksum, AggregateResult, WithdrawalOutcome};
use minipool_api::error::WithdrawalError;
use std::io::Write;
use tokio::io::AsyncBufRead;
use web3::types::Address;

use crate::console::Console;

/// Withdraws from each minipool in turn. Failures are recorded per address and
/// never stop the loop, so every address gets exactly one outcome.
pub async fn execute_withdrawals<C, R, W>(
    chain: &C,
    console: &mut Console<R, W>,
    minipools: &[Address],
) -> AggregateResult
where
    C: MinipoolChain,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut result = AggregateResult::new();
    for minipool in minipools {
        let outcome = withdraw_deposit(chain, console, *minipool).await;
        match &outcome.result {
            Ok(_) => info!("Withdrew node deposit from minipool {:?}", minipool),
            Err(e) if e.is_confirmed() => warn!(
                "Minipool {:?} was withdrawn, but the amounts are unknown: {}",
                minipool, e
            ),
            Err(e) => error!("Minipool {:?}: {}", minipool, e),
        }
        result.push(outcome);
    }
    result
}

async fn withdraw_deposit<C, R, W>(
    chain: &C,
    console: &mut Console<R, W>,
    minipool: Address,
) -> WithdrawalOutcome
where
    C: MinipoolChain,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let signer = match chain.acquire_signer().await {
        Ok(signer) => signer,
        Err(e) => {
            return WithdrawalOutcome::failure(
                minipool,
                WithdrawalError::SignerAcquisition(e.to_string()),
            )
        }
    };

    report(
        console,
        &format!(
            "Withdrawing deposit from minipool {}...",
            to_checksum(&minipool)
        ),
    );
    let receipt = match chain.submit_withdrawal(&signer, minipool).await {
        Ok(receipt) => receipt,
        Err(e) => {
            return WithdrawalOutcome::failure(minipool, WithdrawalError::Transaction(e.to_string()))
        }
    };

    let event = match chain.decode_withdrawal_events(&receipt, minipool) {
        Ok(events) => events.into_iter().next(),
        Err(e) => {
            return WithdrawalOutcome::failure(minipool, WithdrawalError::EventDecode(e.to_string()))
        }
    };
    match event {
        Some(withdrawal) => {
            report(console, &withdrawal.describe(&minipool));
            WithdrawalOutcome::success(minipool, withdrawal)
        }
        None => WithdrawalOutcome::failure(minipool, WithdrawalError::EventMissing),
    }
}

/// Progress lines are best effort, a broken terminal must not stop the loop
fn report<R: AsyncBufRead + Unpin, W: Write>(console: &mut Console<R, W>, line: &str) {
    if let Err(e) = console.println(line) {
        warn!("Failed to print to console: {}", e);
    }
}
