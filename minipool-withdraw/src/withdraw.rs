use log::*;
use minipool_api::chain::MinipoolChain;
use minipool_api::domain::{AggregateResult, EarlyExit};
use std::io::Write;
use tokio::io::AsyncBufRead;

use crate::collector::collect_statuses;
use crate::console::Console;
use crate::context::WithdrawContext;
use crate::error::{Error, Result};
use crate::executor::execute_withdrawals;
use crate::gate::withdrawals_enabled;
use crate::selector::{prompt_selection, resolve, withdrawable};

/// Interactive withdrawal of node deposits from the minipools of the context node.
///
/// Returns `Err` only when the operation cannot proceed at all: failed network
/// queries, closed console input or an operator interrupt. Per minipool
/// failures end up in the returned outcomes, see [`ensure_success`].
pub async fn withdraw_minipools<C, R, W>(ctx: &mut WithdrawContext<C, R, W>) -> Result<AggregateResult>
where
    C: MinipoolChain,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if !withdrawals_enabled(&ctx.chain).await? {
        return finish_early(&mut ctx.console, EarlyExit::WithdrawalsDisabled);
    }

    let addresses = ctx
        .chain
        .minipool_addresses(ctx.node_account)
        .await
        .map_err(|e| Error::AddressLookup(Box::new(e)))?;
    debug!(
        "Node {:?} has {} minipools",
        ctx.node_account,
        addresses.len()
    );
    let statuses = collect_statuses(&ctx.chain, &addresses).await?;

    let eligible = withdrawable(&statuses);
    if eligible.is_empty() {
        return finish_early(&mut ctx.console, EarlyExit::NoneAvailable);
    }

    let selection = prompt_selection(&mut ctx.console, &eligible).await?;
    let selected = resolve(&eligible, selection);
    if selected.is_empty() {
        return finish_early(&mut ctx.console, EarlyExit::NoneSelected);
    }
    // Ctrl-C at the prompt cancels the run before any transaction
    if ctx.is_aborted() {
        warn!("Interrupted before withdrawing from {} minipools", selected.len());
        return Err(Error::Aborted);
    }

    info!("Withdrawing from {} minipools", selected.len());
    Ok(execute_withdrawals(&ctx.chain, &mut ctx.console, &selected).await)
}

fn finish_early<R: AsyncBufRead + Unpin, W: Write>(
    console: &mut Console<R, W>,
    exit: EarlyExit,
) -> Result<AggregateResult> {
    info!("Nothing to withdraw: {:?}", exit);
    console.println(&exit.to_string())?;
    Ok(AggregateResult::early(exit))
}

/// Turns any failed outcome into an error carrying the failure report
pub fn ensure_success(result: AggregateResult) -> Result<AggregateResult> {
    match result.failure_report() {
        Some(report) => Err(Error::Withdrawals(report)),
        None => Ok(result),
    }
}
