
use futures::future::{AbortHandle, Abortable};
use minipool_api::domain::{to_checksum, EarlyExit, MinipoolState, FAILURE_REPORT_HEADER};
use minipool_api::error::WithdrawalError;
use minipool_test::chain::{mock_withdrawal, MockChain, MockSigner};
use minipool_test::helpers::*;
use runner::*;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncRead, BufReader, ReadBuf};
use tokio::time::{sleep, timeout};
use web3::types::Address;

use crate::collector::collect_statuses;
use crate::error::Error;
use crate::selector::{SELECTION_PROMPT, SELECTION_RETRY};
use crate::withdraw::{ensure_success, withdraw_minipools};

use MinipoolState::*;

fn started_line(minipool: &Address) -> String {
    format!("Withdrawing deposit from minipool {}...", to_checksum(minipool))
}

fn success_line(minipool: &Address) -> String {
    mock_withdrawal(node_account()).describe(minipool)
}

#[tokio::test]
async fn test_fresh_minipools_not_withdrawable() {
    run_test("A\n", |mut env| async move {
        fresh_node(env.chain(), 3);
        let res = withdraw_minipools(&mut env.ctx).await.expect("withdraw");
        assert_eq!(res.early_exit, Some(EarlyExit::NoneAvailable));
        assert!(res.outcomes.is_empty());
        assert!(res.is_success());
        assert_eq!(
            env.printed(),
            vec!["No minipools are currently available for withdrawal"]
        );
        assert!(env.chain().submitted().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_withdrawals_disabled() {
    run_test("A\n", |mut env| async move {
        add_minipools(env.chain(), &[Withdrawn, TimedOut]);
        env.chain().set_withdrawals_enabled(false);
        let res = withdraw_minipools(&mut env.ctx).await.expect("withdraw");
        assert_eq!(res.early_exit, Some(EarlyExit::WithdrawalsDisabled));
        assert!(res.outcomes.is_empty());
        assert_eq!(
            env.printed(),
            vec!["Node withdrawals are currently disabled in Rocket Pool"]
        );
        assert!(env.chain().status_queries().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_no_minipools() {
    run_test("", |mut env| async move {
        let res = withdraw_minipools(&mut env.ctx).await.expect("withdraw");
        assert_eq!(res.early_exit, Some(EarlyExit::NoneAvailable));
        assert!(res.outcomes.is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_withdrawals_query_failure() {
    run_test("A\n", |mut env| async move {
        add_minipools(env.chain(), &[Withdrawn]);
        env.chain().fail_withdrawals_query();
        let res = withdraw_minipools(&mut env.ctx).await;
        assert!(matches!(res, Err(Error::NetworkQuery(_))));
        assert!(env.printed().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_address_lookup_failure() {
    run_test("A\n", |mut env| async move {
        add_minipools(env.chain(), &[Withdrawn]);
        env.chain().fail_address_lookup();
        let res = withdraw_minipools(&mut env.ctx).await;
        assert!(matches!(res, Err(Error::AddressLookup(_))));
        assert!(env.chain().submitted().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_status_failure_aborts_before_prompt() {
    run_test("A\n", |mut env| async move {
        let minipools = add_minipools(env.chain(), &[Withdrawn, TimedOut, Withdrawn]);
        env.chain().fail_status(minipools[1]);
        let res = withdraw_minipools(&mut env.ctx).await;
        match res {
            Err(Error::StatusFetch { address, .. }) => assert_eq!(address, minipools[1]),
            other => panic!("Expected status error, got {:?}", other),
        }
        assert!(env.printed().is_empty());
        assert!(env.chain().submitted().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_select_all_excludes_initialized() {
    for input in ["A\n", "a\n", "ALL\n", "all\n"] {
        run_test(input, |mut env| async move {
            let minipools =
                add_minipools(env.chain(), &[Initialized, Withdrawn, Staking, TimedOut]);
            env.chain().add_minipool(minipool_address(10), Withdrawn, false);

            let res = withdraw_minipools(&mut env.ctx).await.expect("withdraw");
            assert!(res.is_success());
            assert_eq!(env.chain().submitted(), vec![minipools[1], minipools[3]]);
            let addresses: Vec<_> = res.outcomes.iter().map(|o| o.address).collect();
            assert_eq!(addresses, vec![minipools[1], minipools[3]]);
            assert!(ensure_success(res).is_ok());

            let printed = env.printed();
            assert_eq!(printed[0], SELECTION_PROMPT);
            assert_eq!(printed[1], format!("1: {} (Initialized)", to_checksum(&minipools[0])));
            assert_eq!(printed[2], format!("2: {} (Withdrawn)", to_checksum(&minipools[1])));
            assert_eq!(printed[3], format!("3: {} (Timed Out)", to_checksum(&minipools[3])));
            assert_eq!(
                printed[4..].to_vec(),
                vec![
                    started_line(&minipools[1]),
                    success_line(&minipools[1]),
                    started_line(&minipools[3]),
                    success_line(&minipools[3]),
                ]
            );
        })
        .await;
    }
}

#[tokio::test]
async fn test_select_single_initialized() {
    run_test("1\n", |mut env| async move {
        let minipools = add_minipools(env.chain(), &[Initialized, Withdrawn]);
        let res = withdraw_minipools(&mut env.ctx).await.expect("withdraw");
        assert_eq!(env.chain().submitted(), vec![minipools[0]]);
        assert_eq!(res.outcomes.len(), 1);
        assert_eq!(
            res.outcomes[0].withdrawal(),
            Some(&mock_withdrawal(node_account()))
        );
    })
    .await;
}

#[tokio::test]
async fn test_all_with_only_initialized() {
    run_test("A\n", |mut env| async move {
        add_minipools(env.chain(), &[Initialized, Staking]);
        let res = withdraw_minipools(&mut env.ctx).await.expect("withdraw");
        assert_eq!(res.early_exit, Some(EarlyExit::NoneSelected));
        assert!(res.outcomes.is_empty());
        assert_eq!(
            env.printed().last().map(String::as_str),
            Some("No minipools to withdraw")
        );
        assert!(env.chain().submitted().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_invalid_input_reprompts() {
    run_test("7\nfoo\n0\n2\n", |mut env| async move {
        let minipools = add_minipools(env.chain(), &[Initialized, Withdrawn, TimedOut]);
        let res = withdraw_minipools(&mut env.ctx).await.expect("withdraw");
        assert_eq!(env.chain().submitted(), vec![minipools[1]]);
        assert_eq!(res.outcomes.len(), 1);
        let retries = env
            .printed()
            .iter()
            .filter(|l| l.as_str() == SELECTION_RETRY)
            .count();
        assert_eq!(retries, 3);
    })
    .await;
}

#[tokio::test]
async fn test_closed_input() {
    run_test("nope\n", |mut env| async move {
        add_minipools(env.chain(), &[Withdrawn]);
        let res = withdraw_minipools(&mut env.ctx).await;
        assert!(matches!(res, Err(Error::InputClosed)));
        assert!(env.chain().submitted().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_transaction_failure_continues() {
    run_test("A\n", |mut env| async move {
        let minipools = add_minipools(env.chain(), &[Withdrawn, TimedOut]);
        env.chain().fail_submission(minipools[0]);
        let res = withdraw_minipools(&mut env.ctx).await.expect("withdraw");

        assert_eq!(res.outcomes.len(), 2);
        assert_eq!(res.outcomes[0].address, minipools[0]);
        assert!(matches!(
            res.outcomes[0].error(),
            Some(WithdrawalError::Transaction(_))
        ));
        assert!(res.outcomes[1].is_ok());
        assert!(!res.is_success());
        assert_eq!(env.chain().submitted(), vec![minipools[1]]);

        match ensure_success(res) {
            Err(Error::Withdrawals(report)) => {
                let lines: Vec<&str> = report.lines().collect();
                assert_eq!(lines.len(), 2);
                assert_eq!(lines[0], FAILURE_REPORT_HEADER);
                assert!(lines[1].contains(&to_checksum(&minipools[0])));
            }
            other => panic!("Expected failure report, got {:?}", other),
        }
    })
    .await;
}

#[tokio::test]
async fn test_signer_failure_continues() {
    run_test("A\n", |mut env| async move {
        let minipools = add_minipools(env.chain(), &[Withdrawn, Withdrawn, TimedOut]);
        env.chain().fail_signer_call(0);
        let res = withdraw_minipools(&mut env.ctx).await.expect("withdraw");

        assert!(matches!(
            res.outcomes[0].error(),
            Some(WithdrawalError::SignerAcquisition(_))
        ));
        assert!(res.outcomes[1].is_ok());
        assert!(res.outcomes[2].is_ok());
        assert_eq!(env.chain().signer_calls(), 3);
        assert_eq!(env.chain().submitted(), vec![minipools[1], minipools[2]]);
        assert_eq!(
            env.chain().signers_used(),
            vec![MockSigner(1), MockSigner(2)]
        );
        let started = started_line(&minipools[0]);
        assert!(!env.printed().contains(&started));
    })
    .await;
}

#[tokio::test]
async fn test_event_failures_are_recorded() {
    run_test("A\n", |mut env| async move {
        let minipools = add_minipools(env.chain(), &[Withdrawn, Withdrawn, Withdrawn]);
        env.chain().omit_event(minipools[0]);
        env.chain().malform_event(minipools[1]);
        let res = withdraw_minipools(&mut env.ctx).await.expect("withdraw");

        assert_eq!(env.chain().submitted(), minipools);
        let missing = res.outcomes[0].error().expect("missing event");
        assert_eq!(missing, &WithdrawalError::EventMissing);
        assert!(missing.is_confirmed());
        let malformed = res.outcomes[1].error().expect("malformed event");
        assert!(matches!(malformed, WithdrawalError::EventDecode(_)));
        assert!(malformed.is_confirmed());
        assert!(res.outcomes[2].is_ok());
        assert_eq!(res.failures().count(), 2);
    })
    .await;
}

#[tokio::test]
async fn test_withdrawn_deposit_not_offered_again() {
    run_test("A\n", |mut env| async move {
        let minipools = add_minipools(env.chain(), &[Withdrawn, TimedOut]);
        withdraw_minipools(&mut env.ctx).await.expect("withdraw");
        for minipool in &minipools {
            let status = env.chain().status_of(*minipool).expect("known minipool");
            assert!(!status.deposit_exists);
        }

        let res = withdraw_minipools(&mut env.ctx).await.expect("second run");
        assert_eq!(res.early_exit, Some(EarlyExit::NoneAvailable));
    })
    .await;
}

#[tokio::test]
async fn test_collect_keeps_input_order() {
    run_test("", |env| async move {
        let minipools = add_minipools(env.chain(), &[Withdrawn, Staking, TimedOut]);
        env.chain().delay_status(minipools[0], Duration::from_millis(60));
        env.chain().delay_status(minipools[1], Duration::from_millis(30));
        let statuses = collect_statuses(env.chain(), &minipools)
            .await
            .expect("statuses");
        let addresses: Vec<_> = statuses.iter().map(|s| s.address).collect();
        assert_eq!(addresses, minipools);
        assert_eq!(statuses[1].state, Staking);
        assert_eq!(env.chain().completed_status_queries(), 3);
    })
    .await;
}

#[tokio::test]
async fn test_collect_runs_queries_concurrently() {
    run_test("", |env| async move {
        let states = vec![Withdrawn; 5];
        let minipools = add_minipools(env.chain(), &states);
        for minipool in &minipools {
            env.chain().delay_status(*minipool, Duration::from_millis(300));
        }
        let statuses = timeout(
            Duration::from_millis(1000),
            collect_statuses(env.chain(), &minipools),
        )
        .await
        .expect("queries should overlap")
        .expect("statuses");
        assert_eq!(statuses.len(), 5);
    })
    .await;
}

#[tokio::test]
async fn test_collect_cancels_on_failure() {
    run_test("", |env| async move {
        let minipools = add_minipools(env.chain(), &[Withdrawn, TimedOut, Withdrawn]);
        env.chain().fail_status(minipools[1]);
        env.chain().delay_status(minipools[2], Duration::from_secs(30));
        let res = timeout(
            Duration::from_secs(5),
            collect_statuses(env.chain(), &minipools),
        )
        .await
        .expect("failure should not wait for slow queries");
        match res {
            Err(Error::StatusFetch { address, .. }) => assert_eq!(address, minipools[1]),
            other => panic!("Expected status error, got {:?}", other),
        }
        assert_eq!(env.chain().in_flight(), 0);
        assert!(env.chain().completed_status_queries() < 3);
    })
    .await;
}

#[tokio::test]
async fn test_collect_empty() {
    let chain = MockChain::new();
    let statuses = collect_statuses(&chain, &[]).await.expect("statuses");
    assert!(statuses.is_empty());
    assert!(chain.status_queries().is_empty());
}

#[tokio::test]
async fn test_collect_is_idempotent() {
    run_test("", |env| async move {
        let minipools = add_minipools(env.chain(), &[Initialized, Prelaunch, LoggedOut]);
        let first = collect_statuses(env.chain(), &minipools)
            .await
            .expect("first");
        let second = collect_statuses(env.chain(), &minipools)
            .await
            .expect("second");
        assert_eq!(first, second);
    })
    .await;
}

/// Operator input that presses Ctrl-C while the line is being typed
struct InterruptedInput {
    abort: AbortHandle,
    line: Cursor<Vec<u8>>,
}

impl AsyncRead for InterruptedInput {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().line).poll_read(cx, buf)
    }
}

impl AsyncBufRead for InterruptedInput {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        let this = self.get_mut();
        this.abort.abort();
        Pin::new(&mut this.line).poll_fill_buf(cx)
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        Pin::new(&mut self.get_mut().line).consume(amt)
    }
}

#[tokio::test]
async fn test_interrupt_at_prompt_sends_nothing() {
    minipool_test::runner::run_test(|mock| async move {
        let (abort, registration) = AbortHandle::new_pair();
        let input = InterruptedInput {
            abort: abort.clone(),
            line: Cursor::new(b"A\n".to_vec()),
        };
        let mut ctx = context(mock, input).with_abort(abort);
        add_minipools(&ctx.chain, &[Withdrawn, TimedOut]);

        let res = Abortable::new(withdraw_minipools(&mut ctx), registration).await;
        assert!(
            matches!(res, Err(_) | Ok(Err(Error::Aborted))),
            "Expected an aborted run, got {:?}",
            res
        );
        assert!(ctx.chain.submitted().is_empty());
        assert_eq!(ctx.chain.signer_calls(), 0);
    })
    .await;
}

#[tokio::test]
async fn test_abort_while_waiting_for_input() {
    minipool_test::runner::run_test(|mock| async move {
        let (_operator, terminal) = tokio::io::duplex(64);
        let (abort, registration) = AbortHandle::new_pair();
        let mut ctx = context(mock, BufReader::new(terminal)).with_abort(abort.clone());
        add_minipools(&ctx.chain, &[Withdrawn, TimedOut]);

        let press_ctrl_c = async {
            sleep(Duration::from_millis(50)).await;
            abort.abort();
        };
        let run = timeout(
            Duration::from_secs(5),
            Abortable::new(withdraw_minipools(&mut ctx), registration),
        );
        let (res, _) = tokio::join!(run, press_ctrl_c);
        let res = res.expect("prompt should yield to the interrupt");
        assert!(res.is_err(), "Expected an aborted run, got {:?}", res);

        assert!(ctx.chain.submitted().is_empty());
        assert_eq!(printed(&ctx)[0], SELECTION_PROMPT);
    })
    .await;
}
