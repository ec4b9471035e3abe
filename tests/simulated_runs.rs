// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::sol_types::SolValue;
use oxidity_cycler::common::error::AppError;
use oxidity_cycler::common::pacing::Pacing;
use oxidity_cycler::common::retry::RetryPolicy;
use oxidity_cycler::common::units::native_to_wei;
use oxidity_cycler::domain::constants::{MAGMA_STAKE_SELECTOR, MAGMA_STAKING, MAGMA_UNSTAKE_SELECTOR};
use oxidity_cycler::network::gas::{FeeModel, GasOracle};
use oxidity_cycler::network::provider::ChainClient;
use oxidity_cycler::network::simulated::{Fault, SimulatedChain};
use oxidity_cycler::services::account::{AccountContext, Identity};
use oxidity_cycler::services::execution::builder::{ActionDescriptor, TransactionBuilder};
use oxidity_cycler::services::execution::scheduler::{Scheduler, SchedulerPacing, WorkflowFactory};
use oxidity_cycler::services::execution::sequencer::{
    AmountSource, RunState, Sequencer, StepContext, Workflow, WorkflowStep,
};
use oxidity_cycler::services::execution::submission::{
    SubmissionConfig, SubmissionEngine, TxStatus,
};
use oxidity_cycler::services::protocols::deploy::Deploy;
use oxidity_cycler::services::protocols::magma::Magma;
use oxidity_cycler::services::protocols::{TransferMode, TransferPlan, transfer::Transfer};
use std::sync::Arc;
use std::time::Duration;

fn engine(chain: &Arc<SimulatedChain>, attempts: u32) -> Arc<SubmissionEngine> {
    let client: Arc<dyn ChainClient> = chain.clone();
    let gas = GasOracle::new(client.clone(), 2);
    let builder = TransactionBuilder::new(client.clone(), gas, 10143);
    let config = SubmissionConfig {
        retry: RetryPolicy::immediate(attempts),
        poll_interval: Duration::from_millis(10),
        receipt_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    Arc::new(SubmissionEngine::new(client, builder, config))
}

fn accounts(n: usize) -> Vec<AccountContext> {
    (1..=n)
        .map(|i| AccountContext::new(i, Identity::random()))
        .collect()
}

fn ping(to: Address) -> ActionDescriptor {
    ActionDescriptor::call("ping", to, Bytes::new(), 21_000)
}

#[tokio::test]
async fn two_failures_then_success_rebuilds_each_attempt() {
    let chain = Arc::new(SimulatedChain::default());
    chain.set_gas_price_step(1_000_000_000);
    chain.push_fault(Fault::BroadcastUnavailable);
    chain.push_fault(Fault::Rejected);
    let identity = Identity::random();

    let result = engine(&chain, 3)
        .submit(&identity, &ping(Address::repeat_byte(9)))
        .await
        .unwrap();

    assert_eq!(result.status, TxStatus::Confirmed);
    assert_eq!(result.attempts, 3);

    let sent = chain.broadcasts();
    assert_eq!(sent.len(), 3);
    assert!(sent.windows(2).all(|w| w[0].fee_cap < w[1].fee_cap));
    assert!(sent.windows(2).all(|w| w[0].hash != w[1].hash));
    assert_eq!(chain.nonce_queries(), 3);
    assert_eq!(chain.accepted().len(), 1);
    assert_eq!(chain.nonce_of(identity.address()), 1);
}

#[tokio::test]
async fn exhausted_budget_reports_last_error() {
    let chain = Arc::new(SimulatedChain::default());
    for _ in 0..3 {
        chain.push_fault(Fault::RateLimited);
    }

    let err = engine(&chain, 3)
        .submit(&Identity::random(), &ping(Address::repeat_byte(9)))
        .await
        .unwrap_err();

    match err {
        AppError::SubmissionExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert!(last.is_rate_limited());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(chain.broadcasts().len(), 3);
}

#[tokio::test]
async fn revert_is_terminal_and_not_retried() {
    let chain = Arc::new(SimulatedChain::default());
    chain.push_fault(Fault::Revert);

    let result = engine(&chain, 5)
        .submit(&Identity::random(), &ping(Address::repeat_byte(9)))
        .await
        .unwrap();

    assert_eq!(result.status, TxStatus::Reverted);
    assert_eq!(result.attempts, 1);
    assert_eq!(chain.broadcasts().len(), 1);
}

#[tokio::test]
async fn eip1559_requests_carry_tip_and_cap() {
    let chain = Arc::new(SimulatedChain::default());
    let action = ping(Address::repeat_byte(3)).with_fee_model(FeeModel::Eip1559);

    engine(&chain, 1)
        .submit(&Identity::random(), &action)
        .await
        .unwrap();

    let tx = &chain.accepted()[0];
    let tip = tx.priority_fee.unwrap();
    assert_eq!(tip, 2_000_000_000);
    assert!(tx.fee_cap >= tip + 50_000_000_000);
}

#[tokio::test]
async fn magma_cycle_unstakes_exactly_what_it_staked() {
    let chain = Arc::new(SimulatedChain::default());
    let mut accts = accounts(1);
    chain.fund(accts[0].address(), native_to_wei("1").unwrap());
    let scheduler = Scheduler::new(Sequencer::new(engine(&chain, 3)), SchedulerPacing::NONE);

    let summary = scheduler
        .run_all(&mut accts, 1, &Magma::new(Pacing::NONE))
        .await;

    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.submissions, 2);

    let sent = chain.accepted();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, TxKind::Call(MAGMA_STAKING));
    assert_eq!(sent[0].selector(), Some(MAGMA_STAKE_SELECTOR));
    assert_eq!(sent[1].selector(), Some(MAGMA_UNSTAKE_SELECTOR));
    let unstaked = U256::abi_decode(&sent[1].input[4..]).unwrap();
    assert_eq!(unstaked, sent[0].value);
    assert!(sent[0].value >= native_to_wei("0.01").unwrap());
    assert!(sent[0].value <= native_to_wei("0.05").unwrap());
    assert_eq!(sent[1].nonce, sent[0].nonce + 1);
}

/// Every account pings itself; one account cannot prepare its step.
struct OneBadAccount {
    bad: usize,
}

impl WorkflowFactory for OneBadAccount {
    fn name(&self) -> &str {
        "ping"
    }

    fn build(&self, account: &AccountContext, _cycle: u32) -> Result<Workflow, AppError> {
        let bad = account.index == self.bad;
        Ok(Workflow::new("ping").step(WorkflowStep::call(
            "ping",
            AmountSource::None,
            move |ctx: &StepContext<'_>| {
                if bad {
                    return Err(AppError::validation("amount", "insufficient balance"));
                }
                Ok(ping(ctx.address()))
            },
        )))
    }
}

#[tokio::test]
async fn failing_account_does_not_stop_the_others() {
    let chain = Arc::new(SimulatedChain::default());
    let mut accts = accounts(3);
    let scheduler = Scheduler::new(Sequencer::new(engine(&chain, 2)), SchedulerPacing::NONE);

    let summary = scheduler
        .run_all(&mut accts, 2, &OneBadAccount { bad: 2 })
        .await;

    assert_eq!(summary.attempted, 6);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed(), 2);
    assert!(summary.failures.iter().all(|f| f.account == 2 && f.step == "ping"));
    assert_eq!(chain.nonce_of(accts[0].address()), 2);
    assert_eq!(chain.nonce_of(accts[1].address()), 0);
    assert_eq!(chain.nonce_of(accts[2].address()), 2);
    assert_eq!(accts[0].last_nonce(), Some(1));
}

#[tokio::test]
async fn reverted_step_aborts_the_rest_of_the_cycle() {
    let chain = Arc::new(SimulatedChain::default());
    chain.push_fault(Fault::Revert);
    let mut accts = accounts(1);
    chain.fund(accts[0].address(), native_to_wei("1").unwrap());
    let sequencer = Sequencer::new(engine(&chain, 3));

    let run = sequencer
        .run(
            &Magma::new(Pacing::NONE).build(&accts[0], 1).unwrap(),
            &mut accts[0],
            1,
        )
        .await;

    assert!(matches!(run.state, RunState::Aborted { at: 0 }));
    assert_eq!(chain.broadcasts().len(), 1);
    let (step, reason) = run.failure().unwrap();
    assert_eq!(step, "stake");
    assert!(reason.contains("reverted"));
}

#[tokio::test]
async fn listed_transfers_reach_every_recipient() {
    let chain = Arc::new(SimulatedChain::default());
    let recipients = vec![Address::repeat_byte(0x11), Address::repeat_byte(0x22)];
    let plan = TransferPlan {
        amount: native_to_wei("0.5").unwrap(),
        mode: TransferMode::List(recipients.clone()),
    };
    let mut accts = accounts(1);
    chain.fund(accts[0].address(), native_to_wei("10").unwrap());
    let scheduler = Scheduler::new(Sequencer::new(engine(&chain, 1)), SchedulerPacing::NONE);

    let summary = scheduler
        .run_all(&mut accts, 1, &Transfer::new(plan, Pacing::NONE))
        .await;

    assert_eq!(summary.submissions, 2);
    for to in recipients {
        assert_eq!(chain.balance(to).await.unwrap(), native_to_wei("0.5").unwrap());
    }
    assert_eq!(accts[0].balance(), Some(native_to_wei("10").unwrap()));
}

#[tokio::test]
async fn reverted_transfer_does_not_skip_later_recipients() {
    let chain = Arc::new(SimulatedChain::default());
    chain.push_fault(Fault::Revert);
    let recipients: Vec<Address> = [0x31, 0x32, 0x33].map(Address::repeat_byte).to_vec();
    let amount = native_to_wei("0.1").unwrap();
    let plan = TransferPlan {
        amount,
        mode: TransferMode::List(recipients.clone()),
    };
    let mut accts = accounts(1);
    chain.fund(accts[0].address(), native_to_wei("10").unwrap());
    let scheduler = Scheduler::new(Sequencer::new(engine(&chain, 3)), SchedulerPacing::NONE);

    let summary = scheduler
        .run_all(&mut accts, 1, &Transfer::new(plan, Pacing::NONE))
        .await;

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].cycle, 1);
    assert_eq!(chain.balance(recipients[0]).await.unwrap(), U256::ZERO);
    assert_eq!(chain.balance(recipients[1]).await.unwrap(), amount);
    assert_eq!(chain.balance(recipients[2]).await.unwrap(), amount);
}

#[tokio::test]
async fn underfunded_account_fails_fast_and_others_continue() {
    let chain = Arc::new(SimulatedChain::default());
    let mut accts = accounts(2);
    chain.fund(accts[1].address(), native_to_wei("1").unwrap());
    let plan = TransferPlan {
        amount: native_to_wei("0.5").unwrap(),
        mode: TransferMode::List(vec![Address::repeat_byte(0x44)]),
    };
    let scheduler = Scheduler::new(Sequencer::new(engine(&chain, 3)), SchedulerPacing::NONE);

    let summary = scheduler
        .run_all(&mut accts, 1, &Transfer::new(plan, Pacing::NONE))
        .await;

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failures[0].account, 1);
    assert!(summary.failures[0].reason.contains("insufficient balance"));
    assert_eq!(chain.broadcasts().len(), 1);
    assert_eq!(chain.nonce_of(accts[1].address()), 1);
}

#[tokio::test]
async fn deploy_reports_contract_address() {
    let chain = Arc::new(SimulatedChain::default());
    let mut accts = accounts(1);
    let deployer = accts[0].address();
    let sequencer = Sequencer::new(engine(&chain, 1));

    let workflow = Deploy::new(None).build(&accts[0], 1).unwrap();
    let run = sequencer.run(&workflow, &mut accts[0], 1).await;

    assert!(run.succeeded());
    let result = run.submissions().next().unwrap();
    assert_eq!(result.contract_address, Some(deployer.create(0)));
    assert_eq!(chain.accepted()[0].to, TxKind::Create);
}
