// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::pacing::{Pacing, pause};
use crate::common::parsing::short_address;
use crate::services::account::AccountContext;
use crate::services::execution::sequencer::{CycleRun, RunState, Sequencer, StepOutcome, Workflow};
use alloy::primitives::Address;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Produces a fresh workflow for each (account, cycle) pair so per-cycle
/// random choices stay inside that cycle.
pub trait WorkflowFactory: Send + Sync {
    fn name(&self) -> &str;
    fn build(&self, account: &AccountContext, cycle: u32) -> Result<Workflow, AppError>;

    /// Cycles each account runs when the operator asked for `requested`.
    fn cycles(&self, requested: u32) -> u32 {
        requested
    }

    /// Replaces the scheduler's between-cycle pause when set.
    fn cycle_pacing(&self) -> Option<Pacing> {
        None
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerPacing {
    pub between_cycles: Pacing,
    pub between_accounts: Pacing,
}

impl SchedulerPacing {
    pub const NONE: SchedulerPacing = SchedulerPacing {
        between_cycles: Pacing::NONE,
        between_accounts: Pacing::NONE,
    };
}

#[derive(Debug, Clone)]
pub struct RunFailure {
    pub account: usize,
    pub address: Address,
    pub cycle: u32,
    pub step: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub workflow: String,
    pub accounts: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub submissions: usize,
    pub failures: Vec<RunFailure>,
}

impl RunSummary {
    fn record(&mut self, run: &CycleRun) {
        self.attempted += 1;
        self.submissions += run.submissions().count();
        if run.succeeded() {
            self.succeeded += 1;
        } else {
            let (step, reason) = run.failure().unwrap_or(("unknown", "run did not complete"));
            self.failures.push(RunFailure {
                account: run.account,
                address: run.address,
                cycle: run.cycle,
                step: step.to_string(),
                reason: reason.to_string(),
            });
        }
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    pub fn log_report(&self) {
        tracing::info!(
            target: "scheduler",
            workflow = %self.workflow,
            accounts = self.accounts,
            attempted = self.attempted,
            succeeded = self.succeeded,
            failed = self.failed(),
            submissions = self.submissions,
            "Run finished"
        );
        for f in &self.failures {
            tracing::warn!(
                target: "scheduler",
                account = f.account,
                address = %short_address(&f.address),
                cycle = f.cycle,
                step = %f.step,
                reason = %f.reason,
                "Cycle failed"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

/// Drives a workflow over every account and cycle, one at a time.
pub struct Scheduler {
    sequencer: Sequencer,
    pacing: SchedulerPacing,
}

impl Scheduler {
    pub fn new(sequencer: Sequencer, pacing: SchedulerPacing) -> Self {
        Self { sequencer, pacing }
    }

    /// Failures stay inside their (account, cycle); nothing escapes this call.
    pub async fn run_all(
        &self,
        accounts: &mut [AccountContext],
        cycle_count: u32,
        factory: &dyn WorkflowFactory,
    ) -> RunSummary {
        let mut summary = RunSummary {
            workflow: factory.name().to_string(),
            accounts: accounts.len(),
            ..Default::default()
        };
        let total = accounts.len();
        let client = self.sequencer.engine().client().clone();
        let cycle_count = factory.cycles(cycle_count);
        let between_cycles = factory
            .cycle_pacing()
            .unwrap_or(self.pacing.between_cycles);

        for (pos, account) in accounts.iter_mut().enumerate() {
            tracing::info!(
                target: "scheduler",
                account = account.index,
                of = total,
                address = %account.identity().short(),
                workflow = %factory.name(),
                "Starting account"
            );
            if let Err(e) = account.refresh_balance(client.as_ref()).await {
                tracing::warn!(target: "scheduler", account = account.index, error = %e, "Balance lookup failed");
            }

            for cycle in 1..=cycle_count {
                let run = self.run_cycle(account, cycle, factory).await;
                summary.record(&run);
                if cycle < cycle_count {
                    pause(&between_cycles, "next cycle").await;
                }
            }

            if pos + 1 < total {
                pause(&self.pacing.between_accounts, "next account").await;
            }
        }

        summary.log_report();
        summary
    }

    async fn run_cycle(
        &self,
        account: &mut AccountContext,
        cycle: u32,
        factory: &dyn WorkflowFactory,
    ) -> CycleRun {
        let workflow = match factory.build(account, cycle) {
            Ok(w) => w,
            Err(e) => {
                tracing::error!(target: "scheduler", account = account.index, cycle, error = %e, "Could not build workflow");
                return CycleRun::failed_before_start(account, factory.name(), cycle, e.to_string());
            }
        };

        let index = account.index;
        let address = account.address();
        let outcome = AssertUnwindSafe(self.sequencer.run(&workflow, account, cycle))
            .catch_unwind()
            .await;
        match outcome {
            Ok(run) => run,
            Err(payload) => {
                let reason = format!("panicked: {}", panic_message(payload.as_ref()));
                tracing::error!(target: "scheduler", account = index, cycle, %reason, "Cycle panicked");
                CycleRun {
                    account: index,
                    address,
                    workflow: workflow.name.clone(),
                    cycle,
                    outcomes: vec![StepOutcome::Failed {
                        step: "unknown".into(),
                        reason,
                    }],
                    state: RunState::Aborted { at: 0 },
                }
            }
        }
    }
}
