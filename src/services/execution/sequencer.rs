// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::pacing::{Pacing, pause};
use crate::common::units::AmountRange;
use crate::services::account::AccountContext;
use crate::services::execution::builder::ActionDescriptor;
use crate::services::execution::submission::{SubmissionEngine, SubmissionResult, TxStatus};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Where a step's amount comes from.
#[derive(Debug, Clone)]
pub enum AmountSource {
    None,
    Fixed(U256),
    Random(AmountRange),
    /// Exactly the amount an earlier step in the same run used.
    FromStep(String),
}

/// Read-only view handed to a step when it turns into a transaction.
pub struct StepContext<'a> {
    pub account: &'a AccountContext,
    pub cycle: u32,
    pub amount: U256,
    pub outputs: &'a HashMap<String, U256>,
}

impl StepContext<'_> {
    pub fn address(&self) -> Address {
        self.account.address()
    }
}

#[derive(Debug)]
pub enum Prepared {
    Submit(ActionDescriptor),
    /// Nothing to do this run; not a failure.
    Skip(String),
}

#[async_trait]
pub trait StepAction: Send + Sync {
    async fn prepare(&self, ctx: &StepContext<'_>) -> Result<Prepared, AppError>;
}

/// Steps that are a fixed descriptor with the resolved amount plugged in.
pub struct FnAction<F>(pub F);

#[async_trait]
impl<F> StepAction for FnAction<F>
where
    F: Fn(&StepContext<'_>) -> Result<ActionDescriptor, AppError> + Send + Sync,
{
    async fn prepare(&self, ctx: &StepContext<'_>) -> Result<Prepared, AppError> {
        (self.0)(ctx).map(Prepared::Submit)
    }
}

pub enum StepKind {
    Submit {
        amount: AmountSource,
        action: Arc<dyn StepAction>,
    },
    /// Settlement delay required before the next step can succeed.
    Wait(Pacing),
}

pub struct WorkflowStep {
    pub name: String,
    pub kind: StepKind,
}

impl WorkflowStep {
    pub fn submit(name: impl Into<String>, amount: AmountSource, action: impl StepAction + 'static) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::Submit {
                amount,
                action: Arc::new(action),
            },
        }
    }

    pub fn call<F>(name: impl Into<String>, amount: AmountSource, build: F) -> Self
    where
        F: Fn(&StepContext<'_>) -> Result<ActionDescriptor, AppError> + Send + Sync + 'static,
    {
        Self::submit(name, amount, FnAction(build))
    }

    pub fn wait(name: impl Into<String>, pacing: Pacing) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::Wait(pacing),
        }
    }
}

pub struct Workflow {
    pub name: String,
    pub steps: Vec<WorkflowStep>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn submissions(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.kind, StepKind::Submit { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(usize),
    Completed,
    Aborted { at: usize },
}

#[derive(Debug, Clone)]
pub enum StepOutcome {
    Submitted {
        step: String,
        amount: U256,
        result: SubmissionResult,
    },
    Skipped {
        step: String,
        reason: String,
    },
    Waited {
        step: String,
        waited: Duration,
    },
    Failed {
        step: String,
        reason: String,
    },
}

impl StepOutcome {
    pub fn step(&self) -> &str {
        match self {
            StepOutcome::Submitted { step, .. }
            | StepOutcome::Skipped { step, .. }
            | StepOutcome::Waited { step, .. }
            | StepOutcome::Failed { step, .. } => step,
        }
    }
}

/// Outcome of one workflow for one account in one cycle.
#[derive(Debug, Clone)]
pub struct CycleRun {
    pub account: usize,
    pub address: Address,
    pub workflow: String,
    pub cycle: u32,
    pub outcomes: Vec<StepOutcome>,
    pub state: RunState,
}

impl CycleRun {
    pub fn new(account: &AccountContext, workflow: &str, cycle: u32) -> Self {
        Self {
            account: account.index,
            address: account.address(),
            workflow: workflow.to_string(),
            cycle,
            outcomes: Vec::new(),
            state: RunState::Idle,
        }
    }

    /// A run that never got to its first step.
    pub fn failed_before_start(
        account: &AccountContext,
        workflow: &str,
        cycle: u32,
        reason: String,
    ) -> Self {
        let mut run = Self::new(account, workflow, cycle);
        run.outcomes.push(StepOutcome::Failed {
            step: "setup".into(),
            reason,
        });
        run.state = RunState::Aborted { at: 0 };
        run
    }

    pub fn succeeded(&self) -> bool {
        self.state == RunState::Completed
    }

    pub fn submissions(&self) -> impl Iterator<Item = &SubmissionResult> {
        self.outcomes.iter().filter_map(|o| match o {
            StepOutcome::Submitted { result, .. } => Some(result),
            _ => None,
        })
    }

    pub fn failure(&self) -> Option<(&str, &str)> {
        self.outcomes.iter().find_map(|o| match o {
            StepOutcome::Failed { step, reason } => Some((step.as_str(), reason.as_str())),
            _ => None,
        })
    }

    fn abort(&mut self, at: usize, step: &str, reason: String) {
        tracing::error!(
            target: "workflow",
            account = self.account,
            workflow = %self.workflow,
            cycle = self.cycle,
            step,
            %reason,
            "Step failed; aborting run"
        );
        self.outcomes.push(StepOutcome::Failed {
            step: step.to_string(),
            reason,
        });
        self.state = RunState::Aborted { at };
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Running(i) => write!(f, "running step {}", i + 1),
            RunState::Completed => f.write_str("completed"),
            RunState::Aborted { at } => write!(f, "aborted at step {}", at + 1),
        }
    }
}

fn resolve_amount(
    source: &AmountSource,
    outputs: &HashMap<String, U256>,
) -> Result<U256, AppError> {
    match source {
        AmountSource::None => Ok(U256::ZERO),
        AmountSource::Fixed(v) => Ok(*v),
        AmountSource::Random(range) => range.sample(),
        AmountSource::FromStep(name) => outputs.get(name).copied().ok_or_else(|| {
            AppError::validation("amount", format!("step '{name}' produced no amount"))
        }),
    }
}

/// Runs a workflow's steps in order for one account.
#[derive(Clone)]
pub struct Sequencer {
    engine: Arc<SubmissionEngine>,
}

impl Sequencer {
    pub fn new(engine: Arc<SubmissionEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<SubmissionEngine> {
        &self.engine
    }

    /// Never re-attempts an earlier step: the first failure ends the run.
    pub async fn run(
        &self,
        workflow: &Workflow,
        account: &mut AccountContext,
        cycle: u32,
    ) -> CycleRun {
        let mut run = CycleRun::new(account, &workflow.name, cycle);
        let mut outputs: HashMap<String, U256> = HashMap::new();
        let total = workflow.steps.len();

        for (idx, step) in workflow.steps.iter().enumerate() {
            run.state = RunState::Running(idx);
            match &step.kind {
                StepKind::Wait(pacing) => {
                    let waited = pause(pacing, &step.name).await;
                    run.outcomes.push(StepOutcome::Waited {
                        step: step.name.clone(),
                        waited,
                    });
                }
                StepKind::Submit { amount, action } => {
                    let amount = match resolve_amount(amount, &outputs) {
                        Ok(v) => v,
                        Err(e) => {
                            run.abort(idx, &step.name, e.to_string());
                            return run;
                        }
                    };
                    tracing::info!(
                        target: "workflow",
                        account = account.index,
                        workflow = %workflow.name,
                        cycle,
                        step = %step.name,
                        position = format!("{}/{}", idx + 1, total),
                        "Running step"
                    );

                    let prepared = {
                        let ctx = StepContext {
                            account,
                            cycle,
                            amount,
                            outputs: &outputs,
                        };
                        action.prepare(&ctx).await
                    };
                    let descriptor = match prepared {
                        Ok(Prepared::Submit(d)) => d,
                        Ok(Prepared::Skip(reason)) => {
                            tracing::info!(target: "workflow", step = %step.name, %reason, "Step skipped");
                            run.outcomes.push(StepOutcome::Skipped {
                                step: step.name.clone(),
                                reason,
                            });
                            continue;
                        }
                        Err(e) => {
                            run.abort(idx, &step.name, e.to_string());
                            return run;
                        }
                    };

                    match self.engine.submit(account.identity(), &descriptor).await {
                        Ok(result) if result.status == TxStatus::Confirmed => {
                            account.record_nonce(result.request.nonce);
                            outputs.insert(step.name.clone(), amount);
                            run.outcomes.push(StepOutcome::Submitted {
                                step: step.name.clone(),
                                amount,
                                result,
                            });
                        }
                        Ok(result) => {
                            account.record_nonce(result.request.nonce);
                            let err = AppError::ContractReverted {
                                action: descriptor.label.clone(),
                                hash: format!("{:#x}", result.hash),
                                link: self.engine.explorer_link(&result.hash),
                            };
                            run.outcomes.push(StepOutcome::Submitted {
                                step: step.name.clone(),
                                amount,
                                result,
                            });
                            run.abort(idx, &step.name, err.to_string());
                            return run;
                        }
                        Err(e) => {
                            run.abort(idx, &step.name, e.to_string());
                            return run;
                        }
                    }
                }
            }
        }

        run.state = RunState::Completed;
        tracing::info!(
            target: "workflow",
            account = account.index,
            workflow = %workflow.name,
            cycle,
            "Workflow completed"
        );
        run
    }
}
