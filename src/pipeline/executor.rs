// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Workflow executor
//!
//! Runs committed workflow steps strictly in sequence against one run
//! context. The first failing step aborts the run.

use std::time::{Duration, Instant};

use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::{HypoflowError, HypoflowResult};
use crate::pipeline::builder::Workflow;
use crate::pipeline::context::{RunContext, Trigger};
use crate::pipeline::contract::Contract;

/// Hooks for reporting progress while a workflow runs
pub trait RunObserver: Send + Sync {
    fn step_started(&self, _id: &str, _name: &str) {}

    fn step_completed(&self, _id: &str, _name: &str, _elapsed: Duration) {}

    fn step_skipped(&self, _id: &str, _name: &str, _condition: &str) {}

    fn step_failed(&self, _id: &str, _name: &str, _error: &HypoflowError) {}
}

/// Observer that ignores all events
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Skipped,
}

/// Record of a step in a finished run
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub id: String,
    pub name: String,
    pub status: StepStatus,
    pub duration: Duration,
}

/// Result of a successful workflow run
#[derive(Debug)]
pub struct RunResult {
    /// Identifier of this run
    pub run_id: Uuid,
    /// Final run context
    pub context: RunContext,
    /// Per-step records in execution order
    pub steps: Vec<StepRecord>,
    /// Total execution time
    pub duration: Duration,
}

impl RunResult {
    /// Typed output of a step
    pub fn output<T: Contract>(&self, step_id: &str) -> HypoflowResult<T> {
        self.context.get(step_id)
    }

    /// Whether a step was skipped by its gate
    pub fn was_skipped(&self, step_id: &str) -> bool {
        self.steps
            .iter()
            .any(|s| s.id == step_id && s.status == StepStatus::Skipped)
    }

    /// Ids of steps that ran
    pub fn executed(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .map(|s| s.id.as_str())
            .collect()
    }
}

impl Workflow {
    /// Execute the workflow for a trigger
    pub async fn run(&self, trigger: Trigger) -> HypoflowResult<RunResult> {
        self.run_with(trigger, &NoopObserver).await
    }

    /// Execute the workflow, reporting progress to an observer
    pub async fn run_with(
        &self,
        trigger: Trigger,
        observer: &dyn RunObserver,
    ) -> HypoflowResult<RunResult> {
        trigger.validate()?;

        let run_id = Uuid::new_v4();
        let span = info_span!("workflow_run", workflow = %self.name, %run_id);
        self.execute_steps(run_id, trigger, observer)
            .instrument(span)
            .await
    }

    async fn execute_steps(
        &self,
        run_id: Uuid,
        trigger: Trigger,
        observer: &dyn RunObserver,
    ) -> HypoflowResult<RunResult> {
        let start = Instant::now();
        let mut context = RunContext::new(trigger);
        let mut records = Vec::with_capacity(self.entries.len());

        info!(
            goal = %context.trigger().goal,
            steps = self.entries.len(),
            "Starting workflow run"
        );

        for entry in &self.entries {
            let id = entry.step.step_id();
            let name = entry.step.step_name();

            if let Some(condition) = &entry.condition {
                let should_run = condition
                    .evaluate(id, &context)
                    .map_err(|e| self.abort(id, name, e, observer))?;

                if !should_run {
                    info!(step = id, condition = condition.label(), "Skipping gated step");
                    observer.step_skipped(id, name, condition.label());
                    records.push(StepRecord {
                        id: id.to_string(),
                        name: name.to_string(),
                        status: StepStatus::Skipped,
                        duration: Duration::ZERO,
                    });
                    continue;
                }
            }

            observer.step_started(id, name);
            let step_start = Instant::now();

            let output = entry
                .step
                .run(&context, &entry.dependencies)
                .await
                .map_err(|e| self.abort(id, name, e, observer))?;

            context
                .record(id, output)
                .map_err(|e| self.abort(id, name, e, observer))?;

            let elapsed = step_start.elapsed();
            info!(step = id, elapsed_ms = elapsed.as_millis() as u64, "Step completed");
            observer.step_completed(id, name, elapsed);

            records.push(StepRecord {
                id: id.to_string(),
                name: name.to_string(),
                status: StepStatus::Completed,
                duration: elapsed,
            });
        }

        let duration = start.elapsed();
        info!(elapsed_ms = duration.as_millis() as u64, "Workflow run completed");

        Ok(RunResult {
            run_id,
            context,
            steps: records,
            duration,
        })
    }

    fn abort(
        &self,
        id: &str,
        name: &str,
        cause: HypoflowError,
        observer: &dyn RunObserver,
    ) -> HypoflowError {
        let err = HypoflowError::step_failed(id, name, cause);
        error!(step = id, error = %err, "Step failed, aborting run");
        observer.step_failed(id, name, &err);
        err
    }
}
