//! Month scheduler - ties wall-clock time to task generation and settlement.
//!
//! Each month runs `Active` until its end time, then briefly `Closing` while
//! the summary is taken, then the next month starts `Active`. Per clock tick
//! the scheduler, in order:
//!
//! 1. closes the month once `now >= started_at + duration`, and stops there
//! 2. applies a staged generation result, if one arrived for this month
//! 3. requests a task set if none has been installed or requested yet
//! 4. sweeps expired tasks
//!
//! Generation never blocks: the request runs on an [`Executor`] and its
//! result is picked up by a later tick. Failure, timeout, a dead worker or an
//! unusable payload all install the fixed fallback list instead.

use std::sync::Arc;

use penny_logic::config::GameConfig;
use penny_logic::generation::{
    fallback_tasks, normalize_definitions, CollaboratorError, Difficulty, GenerationRequest,
    TaskDefinition,
};
use penny_logic::ledger::Ledger;
use penny_logic::month::{summarize, MonthEpoch, MonthSummary, SummaryHistory};
use penny_logic::tasks::{ExpiredTask, Task, TaskRegistry};
use penny_logic::time::Millis;
use serde::{Deserialize, Serialize};

use crate::generator::TaskGenerator;
use crate::staging::{dispatch, Executor, Poll, Staged};

type GenerationResult = Result<Vec<TaskDefinition>, CollaboratorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpochPhase {
    Active,
    Closing,
}

/// Where the current month's tasks came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskSource {
    Generated,
    Fallback,
}

/// A task set that was just handed to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub month_index: u32,
    pub source: TaskSource,
    pub count: usize,
}

/// What happened during one scheduler tick.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub installed: Option<Installed>,
    pub expired: Vec<ExpiredTask>,
    pub closed: Option<MonthSummary>,
}

/// Result of closing a month.
#[derive(Debug, Clone)]
pub struct EpochClose {
    pub summary: MonthSummary,
    /// Tasks failed by the final sweep.
    pub expired: Vec<ExpiredTask>,
}

/// Scheduler state that survives a save/load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerState {
    pub epoch: MonthEpoch,
    pub generated_for: Option<u32>,
    pub source: Option<TaskSource>,
    pub history: SummaryHistory,
}

pub struct MonthScheduler {
    epoch: MonthEpoch,
    phase: EpochPhase,
    /// Month whose task set has been installed.
    generated_for: Option<u32>,
    source: Option<TaskSource>,
    pending: Option<Staged<GenerationResult>>,
    history: SummaryHistory,
    generator: Arc<dyn TaskGenerator>,
    difficulty: Difficulty,
    max_generated_tasks: usize,
    generation_timeout_ms: Millis,
}

impl MonthScheduler {
    /// Start month 1 at `now`.
    pub fn new(config: &GameConfig, generator: Arc<dyn TaskGenerator>, now: Millis) -> Self {
        Self {
            epoch: MonthEpoch::first(now, config.month_duration_ms),
            phase: EpochPhase::Active,
            generated_for: None,
            source: None,
            pending: None,
            history: SummaryHistory::new(config.summary_capacity),
            generator,
            difficulty: config.difficulty,
            max_generated_tasks: config.max_generated_tasks,
            generation_timeout_ms: config.generation_timeout_ms,
        }
    }

    pub fn epoch(&self) -> &MonthEpoch {
        &self.epoch
    }

    pub fn month_index(&self) -> u32 {
        self.epoch.month_index
    }

    pub fn phase(&self) -> EpochPhase {
        self.phase
    }

    pub fn history(&self) -> &SummaryHistory {
        &self.history
    }

    pub fn is_generation_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Where the current month's tasks came from, once installed.
    pub fn task_source(&self) -> Option<TaskSource> {
        match self.generated_for {
            Some(m) if m == self.epoch.month_index => self.source,
            _ => None,
        }
    }

    pub fn generator(&self) -> Arc<dyn TaskGenerator> {
        Arc::clone(&self.generator)
    }

    pub fn set_generator(&mut self, generator: Arc<dyn TaskGenerator>) {
        self.generator = generator;
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Run one clock tick. See the module docs for the order of steps.
    pub fn tick(
        &mut self,
        now: Millis,
        tasks: &mut TaskRegistry,
        ledger: &Ledger,
        executor: &dyn Executor,
    ) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.epoch.is_over(now) {
            if let Some(close) = self.close_epoch(self.epoch.month_index, now, tasks, ledger) {
                outcome.expired = close.expired;
                outcome.closed = Some(close.summary);
            }
            return outcome;
        }

        outcome.installed = self.poll_generation(now, tasks);
        self.request_generation(now, executor);
        outcome.expired = tasks.sweep_expired(now);
        outcome
    }

    /// Apply a staged generation result for the current month, if any.
    ///
    /// Nothing is installed once the month is over; the result then waits
    /// for the close and is discarded as stale.
    pub fn poll_generation(&mut self, now: Millis, tasks: &mut TaskRegistry) -> Option<Installed> {
        if self.epoch.is_over(now) {
            return None;
        }
        let pending = self.pending.as_ref()?;
        if pending.tag() != self.epoch.month_index {
            log::warn!(
                "Discarding task generation for month {} (now month {})",
                pending.tag(),
                self.epoch.month_index
            );
            self.pending = None;
            return None;
        }

        let tasks_for_month = match pending.poll(now, self.generation_timeout_ms) {
            Poll::Pending => return None,
            Poll::Ready(Ok(definitions)) => {
                let normalized = normalize_definitions(
                    &definitions,
                    &self.epoch,
                    now,
                    self.difficulty,
                    self.max_generated_tasks,
                );
                if normalized.is_empty() {
                    log::warn!("Task generator returned no usable tasks, using fallback");
                    None
                } else {
                    Some(normalized)
                }
            }
            Poll::Ready(Err(e)) => {
                log::warn!("Task generation failed: {}", e);
                None
            }
            Poll::TimedOut => {
                log::warn!(
                    "Task generation timed out after {} ms",
                    self.generation_timeout_ms
                );
                None
            }
            Poll::Disconnected => {
                log::warn!("Task generation worker disconnected");
                None
            }
        };
        self.pending = None;

        Some(match tasks_for_month {
            Some(generated) => self.install(generated, TaskSource::Generated, tasks),
            None => {
                let fallback = fallback_tasks(&self.epoch, now);
                self.install(fallback, TaskSource::Fallback, tasks)
            }
        })
    }

    /// Ask the generator for this month's tasks unless that already happened.
    /// Returns whether a request was sent.
    pub fn request_generation(&mut self, now: Millis, executor: &dyn Executor) -> bool {
        let month = self.epoch.month_index;
        if self.generated_for == Some(month) || self.pending.is_some() {
            return false;
        }
        let request = GenerationRequest {
            month_index: month,
            difficulty: self.difficulty,
        };
        let generator = Arc::clone(&self.generator);
        log::debug!("Requesting tasks for month {}", month);
        self.pending = Some(dispatch(executor, month, now, move || {
            generator.generate(&request)
        }));
        true
    }

    fn install(&mut self, batch: Vec<Task>, source: TaskSource, tasks: &mut TaskRegistry) -> Installed {
        let count = batch.len();
        tasks.upsert_tasks(batch, self.epoch.window());
        self.generated_for = Some(self.epoch.month_index);
        self.source = Some(source);
        log::info!(
            "Installed {} {:?} tasks for month {}",
            count,
            source,
            self.epoch.month_index
        );
        Installed {
            month_index: self.epoch.month_index,
            source,
            count,
        }
    }

    /// Close month `expected_month` at `now` and start the next one.
    ///
    /// Returns `None` when `expected_month` is not the current month, which
    /// makes repeated calls for the same boundary harmless. Closing may
    /// happen early (manual "End Month"); the summary then ends at `now`.
    pub fn close_epoch(
        &mut self,
        expected_month: u32,
        now: Millis,
        tasks: &mut TaskRegistry,
        ledger: &Ledger,
    ) -> Option<EpochClose> {
        if expected_month != self.epoch.month_index || self.phase != EpochPhase::Active {
            return None;
        }
        self.phase = EpochPhase::Closing;

        let expired = tasks.sweep_expired(now);
        let summary = summarize(&self.epoch, now, tasks.tasks(), ledger);
        self.history.push(summary.clone());
        log::info!(
            "Month {} closed: rent paid {}, {} paid, {} failed, net {}",
            summary.month_index,
            summary.rent_paid,
            summary.tasks_paid,
            summary.tasks_failed,
            summary.net_cents
        );

        self.epoch = self.epoch.next(now);
        // Everything left belongs to the closed month. An in-flight request
        // keeps its old tag and is discarded when polled.
        tasks.clear();
        self.phase = EpochPhase::Active;

        Some(EpochClose { summary, expired })
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            epoch: self.epoch,
            generated_for: self.generated_for,
            source: self.source,
            history: self.history.clone(),
        }
    }

    /// Restore saved state. A generation request that was in flight when
    /// the state was saved is not restored; the next tick asks again if the
    /// month has no tasks yet.
    pub fn restore(&mut self, state: SchedulerState) {
        self.epoch = state.epoch;
        self.generated_for = state.generated_for;
        self.source = state.source;
        self.history = state.history;
        self.phase = EpochPhase::Active;
        self.pending = None;
    }
}
