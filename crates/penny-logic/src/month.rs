//! Month epochs and end-of-month summaries.
//!
//! A month is a fixed-duration round anchored to the wall-clock time it
//! started. Closing a month freezes a [`MonthSummary`] into a bounded,
//! most-recent-first [`SummaryHistory`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::money::Cents;
use crate::tasks::{Task, TaskCategory, TaskCounts, TaskStatus};
use crate::time::{Millis, Window};

/// Five real minutes per game month.
pub const DEFAULT_MONTH_DURATION_MS: Millis = 5 * 60 * 1000;
pub const DEFAULT_SUMMARY_CAPACITY: usize = 12;

/// The active billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthEpoch {
    pub month_index: u32,
    pub started_at: Millis,
    pub duration_ms: Millis,
}

impl MonthEpoch {
    /// The first month of a new game.
    pub fn first(started_at: Millis, duration_ms: Millis) -> Self {
        Self {
            month_index: 1,
            started_at,
            duration_ms: duration_ms.max(1),
        }
    }

    pub fn ends_at(&self) -> Millis {
        self.started_at + self.duration_ms
    }

    /// `[started_at, started_at + duration]`
    pub fn window(&self) -> Window {
        Window::new(self.started_at, self.ends_at())
    }

    pub fn remaining(&self, now: Millis) -> Millis {
        (self.ends_at() - now).max(0)
    }

    pub fn is_over(&self, now: Millis) -> bool {
        now >= self.ends_at()
    }

    /// The epoch that follows this one, starting at `now`.
    pub fn next(&self, now: Millis) -> Self {
        Self {
            month_index: self.month_index + 1,
            started_at: now,
            duration_ms: self.duration_ms,
        }
    }
}

/// Immutable record of how a month went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month_index: u32,
    pub started_at: Millis,
    pub ended_at: Millis,
    pub rent_paid: bool,
    pub tasks_paid: u32,
    pub tasks_failed: u32,
    pub net_cents: Cents,
}

impl MonthSummary {
    /// A month is "won" when rent was paid and nothing was missed.
    pub fn is_clean(&self) -> bool {
        self.rent_paid && self.tasks_failed == 0
    }
}

/// Build the summary for `epoch` closing at `now`.
///
/// Only tasks created inside the epoch count. The month ends at the earlier
/// of `now` and the scheduled end, so an early manual close reports the
/// actual end and a late tick does not stretch the window.
pub fn summarize<'a>(
    epoch: &MonthEpoch,
    now: Millis,
    tasks: impl IntoIterator<Item = &'a Task>,
    ledger: &Ledger,
) -> MonthSummary {
    let ended_at = now.min(epoch.ends_at()).max(epoch.started_at);
    let window = Window::new(epoch.started_at, ended_at);
    let in_month: Vec<&Task> = tasks
        .into_iter()
        .filter(|t| epoch.window().contains(t.created_at))
        .collect();

    let rent_paid = in_month
        .iter()
        .find(|t| t.category == TaskCategory::Rent)
        .map(|t| t.status == TaskStatus::Paid)
        .unwrap_or(false);
    let counts = TaskCounts::tally(in_month.iter().copied());

    MonthSummary {
        month_index: epoch.month_index,
        started_at: epoch.started_at,
        ended_at,
        rent_paid,
        tasks_paid: counts.paid,
        tasks_failed: counts.failed,
        net_cents: ledger.net_within(window),
    }
}

/// Bounded list of past summaries, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryHistory {
    summaries: VecDeque<MonthSummary>,
    capacity: usize,
}

impl SummaryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            summaries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, summary: MonthSummary) {
        self.summaries.push_front(summary);
        self.summaries.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<&MonthSummary> {
        self.summaries.front()
    }

    pub fn contains(&self, month_index: u32) -> bool {
        self.summaries.iter().any(|s| s.month_index == month_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonthSummary> {
        self.summaries.iter()
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

impl Default for SummaryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_CAPACITY)
    }
}
