//! Task registry: monthly obligations and their status lifecycle.
//!
//! A task starts `Open` and ends either `Paid` (payment is the only path)
//! or `Failed` (the expiry sweep is the only automatic transition). Both end
//! states are terminal; nothing ever moves a task back to `Open`.
//!
//! The registry also owns the "exactly one rent task per month" rule: any
//! set it holds after a merge is coerced so that one, and only one, task is
//! in the [`TaskCategory::Rent`] category.

use serde::{Deserialize, Serialize};

use crate::ledger::EntryCategory;
use crate::money::Cents;
use crate::time::{Millis, Window};

/// Default cap on retained tasks.
pub const DEFAULT_TASK_CAPACITY: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Rent,
    Food,
    Home,
    Furniture,
    Transport,
    Fun,
    #[serde(alias = "bills")]
    Bill,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 7] = [
        TaskCategory::Rent,
        TaskCategory::Food,
        TaskCategory::Home,
        TaskCategory::Furniture,
        TaskCategory::Transport,
        TaskCategory::Fun,
        TaskCategory::Bill,
    ];

    /// Parse a loose category label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "rent" => Some(TaskCategory::Rent),
            "food" => Some(TaskCategory::Food),
            "home" => Some(TaskCategory::Home),
            "furniture" => Some(TaskCategory::Furniture),
            "transport" => Some(TaskCategory::Transport),
            "fun" => Some(TaskCategory::Fun),
            "bill" | "bills" => Some(TaskCategory::Bill),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskCategory::Rent => "rent",
            TaskCategory::Food => "food",
            TaskCategory::Home => "home",
            TaskCategory::Furniture => "furniture",
            TaskCategory::Transport => "transport",
            TaskCategory::Fun => "fun",
            TaskCategory::Bill => "bill",
        }
    }

    /// Ledger category used when paying a task of this kind.
    pub fn ledger_category(self) -> EntryCategory {
        match self {
            TaskCategory::Rent => EntryCategory::Rent,
            TaskCategory::Food => EntryCategory::Food,
            TaskCategory::Home | TaskCategory::Furniture => EntryCategory::Home,
            TaskCategory::Fun => EntryCategory::Fun,
            TaskCategory::Transport | TaskCategory::Bill => EntryCategory::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Open,
    Paid,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Open)
    }
}

/// A single obligation the player must pay before `due_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub category: TaskCategory,
    pub cost_cents: Cents,
    pub created_at: Millis,
    pub due_at: Millis,
    pub status: TaskStatus,
    pub prompt: String,
    pub hint: String,
}

impl Task {
    pub fn is_open(&self) -> bool {
        self.status == TaskStatus::Open
    }

    /// Open and strictly past its due time.
    pub fn is_overdue(&self, now: Millis) -> bool {
        self.is_open() && now > self.due_at
    }
}

/// A task that the sweep just moved to `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredTask {
    pub id: String,
    pub title: String,
    pub cost_cents: Cents,
}

/// Open / paid / failed counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub open: u32,
    pub paid: u32,
    pub failed: u32,
}

impl TaskCounts {
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut counts = TaskCounts::default();
        for task in tasks {
            match task.status {
                TaskStatus::Open => counts.open += 1,
                TaskStatus::Paid => counts.paid += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

/// Coerce a task set so exactly one task is rent: if the set does not
/// already hold exactly one, the first task becomes rent and every later
/// rent task is demoted to bill. Returns whether anything changed.
pub fn enforce_single_rent(tasks: &mut [Task]) -> bool {
    let rent_count = tasks
        .iter()
        .filter(|t| t.category == TaskCategory::Rent)
        .count();
    if tasks.is_empty() || rent_count == 1 {
        return false;
    }
    tasks[0].category = TaskCategory::Rent;
    for task in tasks.iter_mut().skip(1) {
        if task.category == TaskCategory::Rent {
            task.category = TaskCategory::Bill;
        }
    }
    true
}

/// Owns every task record. Most recently inserted first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    capacity: usize,
}

impl TaskRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn open_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.is_open())
    }

    /// Open tasks sorted by soonest due.
    pub fn open_by_due(&self) -> Vec<&Task> {
        let mut open: Vec<&Task> = self.open_tasks().collect();
        open.sort_by_key(|t| t.due_at);
        open
    }

    pub fn counts(&self) -> TaskCounts {
        TaskCounts::tally(&self.tasks)
    }

    /// Merge by id. Known ids take the incoming fields but keep their
    /// current status; unseen tasks are inserted at the front in batch order.
    /// Afterwards tasks created outside `window` are purged, the set is
    /// capped (oldest dropped) and the rent rule is enforced.
    pub fn upsert_tasks(&mut self, incoming: Vec<Task>, window: Window) {
        let mut fresh = Vec::new();
        for task in incoming {
            if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
                let status = existing.status;
                *existing = task;
                existing.status = status;
            } else if let Some(dup) = fresh.iter_mut().find(|t: &&mut Task| t.id == task.id) {
                *dup = task;
            } else {
                fresh.push(task);
            }
        }
        fresh.append(&mut self.tasks);
        self.tasks = fresh;

        self.purge_outside(window);
        self.tasks.truncate(self.capacity);
        enforce_single_rent(&mut self.tasks);
    }

    /// Move an open task to `status`. Terminal tasks and unknown ids are
    /// left alone. Returns whether the task changed.
    pub fn mark_task(&mut self, id: &str, status: TaskStatus) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) if task.is_open() && status != TaskStatus::Open => {
                task.status = status;
                true
            }
            _ => false,
        }
    }

    /// Fail every open task whose due time has passed. Idempotent: a second
    /// call at the same `now` finds nothing left to fail.
    pub fn sweep_expired(&mut self, now: Millis) -> Vec<ExpiredTask> {
        let mut expired = Vec::new();
        for task in self.tasks.iter_mut().filter(|t| t.is_overdue(now)) {
            task.status = TaskStatus::Failed;
            expired.push(ExpiredTask {
                id: task.id.clone(),
                title: task.title.clone(),
                cost_cents: task.cost_cents,
            });
        }
        expired
    }

    /// Drop tasks created outside `window`.
    pub fn purge_outside(&mut self, window: Window) {
        self.tasks.retain(|t| window.contains(t.created_at));
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TASK_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, category: TaskCategory, created_at: Millis, due_at: Millis) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            category,
            cost_cents: 500,
            created_at,
            due_at,
            status: TaskStatus::Open,
            prompt: String::new(),
            hint: String::new(),
        }
    }

    fn window() -> Window {
        Window::new(0, 300_000)
    }

    #[test]
    fn test_upsert_inserts_in_batch_order() {
        let mut reg = TaskRegistry::default();
        reg.upsert_tasks(
            vec![
                task("a", TaskCategory::Rent, 10, 1000),
                task("b", TaskCategory::Food, 10, 1000),
            ],
            window(),
        );
        let ids: Vec<_> = reg.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_upsert_preserves_status_of_known_ids() {
        let mut reg = TaskRegistry::default();
        reg.upsert_tasks(vec![task("a", TaskCategory::Rent, 10, 1000)], window());
        assert!(reg.mark_task("a", TaskStatus::Paid));

        let mut update = task("a", TaskCategory::Rent, 10, 2000);
        update.title = "Renamed".into();
        reg.upsert_tasks(vec![update], window());

        let a = reg.get("a").unwrap();
        assert_eq!(a.status, TaskStatus::Paid);
        assert_eq!(a.title, "Renamed");
        assert_eq!(a.due_at, 2000);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_upsert_purges_outside_window_and_caps() {
        let mut reg = TaskRegistry::new(2);
        reg.upsert_tasks(
            vec![
                task("old", TaskCategory::Rent, -5, 1000),
                task("a", TaskCategory::Rent, 1, 1000),
                task("b", TaskCategory::Food, 2, 1000),
                task("c", TaskCategory::Fun, 3, 1000),
            ],
            window(),
        );
        assert!(reg.get("old").is_none());
        assert_eq!(reg.len(), 2);
        assert!(reg.get("c").is_none());
    }

    #[test]
    fn test_upsert_enforces_single_rent() {
        let mut reg = TaskRegistry::default();
        reg.upsert_tasks(
            vec![
                task("a", TaskCategory::Food, 1, 1000),
                task("b", TaskCategory::Rent, 1, 1000),
                task("c", TaskCategory::Rent, 1, 1000),
            ],
            window(),
        );
        let cats: Vec<_> = reg.tasks().iter().map(|t| t.category).collect();
        assert_eq!(cats, vec![TaskCategory::Rent, TaskCategory::Bill, TaskCategory::Bill]);
    }

    #[test]
    fn test_enforce_single_rent_no_rent() {
        let mut tasks = vec![
            task("a", TaskCategory::Food, 0, 0),
            task("b", TaskCategory::Fun, 0, 0),
        ];
        assert!(enforce_single_rent(&mut tasks));
        assert_eq!(tasks[0].category, TaskCategory::Rent);
        assert_eq!(tasks[1].category, TaskCategory::Fun);
    }

    #[test]
    fn test_enforce_single_rent_already_valid() {
        let mut tasks = vec![
            task("a", TaskCategory::Food, 0, 0),
            task("b", TaskCategory::Rent, 0, 0),
        ];
        assert!(!enforce_single_rent(&mut tasks));
        assert_eq!(tasks[0].category, TaskCategory::Food);
    }

    #[test]
    fn test_mark_task_terminal_is_sticky() {
        let mut reg = TaskRegistry::default();
        reg.upsert_tasks(vec![task("a", TaskCategory::Rent, 1, 1000)], window());
        assert!(reg.mark_task("a", TaskStatus::Failed));
        assert!(!reg.mark_task("a", TaskStatus::Paid));
        assert!(!reg.mark_task("a", TaskStatus::Open));
        assert_eq!(reg.get("a").unwrap().status, TaskStatus::Failed);
        assert!(!reg.mark_task("missing", TaskStatus::Paid));
    }

    #[test]
    fn test_sweep_fails_overdue_only() {
        let mut reg = TaskRegistry::default();
        let t0 = 1000;
        reg.upsert_tasks(
            vec![
                task("due", TaskCategory::Rent, 1, t0),
                task("later", TaskCategory::Food, 1, t0 + 10),
            ],
            window(),
        );
        // Exactly at the due time nothing fails
        assert!(reg.sweep_expired(t0).is_empty());
        let expired = reg.sweep_expired(t0 + 1);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, "due");
        assert_eq!(reg.get("due").unwrap().status, TaskStatus::Failed);
        assert!(reg.get("later").unwrap().is_open());
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let mut reg = TaskRegistry::default();
        reg.upsert_tasks(vec![task("a", TaskCategory::Rent, 1, 10)], window());
        assert_eq!(reg.sweep_expired(100).len(), 1);
        let before = reg.tasks().to_vec();
        assert!(reg.sweep_expired(100).is_empty());
        assert_eq!(reg.tasks(), &before[..]);
    }

    #[test]
    fn test_sweep_skips_paid() {
        let mut reg = TaskRegistry::default();
        reg.upsert_tasks(vec![task("a", TaskCategory::Rent, 1, 10)], window());
        reg.mark_task("a", TaskStatus::Paid);
        assert!(reg.sweep_expired(1_000).is_empty());
        assert_eq!(reg.get("a").unwrap().status, TaskStatus::Paid);
    }

    #[test]
    fn test_counts_and_open_by_due() {
        let mut reg = TaskRegistry::default();
        reg.upsert_tasks(
            vec![
                task("a", TaskCategory::Rent, 1, 500),
                task("b", TaskCategory::Food, 1, 100),
                task("c", TaskCategory::Fun, 1, 300),
            ],
            window(),
        );
        reg.mark_task("c", TaskStatus::Paid);
        let counts = reg.counts();
        assert_eq!(counts, TaskCounts { open: 2, paid: 1, failed: 0 });
        let ids: Vec<_> = reg.open_by_due().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(TaskCategory::from_label("Bills"), Some(TaskCategory::Bill));
        assert_eq!(TaskCategory::from_label("groceries"), None);
        let parsed: TaskCategory = serde_json::from_str("\"bills\"").unwrap();
        assert_eq!(parsed, TaskCategory::Bill);
        assert_eq!(TaskCategory::Furniture.ledger_category(), EntryCategory::Home);
    }
}
