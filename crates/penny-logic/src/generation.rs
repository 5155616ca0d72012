//! Task definitions from the external generator, and how they become tasks.
//!
//! The generator is untrusted: it may return too many tasks, zero or several
//! rent tasks, out-of-range costs, overlong text or plain garbage. Everything
//! it returns passes through [`normalize_definitions`], which clamps fields,
//! assigns due times inside the month and enforces the single-rent rule.
//! When nothing usable comes back, [`fallback_tasks`] supplies a fixed set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Cents;
use crate::month::MonthEpoch;
use crate::tasks::{enforce_single_rent, Task, TaskCategory, TaskStatus};
use crate::time::{Millis, MINUTE_MS, SECOND_MS};

pub const MAX_TITLE_CHARS: usize = 60;
pub const MAX_PROMPT_CHARS: usize = 240;
pub const MAX_HINT_CHARS: usize = 140;
pub const MIN_MINUTES_TO_DUE: i64 = 1;
pub const MAX_MINUTES_TO_DUE: i64 = 4;
/// A task is never due sooner than this after it appears.
pub const MIN_DUE_LEAD_MS: Millis = 30 * SECOND_MS;
/// Due times of tasks without an explicit deadline are spread over the
/// month in steps of `duration / DUE_SPREAD_STEPS`.
pub const DUE_SPREAD_STEPS: i64 = 7;

const DEFAULT_TITLE: &str = "Task";
const DEFAULT_PROMPT: &str = "Complete this task.";
const DEFAULT_HINT: &str = "Think before you spend.";
const DEFAULT_COST: Cents = 300;

/// Failure of an external collaborator (task generator, money coach).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("no response within {0} ms")]
    TimedOut(Millis),
    #[error("worker disconnected before replying")]
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Allowed task cost range in cents, inclusive.
    pub fn cost_range(self) -> (Cents, Cents) {
        match self {
            Difficulty::Easy => (300, 2500),
            Difficulty::Medium => (600, 4000),
            Difficulty::Hard => (1000, 7000),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// What the scheduler asks the generator for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub month_index: u32,
    pub difficulty: Difficulty,
}

/// One raw task as returned by the generator. Every field is optional
/// because nothing about the payload is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskDefinition {
    pub id: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub cost_cents: Option<Cents>,
    pub minutes_to_due: Option<i64>,
    pub prompt: Option<String>,
    pub hint: Option<String>,
}

impl TaskDefinition {
    pub fn new(title: &str, category: TaskCategory, cost_cents: Cents) -> Self {
        Self {
            title: Some(title.to_string()),
            category: Some(category.label().to_string()),
            cost_cents: Some(cost_cents),
            ..Self::default()
        }
    }

    pub fn with_minutes_to_due(mut self, minutes: i64) -> Self {
        self.minutes_to_due = Some(minutes);
        self
    }

    pub fn with_text(mut self, prompt: &str, hint: &str) -> Self {
        self.prompt = Some(prompt.to_string());
        self.hint = Some(hint.to_string());
        self
    }
}

#[derive(Deserialize)]
struct TaskEnvelope {
    tasks: Vec<TaskDefinition>,
}

/// Parse a generator response. Accepts a bare JSON array, a `{"tasks": [...]}`
/// envelope, or either wrapped in markdown code fences and chatter.
pub fn parse_task_payload(raw: &str) -> Result<Vec<TaskDefinition>, CollaboratorError> {
    let cleaned = raw
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "");
    let cleaned = cleaned.trim();

    if cleaned.starts_with('{') {
        let envelope: TaskEnvelope = serde_json::from_str(cleaned)
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
        return Ok(envelope.tasks);
    }

    let start = cleaned.find('[');
    let end = cleaned.rfind(']');
    match (start, end) {
        (Some(s), Some(e)) if s < e => serde_json::from_str(&cleaned[s..=e])
            .map_err(|e| CollaboratorError::Malformed(e.to_string())),
        _ => Err(CollaboratorError::Malformed("no JSON array in payload".into())),
    }
}

fn clip(text: Option<&str>, max_chars: usize, default: &str) -> String {
    let trimmed = text.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return default.to_string();
    }
    trimmed.chars().take(max_chars).collect()
}

/// `value` limited to `[lo, hi]`, with `lo` winning when the range is empty.
fn clamp_due(value: Millis, lo: Millis, hi: Millis) -> Millis {
    value.min(hi).max(lo)
}

/// Due time for the `index`-th task of a month without its own deadline.
pub fn spread_due(epoch: &MonthEpoch, index: usize, now: Millis) -> Millis {
    let step = epoch.duration_ms / DUE_SPREAD_STEPS;
    let target = epoch.started_at + (index as i64 + 1) * step;
    clamp_due(target, now + MIN_DUE_LEAD_MS, epoch.ends_at())
}

/// Turn raw definitions into tasks for `epoch`, created at `now`.
///
/// At most `max_tasks` are kept. Ids come from the payload when present,
/// otherwise `task-m{month}-{n}`.
pub fn normalize_definitions(
    definitions: &[TaskDefinition],
    epoch: &MonthEpoch,
    now: Millis,
    difficulty: Difficulty,
    max_tasks: usize,
) -> Vec<Task> {
    let (min_cost, max_cost) = difficulty.cost_range();
    let mut tasks: Vec<Task> = definitions
        .iter()
        .take(max_tasks)
        .enumerate()
        .map(|(idx, def)| {
            let id = def
                .id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("task-m{}-{}", epoch.month_index, idx + 1));
            let category = def
                .category
                .as_deref()
                .and_then(TaskCategory::from_label)
                .unwrap_or(TaskCategory::Bill);
            let cost_cents = def.cost_cents.unwrap_or(DEFAULT_COST).clamp(min_cost, max_cost);
            let due_at = match def.minutes_to_due {
                Some(minutes) => {
                    let minutes = minutes.clamp(MIN_MINUTES_TO_DUE, MAX_MINUTES_TO_DUE);
                    clamp_due(now + minutes * MINUTE_MS, now + MIN_DUE_LEAD_MS, epoch.ends_at())
                }
                None => spread_due(epoch, idx, now),
            };
            Task {
                id,
                title: clip(def.title.as_deref(), MAX_TITLE_CHARS, DEFAULT_TITLE),
                category,
                cost_cents,
                created_at: now,
                due_at,
                status: TaskStatus::Open,
                prompt: clip(def.prompt.as_deref(), MAX_PROMPT_CHARS, DEFAULT_PROMPT),
                hint: clip(def.hint.as_deref(), MAX_HINT_CHARS, DEFAULT_HINT),
            }
        })
        .collect();
    enforce_single_rent(&mut tasks);
    tasks
}

struct FallbackTask {
    title: &'static str,
    category: TaskCategory,
    cost_cents: Cents,
    prompt: &'static str,
    hint: &'static str,
}

const FALLBACK: [FallbackTask; 5] = [
    FallbackTask {
        title: "Pay Rent",
        category: TaskCategory::Rent,
        cost_cents: 2200,
        prompt: "It's rent day! Pay your rent to keep your home happy and your budget steady.",
        hint: "Put money in checking before paying.",
    },
    FallbackTask {
        title: "Grocery Run",
        category: TaskCategory::Food,
        cost_cents: 650,
        prompt: "You need groceries for the week. Can you stay within your budget?",
        hint: "Needs first, wants later.",
    },
    FallbackTask {
        title: "Bus Pass",
        category: TaskCategory::Transport,
        cost_cents: 500,
        prompt: "Get a bus pass so you can travel around town.",
        hint: "Transportation is a monthly expense.",
    },
    FallbackTask {
        title: "Phone Bill",
        category: TaskCategory::Bill,
        cost_cents: 750,
        prompt: "Your phone bill is due. Missing it can add a fee.",
        hint: "Bills have deadlines. Check due dates.",
    },
    FallbackTask {
        title: "Snack Treat",
        category: TaskCategory::Fun,
        cost_cents: 300,
        prompt: "A fun snack treat! It's optional, but it costs money.",
        hint: "Wants are okay, just plan for them.",
    },
];

/// The fixed task list used whenever the generator cannot be relied on.
/// Always contains exactly one rent task.
pub fn fallback_tasks(epoch: &MonthEpoch, now: Millis) -> Vec<Task> {
    FALLBACK
        .iter()
        .enumerate()
        .map(|(idx, t)| Task {
            id: format!("fallback-m{}-{}", epoch.month_index, idx + 1),
            title: t.title.to_string(),
            category: t.category,
            cost_cents: t.cost_cents,
            created_at: now,
            due_at: spread_due(epoch, idx, now),
            status: TaskStatus::Open,
            prompt: t.prompt.to_string(),
            hint: t.hint.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> MonthEpoch {
        MonthEpoch::first(0, 300_000)
    }

    #[test]
    fn test_parse_bare_array() {
        let raw = r#"[{"title":"Pay Rent","category":"rent","costCents":2000,"minutesToDue":3}]"#;
        let defs = parse_task_payload(raw).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].cost_cents, Some(2000));
        assert_eq!(defs[0].minutes_to_due, Some(3));
    }

    #[test]
    fn test_parse_fenced_with_chatter() {
        let raw = "Sure! Here you go:\n```json\n[{\"title\":\"Lunch\",\"category\":\"food\"}]\n```";
        let defs = parse_task_payload(raw).unwrap();
        assert_eq!(defs[0].title.as_deref(), Some("Lunch"));
    }

    #[test]
    fn test_parse_envelope() {
        let raw = r#"{"tasks":[{"title":"A"},{"title":"B"}]}"#;
        assert_eq!(parse_task_payload(raw).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_task_payload("I cannot help with that"),
            Err(CollaboratorError::Malformed(_))
        ));
        assert!(parse_task_payload("[{\"title\": 5}]").is_err());
    }

    #[test]
    fn test_normalize_clamps_fields() {
        let long_title = "x".repeat(100);
        let defs = vec![
            TaskDefinition::new(&long_title, TaskCategory::Food, 50_000).with_minutes_to_due(99),
            TaskDefinition {
                category: Some("mystery".into()),
                cost_cents: Some(1),
                ..TaskDefinition::default()
            },
        ];
        let tasks = normalize_definitions(&defs, &epoch(), 1_000, Difficulty::Easy, 8);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title.chars().count(), MAX_TITLE_CHARS);
        assert_eq!(tasks[0].cost_cents, 2500);
        assert_eq!(tasks[0].due_at, 1_000 + 4 * MINUTE_MS);
        // No rent in the batch: first task is coerced
        assert_eq!(tasks[0].category, TaskCategory::Rent);
        assert_eq!(tasks[1].category, TaskCategory::Bill);
        assert_eq!(tasks[1].cost_cents, 300);
        assert_eq!(tasks[1].title, "Task");
        assert_eq!(tasks[1].prompt, "Complete this task.");
        assert_eq!(tasks[1].hint, "Think before you spend.");
        assert!(tasks.iter().all(|t| t.created_at == 1_000 && t.is_open()));
    }

    #[test]
    fn test_normalize_due_stays_inside_month() {
        let e = epoch();
        let late = e.ends_at() - 60_000;
        let defs = vec![TaskDefinition::new("Rent", TaskCategory::Rent, 2000).with_minutes_to_due(4)];
        let tasks = normalize_definitions(&defs, &e, late, Difficulty::Easy, 8);
        assert_eq!(tasks[0].due_at, e.ends_at());
    }

    #[test]
    fn test_normalize_respects_max_and_payload_ids() {
        let mut defs: Vec<TaskDefinition> = (0..12)
            .map(|i| TaskDefinition::new(&format!("T{}", i), TaskCategory::Fun, 500))
            .collect();
        defs[0].id = Some("given-id".into());
        let tasks = normalize_definitions(&defs, &epoch(), 0, Difficulty::Medium, 8);
        assert_eq!(tasks.len(), 8);
        assert_eq!(tasks[0].id, "given-id");
        assert_eq!(tasks[1].id, "task-m1-2");
        assert_eq!(tasks[1].cost_cents, 600);
    }

    #[test]
    fn test_fallback_has_exactly_one_rent() {
        let tasks = fallback_tasks(&epoch(), 0);
        assert_eq!(tasks.len(), 5);
        assert_eq!(
            tasks.iter().filter(|t| t.category == TaskCategory::Rent).count(),
            1
        );
        assert_eq!(tasks[0].title, "Pay Rent");
        assert_eq!(tasks[0].cost_cents, 2200);
    }

    #[test]
    fn test_fallback_due_spread() {
        let e = epoch();
        let tasks = fallback_tasks(&e, 0);
        let step = e.duration_ms / DUE_SPREAD_STEPS;
        for (i, t) in tasks.iter().enumerate() {
            assert_eq!(t.due_at, (i as i64 + 1) * step);
        }
        // Generated late in the month, nothing is due sooner than the lead time
        let late = fallback_tasks(&e, 200_000);
        assert!(late.iter().all(|t| t.due_at >= 200_000 + MIN_DUE_LEAD_MS));
    }
}
