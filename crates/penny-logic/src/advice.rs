//! Context text handed to the money coach.

use crate::ledger::Balances;
use crate::money::format_cents;
use crate::tasks::Task;

/// Upper bound on coach replies kept for display.
pub const MAX_ADVICE_CHARS: usize = 600;

/// Plain-text prompt describing the selected task and current balances.
pub fn advice_context(task: &Task, balances: &Balances) -> String {
    format!(
        "Task: {}\nCategory: {}\nCost: {}\nHint: {}\n\nBalances:\nChecking: {}\nSavings: {}\n\n\
         What should I do next to pay this on time? Teach 1-2 terms.",
        task.title,
        task.category.label(),
        format_cents(task.cost_cents),
        task.hint,
        format_cents(balances.checking_cents),
        format_cents(balances.savings_cents),
    )
}

/// Trim a coach reply for display. Empty replies yield `None`.
pub fn tidy_advice(reply: &str) -> Option<String> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_ADVICE_CHARS).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TaskCategory, TaskStatus};

    #[test]
    fn test_context_lists_task_and_balances() {
        let task = Task {
            id: "t1".into(),
            title: "Pay Rent".into(),
            category: TaskCategory::Rent,
            cost_cents: 2200,
            created_at: 0,
            due_at: 1000,
            status: TaskStatus::Open,
            prompt: String::new(),
            hint: "Put money in checking before paying.".into(),
        };
        let text = advice_context(&task, &Balances::new(1500, 2000));
        assert!(text.starts_with("Task: Pay Rent\nCategory: rent\nCost: $22.00"));
        assert!(text.contains("Checking: $15.00\nSavings: $20.00"));
        assert!(text.ends_with("Teach 1-2 terms."));
    }

    #[test]
    fn test_tidy_advice() {
        assert_eq!(tidy_advice("   "), None);
        assert_eq!(tidy_advice("  Save first. ").as_deref(), Some("Save first."));
        assert_eq!(tidy_advice(&"a".repeat(1000)).unwrap().len(), MAX_ADVICE_CHARS);
    }
}
