//! Expiry system - fails overdue tasks and shrinks the avatar a little.

use penny_logic::avatar::expiry_penalty;
use penny_logic::tasks::{ExpiredTask, TaskRegistry};
use penny_logic::time::Millis;

use crate::components::Avatar;

/// Sweep overdue tasks. Each newly failed task costs the avatar growth
/// bonus; ledger balances are untouched.
pub fn expire_tasks(tasks: &mut TaskRegistry, avatar: &mut Avatar, now: Millis) -> Vec<ExpiredTask> {
    let expired = tasks.sweep_expired(now);
    apply_expiry_penalties(avatar, &expired);
    expired
}

/// Growth penalty for tasks failed elsewhere (the scheduler's own sweeps).
pub fn apply_expiry_penalties(avatar: &mut Avatar, expired: &[ExpiredTask]) {
    for task in expired {
        avatar.adjust_growth(expiry_penalty(task.cost_cents));
        log::debug!("Task '{}' expired unpaid", task.title);
    }
}
