//! Pickup components - coins and task markers placed in the world.

use penny_logic::money::Cents;
use penny_logic::tasks::TaskCategory;
use serde::{Deserialize, Serialize};

/// A coin worth `value_cents`. Respawns elsewhere once collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub value_cents: Cents,
}

/// Marker for an open task. Touching it reveals the task exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPickup {
    pub task_id: String,
    pub category: TaskCategory,
}
