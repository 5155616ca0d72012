//! Save/Load functionality for persisting game state
//!
//! Full saves use bincode and cover everything needed to resume a game:
//! ledger, tasks, month state, profile and the pickups placed in the world.
//! Components are serialized individually then reconstructed on load. The
//! avatar is not saved; it respawns sized from the restored balances.
//!
//! [`StatementSnapshot`] is the smaller JSON record handed to a statement
//! store. The engine never needs it back to run.

use std::io::{Read, Write};

use hecs::World;
use penny_logic::config::{ConfigError, GameConfig};
use penny_logic::ledger::{Balances, Ledger, LedgerEntry};
use penny_logic::month::MonthSummary;
use penny_logic::tasks::{Task, TaskRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{Coin, Position, TaskPickup};
use crate::engine::Profile;
use crate::scheduler::SchedulerState;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Ledger entries included in a statement.
pub const STATEMENT_LEDGER_ENTRIES: usize = 30;

/// Serializable snapshot of the game state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub config: GameConfig,
    pub ledger: Ledger,
    pub tasks: TaskRegistry,
    pub scheduler: SchedulerState,
    pub profile: Profile,
    pub selected_task: Option<String>,
    /// Tasks whose marker was already touched
    pub revealed: Vec<String>,
    pub entities: Vec<SerializableEntity>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct SerializableEntity {
    pub position: Option<Position>,
    pub coin: Option<Coin>,
    pub task_pickup: Option<TaskPickup>,
}

/// Extract all entities from a world into serializable form
pub fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let mut entities = Vec::new();
    for entity_ref in world.iter() {
        let mut se = SerializableEntity::default();
        if let Some(c) = entity_ref.get::<&Position>() {
            se.position = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Coin>() {
            se.coin = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&TaskPickup>() {
            se.task_pickup = Some((*c).clone());
        }
        entities.push(se);
    }
    entities
}

/// Rebuild entities into `world`
pub fn spawn_entities(world: &mut World, entities: Vec<SerializableEntity>) {
    for se in entities {
        let entity = world.spawn(());
        if let Some(c) = se.position {
            let _ = world.insert_one(entity, c);
        }
        if let Some(c) = se.coin {
            let _ = world.insert_one(entity, c);
        }
        if let Some(c) = se.task_pickup {
            let _ = world.insert_one(entity, c);
        }
    }
}

pub fn write_save<W: Write>(writer: W, data: &SaveData) -> Result<(), SaveError> {
    bincode::serialize_into(writer, data)?;
    Ok(())
}

pub fn read_save<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let data: SaveData = bincode::deserialize_from(reader)?;
    if data.version != SAVE_VERSION {
        log::warn!("Save version {} does not match {}", data.version, SAVE_VERSION);
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }
    data.config.validate()?;
    Ok(data)
}

/// Read-only record of the player's accounts for a statement store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementSnapshot {
    pub month_index: u32,
    pub balances: Balances,
    /// Most recent first
    pub ledger: Vec<LedgerEntry>,
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub latest_summary: Option<MonthSummary>,
    /// Summary text a statement store generated for this month, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl StatementSnapshot {
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The stored narrative, if it was written for `month_index`. Lets a
    /// front end skip regenerating text it already has.
    pub fn reusable_narrative(&self, month_index: u32) -> Option<&str> {
        if self.month_index == month_index {
            self.narrative.as_deref()
        } else {
            None
        }
    }
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Saved config rejected: {0}")]
    InvalidConfig(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use penny_logic::tasks::TaskCategory;

    #[test]
    fn test_entities_rebuild() {
        let mut world = World::new();
        world.spawn((Position::new(1.0, 2.0), Coin { value_cents: 50 }));
        world.spawn((
            Position::new(400.0, 500.0),
            TaskPickup {
                task_id: "t1".into(),
                category: TaskCategory::Rent,
            },
        ));

        let entities = serialize_entities(&world);
        assert_eq!(entities.len(), 2);

        let mut rebuilt = World::new();
        spawn_entities(&mut rebuilt, entities);
        assert_eq!(rebuilt.query::<(&Position, &Coin)>().iter().count(), 1);
        assert_eq!(rebuilt.query::<(&Position, &TaskPickup)>().iter().count(), 1);
    }

    #[test]
    fn test_statement_json_shape() {
        let snapshot = StatementSnapshot {
            month_index: 3,
            balances: Balances::new(5000, 2000),
            ledger: Vec::new(),
            tasks: Vec::new(),
            user_id: None,
            latest_summary: None,
            narrative: Some("You paid rent on time.".into()),
        };
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"monthIndex\": 3"));
        assert!(json.contains("\"checkingCents\": 5000"));
        assert!(!json.contains("userId"));

        let back = StatementSnapshot::from_json(&json).unwrap();
        assert_eq!(back.reusable_narrative(3), Some("You paid rent on time."));
        assert_eq!(back.reusable_narrative(4), None);
    }

    #[test]
    fn test_statement_accepts_minimal_record() {
        let json = r#"{"monthIndex":1,"balances":{"checkingCents":1,"savingsCents":2},"ledger":[],"tasks":[]}"#;
        let snapshot = StatementSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.balances.total(), 3);
        assert!(snapshot.latest_summary.is_none());
    }
}
