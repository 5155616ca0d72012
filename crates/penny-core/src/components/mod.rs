//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod avatar;
mod common;
mod pickups;

pub use avatar::*;
pub use common::*;
pub use pickups::*;
