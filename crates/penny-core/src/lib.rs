//! Penny Core - Play Bank Game Engine
//!
//! A small open-world money game: the player steers an avatar around a
//! town collecting coins, finds the month's bills, and pays them from a
//! checking account before they fall due. Month after month the avatar
//! grows or shrinks with the household's money.
//!
//! # Architecture
//!
//! Money rules live in `penny-logic`; this crate runs them in real time:
//! - **Entities** (`hecs`): coins and task pickups scattered in the world
//! - **Components**: pure data (Position, Coin, TaskPickup, Avatar, Camera)
//! - **Systems**: per-frame logic (physics, camera, pickups, expiry)
//! - **Scheduler**: the month clock, task generation and month close
//! - **Staging**: collaborator calls run off-thread and are applied on a
//!   later clock tick, tagged with the month they were made for
//!
//! # Example
//!
//! ```rust,no_run
//! use penny_core::prelude::*;
//! use penny_logic::config::GameConfig;
//!
//! let mut engine = GameEngine::new(GameConfig::default(), 0).unwrap();
//!
//! // Run the game
//! let mut now = 0;
//! loop {
//!     engine.update(1.0 / 60.0, now); // 60 FPS
//!     now += 16;
//! }
//! ```

pub mod components;
pub mod engine;
pub mod generator;
pub mod input;
pub mod narration;
pub mod persistence;
pub mod scheduler;
pub mod staging;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{GameEngine, Hud, PaymentError, Profile};
    pub use crate::generator::{AdviceProvider, TaskGenerator};
    pub use crate::input::InputState;
    pub use crate::narration::{NarrationSink, Notification};
    pub use penny_logic::money::{Account, Cents};
}
