//! Systems - logic that operates on components

mod camera;
mod expiry;
mod physics;
mod pickups;

pub use camera::*;
pub use expiry::*;
pub use physics::*;
pub use pickups::*;
