//! Player avatar and camera state.
//!
//! Both are engine-owned singletons rather than ECS entities. Neither is
//! persisted: radius is re-derived from the ledger each frame and the
//! growth bonus is transient feedback.

use penny_logic::avatar::{radius_for_total, BASE_RADIUS};
use penny_logic::money::Cents;
use penny_logic::world::WorldConfig;

use super::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avatar {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Cosmetic bonus added to total funds when sizing the avatar. May go
    /// negative after missed tasks.
    pub growth_cents: Cents,
}

impl Avatar {
    /// A fresh avatar at the world spawn point, already sized for `total_cents`.
    pub fn spawn(world: &WorldConfig, total_cents: Cents) -> Self {
        Self {
            position: world.spawn_point().into(),
            velocity: Vec2::ZERO,
            radius: radius_for_total(total_cents),
            growth_cents: 0,
        }
    }

    pub fn adjust_growth(&mut self, delta: Cents) {
        self.growth_cents = self.growth_cents.saturating_add(delta);
    }
}

impl Default for Avatar {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius: BASE_RADIUS,
            growth_cents: 0,
        }
    }
}

/// Top-left corner of the viewport in world coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    pub offset: Vec2,
}

impl Camera {
    /// Camera centred on `target`, clamped to the world.
    pub fn centered_on(target: Vec2, world: &WorldConfig) -> Self {
        let half = Vec2::new(world.viewport_width / 2.0, world.viewport_height / 2.0);
        Self {
            offset: (target - half).clamp(Vec2::ZERO, max_offset(world)),
        }
    }
}

/// Largest camera offset that keeps the viewport inside the world.
pub fn max_offset(world: &WorldConfig) -> Vec2 {
    Vec2::new(
        (world.width - world.viewport_width).max(0.0),
        (world.height - world.viewport_height).max(0.0),
    )
}
