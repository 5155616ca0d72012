//! Camera system - eases the viewport toward the avatar.

use penny_logic::avatar::{ease_factor, CAMERA_EASE_RATE};
use penny_logic::world::WorldConfig;

use crate::components::{max_offset, Camera, Vec2};

pub fn follow_camera(camera: &mut Camera, target: Vec2, world: &WorldConfig, dt: f32) {
    let half = Vec2::new(world.viewport_width / 2.0, world.viewport_height / 2.0);
    let eased = camera
        .offset
        .lerp(target - half, ease_factor(CAMERA_EASE_RATE, dt));
    camera.offset = eased.clamp(Vec2::ZERO, max_offset(world));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_never_leaves_world() {
        let world = WorldConfig::default();
        let mut camera = Camera::default();
        for _ in 0..500 {
            follow_camera(&mut camera, Vec2::new(world.width, world.height), &world, 0.033);
        }
        assert!((camera.offset.x - (world.width - world.viewport_width)).abs() < 0.01);
        assert!((camera.offset.y - (world.height - world.viewport_height)).abs() < 0.01);

        for _ in 0..500 {
            follow_camera(&mut camera, Vec2::ZERO, &world, 0.033);
        }
        assert_eq!(camera.offset, Vec2::ZERO);
    }

    #[test]
    fn test_camera_eases() {
        let world = WorldConfig::default();
        let target = Vec2::new(1600.0, 1100.0);
        let mut camera = Camera::default();
        follow_camera(&mut camera, target, &world, 0.016);
        assert!(camera.offset.x > 0.0 && camera.offset.x < 1600.0 - 550.0);
    }
}
