//! Player steering input, fed by whatever front end drives the engine.

use penny_logic::avatar::{steer_from_keys, steer_from_pointer};

use crate::components::Vec2;

/// Directional keys currently held plus an optional pointer position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Pointer position in viewport coordinates, `None` when it left the view.
    pub pointer: Option<Vec2>,
}

impl InputState {
    pub fn keys(up: bool, down: bool, left: bool, right: bool) -> Self {
        Self {
            up,
            down,
            left,
            right,
            pointer: None,
        }
    }

    pub fn pointer_at(x: f32, y: f32) -> Self {
        Self {
            pointer: Some(Vec2::new(x, y)),
            ..Self::default()
        }
    }

    /// Steering vector with length in `[0, 1]`. The pointer wins over keys
    /// while it is inside the viewport.
    pub fn steering(&self, viewport_center: Vec2) -> Vec2 {
        match self.pointer {
            Some(p) => {
                let offset = p - viewport_center;
                steer_from_pointer(offset.x, offset.y).into()
            }
            None => steer_from_keys(self.up, self.down, self.left, self.right).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_input_has_no_steering() {
        assert_eq!(InputState::default().steering(Vec2::new(550.0, 360.0)), Vec2::ZERO);
    }

    #[test]
    fn test_pointer_overrides_keys() {
        let mut input = InputState::keys(false, false, true, false);
        input.pointer = Some(Vec2::new(1000.0, 360.0));
        let s = input.steering(Vec2::new(550.0, 360.0));
        assert!(s.x > 0.9);
        assert_eq!(s.y, 0.0);
    }
}
