//! World bounds, viewport size and the fixed landmarks of Penny World.

use serde::{Deserialize, Serialize};

/// Playfield and camera dimensions, in world units (pixels at 1:1 zoom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Task pickups never spawn closer than this to the world edge.
    pub pickup_margin: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 3200.0,
            height: 2200.0,
            viewport_width: 1100.0,
            viewport_height: 720.0,
            pickup_margin: 350.0,
        }
    }
}

impl WorldConfig {
    /// Where a new avatar appears.
    pub fn spawn_point(&self) -> (f32, f32) {
        (self.width * 0.45, self.height * 0.55)
    }

    pub fn viewport_center(&self) -> (f32, f32) {
        (self.viewport_width / 2.0, self.viewport_height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandmarkKind {
    Bank,
    Snack,
    Shop,
    Play,
    Home,
}

/// A static, named place drawn in the world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Landmark {
    pub id: &'static str,
    pub kind: LandmarkKind,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub label: &'static str,
}

pub const LANDMARKS: [Landmark; 5] = [
    Landmark {
        id: "lm_bank",
        kind: LandmarkKind::Bank,
        x: 520.0,
        y: 420.0,
        radius: 70.0,
        label: "Bank",
    },
    Landmark {
        id: "lm_snack",
        kind: LandmarkKind::Snack,
        x: 2400.0,
        y: 500.0,
        radius: 70.0,
        label: "Snack",
    },
    Landmark {
        id: "lm_shop",
        kind: LandmarkKind::Shop,
        x: 650.0,
        y: 1750.0,
        radius: 70.0,
        label: "Shop",
    },
    Landmark {
        id: "lm_play",
        kind: LandmarkKind::Play,
        x: 2500.0,
        y: 1750.0,
        radius: 70.0,
        label: "Play",
    },
    Landmark {
        id: "lm_home",
        kind: LandmarkKind::Home,
        x: 1550.0,
        y: 1150.0,
        radius: 80.0,
        label: "Home",
    },
];
