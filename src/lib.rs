//! Honk Drop - a 2D arcade game over a busy road
//!
//! Core modules:
//! - `sim`: Simulation (traffic, projectiles, player, waves, game state)
//! - `tuning`: Data-driven game balance
//! - `view`: Per-frame draw data for the rendering layer
//! - `game`: Owning façade used by the browser/native front ends

pub mod game;
pub mod sim;
pub mod tuning;
pub mod view;

pub use game::Game;
pub use tuning::{Tuning, TuningError};
pub use view::FrameView;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Longest simulation substep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest frame delta the core will integrate; anything above is dropped
    pub const MAX_FRAME_DT: f32 = 0.25;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 15;

    /// Default canvas dimensions
    pub const DEFAULT_CANVAS_WIDTH: f32 = 960.0;
    pub const DEFAULT_CANVAS_HEIGHT: f32 = 640.0;

    /// Number of traffic lanes; the outermost two are emergency-only
    pub const LANE_COUNT: usize = 6;
    /// Restricted inner lane (lane-change target only, never a spawn lane)
    pub const INNER_RESTRICTED_LANE: usize = 4;

    /// Collidable size used when the asset layer has nothing to offer
    pub const DEFAULT_VEHICLE_WIDTH: f32 = 64.0;
    pub const DEFAULT_VEHICLE_HEIGHT: f32 = 30.0;

    /// Player (the flyer) hitbox
    pub const PLAYER_WIDTH: f32 = 48.0;
    pub const PLAYER_HEIGHT: f32 = 36.0;

    /// Health bounds
    pub const MAX_HEALTH: f32 = 100.0;

    /// Belly points needed per power level
    pub const POINTS_PER_LEVEL: u32 = 5;
    /// Highest power level (the line pattern)
    pub const MAX_POWER_LEVEL: u8 = 4;
}

/// Canvas size supplied by the host page
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: consts::DEFAULT_CANVAS_WIDTH,
            height: consts::DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Smoothstep easing on [0, 1]
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    if current < target {
        (current + max_delta).min(target)
    } else {
        (current - max_delta).max(target)
    }
}
