//! Per-frame draw data
//!
//! A read-only snapshot the rendering layer consumes after each tick. It
//! carries positions and visual-state flags only; sprites, colors and HUD
//! decoration are the renderer's business.

use glam::Vec2;
use serde::Serialize;

use crate::Canvas;
use crate::sim::{
    CrashState, FoodKind, GameEvent, GameState, Heading, PatternKind, VehicleClass,
};

#[derive(Debug, Clone, Serialize)]
pub struct VehicleView {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    pub lane: usize,
    pub class: VehicleClass,
    pub heading: Heading,
    pub sprite: Option<usize>,
    /// Truthful honk state
    pub honking: bool,
    /// Within the audio budget this tick
    pub honk_audible: bool,
    pub crashed: bool,
    pub wrecked: bool,
    /// Fire effect attached to a crashed vehicle
    pub fire: Option<u32>,
    /// Splattered and about to be removed
    pub hit: bool,
    pub changing_lane: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub id: u32,
    pub kind: PatternKind,
    pub size: f32,
    pub splash_radius: f32,
    /// Live drop positions only
    pub drops: Vec<Vec2>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub size: Vec2,
    pub facing: Heading,
    pub active_drop: bool,
    pub power_level: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupView {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub kind: FoodKind,
    pub remaining: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HudView {
    pub score: u64,
    pub wave: u32,
    pub wave_progress: f32,
    pub health_percent: f32,
    pub power_level: u8,
    pub belly_points: u32,
    pub points_to_next: Option<u32>,
    pub emergency_mode: bool,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameView {
    pub canvas: Canvas,
    /// Lane centerlines, top to bottom
    pub lanes: Vec<f32>,
    pub vehicles: Vec<VehicleView>,
    pub projectiles: Vec<ProjectileView>,
    pub player: PlayerView,
    pub pickups: Vec<PickupView>,
    pub hud: HudView,
    pub dead: bool,
    /// Sound/effect triggers raised during the tick
    pub events: Vec<GameEvent>,
}

impl FrameView {
    pub fn capture(state: &GameState) -> Self {
        let lanes = (0..crate::consts::LANE_COUNT)
            .map(|lane| state.traffic.lanes.center_y(lane))
            .collect();

        let vehicles = state
            .traffic
            .vehicles
            .iter()
            .map(|v| VehicleView {
                id: v.id,
                pos: v.pos,
                size: v.size,
                lane: v.lane,
                class: v.class,
                heading: v.heading,
                sprite: v.sprite,
                honking: v.is_honking(),
                honk_audible: state.audible_honks.contains(&v.id),
                crashed: v.is_crashed(),
                wrecked: matches!(v.crash, CrashState::Wrecked { .. }),
                fire: v.fire().map(|f| f.0),
                hit: v.is_hit(),
                changing_lane: v.lane_change.is_some(),
            })
            .collect();

        let projectiles = state
            .projectiles
            .iter()
            .map(|p| ProjectileView {
                id: p.id,
                kind: p.kind(),
                size: p.size,
                splash_radius: p.splash_radius,
                drops: p.drops().iter().filter(|d| d.active).map(|d| d.pos).collect(),
            })
            .collect();

        let pickups = state
            .pickups
            .iter()
            .map(|p| PickupView {
                id: p.id,
                pos: p.pos,
                size: p.size,
                kind: p.kind,
                remaining: p.remaining,
            })
            .collect();

        let player = &state.player;
        let power = player.power_state();

        Self {
            canvas: state.canvas,
            lanes,
            vehicles,
            projectiles,
            player: PlayerView {
                pos: player.pos,
                size: player.size,
                facing: player.facing,
                active_drop: player.has_active_drop,
                power_level: player.power_level,
            },
            pickups,
            hud: HudView {
                score: state.score,
                wave: state.wave.wave,
                wave_progress: state.wave.progress(&state.tuning),
                health_percent: player.health_percent(),
                power_level: power.level,
                belly_points: power.belly_points,
                points_to_next: power.points_to_next,
                emergency_mode: state.emergency_mode,
            },
            dead: state.is_game_over(),
            events: state.events.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
