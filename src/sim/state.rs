//! Game state and aggregate counters
//!
//! Everything the orchestrator owns lives here: entity collections, score,
//! wave counters, emergency mode and the per-tick event queue.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pickup::{FoodKind, Pickup};
use super::player::Player;
use super::projectile::{PatternKind, Projectile};
use super::traffic::Traffic;
use super::vehicle::VehicleClass;
use super::wave::WaveState;
use crate::Canvas;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Player died; ticks are no-ops
    GameOver,
}

/// Discrete notifications for the sound/effects layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    HitHonking { vehicle: u32, points: i64, pos: Vec2 },
    HitSilent { vehicle: u32, points: i64, pos: Vec2 },
    HitEmergency { vehicle: u32, points: i64, pos: Vec2 },
    DropFired { kind: PatternKind },
    PowerLevelUp { level: u8 },
    PickupEaten { kind: FoodKind },
    Crash { vehicles: (u32, u32), pos: Vec2 },
    HonkExposure { vehicle: u32, damage: f32 },
    WaveStart { wave: u32 },
    PlayerDeath,
}

/// Monotonic entity id allocator shared by every entity kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIds {
    next: u32,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIds {
    pub fn new(start: u32) -> Self {
        Self { next: start }
    }

    /// Allocate a new entity ID
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub canvas: Canvas,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Never negative; deltas are clamped at zero
    pub score: u64,
    pub wave: WaveState,
    pub traffic: Traffic,
    pub player: Player,
    /// Active casts (at most one per player)
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    /// Seconds until the next pickup spawn attempt
    pub pickup_timer: f32,
    /// Set by a crash; forces emergency-class spawns while budget remains
    pub emergency_mode: bool,
    pub emergency_spawns_remaining: u32,
    /// Honkers the sound layer should play this tick
    pub audible_honks: Vec<u32>,
    /// Seconds of simulated play
    pub elapsed: f32,
    /// Events raised during the last tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    pub ids: EntityIds,
}

impl GameState {
    pub fn new(canvas: Canvas, tuning: Tuning) -> Self {
        let mut ids = EntityIds::default();
        let player = Player::new(ids.next_id(), canvas);
        Self {
            canvas,
            phase: GamePhase::Playing,
            score: 0,
            wave: WaveState::new(&tuning),
            traffic: Traffic::new(canvas, &tuning),
            player,
            projectiles: Vec::new(),
            pickups: Vec::new(),
            pickup_timer: tuning.pickup_interval,
            emergency_mode: false,
            emergency_spawns_remaining: 0,
            audible_honks: Vec::new(),
            elapsed: 0.0,
            events: Vec::new(),
            ids,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        self.ids.next_id()
    }

    /// Apply a signed score change, clamping at zero
    pub fn apply_score_delta(&mut self, delta: i64) {
        self.score = if delta >= 0 {
            self.score.saturating_add(delta as u64)
        } else {
            self.score.saturating_sub(delta.unsigned_abs())
        };
    }

    /// Earshot of a honking vehicle on the current wave
    pub fn honk_radius(&self, class: VehicleClass) -> f32 {
        let t = &self.tuning;
        let waves = self.wave.wave.saturating_sub(1) as f32;
        let radius = (t.honk_radius_base + t.honk_radius_per_wave * waves).min(t.honk_radius_max);
        match class {
            VehicleClass::Ordinary => radius,
            VehicleClass::Emergency => radius * t.emergency_radius_factor,
        }
    }

    /// A crash happened: top the emergency budget back up
    pub fn enter_emergency_mode(&mut self) {
        if !self.emergency_mode {
            log::info!("Emergency mode: next {} spawns are emergency vehicles", self.tuning.emergency_spawn_budget);
        }
        self.emergency_spawns_remaining = self.emergency_spawns_remaining.max(self.tuning.emergency_spawn_budget);
        self.emergency_mode = self.emergency_spawns_remaining > 0;
    }

    /// Class the next spawn must use
    pub fn next_spawn_class(&self) -> VehicleClass {
        if self.emergency_mode && self.emergency_spawns_remaining > 0 {
            VehicleClass::Emergency
        } else {
            VehicleClass::Ordinary
        }
    }

    /// One emergency spawn went out (or fell back to ordinary)
    pub fn consume_emergency_spawn(&mut self) {
        self.emergency_spawns_remaining = self.emergency_spawns_remaining.saturating_sub(1);
        if self.emergency_spawns_remaining == 0 && self.emergency_mode {
            self.emergency_mode = false;
            log::info!("Emergency mode over");
        }
    }

    /// Adopt a new canvas size
    pub fn resize(&mut self, canvas: Canvas) {
        self.canvas = canvas;
        self.traffic.resize(canvas, &self.tuning);
        let half = self.player.size * 0.5;
        self.player.pos = self.player.pos.clamp(half, (canvas.size() - half).max(half));
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let mut ids = EntityIds::default();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_eq!(a, 1);
        assert!(b > a);
        assert_eq!(EntityIds::new(100).next_id(), 100);
    }

    #[test]
    fn test_score_clamped_at_zero() {
        let mut state = GameState::new(Canvas::default(), Tuning::default());
        state.apply_score_delta(-50);
        assert_eq!(state.score, 0);
        state.apply_score_delta(30);
        state.apply_score_delta(-5);
        assert_eq!(state.score, 25);
    }

    #[test]
    fn test_honk_radius_grows_and_caps() {
        let mut state = GameState::new(Canvas::default(), Tuning::default());
        let t = state.tuning.clone();
        assert_eq!(state.honk_radius(VehicleClass::Ordinary), t.honk_radius_base);
        assert_eq!(
            state.honk_radius(VehicleClass::Emergency),
            t.honk_radius_base * t.emergency_radius_factor
        );
        state.wave.wave = 3;
        assert_eq!(
            state.honk_radius(VehicleClass::Ordinary),
            t.honk_radius_base + 2.0 * t.honk_radius_per_wave
        );
        state.wave.wave = 1000;
        assert_eq!(state.honk_radius(VehicleClass::Ordinary), t.honk_radius_max);
    }

    #[test]
    fn test_emergency_budget() {
        let mut state = GameState::new(Canvas::default(), Tuning::default());
        let budget = state.tuning.emergency_spawn_budget;
        assert_eq!(state.next_spawn_class(), VehicleClass::Ordinary);
        state.enter_emergency_mode();
        assert!(state.emergency_mode);
        for _ in 0..budget {
            assert_eq!(state.next_spawn_class(), VehicleClass::Emergency);
            state.consume_emergency_spawn();
        }
        assert!(!state.emergency_mode);
        assert_eq!(state.next_spawn_class(), VehicleClass::Ordinary);
    }

    #[test]
    fn test_second_crash_refills_budget_without_stacking() {
        let mut state = GameState::new(Canvas::default(), Tuning::default());
        let budget = state.tuning.emergency_spawn_budget;
        state.enter_emergency_mode();
        state.consume_emergency_spawn();
        state.enter_emergency_mode();
        assert_eq!(state.emergency_spawns_remaining, budget);
    }

    #[test]
    fn test_resize_keeps_player_on_canvas() {
        let mut state = GameState::new(Canvas::default(), Tuning::default());
        state.player.pos = Vec2::new(900.0, 600.0);
        state.resize(Canvas::new(400.0, 300.0));
        assert!(state.player.pos.x <= 400.0 - state.player.size.x * 0.5);
        assert!(state.player.pos.y <= 300.0 - state.player.size.y * 0.5);
    }
}
