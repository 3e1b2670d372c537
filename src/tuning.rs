//! Data-driven game balance
//!
//! Every policy number the simulation uses lives here so a host page can
//! ship a JSON override without a rebuild. Missing fields fall back to
//! defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors from loading a tuning document
#[derive(Debug)]
pub enum TuningError {
    /// Document is not valid JSON for this schema
    Parse(serde_json::Error),
    /// A value is out of its allowed range
    Invalid { field: &'static str, reason: &'static str },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "tuning parse error: {e}"),
            Self::Invalid { field, reason } => write!(f, "invalid tuning `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

/// Game balance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Road layout (fractions of canvas height) ===
    /// Top edge of lane 0
    pub road_top: f32,
    /// Height of one lane band
    pub lane_height: f32,

    // === Vehicles ===
    /// Ordinary base speed range (px/s) at wave 1
    pub vehicle_speed_min: f32,
    pub vehicle_speed_max: f32,
    /// Emergency base speed range (px/s)
    pub emergency_speed_min: f32,
    pub emergency_speed_max: f32,
    /// Base speed multiplier gained per wave, and its cap
    pub speed_growth_per_wave: f32,
    pub speed_growth_cap: f32,
    /// Deceleration and acceleration, as fractions of base speed per second
    pub brake_rate: f32,
    pub accel_rate: f32,

    // === Collision avoidance ===
    /// Opposing time-to-collision that starts a slowdown (s)
    pub slow_ttc: f32,
    /// Opposing time-to-collision that triggers a lane change (s)
    pub lane_change_ttc: f32,
    /// Opposing time-to-collision that counts as an emergency situation (s)
    pub emergency_ttc: f32,
    /// Same-direction gaps, in vehicle widths
    pub follow_slow_widths: f32,
    pub follow_change_widths: f32,
    pub follow_emergency_widths: f32,
    /// Slowdown target range, as fractions of base speed
    pub slowdown_min: f32,
    pub slowdown_max: f32,
    /// Below this fraction of base speed two overlapping vehicles pass through
    pub ghost_speed_fraction: f32,
    /// Target lane must be clear within this many vehicle widths
    pub lane_safety_widths: f32,
    /// Duration of the lane-change transition (s)
    pub lane_change_duration: f32,

    // === Crashes ===
    pub crash_duration: f32,
    pub wreck_duration: f32,

    // === Honking ===
    /// Chance a vehicle spawns as a honker
    pub honk_onset_chance: f32,
    pub honk_duration_min: f32,
    pub honk_duration_max: f32,
    pub honk_cooldown_min: f32,
    pub honk_cooldown_max: f32,
    /// Ordinary honks audible at once (presentation budget)
    pub max_concurrent_honks: usize,
    /// Hearing damage per honk-proximity event
    pub honk_damage: f32,
    /// Minimum spacing between exposure events from the same vehicle (s)
    pub honk_exposure_interval: f32,
    /// Detection radius: base + per_wave * (wave - 1), capped
    pub honk_radius_base: f32,
    pub honk_radius_per_wave: f32,
    pub honk_radius_max: f32,
    /// Emergency sirens reach further and hurt more
    pub emergency_radius_factor: f32,
    pub emergency_damage_factor: f32,

    // === Waves ===
    pub wave_duration: f32,
    pub initial_vehicles_per_wave: u32,
    pub vehicles_per_wave_growth: u32,
    pub spawn_interval_base: f32,
    pub spawn_interval_step: f32,
    pub spawn_interval_floor: f32,
    /// Emergency spawns forced after a crash
    pub emergency_spawn_budget: u32,

    // === Pickups ===
    pub pickup_interval: f32,
    pub pickup_lifespan: f32,
    pub max_pickups: usize,
    pub pickup_size: f32,
    /// Health restored per belly point eaten
    pub heal_per_point: f32,

    // === Player ===
    pub player_speed: f32,

    // === Scoring ===
    /// Points per honking hit are `honk_hit_points * (level + 1)`
    pub honk_hit_points: i64,
    /// Penalty for hitting a silent ordinary vehicle
    pub silent_hit_penalty: i64,
    /// Penalty for hitting an emergency vehicle
    pub emergency_hit_penalty: i64,
    /// Splattered vehicle linger at power 0 (s); shrinks to zero at max power
    pub hit_linger: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            road_top: 0.52,
            lane_height: 0.075,

            vehicle_speed_min: 90.0,
            vehicle_speed_max: 150.0,
            emergency_speed_min: 170.0,
            emergency_speed_max: 220.0,
            speed_growth_per_wave: 0.05,
            speed_growth_cap: 1.6,
            brake_rate: 2.0,
            accel_rate: 0.8,

            slow_ttc: 3.0,
            lane_change_ttc: 2.0,
            emergency_ttc: 1.0,
            follow_slow_widths: 4.0,
            follow_change_widths: 2.0,
            follow_emergency_widths: 1.0,
            slowdown_min: 0.05,
            slowdown_max: 0.30,
            ghost_speed_fraction: 0.30,
            lane_safety_widths: 2.0,
            lane_change_duration: 0.6,

            crash_duration: 1.0,
            wreck_duration: 6.0,

            honk_onset_chance: 0.28,
            honk_duration_min: 1.0,
            honk_duration_max: 2.5,
            honk_cooldown_min: 2.0,
            honk_cooldown_max: 4.0,
            max_concurrent_honks: 3,
            honk_damage: 2.0,
            honk_exposure_interval: 0.5,
            honk_radius_base: 120.0,
            honk_radius_per_wave: 10.0,
            honk_radius_max: 250.0,
            emergency_radius_factor: 1.5,
            emergency_damage_factor: 2.0,

            wave_duration: 30.0,
            initial_vehicles_per_wave: 6,
            vehicles_per_wave_growth: 2,
            spawn_interval_base: 2.0,
            spawn_interval_step: 0.15,
            spawn_interval_floor: 0.5,
            emergency_spawn_budget: 2,

            pickup_interval: 4.0,
            pickup_lifespan: 8.0,
            max_pickups: 3,
            pickup_size: 22.0,
            heal_per_point: 3.0,

            player_speed: 260.0,

            honk_hit_points: 10,
            silent_hit_penalty: 5,
            emergency_hit_penalty: 50,
            hit_linger: 0.8,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse a tuning document, falling back to defaults on any error
    pub fn load_or_default(json: Option<&str>) -> Self {
        match json.map(Self::from_json) {
            Some(Ok(tuning)) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Some(Err(e)) => {
                log::warn!("{e}; using default tuning");
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Serialize to JSON (for shipping a baseline document)
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check ranges that would otherwise break the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        fn range(field: &'static str, lo: f32, hi: f32) -> Result<(), TuningError> {
            if lo < 0.0 || lo > hi {
                return Err(TuningError::Invalid {
                    field,
                    reason: "range must satisfy 0 <= min <= max",
                });
            }
            Ok(())
        }
        fn positive(field: &'static str, v: f32) -> Result<(), TuningError> {
            if v <= 0.0 || !v.is_finite() {
                return Err(TuningError::Invalid {
                    field,
                    reason: "must be positive",
                });
            }
            Ok(())
        }

        range("vehicle_speed", self.vehicle_speed_min, self.vehicle_speed_max)?;
        range("emergency_speed", self.emergency_speed_min, self.emergency_speed_max)?;
        range("slowdown", self.slowdown_min, self.slowdown_max)?;
        range("honk_duration", self.honk_duration_min, self.honk_duration_max)?;
        range("honk_cooldown", self.honk_cooldown_min, self.honk_cooldown_max)?;
        if self.slowdown_max > 1.0 {
            return Err(TuningError::Invalid {
                field: "slowdown_max",
                reason: "must not exceed 1.0",
            });
        }
        if !(0.0..=1.0).contains(&self.honk_onset_chance) {
            return Err(TuningError::Invalid {
                field: "honk_onset_chance",
                reason: "must be a probability",
            });
        }
        if self.road_top + self.lane_height * crate::consts::LANE_COUNT as f32 > 1.0 {
            return Err(TuningError::Invalid {
                field: "lane_height",
                reason: "road does not fit on the canvas",
            });
        }
        positive("lane_height", self.lane_height)?;
        positive("lane_change_duration", self.lane_change_duration)?;
        positive("wave_duration", self.wave_duration)?;
        positive("spawn_interval_floor", self.spawn_interval_floor)?;
        positive("pickup_interval", self.pickup_interval)?;
        positive("pickup_lifespan", self.pickup_lifespan)?;
        positive("player_speed", self.player_speed)?;
        positive("brake_rate", self.brake_rate)?;
        positive("accel_rate", self.accel_rate)?;
        Ok(())
    }
}
