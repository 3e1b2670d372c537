//! Wave progression
//!
//! `Active(wave, timer)` moves to `Active(wave + 1, 0)` when the wave timer
//! runs out, or when the quota has been spawned and the road is clear.
//! There is no terminal wave; only player death ends a run.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Counters and timers for the current wave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveState {
    /// Current wave (1-based)
    pub wave: u32,
    /// Seconds into the current wave
    pub timer: f32,
    pub vehicles_spawned: u32,
    pub vehicles_per_wave: u32,
    /// Seconds until the next spawn attempt
    pub spawn_timer: f32,
}

/// Seconds between spawns on a given wave; shrinks with the wave down to a floor
pub fn spawn_interval(wave: u32, tuning: &Tuning) -> f32 {
    let steps = wave.saturating_sub(1) as f32;
    (tuning.spawn_interval_base - tuning.spawn_interval_step * steps).max(tuning.spawn_interval_floor)
}

impl WaveState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            wave: 1,
            timer: 0.0,
            vehicles_spawned: 0,
            vehicles_per_wave: tuning.initial_vehicles_per_wave,
            spawn_timer: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.timer += dt;
        self.spawn_timer = (self.spawn_timer - dt).max(0.0);
    }

    /// Quota not yet met and the spawn timer has elapsed
    pub fn spawn_due(&self) -> bool {
        self.vehicles_spawned < self.vehicles_per_wave && self.spawn_timer <= 0.0
    }

    /// Count a successful spawn and restart the spawn timer
    pub fn record_spawn(&mut self, tuning: &Tuning) {
        self.vehicles_spawned += 1;
        self.spawn_timer = spawn_interval(self.wave, tuning);
    }

    pub fn should_advance(&self, live_vehicles: usize, tuning: &Tuning) -> bool {
        let timed_out = self.timer >= tuning.wave_duration;
        let cleared = self.vehicles_spawned >= self.vehicles_per_wave && live_vehicles == 0;
        timed_out || cleared
    }

    /// Move to the next wave. Returns the new wave number.
    pub fn advance(&mut self, tuning: &Tuning) -> u32 {
        self.wave += 1;
        self.vehicles_per_wave += tuning.vehicles_per_wave_growth;
        self.timer = 0.0;
        self.vehicles_spawned = 0;
        self.spawn_timer = 0.0;
        self.wave
    }

    /// Fraction of the wave timer used, for the HUD
    pub fn progress(&self, tuning: &Tuning) -> f32 {
        (self.timer / tuning.wave_duration).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_expiry_advances_with_quota_unmet() {
        let t = Tuning::default();
        let mut w = WaveState::new(&t);
        w.record_spawn(&t);
        w.update(t.wave_duration);
        assert!(w.vehicles_spawned < w.vehicles_per_wave);
        assert!(w.should_advance(3, &t));

        let quota = w.vehicles_per_wave;
        assert_eq!(w.advance(&t), 2);
        assert_eq!(w.timer, 0.0);
        assert_eq!(w.vehicles_spawned, 0);
        assert_eq!(w.vehicles_per_wave, quota + t.vehicles_per_wave_growth);
    }

    #[test]
    fn test_quota_met_waits_for_clear_road() {
        let t = Tuning::default();
        let mut w = WaveState::new(&t);
        w.vehicles_spawned = w.vehicles_per_wave;
        assert!(!w.should_advance(1, &t));
        assert!(w.should_advance(0, &t));
        assert!(!w.spawn_due());
    }

    #[test]
    fn test_spawn_interval_shrinks_to_floor() {
        let t = Tuning::default();
        let mut last = spawn_interval(1, &t);
        for wave in 2..100 {
            let next = spawn_interval(wave, &t);
            assert!(next <= last);
            last = next;
        }
        assert_eq!(last, t.spawn_interval_floor);
    }

    #[test]
    fn test_spawn_timer_gates_spawns() {
        let t = Tuning::default();
        let mut w = WaveState::new(&t);
        assert!(w.spawn_due());
        w.record_spawn(&t);
        assert!(!w.spawn_due());
        w.update(spawn_interval(1, &t));
        assert!(w.spawn_due());
    }

    #[test]
    fn test_progress_is_clamped() {
        let t = Tuning::default();
        let mut w = WaveState::new(&t);
        w.update(t.wave_duration * 0.5);
        assert!((w.progress(&t) - 0.5).abs() < 1e-5);
        w.update(t.wave_duration * 10.0);
        assert_eq!(w.progress(&t), 1.0);
    }
}
