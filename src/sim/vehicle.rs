//! Vehicle agent and its per-vehicle state machines
//!
//! A vehicle owns three small state machines that the traffic simulation
//! drives: honking (silent/honking/cooldown), lane change (none/in progress)
//! and crash (none/crashing/wrecked). Crash is terminal for the other two.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::rng::RandomSource;
use crate::smoothstep;
use crate::tuning::Tuning;

/// Vehicle class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleClass {
    Ordinary,
    Emergency,
}

/// Direction of travel along x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    /// +x
    Right,
    /// -x
    Left,
}

impl Heading {
    /// Velocity sign
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Heading::Right => 1.0,
            Heading::Left => -1.0,
        }
    }

    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Heading::Right => Heading::Left,
            Heading::Left => Heading::Right,
        }
    }

    pub fn from_sign(sign: f32) -> Self {
        if sign >= 0.0 { Heading::Right } else { Heading::Left }
    }
}

/// Handle to the fire/smoke effect attached to a crashed vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FireHandle(pub u32);

/// Crash lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CrashState {
    None,
    /// Impact animation playing
    Crashing { timer: f32, fire: FireHandle },
    /// Burning wreck; removed when `timer` reaches the wreck duration
    Wrecked { timer: f32, fire: FireHandle },
}

/// Honking state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HonkState {
    /// Spawned as a habitual honker (re-honks after each cooldown)
    pub habitual: bool,
    /// Emergency siren: honks continuously until cancelled
    pub siren: bool,
    pub active: bool,
    /// Remaining honk time while active
    pub timer: f32,
    /// Remaining quiet time before another episode may start
    pub cooldown: f32,
    /// Remaining time before this honk can hurt the player again
    pub exposure_cooldown: f32,
}

impl HonkState {
    pub fn silent() -> Self {
        Self {
            habitual: false,
            siren: false,
            active: false,
            timer: 0.0,
            cooldown: 0.0,
            exposure_cooldown: 0.0,
        }
    }

    /// Begin an episode unless one is running or cooling down.
    /// Returns true if honking started.
    pub fn start(&mut self, tuning: &Tuning, rng: &mut dyn RandomSource) -> bool {
        if self.active || self.cooldown > 0.0 {
            return false;
        }
        self.active = true;
        self.timer = rng.range(tuning.honk_duration_min, tuning.honk_duration_max);
        true
    }

    /// Advance timers; ends the episode and starts the cooldown when due
    pub fn update(&mut self, dt: f32, tuning: &Tuning, rng: &mut dyn RandomSource) {
        self.exposure_cooldown = (self.exposure_cooldown - dt).max(0.0);
        if self.siren {
            self.active = true;
            return;
        }
        if self.active {
            self.timer -= dt;
            if self.timer <= 0.0 {
                self.active = false;
                self.timer = 0.0;
                self.cooldown = rng.range(tuning.honk_cooldown_min, tuning.honk_cooldown_max);
            }
        } else if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
            if self.cooldown == 0.0 && self.habitual {
                self.start(tuning, rng);
            }
        }
    }

    /// Switch on a continuous siren
    pub fn sound_siren(&mut self) {
        self.siren = true;
        self.active = true;
        self.timer = 0.0;
        self.cooldown = 0.0;
    }

    pub fn cancel(&mut self) {
        self.habitual = false;
        self.siren = false;
        self.active = false;
        self.timer = 0.0;
        self.cooldown = 0.0;
    }
}

/// An in-progress lane change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneChange {
    pub from_lane: usize,
    pub to_lane: usize,
    pub from_y: f32,
    pub to_y: f32,
    /// 0..1
    pub progress: f32,
}

/// A vehicle on the road
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u32,
    /// Center of the bounding box
    pub pos: Vec2,
    pub size: Vec2,
    pub lane: usize,
    pub heading: Heading,
    pub class: VehicleClass,
    /// Sprite variant chosen at spawn (None = placeholder)
    pub sprite: Option<usize>,
    /// Spawn-time speed; current speed never exceeds it
    pub base_speed: f32,
    /// Current speed magnitude
    pub speed: f32,
    /// Speed the vehicle is ramping toward
    pub target_speed: f32,
    /// Slowdown fraction captured for the current hazard episode
    pub slowdown: Option<f32>,
    pub honk: HonkState,
    pub crash: CrashState,
    pub lane_change: Option<LaneChange>,
    /// Remaining time before a splattered vehicle is removed
    pub hit_timer: Option<f32>,
}

impl Vehicle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        pos: Vec2,
        size: Vec2,
        lane: usize,
        heading: Heading,
        class: VehicleClass,
        sprite: Option<usize>,
        base_speed: f32,
    ) -> Self {
        Self {
            id,
            pos,
            size,
            lane,
            heading,
            class,
            sprite,
            base_speed,
            speed: base_speed,
            target_speed: base_speed,
            slowdown: None,
            honk: HonkState::silent(),
            crash: CrashState::None,
            lane_change: None,
            hit_timer: None,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }

    /// Signed x velocity
    #[inline]
    pub fn velocity(&self) -> f32 {
        self.heading.sign() * self.speed
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn is_crashed(&self) -> bool {
        !matches!(self.crash, CrashState::None)
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit_timer.is_some()
    }

    #[inline]
    pub fn is_honking(&self) -> bool {
        self.honk.active
    }

    pub fn fire(&self) -> Option<FireHandle> {
        match self.crash {
            CrashState::None => None,
            CrashState::Crashing { fire, .. } | CrashState::Wrecked { fire, .. } => Some(fire),
        }
    }

    /// True if the vehicle is in `lane`, counting both ends of a lane change
    pub fn occupies(&self, lane: usize) -> bool {
        self.lane == lane
            || self
                .lane_change
                .is_some_and(|lc| lc.from_lane == lane || lc.to_lane == lane)
    }

    /// Below `fraction` of its own spawn speed
    #[inline]
    pub fn is_slow(&self, fraction: f32) -> bool {
        self.speed < self.base_speed * fraction
    }

    /// Transition to crashed. Idempotent: a second call changes nothing and
    /// allocates nothing. Returns the new fire handle on the first call.
    pub fn crash(&mut self, next_fire: impl FnOnce() -> FireHandle) -> Option<FireHandle> {
        if self.is_crashed() {
            return None;
        }
        let fire = next_fire();
        self.crash = CrashState::Crashing { timer: 0.0, fire };
        self.speed = 0.0;
        self.target_speed = 0.0;
        self.slowdown = None;
        self.honk.cancel();
        // Freeze wherever the lane change got to
        if let Some(lc) = self.lane_change.take() {
            self.lane = if lc.progress >= 0.5 { lc.to_lane } else { lc.from_lane };
        }
        Some(fire)
    }

    /// Burning wreck whose time is up
    pub fn is_wreck_expired(&self, tuning: &Tuning) -> bool {
        matches!(self.crash, CrashState::Wrecked { timer, .. } if timer >= tuning.wreck_duration)
    }

    /// Advance the crash timers. Returns true when the wreck should be removed.
    pub fn update_crash(&mut self, dt: f32, tuning: &Tuning) -> bool {
        match &mut self.crash {
            CrashState::None => false,
            CrashState::Crashing { timer, fire } => {
                *timer += dt;
                if *timer >= tuning.crash_duration {
                    let fire = *fire;
                    self.crash = CrashState::Wrecked { timer: 0.0, fire };
                }
                false
            }
            CrashState::Wrecked { timer, .. } => {
                *timer += dt;
                *timer >= tuning.wreck_duration
            }
        }
    }

    /// Start a honk episode; crashed vehicles stay silent
    pub fn start_honk(&mut self, tuning: &Tuning, rng: &mut dyn RandomSource) -> bool {
        if self.is_crashed() {
            return false;
        }
        self.honk.start(tuning, rng)
    }

    /// Begin an interpolated move to `to_lane` centred at `to_y`.
    /// Ignored while crashed or mid-change.
    pub fn begin_lane_change(&mut self, to_lane: usize, to_y: f32) -> bool {
        if self.is_crashed() || self.lane_change.is_some() || to_lane == self.lane {
            return false;
        }
        self.lane_change = Some(LaneChange {
            from_lane: self.lane,
            to_lane,
            from_y: self.pos.y,
            to_y,
            progress: 0.0,
        });
        true
    }

    /// Advance any lane change; the lane index switches when it completes
    pub fn update_lane_change(&mut self, dt: f32, duration: f32) {
        let Some(lc) = self.lane_change.as_mut() else {
            return;
        };
        lc.progress = (lc.progress + dt / duration).min(1.0);
        self.pos.y = lc.from_y + (lc.to_y - lc.from_y) * smoothstep(lc.progress);
        if lc.progress >= 1.0 {
            self.lane = lc.to_lane;
            self.pos.y = lc.to_y;
            self.lane_change = None;
        }
    }

    /// Ramp current speed toward the target speed, never above base speed
    pub fn update_speed(&mut self, dt: f32, tuning: &Tuning) {
        if self.is_crashed() {
            return;
        }
        let rate = if self.target_speed < self.speed {
            tuning.brake_rate
        } else {
            tuning.accel_rate
        };
        self.speed = crate::approach(self.speed, self.target_speed, self.base_speed * rate * dt)
            .clamp(0.0, self.base_speed);
    }

    /// Move along x by current velocity
    #[inline]
    pub fn advance(&mut self, dt: f32) {
        self.pos.x += self.velocity() * dt;
    }

    /// Fully past the far edge in its direction of travel
    pub fn has_exited(&self, canvas_width: f32) -> bool {
        let half = self.size.x * 0.5;
        match self.heading {
            Heading::Right => self.pos.x - half > canvas_width,
            Heading::Left => self.pos.x + half < 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::SequenceRng;

    fn car() -> Vehicle {
        Vehicle::new(
            1,
            Vec2::new(100.0, 300.0),
            Vec2::new(60.0, 30.0),
            2,
            Heading::Right,
            VehicleClass::Ordinary,
            Some(0),
            120.0,
        )
    }

    #[test]
    fn test_crash_is_idempotent() {
        let mut v = car();
        let mut next = 10;
        let first = v.crash(|| {
            next += 1;
            FireHandle(next)
        });
        let state_after_first = v.crash;
        let second = v.crash(|| {
            next += 1;
            FireHandle(next)
        });
        assert_eq!(first, Some(FireHandle(11)));
        assert_eq!(second, None);
        assert_eq!(v.crash, state_after_first);
        // No second fire allocated
        assert_eq!(next, 11);
        assert_eq!(v.speed, 0.0);
    }

    #[test]
    fn test_crash_cancels_honk_and_lane_change() {
        let mut v = car();
        let tuning = Tuning::default();
        let mut rng = SequenceRng::constant(0.5);
        v.honk.habitual = true;
        assert!(v.start_honk(&tuning, &mut rng));
        v.begin_lane_change(1, 260.0);
        v.crash(|| FireHandle(1));
        assert!(!v.is_honking());
        assert!(v.lane_change.is_none());
        assert!(!v.begin_lane_change(3, 340.0));
        assert!(!v.start_honk(&tuning, &mut rng));
    }

    #[test]
    fn test_crash_progresses_to_removal() {
        let tuning = Tuning::default();
        let mut v = car();
        v.crash(|| FireHandle(1));
        assert!(!v.update_crash(tuning.crash_duration, &tuning));
        assert!(matches!(v.crash, CrashState::Wrecked { .. }));
        assert!(!v.update_crash(tuning.wreck_duration * 0.5, &tuning));
        assert!(v.update_crash(tuning.wreck_duration, &tuning));
        assert_eq!(v.fire(), Some(FireHandle(1)));
    }

    #[test]
    fn test_lane_change_interpolates() {
        let mut v = car();
        assert!(v.begin_lane_change(3, 340.0));
        assert!(!v.begin_lane_change(1, 260.0), "only one change at a time");
        v.update_lane_change(0.3, 0.6);
        assert!(v.pos.y > 300.0 && v.pos.y < 340.0);
        assert!(v.occupies(2) && v.occupies(3));
        v.update_lane_change(0.3, 0.6);
        assert_eq!(v.lane, 3);
        assert_eq!(v.pos.y, 340.0);
        assert!(v.lane_change.is_none());
    }

    #[test]
    fn test_speed_never_exceeds_base() {
        let tuning = Tuning::default();
        let mut v = car();
        v.target_speed = 500.0;
        v.update_speed(10.0, &tuning);
        assert_eq!(v.speed, v.base_speed);
        v.target_speed = 12.0;
        v.update_speed(0.1, &tuning);
        assert!(v.speed < v.base_speed && v.speed > 12.0);
    }

    #[test]
    fn test_honk_cycle() {
        let tuning = Tuning::default();
        let mut rng = SequenceRng::constant(0.0);
        let mut honk = HonkState::silent();
        honk.habitual = true;
        assert!(honk.start(&tuning, &mut rng));
        assert!(!honk.start(&tuning, &mut rng));
        honk.update(tuning.honk_duration_min + 0.01, &tuning, &mut rng);
        assert!(!honk.active);
        assert!(honk.cooldown > 0.0);
        honk.update(tuning.honk_cooldown_min + 0.01, &tuning, &mut rng);
        // Habitual honkers start again after the cooldown
        assert!(honk.active);
    }

    #[test]
    fn test_siren_never_times_out() {
        let tuning = Tuning::default();
        let mut rng = SequenceRng::constant(0.0);
        let mut honk = HonkState::silent();
        honk.sound_siren();
        for _ in 0..100 {
            honk.update(1.0, &tuning, &mut rng);
        }
        assert!(honk.active);
        honk.cancel();
        honk.update(1.0, &tuning, &mut rng);
        assert!(!honk.active);
    }

    #[test]
    fn test_exit_detection() {
        let mut v = car();
        v.pos.x = 1000.0 + 31.0;
        assert!(v.has_exited(1000.0));
        v.heading = Heading::Left;
        assert!(!v.has_exited(1000.0));
        v.pos.x = -31.0;
        assert!(v.has_exited(1000.0));
    }
}
