//! Multi-lane traffic simulation
//!
//! Owns every vehicle on the road. Each tick runs in a fixed order:
//! 1. hazard assessment and response (braking, lane changes) on the
//!    positions of the previous tick
//! 2. integration (honk timers, speed ramp, movement, lane interpolation)
//! 3. contact resolution (ghosting, head-on crashes, soft rear contacts)
//!
//! Crashes are returned to the caller as `CrashEvent`s rather than
//! dispatched, so the orchestrator decides what happens next.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::{SpriteCatalog, choose_sprite};
use super::collision::{edge_gap, time_to_collision};
use super::rng::RandomSource;
use super::state::EntityIds;
use super::vehicle::{FireHandle, Heading, Vehicle, VehicleClass};
use crate::Canvas;
use crate::consts::LANE_COUNT;
use crate::tuning::Tuning;

/// Lanes ordinary vehicles spawn in
pub const SPAWN_LANES: [usize; 3] = [1, 2, 3];
/// Lanes reserved for emergency vehicles
pub const EMERGENCY_LANES: [usize; 2] = [0, LANE_COUNT - 1];

#[inline]
pub fn is_emergency_lane(lane: usize) -> bool {
    EMERGENCY_LANES.contains(&lane)
}

/// Fixed horizontal lane bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneLayout {
    /// Top edge of lane 0
    pub top: f32,
    pub lane_height: f32,
}

impl LaneLayout {
    pub fn new(canvas: Canvas, tuning: &Tuning) -> Self {
        Self {
            top: canvas.height * tuning.road_top,
            lane_height: canvas.height * tuning.lane_height,
        }
    }

    /// Y of a lane's centerline
    #[inline]
    pub fn center_y(&self, lane: usize) -> f32 {
        self.top + (lane as f32 + 0.5) * self.lane_height
    }
}

/// Two vehicles collided head-on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrashEvent {
    pub vehicles: (u32, u32),
    pub fires: (FireHandle, FireHandle),
    /// Midpoint of the impact
    pub pos: Vec2,
}

/// What a vehicle sees in its lane this tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hazard {
    /// Nearest opposing time-to-collision (None = nothing on a collision course)
    pub oncoming_ttc: Option<f32>,
    /// Nearest same-direction gap ahead
    pub ahead_gap: Option<f32>,
    pub slow: bool,
    pub change_lane: bool,
    /// Imminent collision: emergency lanes become valid targets
    pub emergency: bool,
    /// The lane change was triggered by opposing traffic
    pub oncoming: bool,
}

/// The set of vehicles plus the road they drive on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traffic {
    pub vehicles: Vec<Vehicle>,
    pub lanes: LaneLayout,
    pub canvas: Canvas,
}

impl Traffic {
    pub fn new(canvas: Canvas, tuning: &Tuning) -> Self {
        Self {
            vehicles: Vec::new(),
            lanes: LaneLayout::new(canvas, tuning),
            canvas,
        }
    }

    /// Adopt a new canvas size; vehicles not mid-change snap to the new bands
    pub fn resize(&mut self, canvas: Canvas, tuning: &Tuning) {
        self.canvas = canvas;
        self.lanes = LaneLayout::new(canvas, tuning);
        for v in &mut self.vehicles {
            if v.lane_change.is_none() {
                v.pos.y = self.lanes.center_y(v.lane);
            }
        }
    }

    /// Vehicles that still count as traffic (not crashed, not splattered)
    pub fn live_count(&self) -> usize {
        self.vehicles
            .iter()
            .filter(|v| !v.is_crashed() && !v.is_hit())
            .count()
    }

    pub fn get(&self, id: u32) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    /// Spawn a vehicle at the edge of the canvas
    ///
    /// Emergency requests fall back to ordinary when no emergency sprite is
    /// available. Returns `None` when every candidate lane entry is blocked;
    /// the caller retries on a later tick.
    pub fn spawn(
        &mut self,
        class: VehicleClass,
        wave: u32,
        ids: &mut EntityIds,
        tuning: &Tuning,
        rng: &mut dyn RandomSource,
        catalog: &dyn SpriteCatalog,
    ) -> Option<u32> {
        let heading = Heading::from_sign(rng.sign());
        let choice = choose_sprite(catalog, class, heading, rng);

        let lanes: &[usize] = match choice.class {
            VehicleClass::Ordinary => &SPAWN_LANES,
            VehicleClass::Emergency => &EMERGENCY_LANES,
        };
        let start = rng.index(lanes.len());
        let entry_x = match choice.heading {
            Heading::Right => -choice.size.x * 0.5,
            Heading::Left => self.canvas.width + choice.size.x * 0.5,
        };
        let lane = (0..lanes.len())
            .map(|k| lanes[(start + k) % lanes.len()])
            .find(|&lane| self.entry_clear(lane, entry_x, choice.size.x, tuning))?;

        let (lo, hi) = match choice.class {
            VehicleClass::Ordinary => (tuning.vehicle_speed_min, tuning.vehicle_speed_max),
            VehicleClass::Emergency => (tuning.emergency_speed_min, tuning.emergency_speed_max),
        };
        let growth = (1.0 + tuning.speed_growth_per_wave * wave.saturating_sub(1) as f32)
            .min(tuning.speed_growth_cap);
        let base_speed = rng.range(lo, hi) * growth;

        let id = ids.next_id();
        let mut vehicle = Vehicle::new(
            id,
            Vec2::new(entry_x, self.lanes.center_y(lane)),
            choice.size,
            lane,
            choice.heading,
            choice.class,
            choice.variant,
            base_speed,
        );
        match choice.class {
            VehicleClass::Emergency => vehicle.honk.sound_siren(),
            VehicleClass::Ordinary => {
                if rng.chance(tuning.honk_onset_chance) {
                    vehicle.honk.habitual = true;
                    vehicle.start_honk(tuning, rng);
                }
            }
        }

        log::debug!(
            "Spawned {:?} #{} lane {} heading {:?} speed {:.0}",
            vehicle.class,
            id,
            lane,
            vehicle.heading,
            base_speed
        );
        self.vehicles.push(vehicle);
        Some(id)
    }

    /// No vehicle within the safety distance of a lane's entry point
    fn entry_clear(&self, lane: usize, entry_x: f32, width: f32, tuning: &Tuning) -> bool {
        let safety = tuning.lane_safety_widths * width;
        self.vehicles
            .iter()
            .filter(|v| v.occupies(lane))
            .all(|v| (v.pos.x - entry_x).abs() >= safety)
    }

    /// Advance every vehicle by `dt` and return the crashes that happened
    pub fn tick(
        &mut self,
        dt: f32,
        tuning: &Tuning,
        rng: &mut dyn RandomSource,
        ids: &mut EntityIds,
    ) -> Vec<CrashEvent> {
        // Avoidance runs against last tick's positions
        for i in 0..self.vehicles.len() {
            if self.vehicles[i].is_crashed() {
                continue;
            }
            let hazard = self.assess(i, tuning);
            let target_lane = if hazard.change_lane && self.vehicles[i].lane_change.is_none() {
                self.pick_lane(i, &hazard, tuning, rng)
            } else {
                None
            };
            self.respond(i, &hazard, target_lane, tuning, rng);
        }

        for v in &mut self.vehicles {
            if let Some(t) = v.hit_timer.as_mut() {
                *t -= dt;
            }
            if v.is_crashed() {
                v.update_crash(dt, tuning);
                continue;
            }
            v.honk.update(dt, tuning, rng);
            v.update_speed(dt, tuning);
            v.advance(dt);
            v.update_lane_change(dt, tuning.lane_change_duration);
        }

        self.resolve_contacts(tuning, ids)
    }

    /// Scan the vehicle's lane(s) for oncoming and leading traffic
    pub fn assess(&self, index: usize, tuning: &Tuning) -> Hazard {
        let me = &self.vehicles[index];
        let target_lane = me.lane_change.map(|lc| lc.to_lane);
        let mut hazard = Hazard::default();
        let mut passing = false;

        for (j, other) in self.vehicles.iter().enumerate() {
            if j == index {
                continue;
            }
            let shares_lane = other.occupies(me.lane) || target_lane.is_some_and(|l| other.occupies(l));
            if !shares_lane {
                continue;
            }

            if other.heading != me.heading {
                // Still inside an opposing vehicle: hold the crawl until clear
                if edge_gap(me.pos.x, me.width(), other.pos.x, other.width()) < 0.0 {
                    passing = true;
                }
                let ttc = time_to_collision(
                    me.pos.x,
                    me.width(),
                    me.velocity(),
                    other.pos.x,
                    other.width(),
                    other.velocity(),
                );
                if let Some(t) = ttc {
                    hazard.oncoming_ttc = Some(hazard.oncoming_ttc.map_or(t, |cur| cur.min(t)));
                }
            } else {
                let ahead = (other.pos.x - me.pos.x) * me.heading.sign() > 0.0;
                if ahead {
                    let gap = edge_gap(me.pos.x, me.width(), other.pos.x, other.width());
                    hazard.ahead_gap = Some(hazard.ahead_gap.map_or(gap, |cur| cur.min(gap)));
                }
            }
        }

        let w = me.width();
        let ttc_below = |limit: f32| hazard.oncoming_ttc.is_some_and(|t| t < limit);
        let gap_below = |widths: f32| hazard.ahead_gap.is_some_and(|g| g < widths * w);

        hazard.slow =
            passing || ttc_below(tuning.slow_ttc) || gap_below(tuning.follow_slow_widths);
        hazard.change_lane =
            ttc_below(tuning.lane_change_ttc) || gap_below(tuning.follow_change_widths);
        hazard.emergency = ttc_below(tuning.emergency_ttc) || gap_below(tuning.follow_emergency_widths);
        hazard.oncoming = ttc_below(tuning.lane_change_ttc);
        hazard
    }

    /// Choose an adjacent lane that is clear, or None
    pub fn pick_lane(
        &self,
        index: usize,
        hazard: &Hazard,
        tuning: &Tuning,
        rng: &mut dyn RandomSource,
    ) -> Option<usize> {
        let me = &self.vehicles[index];
        let emergency_ok = hazard.emergency || me.class == VehicleClass::Emergency;

        let candidates: Vec<usize> = [me.lane.checked_sub(1), Some(me.lane + 1)]
            .into_iter()
            .flatten()
            .filter(|&lane| lane < LANE_COUNT)
            .filter(|&lane| emergency_ok || !is_emergency_lane(lane))
            .filter(|&lane| self.lane_clear(index, lane, tuning))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        if hazard.oncoming {
            // Rightward traffic drifts to lower indices, leftward to higher
            let preferred = match me.heading {
                Heading::Right => me.lane.checked_sub(1),
                Heading::Left => Some(me.lane + 1),
            };
            if let Some(lane) = preferred.filter(|l| candidates.contains(l)) {
                return Some(lane);
            }
        }

        Some(candidates[rng.index(candidates.len())])
    }

    /// No other vehicle in `lane` within the safety distance
    fn lane_clear(&self, index: usize, lane: usize, tuning: &Tuning) -> bool {
        let me = &self.vehicles[index];
        let safety = tuning.lane_safety_widths * me.width();
        self.vehicles
            .iter()
            .enumerate()
            .filter(|&(j, v)| j != index && v.occupies(lane))
            .all(|(_, v)| (v.pos.x - me.pos.x).abs() >= safety)
    }

    fn respond(
        &mut self,
        index: usize,
        hazard: &Hazard,
        target_lane: Option<usize>,
        tuning: &Tuning,
        rng: &mut dyn RandomSource,
    ) {
        let lanes = self.lanes;
        let v = &mut self.vehicles[index];

        if hazard.slow {
            let factor = match v.slowdown {
                Some(f) => f,
                None => {
                    let f = rng.range(tuning.slowdown_min, tuning.slowdown_max);
                    v.slowdown = Some(f);
                    if v.class == VehicleClass::Ordinary {
                        v.start_honk(tuning, rng);
                    }
                    f
                }
            };
            v.target_speed = v.base_speed * factor;
        } else {
            v.slowdown = None;
            v.target_speed = v.base_speed;
        }

        if let Some(lane) = target_lane {
            if v.begin_lane_change(lane, lanes.center_y(lane)) {
                log::debug!("Vehicle #{} changing lane {} -> {}", v.id, v.lane, lane);
            }
        }
    }

    /// Overlap checks between every pair of vehicles still in traffic
    fn resolve_contacts(&mut self, tuning: &Tuning, ids: &mut EntityIds) -> Vec<CrashEvent> {
        let mut crashes = Vec::new();
        let n = self.vehicles.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let (head, tail) = self.vehicles.split_at_mut(j);
                let a = &mut head[i];
                let b = &mut tail[0];

                if a.is_crashed() || b.is_crashed() || a.is_hit() || b.is_hit() {
                    continue;
                }
                if !a.bounds().overlaps(&b.bounds()) {
                    continue;
                }
                // Near-stationary congestion passes through
                if a.is_slow(tuning.ghost_speed_fraction) && b.is_slow(tuning.ghost_speed_fraction) {
                    continue;
                }

                if a.heading != b.heading {
                    // Centers already crossed: the pair is separating
                    if (b.pos.x - a.pos.x) * a.heading.sign() < 0.0 {
                        continue;
                    }
                    let fire_a = a.crash(|| FireHandle(ids.next_id()));
                    let fire_b = b.crash(|| FireHandle(ids.next_id()));
                    if let (Some(fa), Some(fb)) = (fire_a, fire_b) {
                        let pos = (a.pos + b.pos) * 0.5;
                        log::debug!("Crash between #{} and #{} at {:?}", a.id, b.id, pos);
                        crashes.push(CrashEvent {
                            vehicles: (a.id, b.id),
                            fires: (fa, fb),
                            pos,
                        });
                    }
                } else {
                    // Rear contact: the follower can go no faster than the leader
                    let a_leads = (a.pos.x - b.pos.x) * a.heading.sign() > 0.0;
                    let (leader, follower) = if a_leads { (a, b) } else { (b, a) };
                    follower.speed = follower.speed.min(leader.speed);
                    follower.target_speed = follower.target_speed.min(leader.speed);
                }
            }
        }

        crashes
    }

    /// Ordinary honkers allowed to sound this tick, plus every siren
    pub fn audible_honkers(&self, cap: usize) -> Vec<u32> {
        let mut ordinary = 0;
        self.vehicles
            .iter()
            .filter(|v| v.is_honking())
            .filter(|v| {
                if v.class == VehicleClass::Emergency {
                    return true;
                }
                ordinary += 1;
                ordinary <= cap
            })
            .map(|v| v.id)
            .collect()
    }

    /// Remove vehicles that left the canvas, burned out, or finished their
    /// post-hit linger. Returns how many were removed.
    pub fn prune(&mut self, tuning: &Tuning) -> usize {
        let before = self.vehicles.len();
        let width = self.canvas.width;
        self.vehicles.retain(|v| {
            let hit_done = v.hit_timer.is_some_and(|t| t <= 0.0);
            !(v.has_exited(width) || v.is_wreck_expired(tuning) || hit_done)
        });
        before - self.vehicles.len()
    }
}
