//! Projectile × vehicle resolution
//!
//! Advances every cast, hit-tests each live drop against the vehicles
//! (bounding-box overlap, or within the splash radius of the vehicle box),
//! marks hit vehicles for removal and reports what happened. Sounds, effects
//! and the score itself are the caller's business.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::projectile::{PatternKind, Projectile};
use super::vehicle::{Vehicle, VehicleClass};
use crate::consts::MAX_POWER_LEVEL;
use crate::tuning::Tuning;

/// One scoring event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub projectile_id: u32,
    pub vehicle_id: u32,
    pub class: VehicleClass,
    /// Whether the vehicle was honking when hit
    pub honking: bool,
    /// Signed score change
    pub points: i64,
    /// Where the hit landed
    pub pos: Vec2,
}

/// Score for hitting a vehicle at the given power level
pub fn hit_points(class: VehicleClass, honking: bool, power_level: u8, tuning: &Tuning) -> i64 {
    match class {
        VehicleClass::Emergency => -tuning.emergency_hit_penalty,
        VehicleClass::Ordinary if honking => tuning.honk_hit_points * (power_level as i64 + 1),
        VehicleClass::Ordinary => -tuning.silent_hit_penalty,
    }
}

/// How long a hit vehicle lingers before removal; instant at max power
pub fn hit_linger(power_level: u8, tuning: &Tuning) -> f32 {
    let level = power_level.min(MAX_POWER_LEVEL) as f32;
    tuning.hit_linger * (1.0 - level / MAX_POWER_LEVEL as f32)
}

/// Advance projectiles and resolve their hits against `vehicles`
pub fn resolve(
    dt: f32,
    projectiles: &mut [Projectile],
    vehicles: &mut [Vehicle],
    power_level: u8,
    canvas_height: f32,
    tuning: &Tuning,
) -> Vec<ScoreDelta> {
    let mut deltas = Vec::new();
    let linger = hit_linger(power_level, tuning);

    for projectile in projectiles.iter_mut() {
        projectile.advance(dt, canvas_height);
        if projectile.is_spent() {
            continue;
        }

        let id = projectile.id;
        let size = projectile.size;
        let splash = projectile.splash_radius;
        let kind = projectile.kind();

        for drop in projectile.drops_mut().iter_mut().filter(|d| d.active) {
            let bounds = Aabb::from_center(drop.pos, Vec2::splat(size));

            for vehicle in vehicles.iter_mut() {
                if vehicle.is_hit() || vehicle.is_crashed() {
                    continue;
                }
                let vb = vehicle.bounds();
                let direct = bounds.overlaps(&vb);
                let splashed = splash > 0.0 && vb.distance_to_point(drop.pos) <= splash;
                if !(direct || splashed) {
                    continue;
                }

                let honking = vehicle.is_honking();
                vehicle.hit_timer = Some(linger);
                deltas.push(ScoreDelta {
                    projectile_id: id,
                    vehicle_id: vehicle.id,
                    class: vehicle.class,
                    honking,
                    points: hit_points(vehicle.class, honking, power_level, tuning),
                    pos: drop.pos,
                });

                match kind {
                    PatternKind::Single | PatternKind::Multi => {
                        drop.active = false;
                        break;
                    }
                    // Line drops stay live for the whole cast
                    PatternKind::Line => {}
                }
            }
        }
    }

    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::projectile::power_stats;
    use crate::sim::vehicle::Heading;

    fn vehicle(id: u32, x: f32, y: f32, honking: bool) -> Vehicle {
        let mut v = Vehicle::new(
            id,
            Vec2::new(x, y),
            Vec2::new(60.0, 30.0),
            2,
            Heading::Right,
            VehicleClass::Ordinary,
            Some(0),
            0.0,
        );
        v.honk.active = honking;
        v
    }

    #[test]
    fn test_points_by_honk_state() {
        let t = Tuning::default();
        assert!(hit_points(VehicleClass::Ordinary, true, 0, &t) > 0);
        assert!(hit_points(VehicleClass::Ordinary, false, 0, &t) < 0);
        assert_eq!(hit_points(VehicleClass::Emergency, true, 4, &t), -t.emergency_hit_penalty);
        assert_eq!(hit_points(VehicleClass::Emergency, false, 0, &t), -t.emergency_hit_penalty);
        assert!(hit_points(VehicleClass::Ordinary, true, 3, &t) > hit_points(VehicleClass::Ordinary, true, 0, &t));
    }

    #[test]
    fn test_linger_shrinks_to_instant() {
        let t = Tuning::default();
        assert_eq!(hit_linger(0, &t), t.hit_linger);
        assert!(hit_linger(2, &t) < hit_linger(1, &t));
        assert_eq!(hit_linger(MAX_POWER_LEVEL, &t), 0.0);
    }

    #[test]
    fn test_single_scores_once() {
        let t = Tuning::default();
        let mut projectiles = vec![Projectile::cast(9, 0, Vec2::new(100.0, 300.0), &power_stats(0))];
        // Two vehicles stacked under the drop
        let mut vehicles = vec![vehicle(1, 100.0, 300.0, true), vehicle(2, 100.0, 305.0, true)];
        let mut deltas = Vec::new();
        for _ in 0..10 {
            deltas.extend(resolve(0.016, &mut projectiles, &mut vehicles, 0, 600.0, &t));
        }
        assert_eq!(deltas.len(), 1);
        assert!(projectiles[0].is_spent());
        assert_eq!(vehicles[0].hit_timer, Some(t.hit_linger));
        assert!(vehicles[1].hit_timer.is_none());
    }

    #[test]
    fn test_splash_hits_without_overlap() {
        let t = Tuning::default();
        // Level 1 single: splash 20, size 18. Drop edge misses the box by ~10px.
        let mut projectiles = vec![Projectile::cast(9, 0, Vec2::new(150.0, 300.0), &power_stats(1))];
        let mut vehicles = vec![vehicle(1, 100.0, 300.0, true)];
        let deltas = resolve(0.0, &mut projectiles, &mut vehicles, 1, 600.0, &t);
        assert_eq!(deltas.len(), 1);
        assert!(deltas[0].points > 0);
    }

    #[test]
    fn test_no_splash_means_box_only() {
        let t = Tuning::default();
        let mut projectiles = vec![Projectile::cast(9, 0, Vec2::new(150.0, 300.0), &power_stats(0))];
        let mut vehicles = vec![vehicle(1, 100.0, 300.0, true)];
        let deltas = resolve(0.0, &mut projectiles, &mut vehicles, 0, 600.0, &t);
        assert!(deltas.is_empty());
    }

    #[test]
    fn test_multi_siblings_stay_live() {
        let t = Tuning::default();
        let mut projectiles = vec![Projectile::cast(9, 0, Vec2::new(100.0, 300.0), &power_stats(2))];
        let mut vehicles = vec![vehicle(1, 100.0, 300.0, true)];
        let deltas = resolve(0.0, &mut projectiles, &mut vehicles, 2, 600.0, &t);
        assert_eq!(deltas.len(), 1);
        let active = projectiles[0].drops().iter().filter(|d| d.active).count();
        assert_eq!(active, 2);
        assert!(!projectiles[0].is_spent());
    }

    #[test]
    fn test_line_scores_multiple_vehicles() {
        let t = Tuning::default();
        let stats = power_stats(MAX_POWER_LEVEL);
        let mut projectiles = vec![Projectile::cast(9, 0, Vec2::new(100.0, 200.0), &stats)];
        let mut vehicles = vec![
            vehicle(1, 100.0, 260.0, true),
            vehicle(2, 100.0, 310.0, true),
            vehicle(3, 100.0, 360.0, false),
        ];
        let mut deltas = Vec::new();
        for _ in 0..60 {
            deltas.extend(resolve(1.0 / 60.0, &mut projectiles, &mut vehicles, MAX_POWER_LEVEL, 600.0, &t));
        }
        assert_eq!(deltas.len(), 3);
        // Each vehicle scored once; no drop was consumed
        let mut ids: Vec<u32> = deltas.iter().map(|d| d.vehicle_id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(vehicles[0].hit_timer, Some(0.0));
    }

    #[test]
    fn test_crashed_vehicles_are_not_targets() {
        let t = Tuning::default();
        let mut projectiles = vec![Projectile::cast(9, 0, Vec2::new(100.0, 300.0), &power_stats(0))];
        let mut vehicles = vec![vehicle(1, 100.0, 300.0, true)];
        vehicles[0].crash(|| crate::sim::vehicle::FireHandle(1));
        let deltas = resolve(0.0, &mut projectiles, &mut vehicles, 0, 600.0, &t);
        assert!(deltas.is_empty());
        assert!(!projectiles[0].is_spent());
    }
}
