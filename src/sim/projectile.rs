//! Dropped projectiles and the power-level stat table
//!
//! A projectile group is one cast. Its payload is a tagged variant:
//! - `Single`: one drop, gone after its first hit
//! - `Multi`: a spread cluster; each drop deactivates on its own hit
//! - `Line`: a vertical column that keeps every drop live until the cast's
//!   lifetime runs out, so one cast can score several vehicles

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_POWER_LEVEL;

/// Projectile pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    Single,
    Multi,
    Line,
}

/// Derived stats for one power level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerStats {
    /// Edge length of each drop
    pub size: f32,
    /// Seconds between casts
    pub cooldown: f32,
    pub splash_radius: f32,
    pub pattern: PatternKind,
    /// Drops per cast
    pub count: u32,
    /// px/s
    pub fall_speed: f32,
    /// Cast lifetime for line patterns (s)
    pub lifetime: f32,
}

/// Per-level stats: smaller drops, more of them, faster cooldown
const POWER_TABLE: [PowerStats; MAX_POWER_LEVEL as usize + 1] = [
    PowerStats {
        size: 14.0,
        cooldown: 1.0,
        splash_radius: 0.0,
        pattern: PatternKind::Single,
        count: 1,
        fall_speed: 300.0,
        lifetime: 0.0,
    },
    PowerStats {
        size: 18.0,
        cooldown: 0.85,
        splash_radius: 20.0,
        pattern: PatternKind::Single,
        count: 1,
        fall_speed: 320.0,
        lifetime: 0.0,
    },
    PowerStats {
        size: 11.0,
        cooldown: 0.7,
        splash_radius: 16.0,
        pattern: PatternKind::Multi,
        count: 3,
        fall_speed: 340.0,
        lifetime: 0.0,
    },
    PowerStats {
        size: 9.0,
        cooldown: 0.55,
        splash_radius: 14.0,
        pattern: PatternKind::Multi,
        count: 5,
        fall_speed: 360.0,
        lifetime: 0.0,
    },
    PowerStats {
        size: 7.0,
        cooldown: 0.4,
        splash_radius: 12.0,
        pattern: PatternKind::Line,
        count: 8,
        fall_speed: 420.0,
        lifetime: 1.2,
    },
];

/// Stats for a power level (clamped to the table)
pub fn power_stats(level: u8) -> PowerStats {
    POWER_TABLE[level.min(MAX_POWER_LEVEL) as usize]
}

/// One collidable point of a cast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Droplet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub active: bool,
}

impl Droplet {
    fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            vel,
            active: true,
        }
    }
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Single(Droplet),
    Multi(Vec<Droplet>),
    Line { drops: Vec<Droplet>, remaining: f32 },
}

/// A projectile group dropped by the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    /// Player entity that dropped it
    pub owner: u32,
    pub size: f32,
    pub splash_radius: f32,
    pub payload: Payload,
}

/// Horizontal drift between neighbouring drops of a spread cluster (px/s)
const SPREAD_DRIFT: f32 = 30.0;

impl Projectile {
    /// Build a cast at `origin` using the stats of the caster's power level
    pub fn cast(id: u32, owner: u32, origin: Vec2, stats: &PowerStats) -> Self {
        let fall = Vec2::new(0.0, stats.fall_speed);
        let payload = match stats.pattern {
            PatternKind::Single => Payload::Single(Droplet::new(origin, fall)),
            PatternKind::Multi => {
                let n = stats.count.max(1);
                let mid = (n - 1) as f32 * 0.5;
                let drops = (0..n)
                    .map(|k| {
                        let offset = k as f32 - mid;
                        let pos = origin + Vec2::new(offset * stats.size * 1.6, 0.0);
                        Droplet::new(pos, fall + Vec2::new(offset * SPREAD_DRIFT, 0.0))
                    })
                    .collect();
                Payload::Multi(drops)
            }
            PatternKind::Line => {
                let drops = (0..stats.count.max(1))
                    .map(|k| {
                        Droplet::new(origin + Vec2::new(0.0, k as f32 * stats.size * 1.5), fall)
                    })
                    .collect();
                Payload::Line {
                    drops,
                    remaining: stats.lifetime,
                }
            }
        };
        Self {
            id,
            owner,
            size: stats.size,
            splash_radius: stats.splash_radius,
            payload,
        }
    }

    pub fn kind(&self) -> PatternKind {
        match self.payload {
            Payload::Single(_) => PatternKind::Single,
            Payload::Multi(_) => PatternKind::Multi,
            Payload::Line { .. } => PatternKind::Line,
        }
    }

    pub fn drops(&self) -> &[Droplet] {
        match &self.payload {
            Payload::Single(drop) => std::slice::from_ref(drop),
            Payload::Multi(drops) | Payload::Line { drops, .. } => drops,
        }
    }

    pub fn drops_mut(&mut self) -> &mut [Droplet] {
        match &mut self.payload {
            Payload::Single(drop) => std::slice::from_mut(drop),
            Payload::Multi(drops) | Payload::Line { drops, .. } => drops,
        }
    }

    /// Fall by `dt`; drops below the canvas go inactive, line casts age
    pub fn advance(&mut self, dt: f32, canvas_height: f32) {
        let half = self.size * 0.5;
        for drop in self.drops_mut().iter_mut().filter(|d| d.active) {
            drop.pos += drop.vel * dt;
            if drop.pos.y - half > canvas_height {
                drop.active = false;
            }
        }
        if let Payload::Line { remaining, .. } = &mut self.payload {
            *remaining = (*remaining - dt).max(0.0);
        }
    }

    /// Nothing left that can hit
    pub fn is_spent(&self) -> bool {
        match &self.payload {
            Payload::Line { remaining, .. } if *remaining <= 0.0 => true,
            _ => self.drops().iter().all(|d| !d.active),
        }
    }
}
