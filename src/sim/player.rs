//! The player: a flyer that eats, drops, and suffers the noise
//!
//! Power only goes up within a run. Health only goes down through honk
//! exposure and only comes back through food. Reaching zero health is
//! terminal.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::pickup::Pickup;
use super::projectile::{PowerStats, Projectile, power_stats};
use super::vehicle::{Heading, VehicleClass};
use crate::Canvas;
use crate::consts::{MAX_HEALTH, MAX_POWER_LEVEL, PLAYER_HEIGHT, PLAYER_WIDTH, POINTS_PER_LEVEL};
use crate::tuning::Tuning;

/// One of the four movement intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Held movement keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Intent {
    pub fn set(&mut self, direction: Direction, pressed: bool) {
        match direction {
            Direction::Up => self.up = pressed,
            Direction::Down => self.down = pressed,
            Direction::Left => self.left = pressed,
            Direction::Right => self.right = pressed,
        }
    }

    /// Unit (or zero) direction; opposing keys cancel
    pub fn vector(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        // Screen space: +y is down
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down)).normalize_or_zero()
    }
}

/// Snapshot of the player's power for the HUD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerState {
    pub level: u8,
    pub belly_points: u32,
    /// Points still needed for the next level (None at max)
    pub points_to_next: Option<u32>,
    pub stats: PowerStats,
}

/// Power level for an accumulated belly total
#[inline]
pub fn level_for_points(belly_points: u32) -> u8 {
    (belly_points / POINTS_PER_LEVEL).min(MAX_POWER_LEVEL as u32) as u8
}

/// The player entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    pub intent: Intent,
    pub facing: Heading,
    pub belly_points: u32,
    pub power_level: u8,
    pub health: f32,
    pub alive: bool,
    /// Seconds until the next drop is allowed
    pub drop_cooldown: f32,
    /// A cast from this player is still falling
    pub has_active_drop: bool,
}

impl Player {
    /// New player centred in the sky
    pub fn new(id: u32, canvas: Canvas) -> Self {
        Self {
            id,
            pos: Vec2::new(canvas.width * 0.5, canvas.height * 0.2),
            size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            intent: Intent::default(),
            facing: Heading::Right,
            belly_points: 0,
            power_level: 0,
            health: MAX_HEALTH,
            alive: true,
            drop_cooldown: 0.0,
            has_active_drop: false,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }

    pub fn set_intent(&mut self, direction: Direction, pressed: bool) {
        self.intent.set(direction, pressed);
    }

    /// Move by the given intent for `dt`, clamped to the canvas.
    /// Diagonals move at the same speed as straight lines.
    pub fn move_by(&mut self, intent: Intent, dt: f32, speed: f32, canvas: Canvas) {
        if !self.alive {
            return;
        }
        self.intent = intent;
        let dir = intent.vector();
        if dir.x > 0.0 {
            self.facing = Heading::Right;
        } else if dir.x < 0.0 {
            self.facing = Heading::Left;
        }
        let half = self.size * 0.5;
        let max = (canvas.size() - half).max(half);
        self.pos = (self.pos + dir * speed * dt).clamp(half, max);
        self.drop_cooldown = (self.drop_cooldown - dt).max(0.0);
    }

    pub fn power_state(&self) -> PowerState {
        let points_to_next = (self.power_level < MAX_POWER_LEVEL)
            .then(|| (self.power_level as u32 + 1) * POINTS_PER_LEVEL - self.belly_points);
        PowerState {
            level: self.power_level,
            belly_points: self.belly_points,
            points_to_next,
            stats: power_stats(self.power_level),
        }
    }

    #[inline]
    pub fn health_percent(&self) -> f32 {
        (self.health / MAX_HEALTH * 100.0).clamp(0.0, 100.0)
    }

    /// Drop a cast if nothing is falling and the cooldown has elapsed
    pub fn try_drop(&mut self, projectile_id: u32) -> Option<Projectile> {
        if !self.alive || self.has_active_drop || self.drop_cooldown > 0.0 {
            return None;
        }
        let stats = power_stats(self.power_level);
        let origin = self.pos + Vec2::new(0.0, self.size.y * 0.5);
        self.drop_cooldown = stats.cooldown;
        self.has_active_drop = true;
        Some(Projectile::cast(projectile_id, self.id, origin, &stats))
    }

    /// Eat a pickup. Returns the new power level if this meal levelled up.
    pub fn eat(&mut self, pickup: &Pickup, tuning: &Tuning) -> Option<u8> {
        if !self.alive {
            return None;
        }
        let points = pickup.kind.points();
        self.belly_points = self.belly_points.saturating_add(points);
        self.health = (self.health + points as f32 * tuning.heal_per_point).min(MAX_HEALTH);

        let level = level_for_points(self.belly_points).max(self.power_level);
        if level > self.power_level {
            self.power_level = level;
            return Some(level);
        }
        None
    }

    /// A honking vehicle is within earshot. Returns the damage taken.
    pub fn experience_honk_proximity(&mut self, source: VehicleClass, tuning: &Tuning) -> f32 {
        if !self.alive {
            return 0.0;
        }
        let damage = match source {
            VehicleClass::Ordinary => tuning.honk_damage,
            VehicleClass::Emergency => tuning.honk_damage * tuning.emergency_damage_factor,
        };
        let before = self.health;
        self.health = (self.health - damage).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
        }
        before - self.health
    }
}
