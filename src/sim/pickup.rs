//! Food pickups
//!
//! Food appears in the sky above the road and rots after a while. Eating it
//! fills the player's belly (power) and soothes their ears (health).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::rng::RandomSource;
use crate::Canvas;
use crate::tuning::Tuning;

/// Food types, by value tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodKind {
    /// Low tier
    Seed,
    /// Medium tier
    Fries,
    /// High tier
    Pizza,
}

impl FoodKind {
    /// Belly points this food is worth
    pub fn points(self) -> u32 {
        match self {
            FoodKind::Seed => 1,
            FoodKind::Fries => 2,
            FoodKind::Pizza => 3,
        }
    }

    /// Weighted pick: common seeds, rarer fries, rare pizza
    pub fn roll(rng: &mut dyn RandomSource) -> Self {
        let r = rng.next_f32();
        if r < 0.6 {
            FoodKind::Seed
        } else if r < 0.9 {
            FoodKind::Fries
        } else {
            FoodKind::Pizza
        }
    }
}

/// A pickup entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: FoodKind,
    pub pos: Vec2,
    pub size: f32,
    /// Seconds until it rots away
    pub remaining: f32,
}

impl Pickup {
    pub fn new(id: u32, kind: FoodKind, pos: Vec2, size: f32, lifespan: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            size,
            remaining: lifespan,
        }
    }

    /// Place a random food somewhere in the sky band above `sky_bottom`
    pub fn spawn(
        id: u32,
        canvas: Canvas,
        sky_bottom: f32,
        tuning: &Tuning,
        rng: &mut dyn RandomSource,
    ) -> Self {
        let margin = tuning.pickup_size;
        let kind = FoodKind::roll(rng);
        let x = rng.range(margin, (canvas.width - margin).max(margin));
        let y = rng.range(margin, (sky_bottom - margin).max(margin));
        Self::new(id, kind, Vec2::new(x, y), tuning.pickup_size, tuning.pickup_lifespan)
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(self.size))
    }

    /// Age by `dt`; true once expired
    pub fn update(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining <= 0.0
    }
}
