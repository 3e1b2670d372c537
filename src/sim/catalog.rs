//! Sprite-variant catalog supplied by the asset layer
//!
//! The core never loads images. It only asks how many variants exist for a
//! class/heading and how big a given variant is, then picks an index. When a
//! class has nothing to offer, selection falls back instead of failing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::RandomSource;
use super::vehicle::{Heading, VehicleClass};
use crate::consts::{DEFAULT_VEHICLE_HEIGHT, DEFAULT_VEHICLE_WIDTH};

/// What the asset layer knows about vehicle sprites
pub trait SpriteCatalog {
    /// Number of loaded variants for a class travelling in `heading`
    fn variant_count(&self, class: VehicleClass, heading: Heading) -> usize;

    /// Collidable size of a variant, if the asset reports one
    fn dimensions(&self, class: VehicleClass, heading: Heading, index: usize) -> Option<Vec2>;
}

/// The outcome of sprite selection for a spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteChoice {
    pub class: VehicleClass,
    pub heading: Heading,
    /// `None` when no asset was available at all (placeholder box)
    pub variant: Option<usize>,
    pub size: Vec2,
}

/// Pick a sprite for the requested class and heading
///
/// Falls back in order: other heading, then (for emergency requests) the
/// ordinary class, then a default-sized placeholder. Never fails.
pub fn choose_sprite(
    catalog: &dyn SpriteCatalog,
    class: VehicleClass,
    heading: Heading,
    rng: &mut dyn RandomSource,
) -> SpriteChoice {
    let mut candidates = vec![(class, heading), (class, heading.reversed())];
    if class == VehicleClass::Emergency {
        candidates.push((VehicleClass::Ordinary, heading));
        candidates.push((VehicleClass::Ordinary, heading.reversed()));
    }

    for (cls, dir) in candidates {
        let count = catalog.variant_count(cls, dir);
        if count == 0 {
            continue;
        }
        if (cls, dir) != (class, heading) {
            log::warn!("No {class:?}/{heading:?} sprites; falling back to {cls:?}/{dir:?}");
        }
        let index = rng.index(count);
        let size = catalog
            .dimensions(cls, dir, index)
            .filter(|s| s.x > 0.0 && s.y > 0.0)
            .unwrap_or_else(default_vehicle_size);
        return SpriteChoice {
            class: cls,
            heading: dir,
            variant: Some(index),
            size,
        };
    }

    log::warn!("Sprite catalog is empty; spawning placeholder vehicle");
    SpriteChoice {
        class,
        heading,
        variant: None,
        size: default_vehicle_size(),
    }
}

#[inline]
pub fn default_vehicle_size() -> Vec2 {
    Vec2::new(DEFAULT_VEHICLE_WIDTH, DEFAULT_VEHICLE_HEIGHT)
}

/// Fixed catalog, configured by counts and sizes per class/heading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticCatalog {
    /// Sizes of ordinary variants facing right / left
    pub ordinary_right: Vec<Vec2>,
    pub ordinary_left: Vec<Vec2>,
    /// Sizes of emergency variants facing right / left
    pub emergency_right: Vec<Vec2>,
    pub emergency_left: Vec<Vec2>,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        let cars = vec![
            Vec2::new(64.0, 30.0),
            Vec2::new(58.0, 28.0),
            Vec2::new(72.0, 32.0),
            Vec2::new(96.0, 36.0),
        ];
        let sirens = vec![Vec2::new(80.0, 34.0), Vec2::new(104.0, 38.0)];
        Self {
            ordinary_right: cars.clone(),
            ordinary_left: cars,
            emergency_right: sirens.clone(),
            emergency_left: sirens,
        }
    }
}

impl StaticCatalog {
    /// A catalog with no assets at all
    pub fn empty() -> Self {
        Self {
            ordinary_right: Vec::new(),
            ordinary_left: Vec::new(),
            emergency_right: Vec::new(),
            emergency_left: Vec::new(),
        }
    }

    fn variants(&self, class: VehicleClass, heading: Heading) -> &[Vec2] {
        match (class, heading) {
            (VehicleClass::Ordinary, Heading::Right) => &self.ordinary_right,
            (VehicleClass::Ordinary, Heading::Left) => &self.ordinary_left,
            (VehicleClass::Emergency, Heading::Right) => &self.emergency_right,
            (VehicleClass::Emergency, Heading::Left) => &self.emergency_left,
        }
    }
}

impl SpriteCatalog for StaticCatalog {
    fn variant_count(&self, class: VehicleClass, heading: Heading) -> usize {
        self.variants(class, heading).len()
    }

    fn dimensions(&self, class: VehicleClass, heading: Heading, index: usize) -> Option<Vec2> {
        self.variants(class, heading).get(index).copied()
    }
}
