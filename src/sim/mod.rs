//! Simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Clamped, substepped time only
//! - Randomness only through an injected `RandomSource`
//! - Stable iteration order (spawn order)
//! - No rendering, audio or platform dependencies

pub mod catalog;
pub mod collision;
pub mod pickup;
pub mod player;
pub mod projectile;
pub mod resolver;
pub mod rng;
pub mod state;
pub mod tick;
pub mod traffic;
pub mod vehicle;
pub mod wave;

pub use catalog::{SpriteCatalog, StaticCatalog};
pub use collision::{Aabb, edge_gap, time_to_collision};
pub use pickup::{FoodKind, Pickup};
pub use player::{Direction, Intent, Player, PowerState};
pub use projectile::{PatternKind, PowerStats, Projectile, power_stats};
pub use resolver::{ScoreDelta, resolve};
pub use rng::{GameRng, RandomSource, SequenceRng};
pub use state::{EntityIds, GameEvent, GamePhase, GameState};
pub use tick::{TickInput, tick};
pub use traffic::{CrashEvent, LaneLayout, Traffic};
pub use vehicle::{CrashState, FireHandle, Heading, Vehicle, VehicleClass};
pub use wave::WaveState;
