//! Owning game façade
//!
//! Bundles the state with its random source and sprite catalog so the front
//! ends (browser glue, headless runner, tests) drive one object.

use crate::Canvas;
use crate::sim::{Direction, GameRng, GameState, StaticCatalog, TickInput, tick};
use crate::tuning::Tuning;
use crate::view::FrameView;

/// Game instance holding all state
pub struct Game {
    pub state: GameState,
    rng: GameRng,
    catalog: StaticCatalog,
    input: TickInput,
}

impl Game {
    /// New run on a canvas; `seed` of None draws one from the OS
    pub fn new(width: f32, height: f32, seed: Option<u64>) -> Self {
        Self::with_tuning(width, height, seed, Tuning::default())
    }

    pub fn with_tuning(width: f32, height: f32, seed: Option<u64>, tuning: Tuning) -> Self {
        let rng = seed.map_or_else(GameRng::from_entropy, GameRng::new);
        log::info!("New run (seed {})", rng.seed());
        Self {
            state: GameState::new(Canvas::new(width, height), tuning),
            rng,
            catalog: StaticCatalog::default(),
            input: TickInput::default(),
        }
    }

    /// Replace the sprite catalog reported by the asset layer
    pub fn set_catalog(&mut self, catalog: StaticCatalog) {
        self.catalog = catalog;
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Advance one frame
    pub fn tick(&mut self, dt: f32) {
        tick(&mut self.state, &self.input, dt, &mut self.rng, &self.catalog);
        // Clear one-shot inputs after processing
        self.input.drop = false;
    }

    pub fn set_intent(&mut self, direction: Direction, pressed: bool) {
        self.input.intent.set(direction, pressed);
    }

    pub fn request_drop(&mut self) {
        self.input.drop = true;
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.input.autopilot = enabled;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.resize(Canvas::new(width, height));
    }

    /// Start over with the same canvas and tuning
    pub fn restart(&mut self) {
        let canvas = self.state.canvas;
        let tuning = self.state.tuning.clone();
        self.state = GameState::new(canvas, tuning);
        self.input = TickInput::default();
    }

    pub fn view(&self) -> FrameView {
        FrameView::capture(&self.state)
    }

    pub fn is_over(&self) -> bool {
        self.state.is_game_over()
    }
}
