//! Honk Drop entry point
//!
//! On wasm32 the game is exported to JavaScript; the page owns the canvas,
//! the frame scheduler, input binding, drawing and audio. Natively the
//! binary runs a headless autopilot session and logs a summary.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use wasm_bindgen::prelude::*;

    use honk_drop::Game;
    use honk_drop::sim::Direction;
    use honk_drop::tuning::Tuning;

    /// Game handle exported to the page
    #[wasm_bindgen]
    pub struct WebGame {
        game: Game,
    }

    #[wasm_bindgen]
    impl WebGame {
        /// `tuning_json` may be empty for the default balance
        #[wasm_bindgen(constructor)]
        pub fn new(width: f32, height: f32, tuning_json: Option<String>) -> WebGame {
            let tuning = Tuning::load_or_default(tuning_json.as_deref().filter(|s| !s.is_empty()));
            WebGame {
                game: Game::with_tuning(width, height, None, tuning),
            }
        }

        pub fn tick(&mut self, dt: f32) {
            self.game.tick(dt);
        }

        /// `direction` is one of "up", "down", "left", "right"
        pub fn set_intent(&mut self, direction: &str, pressed: bool) {
            let direction = match direction {
                "up" => Direction::Up,
                "down" => Direction::Down,
                "left" => Direction::Left,
                "right" => Direction::Right,
                other => {
                    log::warn!("Unknown direction {other:?}");
                    return;
                }
            };
            self.game.set_intent(direction, pressed);
        }

        pub fn request_drop(&mut self) {
            self.game.request_drop();
        }

        pub fn set_autopilot(&mut self, enabled: bool) {
            self.game.set_autopilot(enabled);
        }

        pub fn resize(&mut self, width: f32, height: f32) {
            self.game.resize(width, height);
        }

        pub fn restart(&mut self) {
            self.game.restart();
        }

        pub fn is_over(&self) -> bool {
            self.game.is_over()
        }

        /// Draw data for the frame just simulated
        pub fn view_json(&self) -> Result<String, JsValue> {
            self.game
                .view()
                .to_json()
                .map_err(|e| JsValue::from_str(&e.to_string()))
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_ok() {
        log::info!("Honk Drop starting...");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Honk Drop (native) starting headless autopilot...");
    headless::run(std::env::args().skip(1).collect());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use honk_drop::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, SIM_DT};
    use honk_drop::sim::GameEvent;
    use honk_drop::{Game, Tuning};

    /// Simulated seconds per session
    const SESSION_SECONDS: f32 = 300.0;

    /// Usage: `honk-drop [seed] [tuning.json]`
    pub fn run(args: Vec<String>) {
        let seed = args.first().and_then(|s| match s.parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(e) => {
                log::warn!("Ignoring seed {s:?}: {e}");
                None
            }
        });
        let tuning_json = args.get(1).and_then(|path| match std::fs::read_to_string(path) {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("Could not read tuning file {path}: {e}");
                None
            }
        });
        let tuning = Tuning::load_or_default(tuning_json.as_deref());

        let mut game = Game::with_tuning(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT, seed, tuning);
        game.set_autopilot(true);

        let mut crashes = 0u32;
        let mut hits = 0u32;
        let mut penalties = 0u32;
        let mut frames = 0u32;
        let max_frames = (SESSION_SECONDS / SIM_DT) as u32;

        while frames < max_frames && !game.is_over() {
            game.tick(SIM_DT);
            frames += 1;
            for event in &game.state.events {
                match event {
                    GameEvent::Crash { .. } => crashes += 1,
                    GameEvent::HitHonking { .. } => hits += 1,
                    GameEvent::HitSilent { .. } | GameEvent::HitEmergency { .. } => penalties += 1,
                    _ => {}
                }
            }
        }

        let view = game.view();
        log::info!(
            "Session over after {:.1}s (seed {}): score {}, wave {}, health {:.0}%, power {}, {} hits, {} penalties, {} crashes{}",
            frames as f32 * SIM_DT,
            game.seed(),
            view.hud.score,
            view.hud.wave,
            view.hud.health_percent,
            view.hud.power_level,
            hits,
            penalties,
            crashes,
            if view.dead { ", deafened" } else { "" }
        );
    }
}
