//! Can Grid entry point
//!
//! Browser: boots the DOM surface and frame loop.
//! Native: plays one headless session with an autoplay bot.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }

    log::info!("Can Grid starting...");
    match can_grid::platform::dom::run() {
        Ok(()) => log::info!("Can Grid running!"),
        Err(e) => log::error!("Boot failed: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use anyhow::{Context, Result};
    use serde::Serialize;

    use can_grid::sim::{GameEngine, SessionOutcome, SpawnKind};
    use can_grid::{PlayerInput, RecordingSurface, Tuning};

    /// Simulated frame length (ms)
    const FRAME_MS: u64 = 16;
    const DEFAULT_REACTION_MS: u64 = 350;

    /// Printed at the end of a demo run
    #[derive(Debug, Serialize)]
    struct DemoSummary {
        seed: u64,
        reaction_ms: u64,
        outcome: Option<SessionOutcome>,
        collected: u32,
        time_left_secs: u32,
        elapsed_ms: u64,
        clicks: u32,
        feedback: Vec<String>,
        tuning: Tuning,
    }

    fn env_u64(name: &str) -> Result<Option<u64>> {
        match std::env::var(name) {
            Ok(raw) => {
                let value = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be an unsigned integer, got {:?}", name, raw))?;
                Ok(Some(value))
            }
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", name)),
        }
    }

    pub fn run() -> Result<()> {
        let seed = env_u64("CAN_GRID_SEED")?.unwrap_or(12345);
        let reaction_ms = env_u64("CAN_GRID_REACTION_MS")?
            .unwrap_or(DEFAULT_REACTION_MS)
            .max(FRAME_MS);

        let mut engine = GameEngine::new(RecordingSurface::new(), seed);
        engine.apply(PlayerInput::Start);
        log::info!("Autoplay with seed {} (reaction {}ms)", seed, reaction_ms);

        // Bot: wait out the reaction time, then click one visible water can
        let mut clicks = 0;
        let mut since_click = 0;
        while engine.is_active() {
            engine.advance(FRAME_MS);
            since_click += FRAME_MS;
            if since_click < reaction_ms {
                continue;
            }
            if let Some(target) = engine.surface().find(SpawnKind::Collectible) {
                engine.apply(PlayerInput::Click(target));
                clicks += 1;
                since_click = 0;
            }
        }

        let session = engine.session();
        let summary = DemoSummary {
            seed,
            reaction_ms,
            outcome: session.outcome,
            collected: session.collected,
            time_left_secs: session.time_left_secs,
            elapsed_ms: engine.now_ms(),
            clicks,
            feedback: engine
                .surface()
                .feedback_log()
                .into_iter()
                .map(str::to_string)
                .collect(),
            tuning: engine.tuning().clone(),
        };

        let json = serde_json::to_string_pretty(&summary).context("serializing demo summary")?;
        println!("{}", json);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Can Grid (native) starting...");
    log::info!("Native mode runs a headless autoplay session - run with `trunk serve` for web version");

    demo::run()
}
