//! Tilepush core crate.
//!
//! Presentation layer for a 2048-style sliding-tile merge puzzle. The game
//! rules live in an external deterministic engine (see [`engine`]); this
//! crate keeps a shadow registry of visual tile entities in sync with it so
//! every tile keeps its identity across slides, merges combine visually
//! instead of teleporting, and superseded tiles outlive their merge by one
//! cycle to finish their exit animation.
//!
//! The reconciliation core ([`result`], [`registry`], [`apply`], [`game`])
//! is plain Rust and runs under native `cargo test`; only the renderer and
//! the entrypoints below touch the browser.

use wasm_bindgen::prelude::*;

pub mod apply;
pub mod engine;
pub mod game;
pub mod registry;
pub mod result;

#[cfg(target_family = "wasm")]
mod render;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// -----------------------------------------------------------------------------
// Browser session wiring
// -----------------------------------------------------------------------------

#[cfg(target_family = "wasm")]
mod session {
    use std::cell::RefCell;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::engine::{Direction, JsEngine};
    use crate::game::GameSession;
    use crate::render::DomRenderer;

    pub struct App {
        pub session: GameSession<JsEngine>,
        pub renderer: DomRenderer,
    }

    thread_local! {
        pub static APP: RefCell<Option<App>> = RefCell::new(None);
    }

    pub fn direction_for_key(key: &str) -> Option<Direction> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Direction::U),
            "ArrowLeft" | "a" | "A" => Some(Direction::L),
            "ArrowDown" | "s" | "S" => Some(Direction::D),
            "ArrowRight" | "d" | "D" => Some(Direction::R),
            _ => None,
        }
    }

    pub fn handle_key(app: &mut App, key: &str) {
        if let Some(direction) = direction_for_key(key) {
            match app.session.push(direction) {
                Ok(Some(outcome)) => {
                    if outcome.missed_origins > 0 {
                        web_sys::console::warn_1(&JsValue::from_str(&format!(
                            "{} origin tile(s) missing from registry, relocation skipped",
                            outcome.missed_origins
                        )));
                    }
                    app.renderer.apply(&outcome.ops).ok();
                    app.renderer.set_score(outcome.score);
                }
                Ok(None) => {} // illegal move, nothing to reconcile
                Err(err) => {
                    // Cycle aborted with the registry untouched; the prior
                    // visual state stands and input may be retried.
                    web_sys::console::error_1(&JsValue::from_str(&format!(
                        "push result rejected: {err}"
                    )));
                }
            }
        } else if key == "n" || key == "N" {
            match app.session.new_game(None) {
                Ok(ops) => {
                    app.renderer.reset();
                    app.renderer.apply(&ops).ok();
                    app.renderer.set_score(app.session.score());
                    app.renderer.set_seed(&app.session.seed().to_string());
                }
                Err(err) => {
                    web_sys::console::error_1(&JsValue::from_str(&format!(
                        "new game rejected: {err}"
                    )));
                }
            }
        }
    }

    pub fn install_key_listener() -> Result<(), JsValue> {
        let doc = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            APP.with(|cell| {
                if let Some(app) = cell.borrow_mut().as_mut() {
                    handle_key(app, &evt.key());
                }
            });
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }
}

/// Start a game against the host page's engine module and mount the board.
///
/// `seed` is a decimal string (arbitrary precision); pass `None` to let the
/// engine pick one. The seed actually used is shown next to the board so the
/// game can be reproduced.
#[cfg(target_family = "wasm")]
#[wasm_bindgen]
pub fn start_game(
    rows: usize,
    cols: usize,
    mode: usize,
    seed: Option<String>,
) -> Result<(), JsValue> {
    use crate::engine::JsEngine;
    use crate::game::GameSession;
    use crate::render::DomRenderer;

    let (game, ops) = GameSession::start(JsEngine, rows, cols, mode, seed.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let renderer = DomRenderer::mount(rows, cols)?;
    renderer.reset();
    renderer.apply(&ops)?;
    renderer.set_score(game.score());
    renderer.set_seed(&game.seed().to_string());

    let fresh = session::APP.with(|cell| cell.borrow().is_none());
    session::APP.with(|cell| {
        cell.replace(Some(session::App {
            session: game,
            renderer,
        }))
    });
    if fresh {
        session::install_key_listener()?;
    }
    Ok(())
}
