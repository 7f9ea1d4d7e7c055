//! Seam to the external game engine.
//!
//! The engine owns all game rules: move legality, slide/merge arithmetic,
//! spawn placement and seeded randomness. This module only defines the
//! narrow interface we call through (`Engine`), the wire types its answers
//! decode into, and the wasm bridge to the real engine living on the host
//! page. Everything above this module treats the engine as a black box.

use serde::Deserialize;

use crate::result::MalformedResult;

/// Push direction accepted by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    U,
    R,
    L,
    D,
}

impl Direction {
    /// Single-character wire form used by the engine's `push` call.
    pub fn as_char(self) -> char {
        match self {
            Direction::U => 'U',
            Direction::R => 'R',
            Direction::L => 'L',
            Direction::D => 'D',
        }
    }
}

impl TryFrom<char> for Direction {
    type Error = ();

    fn try_from(c: char) -> Result<Self, ()> {
        match c.to_ascii_uppercase() {
            'U' => Ok(Direction::U),
            'R' => Ok(Direction::R),
            'L' => Ok(Direction::L),
            'D' => Ok(Direction::D),
            _ => Err(()),
        }
    }
}

/// Read-only grid of tile values as reported by the engine.
/// `0` is an empty cell; positive values are powers of two.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct BoardSnapshot {
    cells: Vec<Vec<u32>>,
}

impl BoardSnapshot {
    pub fn new(cells: Vec<Vec<u32>>) -> Self {
        Self { cells }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// Column count of the first row; rectangularity is checked by
    /// [`BoardSnapshot::is_rectangular`], not assumed here.
    pub fn cols(&self) -> usize {
        self.cells.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_rectangular(&self) -> bool {
        let cols = self.cols();
        cols > 0 && self.cells.iter().all(|r| r.len() == cols)
    }

    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.cells[row][col]
    }

    /// Iterate `(row, col, value)` over non-empty cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &v)| v != 0)
                .map(move |(c, &v)| (r, c, v))
        })
    }
}

/// Answer to `newGame`: the starting board plus the seed the engine actually
/// used (its own choice when none was supplied). The seed travels as a
/// decimal string because it can exceed the lossless integer range of the
/// host runtime.
#[derive(Clone, Debug, Deserialize)]
pub struct RawNewGame {
    pub board: BoardSnapshot,
    pub seed: String,
}

/// Undecoded answer to `push`, mirroring the engine's JSON shape.
/// `transitions[r][c]` lists the previous-frame coordinates whose tiles now
/// occupy `(r, c)`; interpretation and validation happen in [`crate::result`].
#[derive(Clone, Debug, Deserialize)]
pub struct RawPushResult {
    pub transitions: Vec<Vec<Vec<[usize; 2]>>>,
    pub spawned_row: usize,
    pub spawned_col: usize,
    pub spawned_value: u32,
    pub new_score: u64,
}

/// The black-box engine interface. `push` returns `None` when the move was
/// illegal (a no-op); decode failures at the wire surface as
/// [`MalformedResult`] so the caller can abort the cycle before any registry
/// mutation.
pub trait Engine {
    fn new_game(
        &mut self,
        rows: usize,
        cols: usize,
        mode: usize,
        seed: Option<&str>,
    ) -> Result<RawNewGame, MalformedResult>;

    fn push(&mut self, direction: Direction) -> Result<Option<RawPushResult>, MalformedResult>;

    fn state(&self) -> Result<BoardSnapshot, MalformedResult>;

    fn score(&self) -> u64;
}

// --- Wasm bridge to the host page's engine module ----------------------------

#[cfg(target_family = "wasm")]
mod js {
    use wasm_bindgen::prelude::wasm_bindgen;

    // The host page loads the engine wasm module and exposes it as a
    // `mergeEngine` global before calling `start_game`.
    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = ["window", "mergeEngine"], js_name = newGame)]
        pub fn new_game(rows: usize, cols: usize, mode: usize, seed: Option<String>) -> String;

        #[wasm_bindgen(js_namespace = ["window", "mergeEngine"])]
        pub fn push(direction: char) -> Option<String>;

        #[wasm_bindgen(js_namespace = ["window", "mergeEngine"], js_name = getState)]
        pub fn get_state() -> String;

        // The engine reports its score as a plain JS number.
        #[wasm_bindgen(js_namespace = ["window", "mergeEngine"], js_name = getScore)]
        pub fn get_score() -> u32;
    }
}

/// Engine implementation backed by the JS-hosted wasm engine.
#[cfg(target_family = "wasm")]
#[derive(Default)]
pub struct JsEngine;

#[cfg(target_family = "wasm")]
impl Engine for JsEngine {
    fn new_game(
        &mut self,
        rows: usize,
        cols: usize,
        mode: usize,
        seed: Option<&str>,
    ) -> Result<RawNewGame, MalformedResult> {
        let payload = js::new_game(rows, cols, mode, seed.map(str::to_owned));
        Ok(serde_json::from_str(&payload)?)
    }

    fn push(&mut self, direction: Direction) -> Result<Option<RawPushResult>, MalformedResult> {
        match js::push(direction.as_char()) {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    fn state(&self) -> Result<BoardSnapshot, MalformedResult> {
        Ok(serde_json::from_str(&js::get_state())?)
    }

    fn score(&self) -> u64 {
        u64::from(js::get_score())
    }
}
