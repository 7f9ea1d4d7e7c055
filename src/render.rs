//! Passive DOM renderer.
//!
//! Consumes the ordered [`RenderOp`] stream of a completed cycle and applies
//! it to absolutely positioned tile divs. Sliding is animated by a CSS
//! transition on `transform`; merged and spawned tiles pop in via injected
//! keyframes. Tiles superseded by a merge stay in the DOM beneath the merged
//! tile until the next cycle's `Discard`, so their slide finishes on screen
//! and the actual removal is invisible. The renderer holds no game state of
//! its own: elements are keyed by the registry's stable [`TileId`] index,
//! and whatever the ops say is what happens on screen.

use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use crate::apply::RenderOp;
use crate::registry::TileId;
use crate::result::Coord;

const CELL_PX: f64 = 96.0;
const GAP_PX: f64 = 10.0;

// 2048 palette indexed by log2(value); the last entry covers 4096 and up.
const TILE_COLORS: [&str; 12] = [
    "#eee4da", "#ede0c8", "#f2b179", "#f59563", "#f67c5f", "#f65e3b", "#edcf72", "#edcc61",
    "#edc850", "#edc53f", "#edc22e", "#3c3a32",
];

pub struct DomRenderer {
    doc: Document,
    board: Element,
}

impl DomRenderer {
    /// Create or reuse the board container and the score/seed readouts.
    pub fn mount(rows: usize, cols: usize) -> Result<Self, JsValue> {
        let win = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let doc = win
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;

        // Pop-in keyframes for spawned and merged tiles, injected once.
        if doc.get_element_by_id("tp-style").is_none() {
            let style = doc.create_element("style")?;
            style.set_id("tp-style");
            style.set_text_content(Some(
                "@keyframes tp-pop { from { scale: 0.6; } }\n\
                 @keyframes tp-merge { from { scale: 1.18; } }",
            ));
            body.append_child(&style)?;
        }

        let board = if let Some(el) = doc.get_element_by_id("tp-board") {
            el
        } else {
            let el = doc.create_element("div")?;
            el.set_id("tp-board");
            body.append_child(&el)?;
            el
        };
        let width = cols as f64 * (CELL_PX + GAP_PX) + GAP_PX;
        let height = rows as f64 * (CELL_PX + GAP_PX) + GAP_PX;
        board
            .set_attribute(
                "style",
                &format!(
                    "position:fixed; left:50%; top:45%; transform:translate(-50%,-50%); \
                     width:{width}px; height:{height}px; background:#bbada0; \
                     border-radius:8px; overflow:hidden;"
                ),
            )
            .ok();

        // Score readout (top-left overlay)
        if doc.get_element_by_id("tp-score").is_none() {
            let div = doc.create_element("div")?;
            div.set_id("tp-score");
            div.set_text_content(Some("Score: 0"));
            div.set_attribute("style", "position:fixed; top:10px; left:12px; font-family:'Fira Code', monospace; font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:6px; color:#ffd166; z-index:45; letter-spacing:0.5px;").ok();
            body.append_child(&div)?;
        }
        // Seed readout so a game can be reproduced by typing it back in
        if doc.get_element_by_id("tp-seed").is_none() {
            let div = doc.create_element("div")?;
            div.set_id("tp-seed");
            div.set_attribute("style", "position:fixed; bottom:10px; left:12px; font-family:'Fira Code', monospace; font-size:12px; padding:3px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:6px; color:#9ad1d4; z-index:45;").ok();
            body.append_child(&div)?;
        }

        Ok(Self { doc, board })
    }

    /// Drop every tile element (new game).
    pub fn reset(&self) {
        while let Some(child) = self.board.first_element_child() {
            child.remove();
        }
    }

    pub fn apply(&self, ops: &[RenderOp]) -> Result<(), JsValue> {
        for op in ops {
            match op {
                RenderOp::Discard { id } => {
                    if let Some(el) = self.doc.get_element_by_id(&tile_el_id(*id)) {
                        el.remove();
                    }
                }
                RenderOp::Slide { id, to, .. } => {
                    if let Some(el) = self.doc.get_element_by_id(&tile_el_id(*id)) {
                        slide_to(&el, *to);
                    }
                }
                RenderOp::MergeInto { id, at, value } => {
                    self.create_tile(*id, *at, *value, "tp-merge")?;
                }
                RenderOp::Spawn { id, at, value } => {
                    self.create_tile(*id, *at, *value, "tp-pop")?;
                }
            }
        }
        Ok(())
    }

    pub fn set_score(&self, score: u64) {
        if let Some(el) = self.doc.get_element_by_id("tp-score") {
            el.set_text_content(Some(&format!("Score: {score}")));
        }
    }

    pub fn set_seed(&self, seed: &str) {
        if let Some(el) = self.doc.get_element_by_id("tp-seed") {
            el.set_text_content(Some(&format!("Seed: {seed}")));
        }
    }

    fn create_tile(
        &self,
        id: TileId,
        at: Coord,
        value: u32,
        entry_anim: &str,
    ) -> Result<(), JsValue> {
        let el = self.doc.create_element("div")?;
        el.set_id(&tile_el_id(id));
        el.set_text_content(Some(&value.to_string()));
        let color = TILE_COLORS
            [(value.checked_ilog2().unwrap_or(1) as usize).saturating_sub(1).min(TILE_COLORS.len() - 1)];
        let text = if value >= 8 { "#f9f6f2" } else { "#776e65" };
        let font = if value < 1000 { 40 } else { 28 };
        el.set_attribute(
            "style",
            &format!(
                "position:absolute; width:{CELL_PX}px; height:{CELL_PX}px; \
                 background:{color}; color:{text}; font:bold {font}px 'Fira Code', monospace; \
                 display:flex; align-items:center; justify-content:center; border-radius:5px; \
                 transition:transform 120ms ease-out, opacity 120ms ease-out; \
                 animation:{entry_anim} 120ms ease-out; \
                 {};",
                translate(at)
            ),
        )
        .ok();
        self.board.append_child(&el)?;
        Ok(())
    }
}

fn tile_el_id(id: TileId) -> String {
    format!("tp-tile-{}", id.index())
}

fn translate((row, col): Coord) -> String {
    let x = GAP_PX + col as f64 * (CELL_PX + GAP_PX);
    let y = GAP_PX + row as f64 * (CELL_PX + GAP_PX);
    format!("transform:translate({x}px,{y}px)")
}

fn slide_to(el: &Element, to: Coord) {
    if let Some(style) = el.get_attribute("style") {
        // The transform is the last declaration; rewrite it in place.
        let base = match style.rfind("transform:") {
            Some(i) => &style[..i],
            None => style.as_str(),
        };
        el.set_attribute("style", &format!("{base}{};", translate(to))).ok();
    }
}
