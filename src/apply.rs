//! The transition applier: reconciles the registry with one push result.
//!
//! One call per accepted move, four strictly ordered phases:
//!
//! 1. cleanup of the *previous* cycle (delete `to-remove` entities, clear
//!    `new`/`merged` marks),
//! 2. relocation of every surviving origin entity to its destination,
//! 3. merge resolution for two-origin destinations,
//! 4. spawn of the single engine-chosen tile.
//!
//! Deletion is deferred by one full cycle: a tile superseded by a merge is
//! only *marked* here and physically removed at the start of the next cycle,
//! so its slide-out plays to completion while the merge is announced. The
//! caller validates the push result before this module runs; nothing here
//! can fail, so a rejected result leaves the registry untouched.

use crate::registry::{TileEntity, TileFlags, TileId, TileRegistry};
use crate::result::{Coord, PushResult};

/// One entity operation of a completed cycle, in apply order. The renderer
/// consumes these verbatim; it never inspects the registry's history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderOp {
    /// Physically drop a stale entity from the previous cycle.
    Discard { id: TileId },
    /// Slide an existing entity to a new coordinate.
    Slide { id: TileId, from: Coord, to: Coord },
    /// Create the doubled entity two incomers merged into.
    MergeInto { id: TileId, at: Coord, value: u32 },
    /// Create the freshly spawned entity.
    Spawn { id: TileId, at: Coord, value: u32 },
}

/// Everything a caller needs after one apply cycle.
#[derive(Debug)]
pub struct CycleOutcome {
    pub ops: Vec<RenderOp>,
    /// Absolute score after the move, straight from the engine.
    pub score: u64,
    /// Origins that had no live entity to relocate. Expected only after a
    /// prior, already-reported anomaly; never aborts the cycle.
    pub missed_origins: usize,
}

/// Apply a validated push result to the registry.
pub fn apply(registry: &mut TileRegistry, result: &PushResult) -> CycleOutcome {
    let mut ops = Vec::new();
    let mut missed_origins = 0;

    // Phase 1: finish the previous cycle. Stale entities kept alive for
    // their exit animation are removed now, one full cycle after being
    // superseded; everyone else sheds last cycle's marks.
    let stale: Vec<TileId> = registry
        .iter()
        .filter(|(_, e)| e.flags.is_to_remove())
        .map(|(id, _)| id)
        .collect();
    for id in stale {
        registry.remove(id);
        ops.push(RenderOp::Discard { id });
    }
    for (_, entity) in registry.iter_mut() {
        entity.flags.clear_cycle_marks();
    }

    // Phase 2: relocation. All origin lookups run against the pre-move
    // registry before any entity moves; a tile that slides into a cell must
    // not shadow that cell's own departing occupant.
    let mut moves: Vec<(TileId, Coord, Coord)> = Vec::new();
    for (dest, origins) in result.arrivals() {
        for (or, oc) in origins.iter() {
            match registry.live_at(or, oc) {
                Some(id) => moves.push((id, (or, oc), dest)),
                None => missed_origins += 1,
            }
        }
    }
    for &(id, from, to) in &moves {
        registry.relocate(id, to.0, to.1);
        if from != to {
            ops.push(RenderOp::Slide { id, from, to });
        }
    }

    // Phase 3: merge resolution. Each two-origin destination now holds both
    // incomers; they are marked stale and a doubled entity takes the cell.
    // The equal-value invariant is the engine's to uphold, so either
    // incomer's value works. A destination short of incomers (after a
    // registry miss upstream) merges whatever arrived.
    for (dest, origins) in result.arrivals() {
        if !origins.is_merge() {
            continue;
        }
        let incomers: Vec<TileId> = match registry.live_pair_at(dest.0, dest.1) {
            Some((a, b)) => vec![a, b],
            // A miss upstream can leave a lone incomer; merge what arrived.
            None => registry.live_at(dest.0, dest.1).into_iter().collect(),
        };
        let Some(&first) = incomers.first() else {
            continue;
        };
        let value = registry.get(first).map(|e| e.value).unwrap_or(0) * 2;
        for id in incomers {
            if let Some(entity) = registry.get_mut(id) {
                entity.flags.mark_to_remove();
            }
        }
        let merged = registry.insert(TileEntity {
            value,
            row: dest.0,
            col: dest.1,
            flags: TileFlags::merged_tile(),
        });
        ops.push(RenderOp::MergeInto {
            id: merged,
            at: dest,
            value,
        });
    }

    // Phase 4: spawn the one tile the engine inserted after the move.
    let spawn = registry.insert(TileEntity {
        value: result.spawn_value,
        row: result.spawn_row,
        col: result.spawn_col,
        flags: TileFlags::new_tile(),
    });
    ops.push(RenderOp::Spawn {
        id: spawn,
        at: (result.spawn_row, result.spawn_col),
        value: result.spawn_value,
    });

    CycleOutcome {
        ops,
        score: result.new_score,
        missed_origins,
    }
}
