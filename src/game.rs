//! Game session: initializer plus the per-move reconciliation cycle.
//!
//! A [`GameSession`] owns the engine handle, the tile registry and the
//! displayed score. It is the only writer of the registry and is driven
//! strictly serially by the host event loop; the only asynchrony anywhere is
//! the CSS motion that plays out after a cycle returns, and nothing here
//! waits on it.

use num_bigint::BigUint;

use crate::apply::{self, CycleOutcome, RenderOp};
use crate::engine::{Direction, Engine};
use crate::registry::{TileEntity, TileFlags, TileRegistry};
use crate::result::{MalformedResult, PushResult};

#[derive(Debug)]
pub struct GameSession<E: Engine> {
    engine: E,
    registry: TileRegistry,
    rows: usize,
    cols: usize,
    mode: usize,
    score: u64,
    seed: BigUint,
}

impl<E: Engine> GameSession<E> {
    /// Start a session with a fresh game. Returns the session and the spawn
    /// operations for the starting tiles.
    pub fn start(
        engine: E,
        rows: usize,
        cols: usize,
        mode: usize,
        seed: Option<&str>,
    ) -> Result<(Self, Vec<RenderOp>), MalformedResult> {
        let mut session = Self {
            engine,
            registry: TileRegistry::new(),
            rows,
            cols,
            mode,
            score: 0,
            seed: BigUint::default(),
        };
        let ops = session.new_game(seed)?;
        Ok((session, ops))
    }

    /// Request a fresh board from the engine and rebuild the registry from
    /// it: existing contents are discarded, every non-empty cell gets one
    /// `new`-flagged entity. The canonical seed (the engine's own choice
    /// when none was supplied) is kept for display so a game can be
    /// reproduced by re-supplying it.
    pub fn new_game(&mut self, seed: Option<&str>) -> Result<Vec<RenderOp>, MalformedResult> {
        let fresh = self.engine.new_game(self.rows, self.cols, self.mode, seed)?;
        if !fresh.board.is_rectangular()
            || fresh.board.rows() != self.rows
            || fresh.board.cols() != self.cols
        {
            return Err(MalformedResult::DimensionMismatch {
                got_rows: fresh.board.rows(),
                got_cols: fresh.board.cols(),
                rows: self.rows,
                cols: self.cols,
            });
        }
        // Seeds never touch native integers: the seed space exceeds what the
        // host runtime can represent losslessly, so it stays arbitrary
        // precision from wire to display.
        self.seed = fresh
            .seed
            .parse::<BigUint>()
            .map_err(|_| MalformedResult::BadSeed(fresh.seed.clone()))?;

        self.registry.clear();
        let mut ops = Vec::new();
        for (row, col, value) in fresh.board.occupied() {
            let id = self.registry.insert(TileEntity {
                value,
                row,
                col,
                flags: TileFlags::new_tile(),
            });
            ops.push(RenderOp::Spawn {
                id,
                at: (row, col),
                value,
            });
        }
        self.score = self.engine.score();
        Ok(ops)
    }

    /// Run one complete reconciliation cycle for a move. `Ok(None)` means
    /// the engine judged the move illegal and nothing changed, not even the
    /// previous cycle's deferred cleanup. A malformed result aborts before
    /// any registry mutation.
    pub fn push(&mut self, direction: Direction) -> Result<Option<CycleOutcome>, MalformedResult> {
        let Some(raw) = self.engine.push(direction)? else {
            return Ok(None);
        };
        let result = PushResult::interpret(&raw, self.rows, self.cols)?;
        let outcome = apply::apply(&mut self.registry, &result);
        self.score = outcome.score;
        Ok(Some(outcome))
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Canonical seed of the current game, as chosen or echoed by the engine.
    pub fn seed(&self) -> &BigUint {
        &self.seed
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }
}
