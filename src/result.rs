//! Push result interpretation and validation.
//!
//! This is the sole validation boundary against a misbehaving or
//! version-mismatched engine: anything that passes [`PushResult::interpret`]
//! is trusted by the applier, including the engine's merge invariant (a
//! two-origin cell references equal values and the merged value is double).
//! The applier never re-checks merge arithmetic.

use thiserror::Error;

use crate::engine::RawPushResult;

/// Grid coordinate as `(row, col)`.
pub type Coord = (usize, usize);

/// Rejection reasons for an engine answer. Any of these aborts the cycle
/// before the registry is touched.
#[derive(Debug, Error)]
pub enum MalformedResult {
    #[error("engine payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("result is {got_rows}x{got_cols}, current board is {rows}x{cols}")]
    DimensionMismatch {
        got_rows: usize,
        got_cols: usize,
        rows: usize,
        cols: usize,
    },
    #[error("cell ({row}, {col}) lists {count} origins, at most 2 are possible")]
    TransitionCardinality { row: usize, col: usize, count: usize },
    #[error("spawn at ({row}, {col}) is outside the {rows}x{cols} board")]
    SpawnOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("seed {0:?} is not a decimal integer")]
    BadSeed(String),
}

/// Up to two origin coordinates feeding one destination cell.
///
/// Length 0: the cell stays or was empty. Length 1: a single tile moved in
/// (or stayed put). Length 2: two equal tiles merged here. Equality ignores
/// origin order, matching how the engine reports merges.
#[derive(Copy, Clone, Default)]
pub struct Origins {
    first: Option<Coord>,
    second: Option<Coord>,
}

impl Origins {
    pub(crate) fn push(&mut self, coord: Coord) {
        if self.first.is_none() {
            self.first = Some(coord);
        } else {
            self.second = Some(coord);
        }
    }

    pub fn len(&self) -> usize {
        match (self.first.is_some(), self.second.is_some()) {
            (true, true) => 2,
            (true, false) => 1,
            (false, false) => 0,
            _ => unreachable!(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// True when two tiles arrive here, i.e. the cell is a merge destination.
    pub fn is_merge(&self) -> bool {
        self.second.is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord> {
        self.first.into_iter().chain(self.second)
    }
}

impl From<Coord> for Origins {
    fn from(coord: Coord) -> Self {
        Self {
            first: Some(coord),
            second: None,
        }
    }
}

impl From<(Coord, Coord)> for Origins {
    fn from((first, second): (Coord, Coord)) -> Self {
        Self {
            first: Some(first),
            second: Some(second),
        }
    }
}

impl PartialEq for Origins {
    fn eq(&self, other: &Self) -> bool {
        self.first == other.first && self.second == other.second
            || self.first == other.second && self.second == other.first
    }
}

impl std::fmt::Debug for Origins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.first, self.second) {
            (Some(first), Some(second)) => write!(f, "({first:?}, {second:?})"),
            (Some(first), None) => write!(f, "{first:?}"),
            _ => write!(f, "()"),
        }
    }
}

/// Validated description of one move's effect: per-cell provenance, the
/// single spawned tile, and the absolute score after the move.
#[derive(Debug)]
pub struct PushResult {
    transitions: Vec<Vec<Origins>>,
    pub spawn_row: usize,
    pub spawn_col: usize,
    pub spawn_value: u32,
    pub new_score: u64,
}

impl PushResult {
    /// Validate a raw engine answer against the current board dimensions.
    ///
    /// Rejects transition lists longer than two entries, a transition grid
    /// whose shape (including ragged rows) differs from `rows`x`cols`, and a
    /// spawn outside the board. No registry state is involved; a rejection
    /// here is what makes the apply cycle atomic.
    pub fn interpret(
        raw: &RawPushResult,
        rows: usize,
        cols: usize,
    ) -> Result<Self, MalformedResult> {
        let got_rows = raw.transitions.len();
        if got_rows != rows {
            return Err(MalformedResult::DimensionMismatch {
                got_rows,
                got_cols: raw.transitions.first().map(Vec::len).unwrap_or(0),
                rows,
                cols,
            });
        }
        for row in &raw.transitions {
            if row.len() != cols {
                return Err(MalformedResult::DimensionMismatch {
                    got_rows,
                    got_cols: row.len(),
                    rows,
                    cols,
                });
            }
        }

        let mut transitions = vec![vec![Origins::default(); cols]; rows];
        for (r, row) in raw.transitions.iter().enumerate() {
            for (c, list) in row.iter().enumerate() {
                if list.len() > 2 {
                    return Err(MalformedResult::TransitionCardinality {
                        row: r,
                        col: c,
                        count: list.len(),
                    });
                }
                for &[or, oc] in list {
                    transitions[r][c].push((or, oc));
                }
            }
        }

        if raw.spawned_row >= rows || raw.spawned_col >= cols {
            return Err(MalformedResult::SpawnOutOfRange {
                row: raw.spawned_row,
                col: raw.spawned_col,
                rows,
                cols,
            });
        }

        Ok(Self {
            transitions,
            spawn_row: raw.spawned_row,
            spawn_col: raw.spawned_col,
            spawn_value: raw.spawned_value,
            new_score: raw.new_score,
        })
    }

    pub fn rows(&self) -> usize {
        self.transitions.len()
    }

    pub fn cols(&self) -> usize {
        self.transitions.first().map(Vec::len).unwrap_or(0)
    }

    pub fn origins(&self, row: usize, col: usize) -> &Origins {
        &self.transitions[row][col]
    }

    /// Iterate `(dest, origins)` over cells that receive at least one tile.
    pub fn arrivals(&self) -> impl Iterator<Item = (Coord, &Origins)> {
        self.transitions.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, o)| !o.is_empty())
                .map(move |(c, o)| ((r, c), o))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(transitions: Vec<Vec<Vec<[usize; 2]>>>) -> RawPushResult {
        RawPushResult {
            transitions,
            spawned_row: 0,
            spawned_col: 0,
            spawned_value: 2,
            new_score: 0,
        }
    }

    #[test]
    fn origins_equality_ignores_order() {
        let a = Origins::from(((0, 0), (0, 1)));
        let b = Origins::from(((0, 1), (0, 0)));
        assert_eq!(a, b);
        assert_ne!(a, Origins::from((0, 0)));
    }

    #[test]
    fn rejects_cardinality_above_two() {
        let mut t = vec![vec![vec![]; 2]; 2];
        t[0][0] = vec![[0, 0], [0, 1], [1, 1]];
        let err = PushResult::interpret(&raw(t), 2, 2).unwrap_err();
        assert!(matches!(
            err,
            MalformedResult::TransitionCardinality { row: 0, col: 0, count: 3 }
        ));
    }

    #[test]
    fn rejects_ragged_transition_grid() {
        let t = vec![vec![vec![], vec![]], vec![vec![]]];
        let err = PushResult::interpret(&raw(t), 2, 2).unwrap_err();
        assert!(matches!(err, MalformedResult::DimensionMismatch { .. }));
    }

    #[test]
    fn rejects_spawn_outside_board() {
        let mut r = raw(vec![vec![vec![]; 2]; 2]);
        r.spawned_row = 2;
        let err = PushResult::interpret(&r, 2, 2).unwrap_err();
        assert!(matches!(err, MalformedResult::SpawnOutOfRange { row: 2, .. }));
    }

    #[test]
    fn decodes_engine_wire_format() {
        let payload = r#"{
            "transitions": [[[[0,0],[0,1]], []], [[], [[1,1]]]],
            "spawned_row": 1, "spawned_col": 0, "spawned_value": 2,
            "new_score": 4
        }"#;
        let raw: RawPushResult = serde_json::from_str(payload).unwrap();
        let result = PushResult::interpret(&raw, 2, 2).unwrap();
        assert!(result.origins(0, 0).is_merge());
        assert_eq!(result.origins(1, 1).len(), 1);
        assert_eq!(result.new_score, 4);
    }
}
