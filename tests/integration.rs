// Integration tests (native) for the `tilepush` crate.
// These tests avoid wasm-specific functionality and exercise the
// reconciliation core against a scripted fake engine, so they can run under
// `cargo test` on the host.

use std::collections::VecDeque;

use tilepush::engine::{BoardSnapshot, Direction, Engine, RawNewGame, RawPushResult};
use tilepush::game::GameSession;
use tilepush::result::MalformedResult;

/// Fake engine that replays queued push answers. `new_game` echoes the
/// supplied seed (or picks "42") and always returns the configured board, so
/// determinism is trivially observable.
#[derive(Debug)]
struct ScriptedEngine {
    board: Vec<Vec<u32>>,
    answers: VecDeque<Option<RawPushResult>>,
    score: u64,
    echo_seed: Option<String>,
}

impl ScriptedEngine {
    fn new(board: Vec<Vec<u32>>) -> Self {
        Self {
            board,
            answers: VecDeque::new(),
            score: 0,
            echo_seed: None,
        }
    }

    fn queue(&mut self, answer: Option<RawPushResult>) {
        self.answers.push_back(answer);
    }
}

impl Engine for ScriptedEngine {
    fn new_game(
        &mut self,
        _rows: usize,
        _cols: usize,
        _mode: usize,
        seed: Option<&str>,
    ) -> Result<RawNewGame, MalformedResult> {
        let seed = self
            .echo_seed
            .clone()
            .or_else(|| seed.map(str::to_owned))
            .unwrap_or_else(|| "42".to_owned());
        Ok(RawNewGame {
            board: BoardSnapshot::new(self.board.clone()),
            seed,
        })
    }

    fn push(&mut self, _direction: Direction) -> Result<Option<RawPushResult>, MalformedResult> {
        let answer = self.answers.pop_front().flatten();
        if let Some(r) = &answer {
            self.score = r.new_score;
        }
        Ok(answer)
    }

    fn state(&self) -> Result<BoardSnapshot, MalformedResult> {
        Ok(BoardSnapshot::new(self.board.clone()))
    }

    fn score(&self) -> u64 {
        self.score
    }
}

fn raw_result(
    transitions: Vec<((usize, usize), Vec<(usize, usize)>)>,
    spawn: (usize, usize, u32),
    score: u64,
) -> RawPushResult {
    let mut grid = vec![vec![Vec::new(); 4]; 4];
    for ((r, c), origins) in transitions {
        grid[r][c] = origins.into_iter().map(|(or, oc)| [or, oc]).collect();
    }
    RawPushResult {
        transitions: grid,
        spawned_row: spawn.0,
        spawned_col: spawn.1,
        spawned_value: spawn.2,
        new_score: score,
    }
}

fn two_tile_board() -> Vec<Vec<u32>> {
    let mut board = vec![vec![0u32; 4]; 4];
    board[0][0] = 2;
    board[0][1] = 2;
    board
}

#[test]
fn initializer_builds_new_flagged_registry() {
    let engine = ScriptedEngine::new(two_tile_board());
    let (session, ops) = GameSession::start(engine, 4, 4, 0, None).unwrap();
    assert_eq!(session.registry().live_count(), 2);
    assert_eq!(ops.len(), 2);
    for (_, entity) in session.registry().iter() {
        assert!(entity.flags.is_new());
    }
    assert_eq!(session.seed().to_string(), "42");
}

#[test]
fn same_seed_reproduces_the_same_start() {
    let mut boards = Vec::new();
    for _ in 0..2 {
        let engine = ScriptedEngine::new(two_tile_board());
        let (session, _) = GameSession::start(engine, 4, 4, 0, Some("42")).unwrap();
        let mut tiles: Vec<_> = session
            .registry()
            .iter()
            .map(|(_, e)| (e.row, e.col, e.value))
            .collect();
        tiles.sort_unstable();
        boards.push((session.seed().to_string(), tiles));
    }
    assert_eq!(boards[0], boards[1]);
}

#[test]
fn merge_left_scenario() {
    // 4x4 board, 2 at (0,0) and (0,1), pushed left: both merge into (0,0),
    // a 2 spawns at (3,3), score becomes 4.
    let mut engine = ScriptedEngine::new(two_tile_board());
    engine.queue(Some(raw_result(
        vec![((0, 0), vec![(0, 0), (0, 1)])],
        (3, 3, 2),
        4,
    )));
    let (mut session, _) = GameSession::start(engine, 4, 4, 0, None).unwrap();

    let outcome = session.push(Direction::L).unwrap().unwrap();
    assert_eq!(outcome.missed_origins, 0);

    let reg = session.registry();
    let merged = reg.get(reg.live_at(0, 0).unwrap()).unwrap();
    assert_eq!(merged.value, 4);
    assert!(merged.flags.is_merged());

    let stale: Vec<_> = reg
        .iter()
        .filter(|(_, e)| e.flags.is_to_remove())
        .collect();
    assert_eq!(stale.len(), 2);

    let spawned = reg.get(reg.live_at(3, 3).unwrap()).unwrap();
    assert_eq!(spawned.value, 2);
    assert!(spawned.flags.is_new());

    assert_eq!(session.score(), 4);
}

#[test]
fn stale_entities_survive_exactly_one_extra_cycle() {
    let mut engine = ScriptedEngine::new(two_tile_board());
    engine.queue(Some(raw_result(
        vec![((0, 0), vec![(0, 0), (0, 1)])],
        (3, 3, 2),
        4,
    )));
    // Second move: the merged 4 slides down, the spawned 2 stays put.
    engine.queue(Some(raw_result(
        vec![((3, 0), vec![(0, 0)]), ((3, 3), vec![(3, 3)])],
        (0, 0, 2),
        4,
    )));
    let (mut session, _) = GameSession::start(engine, 4, 4, 0, None).unwrap();

    session.push(Direction::L).unwrap().unwrap();
    assert_eq!(session.registry().total_count(), 4);
    assert_eq!(session.registry().live_count(), 2);

    session.push(Direction::D).unwrap().unwrap();
    // Cleanup ran: the two stale incomers are gone, the spawn of this cycle
    // joined the merged tile and the previous spawn.
    assert_eq!(session.registry().total_count(), 3);
    assert_eq!(session.registry().live_count(), 3);
}

#[test]
fn illegal_move_changes_nothing() {
    let mut engine = ScriptedEngine::new(two_tile_board());
    engine.queue(None);
    let (mut session, _) = GameSession::start(engine, 4, 4, 0, None).unwrap();
    let before: Vec<_> = session
        .registry()
        .iter()
        .map(|(id, e)| (id, e.clone()))
        .collect();

    assert!(session.push(Direction::U).unwrap().is_none());

    let after: Vec<_> = session
        .registry()
        .iter()
        .map(|(id, e)| (id, e.clone()))
        .collect();
    assert_eq!(before, after);
    assert_eq!(session.score(), 0);
}

#[test]
fn malformed_result_aborts_atomically() {
    let mut engine = ScriptedEngine::new(two_tile_board());
    // Spawn coordinates outside a 4x4 board.
    engine.queue(Some(raw_result(
        vec![((0, 0), vec![(0, 0), (0, 1)])],
        (4, 0, 2),
        4,
    )));
    let (mut session, _) = GameSession::start(engine, 4, 4, 0, None).unwrap();
    let before: Vec<_> = session
        .registry()
        .iter()
        .map(|(id, e)| (id, e.clone()))
        .collect();

    let err = session.push(Direction::L).unwrap_err();
    assert!(matches!(err, MalformedResult::SpawnOutOfRange { .. }));

    // No partial application is observable, not even the cleanup phase.
    let after: Vec<_> = session
        .registry()
        .iter()
        .map(|(id, e)| (id, e.clone()))
        .collect();
    assert_eq!(before, after);
    assert_eq!(session.score(), 0);
}

#[test]
fn seed_beyond_u64_is_preserved_exactly() {
    let big = "340282366920938463463374607431768211456"; // 2^128
    let engine = ScriptedEngine::new(two_tile_board());
    let (session, _) = GameSession::start(engine, 4, 4, 0, Some(big)).unwrap();
    assert_eq!(session.seed().to_string(), big);
}

#[test]
fn engine_chosen_seed_must_be_decimal() {
    let mut engine = ScriptedEngine::new(two_tile_board());
    engine.echo_seed = Some("0xbeef".to_owned());
    let err = GameSession::start(engine, 4, 4, 0, None).unwrap_err();
    assert!(matches!(err, MalformedResult::BadSeed(_)));
}

#[test]
fn new_game_discards_previous_registry() {
    let mut engine = ScriptedEngine::new(two_tile_board());
    engine.queue(Some(raw_result(
        vec![((0, 0), vec![(0, 0), (0, 1)])],
        (3, 3, 2),
        4,
    )));
    let (mut session, _) = GameSession::start(engine, 4, 4, 0, None).unwrap();
    session.push(Direction::L).unwrap().unwrap();
    assert_eq!(session.registry().total_count(), 4);

    let ops = session.new_game(Some("7")).unwrap();
    assert_eq!(session.registry().total_count(), 2);
    assert_eq!(session.registry().live_count(), 2);
    assert_eq!(ops.len(), 2);
    assert_eq!(session.seed().to_string(), "7");
}

#[test]
fn wrong_sized_new_game_board_is_rejected() {
    let engine = ScriptedEngine::new(vec![vec![0u32; 3]; 3]);
    let err = GameSession::start(engine, 4, 4, 0, None).unwrap_err();
    assert!(matches!(err, MalformedResult::DimensionMismatch { .. }));
}
