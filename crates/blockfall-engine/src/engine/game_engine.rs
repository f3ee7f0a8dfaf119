use std::mem;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::{Anchor, Cell, Grid, Piece, ROW_COUNT};

use super::{
    ConfigError, DEFAULT_LINE_CLEAR_BONUS, EngineConfig, GameStats, PieceFactory,
    RandomPieceFactory, ScoreStore,
};

/// A player intent or timer tick applied to the falling piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motion {
    Left,
    Right,
    /// Soft drop by one row. This is also what the timer issues on every tick.
    Down,
    Rotate,
}

/// Lifecycle state of a game.
///
/// The falling piece only exists while the game is [`GameState::Active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum GameState {
    AwaitingStart,
    Active(Piece),
    Over,
}

impl GameState {
    /// Returns the falling piece, if the game is active.
    #[must_use]
    pub fn piece(&self) -> Option<&Piece> {
        match self {
            GameState::Active(piece) => Some(piece),
            GameState::AwaitingStart | GameState::Over => None,
        }
    }
}

/// What a call to [`GameEngine::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum MotionOutcome {
    /// The game is not active; nothing happened.
    Ignored,
    /// The piece moved or rotated.
    Moved,
    /// The motion was illegal and the piece stayed where it was.
    Rejected,
    /// The piece landed and locked, and the next piece spawned.
    Locked { cleared_lines: usize },
    /// The piece locked but the next piece could not spawn; the game is over.
    ToppedOut { cleared_lines: usize },
}

/// Rules engine of the game: owns the grid, the falling piece, the score and
/// the lifecycle state.
///
/// All mutation goes through [`Self::apply`], [`Self::start`],
/// [`Self::restart_game`] and [`Self::end_game`]. Callers that drive the
/// engine from several sources (timer and input, say) must serialize those
/// calls themselves.
///
/// # Example
///
/// ```
/// use blockfall_engine::{GameEngine, MemoryScoreStore, Motion, RandomPieceFactory};
///
/// let mut engine = GameEngine::new(
///     Box::new(RandomPieceFactory::new()),
///     Box::new(MemoryScoreStore::default()),
/// );
/// assert!(engine.state().is_awaiting_start());
///
/// engine.start();
/// engine.apply(Motion::Left);
/// engine.apply(Motion::Down);
/// assert!(engine.state().is_active());
/// ```
#[derive(Debug)]
pub struct GameEngine {
    grid: Grid,
    state: GameState,
    stats: GameStats,
    last_session: Option<GameStats>,
    high_score: u32,
    line_clear_bonus: u32,
    factory: Box<dyn PieceFactory>,
    store: Box<dyn ScoreStore>,
}

impl GameEngine {
    /// Creates an engine awaiting start, with the default per-row bonus.
    ///
    /// The high score is read from `store` once, here.
    #[must_use]
    pub fn new(factory: Box<dyn PieceFactory>, store: Box<dyn ScoreStore>) -> Self {
        let high_score = store.read_high_score().unwrap_or_else(|e| {
            warn!("could not read high score, starting from 0: {e}");
            0
        });
        Self {
            grid: Grid::EMPTY,
            state: GameState::AwaitingStart,
            stats: GameStats::new(),
            last_session: None,
            high_score,
            line_clear_bonus: DEFAULT_LINE_CLEAR_BONUS,
            factory,
            store,
        }
    }

    /// Creates an engine from a configuration, using a [`RandomPieceFactory`].
    pub fn from_config(
        config: &EngineConfig,
        store: Box<dyn ScoreStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let factory = config
            .seed
            .map_or_else(RandomPieceFactory::new, RandomPieceFactory::with_seed);
        let mut engine = Self::new(Box::new(factory), store);
        engine.line_clear_bonus = config.line_clear_bonus;
        Ok(engine)
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn cell_at(&self, row: usize, col: usize) -> Cell {
        self.grid.cell_at(row, col)
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn current_piece(&self) -> Option<&Piece> {
        self.state.piece()
    }

    #[must_use]
    pub fn current_score(&self) -> u32 {
        self.stats.score()
    }

    /// The best score known to the engine, including the current game.
    #[must_use]
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Statistics of the game in progress.
    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Statistics of the most recently finished game, kept after the live
    /// score is reset on game over.
    #[must_use]
    pub fn last_session(&self) -> Option<&GameStats> {
        self.last_session.as_ref()
    }

    #[must_use]
    pub fn score_store(&self) -> &dyn ScoreStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn line_clear_bonus(&self) -> u32 {
        self.line_clear_bonus
    }

    /// Checks whether `piece` may occupy frame `frame_index` at `anchor`.
    ///
    /// Rejects placements that leave the field or overlap any non-empty
    /// cell. The falling piece's own ephemeral cells count as non-empty, so
    /// they have to be cleared before revalidating a move.
    #[must_use]
    pub fn is_placement_legal(&self, piece: &Piece, frame_index: usize, anchor: Anchor) -> bool {
        self.grid.can_place(piece.frame(frame_index), anchor)
    }

    /// Applies a motion to the falling piece.
    ///
    /// Does nothing unless the game is active. An illegal `Left`, `Right` or
    /// `Rotate` leaves everything unchanged; an illegal `Down` locks the piece,
    /// clears full rows and spawns the next piece.
    pub fn apply(&mut self, motion: Motion) -> MotionOutcome {
        let GameState::Active(piece) = self.state else {
            return MotionOutcome::Ignored;
        };

        let anchor = piece.anchor();
        let candidate = match motion {
            Motion::Left => anchor.left().map(|a| (piece.frame_index(), a)),
            Motion::Right => Some((piece.frame_index(), anchor.right())),
            Motion::Down => Some((piece.frame_index(), anchor.down())),
            Motion::Rotate => Some((piece.next_frame_index(), anchor)),
        };

        self.grid.clear_ephemeral();
        if let Some((frame_index, anchor)) = candidate
            && self.is_placement_legal(&piece, frame_index, anchor)
        {
            let moved = piece.with_placement(frame_index, anchor);
            self.place_falling(moved);
            return MotionOutcome::Moved;
        }

        if motion != Motion::Down {
            self.place_falling(piece);
            return MotionOutcome::Rejected;
        }
        self.lock(piece)
    }

    /// Starts a game with a freshly spawned piece. No-op if already active.
    pub fn start(&mut self) {
        if self.state.is_active() {
            return;
        }
        info!("game started");
        let piece = self.factory.create();
        self.spawn(piece);
    }

    /// Clears the field and score, then starts a new game.
    pub fn restart_game(&mut self) {
        info!("game restarted");
        self.grid.reset_all();
        self.stats = GameStats::new();
        self.state = GameState::AwaitingStart;
        self.start();
    }

    /// Abandons the current game.
    pub fn end_game(&mut self) {
        info!("game ended with score {}", self.stats.score());
        self.enter_over();
    }

    fn lock(&mut self, piece: Piece) -> MotionOutcome {
        self.grid
            .stamp(piece.current_shape_mask(), piece.anchor(), piece.lock_value());
        let cleared_lines = self.clear_full_rows();
        self.stats.record_lock(cleared_lines, self.line_clear_bonus);
        debug!(
            "locked {:?} at {:?}, cleared {cleared_lines} rows, score {}",
            piece.kind(),
            piece.anchor(),
            self.stats.score()
        );
        self.persist_high_score();

        let next = self.factory.create();
        if self.spawn(next) {
            MotionOutcome::Locked { cleared_lines }
        } else {
            MotionOutcome::ToppedOut { cleared_lines }
        }
    }

    /// Clears every full row, top to bottom, and returns how many were cleared.
    fn clear_full_rows(&mut self) -> usize {
        let mut cleared = 0;
        for row in 0..ROW_COUNT {
            if self.grid.is_row_full(row) {
                self.grid.shift_rows_down_from(row);
                cleared += 1;
            }
        }
        cleared
    }

    fn persist_high_score(&mut self) {
        let score = self.stats.score();
        if score <= self.high_score {
            return;
        }
        self.high_score = score;
        if let Err(e) = self.store.write_high_score(score) {
            warn!("could not persist high score {score}: {e}");
        }
    }

    /// Makes `piece` the falling piece if its default placement is legal,
    /// otherwise ends the game. Returns whether the piece spawned.
    fn spawn(&mut self, piece: Piece) -> bool {
        if !self.is_placement_legal(&piece, piece.frame_index(), piece.anchor()) {
            info!(
                "no room to spawn {:?}, game over with score {}",
                piece.kind(),
                self.stats.score()
            );
            self.enter_over();
            return false;
        }
        debug!("spawned {:?}", piece.kind());
        self.place_falling(piece);
        true
    }

    fn place_falling(&mut self, piece: Piece) {
        self.grid
            .stamp(piece.current_shape_mask(), piece.anchor(), Cell::Ephemeral);
        self.state = GameState::Active(piece);
    }

    fn enter_over(&mut self) {
        let finished = mem::take(&mut self.stats);
        if !self.state.is_over() {
            self.last_session = Some(finished);
        }
        self.grid.reset_all();
        self.state = GameState::Over;
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        COLUMN_COUNT, MemoryScoreStore, PieceKind, ScoreStoreError, SequencePieceFactory,
    };

    use super::*;

    fn engine_with(kinds: &[PieceKind]) -> GameEngine {
        GameEngine::new(
            Box::new(SequencePieceFactory::new(kinds.iter().copied())),
            Box::new(MemoryScoreStore::default()),
        )
    }

    fn started_with(kinds: &[PieceKind]) -> GameEngine {
        let mut engine = engine_with(kinds);
        engine.start();
        engine
    }

    /// Installs a field fixture under the falling piece.
    fn set_field(engine: &mut GameEngine, art: &str) {
        engine.grid = Grid::from_ascii(art);
        if let GameState::Active(piece) = engine.state {
            engine.place_falling(piece);
        }
    }

    fn assert_invariants(engine: &GameEngine) {
        assert_eq!(
            engine.current_piece().is_some(),
            engine.state().is_active(),
            "piece must exist exactly while active"
        );
        let mut footprint: Vec<(usize, usize)> = engine
            .current_piece()
            .map(|piece| piece.occupied_cells().collect())
            .unwrap_or_default();
        footprint.sort_unstable();
        let mut ephemeral = Vec::new();
        for (row, cells) in engine.grid().rows().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if *cell == Cell::Ephemeral {
                    ephemeral.push((row, col));
                }
            }
        }
        assert_eq!(ephemeral, footprint, "ephemeral cells must match the piece");
    }

    fn drop_until_locked(engine: &mut GameEngine) -> MotionOutcome {
        for _ in 0..=ROW_COUNT {
            let outcome = engine.apply(Motion::Down);
            assert_invariants(engine);
            if !outcome.is_moved() {
                return outcome;
            }
        }
        panic!("piece never landed");
    }

    #[derive(Debug)]
    struct FailingStore;

    impl ScoreStore for FailingStore {
        fn read_high_score(&self) -> Result<u32, ScoreStoreError> {
            Err(ScoreStoreError::new("unavailable"))
        }

        fn write_high_score(&mut self, _score: u32) -> Result<(), ScoreStoreError> {
            Err(ScoreStoreError::new("unavailable"))
        }
    }

    #[test]
    fn test_new_engine_awaits_start() {
        let engine = engine_with(&[PieceKind::T]);
        assert!(engine.state().is_awaiting_start());
        assert_eq!(engine.current_score(), 0);
        assert_eq!(engine.grid(), &Grid::EMPTY);
        assert_invariants(&engine);
    }

    #[test]
    fn test_apply_is_ignored_unless_active() {
        let mut engine = engine_with(&[PieceKind::T]);
        for motion in [Motion::Left, Motion::Right, Motion::Down, Motion::Rotate] {
            assert_eq!(engine.apply(motion), MotionOutcome::Ignored);
        }
        assert_eq!(engine.grid(), &Grid::EMPTY);

        engine.end_game();
        assert_eq!(engine.apply(Motion::Down), MotionOutcome::Ignored);
        assert_invariants(&engine);
    }

    #[test]
    fn test_start_spawns_piece_at_center() {
        let engine = started_with(&[PieceKind::T]);
        let piece = engine.current_piece().unwrap();
        assert_eq!(piece.kind(), PieceKind::T);
        assert_eq!(piece.anchor(), Anchor::new(0, COLUMN_COUNT / 2));
        assert_eq!(engine.cell_at(0, COLUMN_COUNT / 2 + 1), Cell::Ephemeral);
        assert_invariants(&engine);
    }

    #[test]
    fn test_start_is_noop_when_active() {
        let mut engine = started_with(&[PieceKind::T, PieceKind::I]);
        engine.apply(Motion::Down);
        let before = *engine.current_piece().unwrap();
        engine.start();
        assert_eq!(engine.current_piece(), Some(&before));
    }

    #[test]
    fn test_moves_update_piece_and_grid() {
        let mut engine = started_with(&[PieceKind::O]);
        assert_eq!(engine.apply(Motion::Left), MotionOutcome::Moved);
        assert_eq!(engine.apply(Motion::Down), MotionOutcome::Moved);
        assert_eq!(engine.apply(Motion::Right), MotionOutcome::Moved);
        assert_eq!(engine.apply(Motion::Right), MotionOutcome::Moved);

        let piece = engine.current_piece().unwrap();
        assert_eq!(piece.anchor(), Anchor::new(1, COLUMN_COUNT / 2 + 1));
        assert_invariants(&engine);
    }

    #[test]
    fn test_rotate_cycles_frames() {
        let mut engine = started_with(&[PieceKind::T]);
        engine.apply(Motion::Down);
        for expected in [1, 2, 3, 0] {
            assert_eq!(engine.apply(Motion::Rotate), MotionOutcome::Moved);
            assert_eq!(engine.current_piece().unwrap().frame_index(), expected);
            assert_invariants(&engine);
        }
    }

    #[test]
    fn test_left_rejected_at_column_zero() {
        let mut engine = started_with(&[PieceKind::O]);
        for _ in 0..COLUMN_COUNT / 2 {
            assert_eq!(engine.apply(Motion::Left), MotionOutcome::Moved);
        }
        assert_eq!(engine.current_piece().unwrap().anchor().col(), 0);

        let grid = engine.grid().clone();
        let piece = *engine.current_piece().unwrap();
        assert_eq!(engine.apply(Motion::Left), MotionOutcome::Rejected);
        assert_eq!(engine.grid(), &grid);
        assert_eq!(engine.current_piece(), Some(&piece));
    }

    #[test]
    fn test_right_rejected_at_rightmost_column() {
        let mut engine = started_with(&[PieceKind::O]);
        // O is two cells wide: the rightmost legal anchor column is COLUMN_COUNT - 2.
        while engine.apply(Motion::Right).is_moved() {}
        assert_eq!(
            engine.current_piece().unwrap().anchor().col(),
            COLUMN_COUNT - 2
        );
        assert_eq!(engine.apply(Motion::Right), MotionOutcome::Rejected);
        assert_invariants(&engine);
    }

    #[test]
    fn test_rejected_motion_is_idempotent() {
        let mut engine = started_with(&[PieceKind::I]);
        while engine.apply(Motion::Left).is_moved() {}

        let grid = engine.grid().clone();
        let piece = *engine.current_piece().unwrap();
        for _ in 0..3 {
            assert_eq!(engine.apply(Motion::Left), MotionOutcome::Rejected);
            assert_eq!(engine.grid(), &grid);
            assert_eq!(engine.current_piece(), Some(&piece));
        }
    }

    #[test]
    fn test_moves_blocked_by_locked_cells() {
        let mut engine = started_with(&[PieceKind::O]);
        // A locked column right next to the spawned square.
        let mut grid = Grid::EMPTY;
        for row in 0..ROW_COUNT {
            grid.set_cell(row, COLUMN_COUNT / 2 + 2, Cell::Locked(PieceKind::I));
        }
        engine.grid = grid;
        let piece = *engine.current_piece().unwrap();
        engine.place_falling(piece);

        assert_eq!(engine.apply(Motion::Right), MotionOutcome::Rejected);
        assert_eq!(engine.apply(Motion::Left), MotionOutcome::Moved);
        assert_invariants(&engine);
    }

    #[test]
    fn test_rotation_into_wall_is_rejected() {
        let mut engine = started_with(&[PieceKind::I]);
        assert_eq!(engine.apply(Motion::Rotate), MotionOutcome::Moved);
        // Upright bar is one column wide; push it against the right wall.
        while engine.apply(Motion::Right).is_moved() {}
        let piece = *engine.current_piece().unwrap();
        assert_eq!(piece.anchor().col(), COLUMN_COUNT - 1);

        // Lying flat would need four columns.
        assert_eq!(engine.apply(Motion::Rotate), MotionOutcome::Rejected);
        assert_eq!(engine.current_piece(), Some(&piece));
        assert_eq!(engine.current_score(), 0);
        assert_invariants(&engine);
    }

    #[test]
    fn test_placement_check_is_pure() {
        let engine = started_with(&[PieceKind::L]);
        let grid = engine.grid().clone();
        let piece = *engine.current_piece().unwrap();

        // The piece's own ephemeral cells count as occupied.
        assert!(!engine.is_placement_legal(&piece, piece.frame_index(), piece.anchor()));
        assert!(engine.is_placement_legal(&piece, 1, Anchor::new(5, 0)));
        assert!(!engine.is_placement_legal(&piece, 0, Anchor::new(ROW_COUNT - 1, 0)));
        assert!(!engine.is_placement_legal(&piece, 0, Anchor::new(0, COLUMN_COUNT - 2)));

        assert_eq!(engine.grid(), &grid);
        assert_eq!(engine.current_piece(), Some(&piece));
    }

    #[test]
    fn test_down_at_bottom_locks_piece() {
        let mut engine = started_with(&[PieceKind::O, PieceKind::T]);
        let outcome = drop_until_locked(&mut engine);
        assert_eq!(outcome, MotionOutcome::Locked { cleared_lines: 0 });

        let col = COLUMN_COUNT / 2;
        for (row, col) in [
            (ROW_COUNT - 2, col),
            (ROW_COUNT - 2, col + 1),
            (ROW_COUNT - 1, col),
            (ROW_COUNT - 1, col + 1),
        ] {
            assert_eq!(engine.cell_at(row, col), Cell::Locked(PieceKind::O));
        }
        assert_eq!(engine.current_piece().unwrap().kind(), PieceKind::T);
        assert_eq!(engine.stats().locked_pieces(), 1);
        assert_eq!(engine.current_score(), 0);
    }

    #[test]
    fn test_lock_clears_completed_row() {
        let mut engine = started_with(&[PieceKind::I, PieceKind::O]);
        // The bottom row misses exactly the cells the flat bar will land in.
        set_field(
            &mut engine,
            "
            J.........
            SSSSS....Z
            ",
        );

        let outcome = drop_until_locked(&mut engine);
        assert_eq!(outcome, MotionOutcome::Locked { cleared_lines: 1 });
        assert_eq!(engine.current_score(), 10);
        assert_eq!(engine.high_score(), 10);

        // The row above moved down, the top row is empty again.
        assert_eq!(engine.cell_at(ROW_COUNT - 1, 0), Cell::Locked(PieceKind::J));
        for col in 1..COLUMN_COUNT {
            assert!(engine.grid().is_empty(ROW_COUNT - 1, col));
        }
        assert!(engine.grid().rows().next().unwrap().iter().all(|cell| {
            matches!(cell, Cell::Empty | Cell::Ephemeral)
        }));
        assert_invariants(&engine);
    }

    #[test]
    fn test_lock_clears_every_full_row() {
        let mut engine = started_with(&[PieceKind::I, PieceKind::T]);
        engine.apply(Motion::Rotate);
        while engine.apply(Motion::Left).is_moved() {}
        // Upright bar fills column 0 of four rows, two of which become full.
        set_field(
            &mut engine,
            "
            .ZZ.......
            .OOOOOOOOO
            .Z........
            .SSSSSSSSS
            ",
        );

        let outcome = drop_until_locked(&mut engine);
        assert_eq!(outcome, MotionOutcome::Locked { cleared_lines: 2 });
        assert_eq!(engine.current_score(), 20);
        assert_eq!(engine.stats().line_clear_counter()[2], 1);

        let text = engine.grid().to_string();
        let bottom: Vec<&str> = text.lines().skip(ROW_COUNT - 2).collect();
        assert_eq!(bottom, ["IZZ.......", "IZ........"]);
    }

    #[test]
    fn test_high_score_is_persisted_only_when_beaten() {
        let mut engine = GameEngine::new(
            Box::new(SequencePieceFactory::new([PieceKind::I])),
            Box::new(MemoryScoreStore::new(15)),
        );
        assert_eq!(engine.high_score(), 15);
        engine.start();
        set_field(&mut engine, "SSSSS....Z");
        drop_until_locked(&mut engine);
        assert_eq!(engine.current_score(), 10);
        assert_eq!(engine.score_store().read_high_score().unwrap(), 15);

        engine.restart_game();
        set_field(
            &mut engine,
            "
            SSSSS....Z
            SSSSS....Z
            ",
        );
        // Two bars stacked into the gap clear two rows: 20 beats 15.
        drop_until_locked(&mut engine);
        drop_until_locked(&mut engine);
        assert_eq!(engine.current_score(), 20);
        assert_eq!(engine.high_score(), 20);
        assert_eq!(engine.score_store().read_high_score().unwrap(), 20);
    }

    #[test]
    fn test_store_failures_do_not_affect_play() {
        let mut engine = GameEngine::new(
            Box::new(SequencePieceFactory::new([PieceKind::I])),
            Box::new(FailingStore),
        );
        assert_eq!(engine.high_score(), 0);
        engine.start();
        set_field(&mut engine, "SSSSS....Z");
        let outcome = drop_until_locked(&mut engine);
        assert_eq!(outcome, MotionOutcome::Locked { cleared_lines: 1 });
        assert_eq!(engine.current_score(), 10);
        assert_eq!(engine.high_score(), 10);
    }

    #[test]
    fn test_blocked_spawn_ends_game() {
        let mut engine = started_with(&[PieceKind::O]);
        // Everything below row 1 is stacked, leaving no full row.
        let row = "ZZZZZZZZZ.";
        let art = vec![row; ROW_COUNT - 2].join("\n");
        set_field(&mut engine, &art);

        let outcome = engine.apply(Motion::Down);
        assert_eq!(outcome, MotionOutcome::ToppedOut { cleared_lines: 0 });
        assert!(engine.state().is_over());
        assert_eq!(engine.current_piece(), None);
        assert_eq!(engine.grid(), &Grid::EMPTY);
        assert_eq!(engine.current_score(), 0);
        assert_eq!(engine.last_session().unwrap().locked_pieces(), 1);
        assert_invariants(&engine);
    }

    #[test]
    fn test_game_over_keeps_last_session_score() {
        let mut engine = started_with(&[PieceKind::I]);
        set_field(&mut engine, "SSSSS....Z");
        drop_until_locked(&mut engine);
        assert_eq!(engine.current_score(), 10);

        let art = vec!["ZZZZZZZZZ."; ROW_COUNT - 1].join("\n");
        set_field(&mut engine, &art);
        assert!(engine.apply(Motion::Down).is_topped_out());
        assert_eq!(engine.current_score(), 0);
        assert_eq!(engine.last_session().unwrap().score(), 10);
        assert_eq!(engine.high_score(), 10);
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut engine = started_with(&[PieceKind::I]);
        set_field(&mut engine, "SSSSS....Z");
        drop_until_locked(&mut engine);
        engine.end_game();
        assert!(engine.state().is_over());

        engine.restart_game();
        assert!(engine.state().is_active());
        assert!(engine.current_piece().is_some());
        assert_eq!(engine.current_score(), 0);
        assert_invariants(&engine);
    }

    #[test]
    fn test_restart_while_active_clears_field() {
        let mut engine = started_with(&[PieceKind::T]);
        drop_until_locked(&mut engine);
        engine.restart_game();

        assert!(engine.state().is_active());
        assert_eq!(engine.stats(), &GameStats::new());
        let locked = engine
            .grid()
            .rows()
            .flatten()
            .filter(|cell| matches!(cell, Cell::Locked(_)))
            .count();
        assert_eq!(locked, 0);
        assert_invariants(&engine);
    }

    #[test]
    fn test_end_game_resets_score_and_field() {
        let mut engine = started_with(&[PieceKind::I]);
        set_field(&mut engine, "SSSSS....Z");
        drop_until_locked(&mut engine);

        engine.end_game();
        assert!(engine.state().is_over());
        assert_eq!(engine.current_score(), 0);
        assert_eq!(engine.grid(), &Grid::EMPTY);
        assert_eq!(engine.last_session().unwrap().score(), 10);

        // Ending again keeps the finished session around.
        engine.end_game();
        assert_eq!(engine.last_session().unwrap().score(), 10);
    }

    #[test]
    fn test_start_from_over_begins_new_game() {
        let mut engine = started_with(&[PieceKind::S]);
        engine.end_game();
        engine.start();
        assert!(engine.state().is_active());
        assert_eq!(engine.current_score(), 0);
        assert_invariants(&engine);
    }

    #[test]
    fn test_from_config_uses_bonus_and_seed() {
        let config = EngineConfig {
            line_clear_bonus: 25,
            seed: Some("00000000000000000000000000000001".parse().unwrap()),
        };
        let mut a = GameEngine::from_config(&config, Box::new(MemoryScoreStore::default()))
            .unwrap();
        let mut b = GameEngine::from_config(&config, Box::new(MemoryScoreStore::default()))
            .unwrap();
        assert_eq!(a.line_clear_bonus(), 25);

        a.start();
        b.start();
        for _ in 0..200 {
            assert_eq!(a.apply(Motion::Down), b.apply(Motion::Down));
            assert_eq!(a.current_piece(), b.current_piece());
        }
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = EngineConfig {
            line_clear_bonus: 0,
            seed: None,
        };
        let result = GameEngine::from_config(&config, Box::new(MemoryScoreStore::default()));
        assert!(matches!(result, Err(ConfigError::ZeroLineClearBonus)));
    }

    #[test]
    fn test_invariants_hold_during_random_play() {
        use rand::{Rng as _, SeedableRng as _};

        let config = EngineConfig {
            seed: Some("0123456789abcdef0123456789abcdef".parse().unwrap()),
            ..EngineConfig::default()
        };
        let mut engine =
            GameEngine::from_config(&config, Box::new(MemoryScoreStore::default())).unwrap();
        let mut rng = rand_pcg::Pcg32::seed_from_u64(42);
        let motions = [Motion::Left, Motion::Right, Motion::Down, Motion::Rotate];

        engine.start();
        for _ in 0..5000 {
            if !engine.state().is_active() {
                engine.restart_game();
            }
            engine.apply(motions[rng.random_range(0..motions.len())]);
            assert_invariants(&engine);
        }
    }
}
