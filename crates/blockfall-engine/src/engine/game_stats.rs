use serde::{Deserialize, Serialize};

/// Largest number of rows a single lock can clear (the tallest frame is 4 rows).
const MAX_LINES_PER_LOCK: usize = 4;

/// Statistics of one game session.
///
/// - **Score**: the per-row bonus times the number of cleared rows
/// - **Locked pieces**: number of pieces converted into permanent material
/// - **Line clear distribution**: how many locks cleared 0, 1, 2, 3 or 4 rows
///
/// # Example
///
/// ```
/// use blockfall_engine::GameStats;
///
/// let mut stats = GameStats::new();
/// stats.record_lock(2, 10);
///
/// assert_eq!(stats.score(), 20);
/// assert_eq!(stats.cleared_lines(), 2);
/// assert_eq!(stats.line_clear_counter()[2], 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    score: u32,
    locked_pieces: usize,
    cleared_lines: usize,
    line_clear_counter: [usize; MAX_LINES_PER_LOCK + 1],
}

impl GameStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            locked_pieces: 0,
            cleared_lines: 0,
            line_clear_counter: [0; MAX_LINES_PER_LOCK + 1],
        }
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn locked_pieces(&self) -> usize {
        self.locked_pieces
    }

    #[must_use]
    pub const fn cleared_lines(&self) -> usize {
        self.cleared_lines
    }

    /// Histogram of locks by the number of rows they cleared (index 0..=4).
    #[must_use]
    pub const fn line_clear_counter(&self) -> &[usize; MAX_LINES_PER_LOCK + 1] {
        &self.line_clear_counter
    }

    /// Records a lock that cleared `cleared_lines` rows, each worth `line_clear_bonus`.
    pub fn record_lock(&mut self, cleared_lines: usize, line_clear_bonus: u32) {
        self.locked_pieces += 1;
        self.cleared_lines += cleared_lines;
        if let Some(count) = self.line_clear_counter.get_mut(cleared_lines) {
            *count += 1;
        }
        let rows = u32::try_from(cleared_lines).unwrap_or(u32::MAX);
        self.score = self
            .score
            .saturating_add(rows.saturating_mul(line_clear_bonus));
    }
}
