use std::fmt;

/// Persistent storage for the high score.
///
/// Failures are reported to the caller, but the engine treats every store
/// call as best effort: it logs the error and keeps playing.
pub trait ScoreStore: fmt::Debug {
    fn read_high_score(&self) -> Result<u32, ScoreStoreError>;
    fn write_high_score(&mut self, score: u32) -> Result<(), ScoreStoreError>;
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("high score store failure: {message}")]
pub struct ScoreStoreError {
    message: String,
}

impl ScoreStoreError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Keeps the high score in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    high_score: u32,
}

impl MemoryScoreStore {
    #[must_use]
    pub const fn new(high_score: u32) -> Self {
        Self { high_score }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn read_high_score(&self) -> Result<u32, ScoreStoreError> {
        Ok(self.high_score)
    }

    fn write_high_score(&mut self, score: u32) -> Result<(), ScoreStoreError> {
        self.high_score = score;
        Ok(())
    }
}
