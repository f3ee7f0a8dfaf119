use std::{
    fs, io,
    path::{Path, PathBuf},
};

use blockfall_engine::{ScoreStore, ScoreStoreError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u32,
}

/// Keeps the high score in a small JSON file: `{"high_score": 120}`.
///
/// A missing file reads as a high score of 0.
#[derive(Debug, Clone)]
pub struct JsonFileScoreStore {
    path: PathBuf,
}

impl JsonFileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the stored high score. Returns `false` if there was nothing to remove.
    pub fn reset(&self) -> io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn error(&self, action: &str, cause: impl std::fmt::Display) -> ScoreStoreError {
        ScoreStoreError::new(format!(
            "failed to {action} {}: {cause}",
            self.path.display()
        ))
    }
}

impl ScoreStore for JsonFileScoreStore {
    fn read_high_score(&self) -> Result<u32, ScoreStoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(self.error("read", e)),
        };
        let record: HighScoreRecord =
            serde_json::from_str(&text).map_err(|e| self.error("parse", e))?;
        Ok(record.high_score)
    }

    fn write_high_score(&mut self, score: u32) -> Result<(), ScoreStoreError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|e| self.error("create directory for", e))?;
        }
        let json = serde_json::to_string_pretty(&HighScoreRecord { high_score: score })
            .map_err(|e| self.error("serialize", e))?;
        fs::write(&self.path, json).map_err(|e| self.error("write", e))
    }
}
