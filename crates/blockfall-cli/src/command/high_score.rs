use std::path::PathBuf;

use anyhow::Context as _;
use blockfall_engine::ScoreStore as _;

use crate::store::JsonFileScoreStore;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct HighScoreArg {
    /// File holding the high score
    #[clap(long, default_value = super::simulate::DEFAULT_HIGH_SCORE_FILE)]
    high_score_file: PathBuf,
    /// Delete the stored high score instead of showing it
    #[clap(long)]
    reset: bool,
}

pub(crate) fn run(arg: &HighScoreArg) -> anyhow::Result<()> {
    let HighScoreArg {
        high_score_file,
        reset,
    } = arg;

    let store = JsonFileScoreStore::new(high_score_file);
    if *reset {
        let removed = store.reset().with_context(|| {
            format!("Failed to reset high score: {}", store.path().display())
        })?;
        if removed {
            log::info!("removed {}", store.path().display());
        }
        println!("High score reset");
        return Ok(());
    }

    let high_score = store.read_high_score()?;
    println!("{high_score}");
    Ok(())
}
