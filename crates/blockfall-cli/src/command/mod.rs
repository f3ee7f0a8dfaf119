use clap::{Parser, Subcommand};

use self::{high_score::HighScoreArg, simulate::SimulateArg};

mod high_score;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play a headless game driven by simulated touches and timer ticks
    Simulate(#[clap(flatten)] SimulateArg),
    /// Show or reset the stored high score
    HighScore(#[clap(flatten)] HighScoreArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or_default() {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::HighScore(arg) => high_score::run(&arg)?,
    }
    Ok(())
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Simulate(SimulateArg::default())
    }
}
