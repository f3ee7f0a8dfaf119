use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver, SyncSender},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::Context as _;
use blockfall_engine::{
    EngineConfig, GameEngine, GameStats, Motion, MotionOutcome, PieceSeed,
    input::{self, TouchPoint, TouchResponse},
};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::{store::JsonFileScoreStore, util};

pub(super) const DEFAULT_HIGH_SCORE_FILE: &str = "./data/high_score.json";

/// Commands in flight between the drivers and the engine.
const COMMAND_QUEUE_SIZE: usize = 64;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Seed for piece generation (32 hex digits), random when omitted
    #[clap(long)]
    seed: Option<PieceSeed>,
    /// Seed for the simulated touches, random when omitted
    #[clap(long)]
    touch_seed: Option<u64>,
    /// Number of simulated touches
    #[clap(long, default_value_t = 500)]
    touches: usize,
    /// Milliseconds between simulated touches
    #[clap(long, default_value_t = 2)]
    touch_interval_ms: u64,
    /// Milliseconds between timer ticks (soft drops)
    #[clap(long, default_value_t = 5)]
    tick_interval_ms: u64,
    /// File holding the high score
    #[clap(long, default_value = DEFAULT_HIGH_SCORE_FILE)]
    high_score_file: PathBuf,
    /// Engine configuration file (JSON)
    #[clap(long)]
    config: Option<PathBuf>,
    /// Print the final field to stderr
    #[clap(long)]
    print_board: bool,
}

impl Default for SimulateArg {
    fn default() -> Self {
        Self {
            seed: None,
            touch_seed: None,
            touches: 500,
            touch_interval_ms: 2,
            tick_interval_ms: 5,
            high_score_file: PathBuf::from(DEFAULT_HIGH_SCORE_FILE),
            config: None,
            print_board: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Touch(TouchPoint),
    Tick,
    Quit,
}

#[derive(Debug, Clone)]
struct SimulationOptions {
    touches: usize,
    touch_seed: u64,
    touch_interval: Duration,
    tick_interval: Duration,
}

#[derive(Debug, Default, Serialize)]
struct SimulationSummary {
    touches: usize,
    ticks: usize,
    finished_games: Vec<GameStats>,
    current_game: GameStats,
    high_score: u32,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    piece_seed: PieceSeed,
    touch_seed: u64,
    #[serde(flatten)]
    summary: SimulationSummary,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let mut config = match &arg.config {
        Some(path) => util::read_json_file::<EngineConfig, _>("engine config", path)?,
        None => EngineConfig::default(),
    };
    let piece_seed = arg
        .seed
        .or(config.seed)
        .unwrap_or_else(|| rand::rng().random());
    config.seed = Some(piece_seed);
    let touch_seed = arg.touch_seed.unwrap_or_else(|| rand::rng().random());

    let store = JsonFileScoreStore::new(&arg.high_score_file);
    let engine = GameEngine::from_config(&config, Box::new(store))
        .context("Invalid engine configuration")?;
    log::info!("simulating with piece seed {piece_seed}, touch seed {touch_seed}");

    let options = SimulationOptions {
        touches: arg.touches,
        touch_seed,
        touch_interval: Duration::from_millis(arg.touch_interval_ms),
        tick_interval: Duration::from_millis(arg.tick_interval_ms),
    };
    let (engine, summary) = simulate(engine, &options);

    if arg.print_board {
        eprintln!("{}", engine.grid());
    }
    util::print_json(&SimulationReport {
        piece_seed,
        touch_seed,
        summary,
    })
}

/// Runs the engine on this thread while a timer thread and a player thread
/// feed it through one command queue, so engine calls never overlap.
fn simulate(mut engine: GameEngine, options: &SimulationOptions) -> (GameEngine, SimulationSummary) {
    let (tx, rx) = mpsc::sync_channel(COMMAND_QUEUE_SIZE);
    let timer = spawn_timer(tx.clone(), options.tick_interval);
    let player = spawn_player(tx, options);

    let mut summary = SimulationSummary::default();
    drive(&mut engine, &rx, &mut summary);
    // Closing the queue stops the timer at its next tick.
    drop(rx);
    for (name, handle) in [("timer", timer), ("player", player)] {
        if handle.join().is_err() {
            log::warn!("{name} thread panicked");
        }
    }

    summary.current_game = engine.stats().clone();
    summary.high_score = engine.high_score();
    (engine, summary)
}

fn drive(engine: &mut GameEngine, rx: &Receiver<Command>, summary: &mut SimulationSummary) {
    for command in rx {
        let outcome = match command {
            Command::Touch(point) => {
                summary.touches += 1;
                match input::dispatch_touch(engine, point) {
                    TouchResponse::Started(outcome) | TouchResponse::Moved(_, outcome) => outcome,
                }
            }
            Command::Tick => {
                summary.ticks += 1;
                engine.apply(Motion::Down)
            }
            Command::Quit => break,
        };
        if let MotionOutcome::ToppedOut { .. } = outcome
            && let Some(stats) = engine.last_session()
        {
            log::info!("game over with score {}", stats.score());
            summary.finished_games.push(stats.clone());
        }
    }
}

fn spawn_timer(tx: SyncSender<Command>, interval: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            thread::sleep(interval);
            if tx.send(Command::Tick).is_err() {
                break;
            }
        }
    })
}

fn spawn_player(tx: SyncSender<Command>, options: &SimulationOptions) -> JoinHandle<()> {
    let mut rng = Pcg32::seed_from_u64(options.touch_seed);
    let touches = options.touches;
    let interval = options.touch_interval;
    thread::spawn(move || {
        for _ in 0..touches {
            thread::sleep(interval);
            let point = TouchPoint::normalized(rng.random(), rng.random());
            if tx.send(Command::Touch(point)).is_err() {
                return;
            }
        }
        let _ = tx.send(Command::Quit);
    })
}

#[cfg(test)]
mod tests {
    use blockfall_engine::{MemoryScoreStore, ScoreStore as _};

    use super::*;

    fn options(touches: usize) -> SimulationOptions {
        SimulationOptions {
            touches,
            touch_seed: 7,
            touch_interval: Duration::ZERO,
            tick_interval: Duration::from_millis(1),
        }
    }

    fn engine() -> GameEngine {
        let config = EngineConfig {
            seed: Some("0123456789abcdef0123456789abcdef".parse().unwrap()),
            ..EngineConfig::default()
        };
        GameEngine::from_config(&config, Box::new(MemoryScoreStore::default())).unwrap()
    }

    #[test]
    fn test_simulation_processes_every_touch() {
        let (engine, summary) = simulate(engine(), &options(300));
        assert_eq!(summary.touches, 300);
        // The first touch always starts the game.
        assert!(!engine.state().is_awaiting_start());
        assert_eq!(summary.high_score, engine.high_score());
    }

    #[test]
    fn test_high_score_covers_finished_games() {
        let (engine, summary) = simulate(engine(), &options(2000));
        let best = summary
            .finished_games
            .iter()
            .map(GameStats::score)
            .chain([summary.current_game.score()])
            .max()
            .unwrap_or(0);
        assert!(summary.high_score >= best);
        assert_eq!(
            engine.score_store().read_high_score().unwrap(),
            summary.high_score
        );
    }

    #[test]
    fn test_no_touches_leaves_game_waiting() {
        let (engine, summary) = simulate(engine(), &options(0));
        assert_eq!(summary.touches, 0);
        assert!(engine.state().is_awaiting_start());
        assert!(summary.finished_games.is_empty());
    }
}
