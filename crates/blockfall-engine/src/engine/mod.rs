//! Game rules on top of the core data structures.
//!
//! - [`GameEngine`] - Lifecycle state machine, motion handling, locking and line clears
//! - [`GameStats`] - Score and lock/line statistics of one game
//! - [`PieceFactory`] - Source of new pieces ([`RandomPieceFactory`], [`SequencePieceFactory`])
//! - [`ScoreStore`] - High score persistence collaborator
//! - [`EngineConfig`] - Tunable settings
//!
//! # Game Flow
//!
//! 1. Create a [`GameEngine`]; it starts out [`GameState::AwaitingStart`]
//! 2. [`GameEngine::start`] spawns the first piece
//! 3. Player gestures and timer ticks are fed to [`GameEngine::apply`]
//! 4. A `Down` that cannot move locks the piece, clears full rows and spawns the next piece
//! 5. When the next piece has no room, the game is [`GameState::Over`] until restarted

pub use self::{config::*, game_engine::*, game_stats::*, piece_factory::*, score_store::*};

mod config;
mod game_engine;
mod game_stats;
mod piece_factory;
mod score_store;
