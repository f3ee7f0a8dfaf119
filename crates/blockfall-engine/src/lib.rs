//! Rules engine of a falling-block puzzle game.
//!
//! The engine owns the playing field, the falling piece, scoring and the
//! game lifecycle. Rendering, input devices, timers and persistence are left
//! to the caller, which talks to the engine through [`GameEngine`],
//! [`ScoreStore`] and the touch helpers in [`input`].

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
pub mod input;
