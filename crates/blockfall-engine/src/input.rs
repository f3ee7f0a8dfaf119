//! Touch input helpers.
//!
//! A touch on the play surface is reduced to a point in the unit square and
//! then to one of the four [`Motion`]s by splitting the square along both
//! diagonals:
//!
//! ```text
//!  (0,0) +-----------+ (1,0)
//!        |\  Rotate /|
//!        |  \     /  |
//!        |Left  X Right
//!        |  /     \  |
//!        |/   Down  \|
//!  (0,1) +-----------+ (1,1)
//! ```
//!
//! Touches exactly on a diagonal go to the region on the `y <= x` or
//! `x + y <= 1` side.

use crate::{GameEngine, GameState, Motion, MotionOutcome};

/// A touch position normalized to the play surface, both axes in `[0, 1]`,
/// with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    x: f32,
    y: f32,
}

impl TouchPoint {
    /// Creates a point from normalized coordinates, clamping them into `[0, 1]`.
    #[must_use]
    pub fn normalized(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    /// Creates a point from raw surface coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the surface has no area.
    #[must_use]
    pub fn on_surface(x: f32, y: f32, width: f32, height: f32) -> Self {
        assert!(
            width > 0.0 && height > 0.0,
            "touch surface must have a positive size, got {width}x{height}"
        );
        Self::normalized(x / width, y / height)
    }

    #[must_use]
    pub fn x(self) -> f32 {
        self.x
    }

    #[must_use]
    pub fn y(self) -> f32 {
        self.y
    }
}

/// Maps a touch to the motion of the triangle it falls in.
#[must_use]
pub fn classify_touch(point: TouchPoint) -> Motion {
    let TouchPoint { x, y } = point;
    let past_anti_diagonal = x + y > 1.0;
    if y > x {
        if past_anti_diagonal {
            Motion::Down
        } else {
            Motion::Left
        }
    } else if past_anti_diagonal {
        Motion::Right
    } else {
        Motion::Rotate
    }
}

/// What [`dispatch_touch`] did with a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchResponse {
    /// The game was not running: it was started and one `Down` tick applied.
    Started(MotionOutcome),
    /// The touch was classified and applied to the falling piece.
    Moved(Motion, MotionOutcome),
}

/// Feeds a touch to the engine.
///
/// While the game awaits start or is over, any touch starts it and issues a
/// `Down` tick instead of a directional motion.
pub fn dispatch_touch(engine: &mut GameEngine, point: TouchPoint) -> TouchResponse {
    match engine.state() {
        GameState::AwaitingStart | GameState::Over => {
            engine.start();
            TouchResponse::Started(engine.apply(Motion::Down))
        }
        GameState::Active(_) => {
            let motion = classify_touch(point);
            TouchResponse::Moved(motion, engine.apply(motion))
        }
    }
}
