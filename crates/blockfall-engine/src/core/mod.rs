pub use self::{grid::*, piece::*};

pub(crate) mod grid;
pub(crate) mod piece;

/// Number of rows on the playing field.
pub const ROW_COUNT: usize = 20;
/// Number of columns on the playing field.
pub const COLUMN_COUNT: usize = 10;
