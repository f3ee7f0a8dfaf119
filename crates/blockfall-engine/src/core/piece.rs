use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::{COLUMN_COUNT, grid::Cell};

/// Largest height or width of any rotation frame.
pub const MAX_FRAME_SIZE: usize = 4;

/// One rotation state of a piece: a tight rectangular fill mask.
///
/// Unlike a fixed bounding box, a frame is exactly as tall and wide as the
/// cells it covers, so its dimensions are what bind against the field edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    height: usize,
    width: usize,
    cells: [[bool; MAX_FRAME_SIZE]; MAX_FRAME_SIZE],
}

impl Frame {
    /// Builds a frame from rows of `#` (filled) and `.` (empty).
    const fn from_rows(rows: &[&str]) -> Self {
        assert!(!rows.is_empty() && rows.len() <= MAX_FRAME_SIZE);
        let width = rows[0].len();
        assert!(width > 0 && width <= MAX_FRAME_SIZE);

        let mut cells = [[false; MAX_FRAME_SIZE]; MAX_FRAME_SIZE];
        let mut i = 0;
        while i < rows.len() {
            let bytes = rows[i].as_bytes();
            assert!(bytes.len() == width, "frame rows must have equal width");
            let mut j = 0;
            while j < width {
                cells[i][j] = bytes[j] == b'#';
                j += 1;
            }
            i += 1;
        }

        Self {
            height: rows.len(),
            width,
            cells,
        }
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Returns whether the sub-cell at (`row`, `col`) of the mask is filled.
    #[must_use]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.cells[row][col]
    }

    /// Returns the mask rows, each `width` cells long.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells[..self.height]
            .iter()
            .map(|row| &row[..self.width])
    }

    /// Returns the `(row, col)` offsets of the filled sub-cells.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows().enumerate().flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(j, &filled)| filled.then_some((i, j)))
        })
    }
}

/// Enum representing the type of piece.
///
/// The kind doubles as the material written into the grid when a piece locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
        PieceKind::T,
    ];

    /// Returns the rotation frames of this kind, in rotation order.
    #[must_use]
    pub const fn frames(self) -> &'static [Frame] {
        SHAPE_CATALOG[self as usize]
    }

    #[must_use]
    pub const fn frame_count(self) -> usize {
        self.frames().len()
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

const I_FRAMES: &[Frame] = &[
    Frame::from_rows(&["####"]),
    Frame::from_rows(&["#", "#", "#", "#"]),
];

const O_FRAMES: &[Frame] = &[Frame::from_rows(&["##", "##"])];

const S_FRAMES: &[Frame] = &[
    Frame::from_rows(&[".##", "##."]),
    Frame::from_rows(&["#.", "##", ".#"]),
];

const Z_FRAMES: &[Frame] = &[
    Frame::from_rows(&["##.", ".##"]),
    Frame::from_rows(&[".#", "##", "#."]),
];

const J_FRAMES: &[Frame] = &[
    Frame::from_rows(&["#..", "###"]),
    Frame::from_rows(&["##", "#.", "#."]),
    Frame::from_rows(&["###", "..#"]),
    Frame::from_rows(&[".#", ".#", "##"]),
];

const L_FRAMES: &[Frame] = &[
    Frame::from_rows(&["..#", "###"]),
    Frame::from_rows(&["#.", "#.", "##"]),
    Frame::from_rows(&["###", "#.."]),
    Frame::from_rows(&["##", ".#", ".#"]),
];

const T_FRAMES: &[Frame] = &[
    Frame::from_rows(&[".#.", "###"]),
    Frame::from_rows(&["#.", "##", "#."]),
    Frame::from_rows(&["###", ".#."]),
    Frame::from_rows(&[".#", "##", ".#"]),
];

/// Rotation frames indexed by `PieceKind as usize`.
const SHAPE_CATALOG: [&[Frame]; PieceKind::LEN] = [
    I_FRAMES, O_FRAMES, S_FRAMES, Z_FRAMES, J_FRAMES, L_FRAMES, T_FRAMES,
];

/// Grid coordinate of a frame's top-left corner.
///
/// Coordinates are unsigned: a motion that would take the anchor above the
/// top row or left of column 0 produces no anchor at all. The bottom and right
/// edges are checked against the frame size by
/// [`Grid::can_place`](super::grid::Grid::can_place).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    row: usize,
    col: usize,
}

impl Anchor {
    /// Anchor of a freshly spawned piece: top row, horizontally centered.
    pub const SPAWN: Self = Self::new(0, COLUMN_COUNT / 2);

    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    #[must_use]
    pub const fn row(self) -> usize {
        self.row
    }

    #[must_use]
    pub const fn col(self) -> usize {
        self.col
    }

    #[must_use]
    pub const fn left(self) -> Option<Self> {
        if self.col == 0 {
            None
        } else {
            Some(Self::new(self.row, self.col - 1))
        }
    }

    #[must_use]
    pub const fn right(self) -> Self {
        Self::new(self.row, self.col + 1)
    }

    #[must_use]
    pub const fn down(self) -> Self {
        Self::new(self.row + 1, self.col)
    }
}

/// A piece instance: its kind, current rotation frame and anchor.
///
/// Pieces are plain values. Moving or rotating produces a new `Piece` via
/// [`Piece::with_placement`], and the caller validates the placement first.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Anchor, Piece, PieceKind};
///
/// let piece = Piece::spawn(PieceKind::T);
/// assert_eq!(piece.anchor(), Anchor::SPAWN);
///
/// let rotated = piece.with_placement(piece.next_frame_index(), piece.anchor());
/// assert_eq!(rotated.frame_index(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    frame_index: usize,
    anchor: Anchor,
}

impl Piece {
    /// Creates a piece in its default placement: first frame at [`Anchor::SPAWN`].
    #[must_use]
    pub const fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            frame_index: 0,
            anchor: Anchor::SPAWN,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn frame_index(&self) -> usize {
        self.frame_index
    }

    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.kind.frame_count()
    }

    #[must_use]
    pub const fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// The cell value written into the grid when this piece locks.
    #[must_use]
    pub const fn lock_value(&self) -> Cell {
        Cell::Locked(self.kind)
    }

    /// Returns the frame at `frame_index`.
    ///
    /// # Panics
    ///
    /// Panics if `frame_index` is not below [`Self::frame_count`].
    #[must_use]
    pub fn frame(&self, frame_index: usize) -> &'static Frame {
        let frames = self.kind.frames();
        assert!(
            frame_index < frames.len(),
            "frame index {frame_index} out of range for {:?} ({} frames)",
            self.kind,
            frames.len()
        );
        &frames[frame_index]
    }

    #[must_use]
    pub fn current_shape_mask(&self) -> &'static Frame {
        self.frame(self.frame_index)
    }

    /// Index of the next rotation frame, wrapping around.
    #[must_use]
    pub const fn next_frame_index(&self) -> usize {
        (self.frame_index + 1) % self.frame_count()
    }

    /// Returns this piece with a new frame and anchor.
    ///
    /// Legality is not checked here.
    #[must_use]
    pub fn with_placement(&self, frame_index: usize, anchor: Anchor) -> Self {
        let _ = self.frame(frame_index);
        Self {
            kind: self.kind,
            frame_index,
            anchor,
        }
    }

    /// Returns the grid cells covered by the piece's current placement.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.current_shape_mask()
            .filled_cells()
            .map(move |(i, j)| (self.anchor.row() + i, self.anchor.col() + j))
    }
}
