use std::{fmt, str::FromStr};

use rand::{Rng, SeedableRng as _, distr::StandardUniform, prelude::Distribution};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{Piece, PieceKind};

/// Source of new pieces.
///
/// Every piece a factory produces must be in its default placement
/// (see [`Piece::spawn`]); the engine checks whether that placement is legal.
pub trait PieceFactory: fmt::Debug {
    fn create(&mut self) -> Piece;
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed, written as 32 hex digits in configuration files and on
/// the command line. The same seed always produces the same piece sequence.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceFactory as _, PieceSeed, RandomPieceFactory};
///
/// let seed: PieceSeed = "0123456789abcdef0123456789abcdef".parse().unwrap();
/// let mut a = RandomPieceFactory::with_seed(seed);
/// let mut b = RandomPieceFactory::with_seed(seed);
/// assert_eq!(a.create(), b.create());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid piece seed {input:?}: expected 32 hex digits")]
pub struct ParsePieceSeedError {
    input: String,
}

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for PieceSeed {
    type Err = ParsePieceSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParsePieceSeedError {
            input: s.to_owned(),
        };
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(error());
        }
        let num = u128::from_str_radix(s, 16).map_err(|_| error())?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `PieceSeed` values with `rng.random()`.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

/// Picks each piece kind uniformly at random.
#[derive(Debug, Clone)]
pub struct RandomPieceFactory {
    rng: Pcg32,
}

impl Default for RandomPieceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPieceFactory {
    /// Creates a factory with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
        }
    }
}

impl PieceFactory for RandomPieceFactory {
    fn create(&mut self) -> Piece {
        Piece::spawn(self.rng.random())
    }
}

/// Replays a fixed list of piece kinds, starting over when it runs out.
#[derive(Debug, Clone)]
pub struct SequencePieceFactory {
    kinds: Vec<PieceKind>,
    next: usize,
}

impl SequencePieceFactory {
    /// # Panics
    ///
    /// Panics if `kinds` is empty.
    #[must_use]
    pub fn new(kinds: impl IntoIterator<Item = PieceKind>) -> Self {
        let kinds: Vec<_> = kinds.into_iter().collect();
        assert!(!kinds.is_empty(), "piece sequence must not be empty");
        Self { kinds, next: 0 }
    }
}

impl PieceFactory for SequencePieceFactory {
    fn create(&mut self) -> Piece {
        let kind = self.kinds[self.next];
        self.next = (self.next + 1) % self.kinds.len();
        Piece::spawn(kind)
    }
}
