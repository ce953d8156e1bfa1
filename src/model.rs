//! Simulation data types.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Nucleotide base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Base {
    A,
    C,
    G,
    T,
}

impl Base {
    /// All bases, in alphabetical order.
    pub const ALL: [Base; 4] = [Base::A, Base::C, Base::G, Base::T];

    pub fn to_char(self) -> char {
        match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::T => 'T',
        }
    }

    /// The three bases different from `self`.
    pub fn others(self) -> [Base; 3] {
        match self {
            Base::A => [Base::C, Base::G, Base::T],
            Base::C => [Base::A, Base::G, Base::T],
            Base::G => [Base::A, Base::C, Base::T],
            Base::T => [Base::A, Base::C, Base::G],
        }
    }
}

impl TryFrom<char> for Base {
    type Error = anyhow::Error;

    fn try_from(chr: char) -> Result<Self> {
        match chr.to_ascii_uppercase() {
            'A' => Ok(Base::A),
            'C' => Ok(Base::C),
            'G' => Ok(Base::G),
            'T' => Ok(Base::T),
            _ => bail!("invalid base {chr:?}"),
        }
    }
}

/// Fixed-length DNA sequence.
///
/// Cloning produces an independent copy, so an original and a mutated
/// version can coexist for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    bases: Vec<Base>,
}

impl Sequence {
    pub fn new(bases: Vec<Base>) -> Self {
        Self { bases }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<Base> {
        self.bases.get(pos).copied()
    }

    /// Apply a mutation event in place.
    pub fn apply(&mut self, event: MutationEvent) -> Result<()> {
        let len = self.len();
        match self.bases.get_mut(event.pos) {
            Some(base) => *base = event.base,
            None => bail!("position must be in the range 0..{len}, but is {}", event.pos),
        }
        Ok(())
    }

    /// Count the positions at which `self` and `other` differ.
    pub fn hamming(&self, other: &Sequence) -> Result<usize> {
        if self.len() != other.len() {
            bail!(
                "sequence lengths must match, but are {} and {}",
                self.len(),
                other.len()
            );
        }
        let dist = self
            .bases
            .iter()
            .zip(other.bases.iter())
            .filter(|(a, b)| a != b)
            .count();
        Ok(dist)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for base in &self.bases {
            write!(f, "{}", base.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for Sequence {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let bases = s.chars().map(Base::try_from).collect::<Result<_>>()?;
        Ok(Self { bases })
    }
}

/// Replacement of the base at `pos` by `base`.
///
/// Produced and consumed within a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationEvent {
    pub pos: usize,
    pub base: Base,
}

/// Record of the simulation at a single round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Round index, starting at 1.
    pub round: usize,

    /// Number of positions differing from the original sequence.
    pub observed: usize,

    /// Jukes-Cantor corrected number of substitutions (`None` past saturation).
    pub corrected: Option<f64>,
}
