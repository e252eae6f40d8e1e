use serde::{Deserialize, Serialize};

use crate::alignment_mode::AlignmentMode;
use crate::{AlignerError, DNA_GAP, DNA_MATCH, DNA_MISMATCH};

pub type Score = i32;

/// Linear scoring: one reward for equal symbols, one penalty for unequal
/// symbols and one penalty per gap column. No sign constraints are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringScheme {
    pub match_score: Score,
    pub mismatch: Score,
    pub gap_penalty: Score,
}

impl Default for ScoringScheme {
    fn default() -> Self {
        Self {
            match_score: DNA_MATCH,
            mismatch: DNA_MISMATCH,
            gap_penalty: DNA_GAP,
        }
    }
}

impl ScoringScheme {
    pub fn new(match_score: Score, mismatch: Score, gap_penalty: Score) -> Self {
        Self {
            match_score,
            mismatch,
            gap_penalty,
        }
    }

    /// Parses one textual scoring parameter. Anything but an integer is rejected.
    pub fn parse_parameter(raw: &str) -> Result<Score, AlignerError> {
        raw.trim().parse::<Score>().map_err(|_| {
            AlignerError::InvalidInput(format!("scoring parameter is not an integer: {raw:?}"))
        })
    }

    pub fn parse(match_score: &str, mismatch: &str, gap_penalty: &str) -> Result<Self, AlignerError> {
        Ok(Self::new(
            Self::parse_parameter(match_score)?,
            Self::parse_parameter(mismatch)?,
            Self::parse_parameter(gap_penalty)?,
        ))
    }

    #[inline]
    pub fn substitution(&self, a: u8, b: u8) -> Score {
        if a == b {
            self.match_score
        } else {
            self.mismatch
        }
    }

    /// Every cell is a sum of at most `rows + cols` per-column scores, so this
    /// bound keeps the whole fill inside the `Score` range.
    pub(crate) fn check_range(&self, len1: usize, len2: usize) -> Result<(), AlignerError> {
        let magnitude = self
            .match_score
            .unsigned_abs()
            .max(self.mismatch.unsigned_abs())
            .max(self.gap_penalty.unsigned_abs()) as u128;
        let columns = len1 as u128 + len2 as u128;
        if columns.saturating_mul(magnitude) > Score::MAX as u128 {
            return Err(AlignerError::InvalidInput(format!(
                "scores overflow for sequences of length {len1} and {len2}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub i: usize,
    pub j: usize,
}

impl Position {
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }

    pub fn is_origin(&self) -> bool {
        self.i == 0 && self.j == 0
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// The three ways to reach one interior cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Candidates {
    pub diagonal: Score,
    pub up: Score,
    pub left: Score,
}

impl Candidates {
    pub fn new(
        diagonal_prev: Score,
        up_prev: Score,
        left_prev: Score,
        a: u8,
        b: u8,
        scoring: &ScoringScheme,
    ) -> Self {
        Self {
            diagonal: diagonal_prev + scoring.substitution(a, b),
            up: up_prev + scoring.gap_penalty,
            left: left_prev + scoring.gap_penalty,
        }
    }

    pub fn resolve(&self, mode: AlignmentMode) -> Score {
        let best = self.diagonal.max(self.up).max(self.left);
        if mode.clamps_to_zero() {
            best.max(0)
        } else {
            best
        }
    }
}

/// Value of one interior cell from its already computed neighbours.
#[inline]
pub fn recurrence(
    diagonal_prev: Score,
    up_prev: Score,
    left_prev: Score,
    a: u8,
    b: u8,
    scoring: &ScoringScheme,
    mode: AlignmentMode,
) -> Score {
    Candidates::new(diagonal_prev, up_prev, left_prev, a, b, scoring).resolve(mode)
}

/// Running maximum of a local fill. Starts at (0, 0) with score 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BestCell {
    pub score: Score,
    pub position: Position,
}

impl BestCell {
    /// Row-major offer: only a strictly greater score replaces the current best.
    pub fn offer(&mut self, score: Score, position: Position) -> bool {
        if score > self.score {
            self.score = score;
            self.position = position;
            true
        } else {
            false
        }
    }

    /// Order-independent offer: ties go to the earlier cell in row-major order.
    pub fn offer_ordered(&mut self, score: Score, position: Position) -> bool {
        if score > self.score || (score == self.score && position < self.position) {
            self.score = score;
            self.position = position;
            true
        } else {
            false
        }
    }
}
