//! Alternative fill orders.
//!
//! Cells on one anti-diagonal `i + j = d` only depend on the two previous
//! anti-diagonals, so each diagonal can be computed in parallel. The result
//! is identical to the row-major fill, including which cell is reported as
//! the local maximum.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::alignment_mode::AlignmentParams;
use crate::matrix::{self, FilledMatrix, ScoreMatrix};
use crate::scoring::{BestCell, Candidates, Position, Score};
use crate::AlignerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillStrategy {
    #[default]
    RowMajor,
    Wavefront,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    pub fill_strategy: FillStrategy,
    /// Shortest anti-diagonal worth handing to the thread pool.
    pub parallel_threshold: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            fill_strategy: FillStrategy::RowMajor,
            parallel_threshold: 256,
        }
    }
}

impl OptimizationConfig {
    pub fn fill(&self, seq1: &[u8], seq2: &[u8], params: AlignmentParams) -> Result<FilledMatrix, AlignerError> {
        match self.fill_strategy {
            FillStrategy::RowMajor => matrix::fill(seq1, seq2, params),
            FillStrategy::Wavefront => fill_wavefront(seq1, seq2, params, self.parallel_threshold),
        }
    }
}

pub fn fill_wavefront(
    seq1: &[u8],
    seq2: &[u8],
    params: AlignmentParams,
    parallel_threshold: usize,
) -> Result<FilledMatrix, AlignerError> {
    matrix::validate_sequences(seq1, seq2)?;
    params.scoring.check_range(seq1.len(), seq2.len())?;

    let (m, n) = (seq1.len(), seq2.len());
    let mut matrix = ScoreMatrix::with_boundaries(m + 1, n + 1, params.mode, params.scoring.gap_penalty);
    let mut best = BestCell::default();

    for diagonal in 2..=m + n {
        let first = diagonal.saturating_sub(n).max(1);
        let last = (diagonal - 1).min(m);
        if first > last {
            continue;
        }

        let cell = |i: usize| -> Score {
            let j = diagonal - i;
            Candidates::new(
                matrix.get(i - 1, j - 1),
                matrix.get(i - 1, j),
                matrix.get(i, j - 1),
                seq1[i - 1],
                seq2[j - 1],
                &params.scoring,
            )
            .resolve(params.mode)
        };
        let values: Vec<Score> = if last - first + 1 >= parallel_threshold {
            (first..=last).into_par_iter().map(cell).collect()
        } else {
            (first..=last).map(cell).collect()
        };

        for (i, value) in (first..=last).zip(values) {
            let j = diagonal - i;
            matrix.set(i, j, value);
            if params.mode.clamps_to_zero() {
                best.offer_ordered(value, Position::new(i, j));
            }
        }
    }

    Ok(FilledMatrix {
        matrix,
        best: params.mode.clamps_to_zero().then_some(best),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_mode::AlignmentMode;
    use crate::scoring::ScoringScheme;

    #[test]
    fn test_wavefront_matches_row_major() {
        let scoring = ScoringScheme::new(2, -1, -2);
        let cases: [(&[u8], &[u8]); 4] = [
            (b"GATTACA", b"GCATGCU"),
            (b"AGCTA", b"AGTCA"),
            (b"A", b"TTATTA"),
            (b"ACACACTA", b"AGCACACA"),
        ];
        for mode in [AlignmentMode::Global, AlignmentMode::Local] {
            let params = AlignmentParams::new(mode, scoring);
            for (seq1, seq2) in cases {
                let reference = matrix::fill(seq1, seq2, params).unwrap();
                for threshold in [1, usize::MAX] {
                    assert_eq!(fill_wavefront(seq1, seq2, params, threshold).unwrap(), reference);
                }
            }
        }
    }

    #[test]
    fn test_wavefront_tie_break() {
        let params = AlignmentParams::new(AlignmentMode::Local, ScoringScheme::new(2, -1, -2));
        let filled = fill_wavefront(b"CA", b"AAAAC", params, 1).unwrap();
        // (2, 1) is reached on an earlier anti-diagonal but (1, 5) comes first in row-major order.
        assert_eq!(filled.matrix.get(2, 1), 2);
        let best = filled.best.unwrap();
        assert_eq!(best.score, 2);
        assert_eq!(best.position, Position::new(1, 5));
    }

    #[test]
    fn test_config_dispatch() {
        let config = OptimizationConfig {
            fill_strategy: FillStrategy::Wavefront,
            parallel_threshold: 2,
        };
        let params = AlignmentParams::new(AlignmentMode::Global, ScoringScheme::default());
        assert_eq!(
            config.fill(b"ACGT", b"AGT", params).unwrap(),
            matrix::fill(b"ACGT", b"AGT", params).unwrap()
        );
        assert!(config.fill(b"", b"AGT", params).is_err());
    }
}
