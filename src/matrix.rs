//! Dynamic-programming score matrix and its row-major fill.
//!
//! The fill is exposed as an iterator of [`FillStep`]s so a caller can
//! replay the construction one cell at a time. [`fill`] simply drives the
//! same iterator to the end.

use serde::Serialize;

use crate::alignment_mode::{AlignmentMode, AlignmentParams};
use crate::scoring::{BestCell, Candidates, Position, Score};
use crate::{AlignerError, GAP_SYMBOL};

/// `(len(seq1) + 1) x (len(seq2) + 1)` scores stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Score>,
}

impl ScoreMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    /// Zeroed matrix with row 0 and column 0 initialised for `mode`.
    pub fn with_boundaries(rows: usize, cols: usize, mode: AlignmentMode, gap_penalty: Score) -> Self {
        let mut matrix = Self::new(rows, cols);
        for i in 0..rows {
            matrix.set(i, 0, mode.boundary(i, gap_penalty));
        }
        for j in 0..cols {
            matrix.set(0, j, mode.boundary(j, gap_penalty));
        }
        matrix
    }

    /// Builds a matrix from caller-supplied rows, e.g. one computed elsewhere.
    pub fn from_rows(rows: Vec<Vec<Score>>) -> Result<Self, AlignerError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(AlignerError::InvalidInput("matrix has no cells".to_string()));
        }
        if let Some(bad) = rows.iter().position(|row| row.len() != cols) {
            return Err(AlignerError::InvalidInput(format!(
                "matrix row {bad} has {} cells, expected {cols}",
                rows[bad].len()
            )));
        }
        let row_count = rows.len();
        Ok(Self {
            rows: row_count,
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Score {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn at(&self, position: Position) -> Score {
        self.get(position.i, position.j)
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Score) {
        self.data[row * self.cols + col] = value;
    }

    pub fn contains(&self, position: Position) -> bool {
        position.i < self.rows && position.j < self.cols
    }

    pub fn row(&self, row: usize) -> &[Score] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Score]> + '_ {
        self.data.chunks(self.cols.max(1))
    }

    pub fn to_rows(&self) -> Vec<Vec<Score>> {
        self.iter_rows().map(<[Score]>::to_vec).collect()
    }

    pub fn max_value(&self) -> Option<Score> {
        self.data.iter().copied().max()
    }
}

/// A completely filled matrix. `best` is only tracked in local mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilledMatrix {
    pub matrix: ScoreMatrix,
    pub best: Option<BestCell>,
}

/// One computed interior cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FillStep {
    pub step: usize,
    pub position: Position,
    pub symbols: (u8, u8),
    pub candidates: Candidates,
    pub value: Score,
    pub is_new_best: bool,
}

impl FillStep {
    pub fn is_match(&self) -> bool {
        self.symbols.0 == self.symbols.1
    }
}

pub(crate) fn validate_sequences(seq1: &[u8], seq2: &[u8]) -> Result<(), AlignerError> {
    if seq1.is_empty() {
        return Err(AlignerError::InvalidInput("first sequence is empty".to_string()));
    }
    if seq2.is_empty() {
        return Err(AlignerError::InvalidInput("second sequence is empty".to_string()));
    }
    reject_gap_symbol(seq1, "first")?;
    reject_gap_symbol(seq2, "second")
}

/// The gap byte is reserved for aligned output rows.
pub(crate) fn reject_gap_symbol(seq: &[u8], which: &str) -> Result<(), AlignerError> {
    match seq.iter().position(|&s| s == GAP_SYMBOL) {
        Some(at) => Err(AlignerError::InvalidInput(format!(
            "{which} sequence contains the gap symbol '{}' at position {at}",
            GAP_SYMBOL as char
        ))),
        None => Ok(()),
    }
}

pub struct FillSteps<'a> {
    seq1: &'a [u8],
    seq2: &'a [u8],
    params: AlignmentParams,
    matrix: ScoreMatrix,
    best: BestCell,
    step: usize,
}

impl<'a> FillSteps<'a> {
    pub fn new(seq1: &'a [u8], seq2: &'a [u8], params: AlignmentParams) -> Result<Self, AlignerError> {
        validate_sequences(seq1, seq2)?;
        params.scoring.check_range(seq1.len(), seq2.len())?;

        let matrix = ScoreMatrix::with_boundaries(
            seq1.len() + 1,
            seq2.len() + 1,
            params.mode,
            params.scoring.gap_penalty,
        );
        Ok(Self {
            seq1,
            seq2,
            params,
            matrix,
            best: BestCell::default(),
            step: 0,
        })
    }

    pub fn total_steps(&self) -> usize {
        self.seq1.len() * self.seq2.len()
    }

    pub fn completed_steps(&self) -> usize {
        self.step
    }

    /// The matrix as filled so far; cells not yet reached hold 0.
    pub fn matrix(&self) -> &ScoreMatrix {
        &self.matrix
    }

    pub fn best(&self) -> Option<BestCell> {
        self.params.mode.clamps_to_zero().then_some(self.best)
    }

    pub fn finish(mut self) -> FilledMatrix {
        while self.next().is_some() {}
        let best = self.best();
        FilledMatrix {
            matrix: self.matrix,
            best,
        }
    }
}

impl Iterator for FillSteps<'_> {
    type Item = FillStep;

    fn next(&mut self) -> Option<FillStep> {
        if self.step >= self.total_steps() {
            return None;
        }

        let width = self.seq2.len();
        let i = self.step / width + 1;
        let j = self.step % width + 1;
        let symbols = (self.seq1[i - 1], self.seq2[j - 1]);

        let candidates = Candidates::new(
            self.matrix.get(i - 1, j - 1),
            self.matrix.get(i - 1, j),
            self.matrix.get(i, j - 1),
            symbols.0,
            symbols.1,
            &self.params.scoring,
        );
        let value = candidates.resolve(self.params.mode);
        self.matrix.set(i, j, value);

        let position = Position::new(i, j);
        let is_new_best = self.params.mode.clamps_to_zero() && self.best.offer(value, position);

        let step = FillStep {
            step: self.step,
            position,
            symbols,
            candidates,
            value,
            is_new_best,
        };
        self.step += 1;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_steps() - self.step;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FillSteps<'_> {}

/// Fills the whole matrix in row-major order.
pub fn fill(seq1: &[u8], seq2: &[u8], params: AlignmentParams) -> Result<FilledMatrix, AlignerError> {
    Ok(FillSteps::new(seq1, seq2, params)?.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoringScheme;

    fn params(mode: AlignmentMode) -> AlignmentParams {
        AlignmentParams::new(mode, ScoringScheme::new(2, -1, -2))
    }

    #[test]
    fn test_gap_symbol_is_rejected() {
        for (seq1, seq2) in [(&b"-"[..], &b"A"[..]), (b"AC", b"A-C")] {
            let err = fill(seq1, seq2, params(AlignmentMode::Global)).unwrap_err();
            assert!(matches!(err, AlignerError::InvalidInput(_)));
        }
        assert!(FillSteps::new(b"A-", b"A", params(AlignmentMode::Local)).is_err());
    }

    #[test]
    fn test_global_fill() {
        let filled = fill(b"AGCTA", b"AGTCA", params(AlignmentMode::Global)).unwrap();
        assert!(filled.best.is_none());
        assert_eq!(
            filled.matrix.to_rows(),
            vec![
                vec![0, -2, -4, -6, -8, -10],
                vec![-2, 2, 0, -2, -4, -6],
                vec![-4, 0, 4, 2, 0, -2],
                vec![-6, -2, 2, 3, 4, 2],
                vec![-8, -4, 0, 4, 2, 3],
                vec![-10, -6, -2, 2, 3, 4],
            ]
        );
    }

    #[test]
    fn test_local_fill_tracks_first_maximum() {
        let filled = fill(b"GATTACA", b"GCATGCU", params(AlignmentMode::Local)).unwrap();
        let best = filled.best.unwrap();
        assert_eq!(best.score, 4);
        assert_eq!(best.position, Position::new(3, 4));
        // (7, 3) holds the same maximum but comes later in row-major order.
        assert_eq!(filled.matrix.get(7, 3), 4);
        assert_eq!(filled.matrix.max_value(), Some(4));
        assert!(filled.matrix.row(0).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_steps_replay_the_fill() {
        let mut steps = FillSteps::new(b"AC", b"AGC", params(AlignmentMode::Global)).unwrap();
        assert_eq!(steps.len(), 6);

        let first = steps.next().unwrap();
        assert_eq!(first.step, 0);
        assert_eq!(first.position, Position::new(1, 1));
        assert!(first.is_match());
        assert_eq!(
            first.candidates,
            Candidates {
                diagonal: 2,
                up: -4,
                left: -4
            }
        );
        assert_eq!(first.value, 2);
        assert_eq!(steps.matrix().get(1, 1), 2);
        assert_eq!(steps.matrix().get(2, 3), 0);

        let last = steps.by_ref().last().unwrap();
        assert_eq!(last.position, Position::new(2, 3));
        assert_eq!(steps.completed_steps(), 6);

        let direct = fill(b"AC", b"AGC", params(AlignmentMode::Global)).unwrap();
        assert_eq!(steps.finish(), direct);
    }

    #[test]
    fn test_rejects_empty_sequences() {
        assert!(matches!(
            fill(b"", b"A", params(AlignmentMode::Global)),
            Err(AlignerError::InvalidInput(_))
        ));
        assert!(matches!(
            FillSteps::new(b"A", b"", params(AlignmentMode::Local)),
            Err(AlignerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_matrix_size_is_exact() {
        let seq2 = vec![b'A'; 100];
        let filled = fill(b"A", &seq2, params(AlignmentMode::Global)).unwrap();
        assert_eq!(filled.matrix.len(), 2 * 101);
        assert_eq!(filled.matrix.get(1, 100), 2 - 99 * 2);
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        assert!(ScoreMatrix::from_rows(vec![vec![0, 1], vec![0]]).is_err());
        assert!(ScoreMatrix::from_rows(Vec::new()).is_err());
        let matrix = ScoreMatrix::from_rows(vec![vec![0, -2], vec![-2, 2]]).unwrap();
        assert_eq!(matrix.get(1, 1), 2);
    }
}
