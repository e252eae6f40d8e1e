use log::{trace, warn};
use serde::Serialize;

use crate::matrix::{reject_gap_symbol, ScoreMatrix};
use crate::scoring::{Position, Score, ScoringScheme};
use crate::{AlignerError, GAP_SYMBOL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TracebackOperation {
    Match,
    Mismatch,
    /// Gap in the first sequence.
    Insertion,
    /// Gap in the second sequence.
    Deletion,
}

impl TracebackOperation {
    pub fn symbol(&self) -> char {
        match self {
            TracebackOperation::Match => '|',
            TracebackOperation::Mismatch => '.',
            TracebackOperation::Insertion | TracebackOperation::Deletion => ' ',
        }
    }
}

/// Predecessor moves, in the order traceback tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Move {
    Diagonal,
    Up,
    Left,
}

impl Move {
    /// Ties between equally optimal predecessors always resolve diagonal
    /// first, then up, then left.
    pub const PRIORITY: [Move; 3] = [Move::Diagonal, Move::Up, Move::Left];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminalCondition {
    /// Stop at (0, 0). Global alignment.
    Origin,
    /// Stop at the first zero cell, without consuming it, or at (0, 0). Local alignment.
    ZeroCell,
}

impl TerminalCondition {
    pub fn is_terminal(&self, matrix: &ScoreMatrix, position: Position) -> bool {
        match self {
            TerminalCondition::Origin => position.is_origin(),
            TerminalCondition::ZeroCell => position.is_origin() || matrix.at(position) == 0,
        }
    }
}

/// One reconstructed alignment. `start_position` is the cell where the
/// traceback stopped, `end_position` the cell it started from; the aligned
/// region is `seq1[start.i..end.i]` against `seq2[start.j..end.j]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentResult {
    pub score: Score,
    pub aligned_seq1: Vec<u8>,
    pub aligned_seq2: Vec<u8>,
    pub operations: Vec<TracebackOperation>,
    pub start_position: Position,
    pub end_position: Position,
}

impl AlignmentResult {
    pub fn len(&self) -> usize {
        self.aligned_seq1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligned_seq1.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.aligned_seq1.iter().copied().zip(self.aligned_seq2.iter().copied())
    }

    pub fn aligned_strings(&self) -> (String, String) {
        (
            String::from_utf8_lossy(&self.aligned_seq1).into_owned(),
            String::from_utf8_lossy(&self.aligned_seq2).into_owned(),
        )
    }

    /// Middle line of a three-line text rendering.
    pub fn markup(&self) -> String {
        self.operations.iter().map(TracebackOperation::symbol).collect()
    }
}

pub struct Traceback<'a> {
    matrix: &'a ScoreMatrix,
    scoring: ScoringScheme,
    seq1: &'a [u8],
    seq2: &'a [u8],
}

impl<'a> Traceback<'a> {
    pub fn new(
        matrix: &'a ScoreMatrix,
        scoring: ScoringScheme,
        seq1: &'a [u8],
        seq2: &'a [u8],
    ) -> Result<Self, AlignerError> {
        if matrix.rows() != seq1.len() + 1 || matrix.cols() != seq2.len() + 1 {
            return Err(AlignerError::InvalidInput(format!(
                "matrix is {}x{} but sequences need {}x{}",
                matrix.rows(),
                matrix.cols(),
                seq1.len() + 1,
                seq2.len() + 1
            )));
        }
        reject_gap_symbol(seq1, "first")?;
        reject_gap_symbol(seq2, "second")?;
        Ok(Self {
            matrix,
            scoring,
            seq1,
            seq2,
        })
    }

    fn predecessor(&self, current: Position, step: Move) -> Option<Position> {
        let value = self.matrix.at(current);
        let Position { i, j } = current;
        // An overflowing candidate cannot have produced `value`.
        let reproduces = |from: Position, delta: Score| {
            (self.matrix.at(from).checked_add(delta) == Some(value)).then_some(from)
        };
        match step {
            Move::Diagonal if i > 0 && j > 0 => reproduces(
                Position::new(i - 1, j - 1),
                self.scoring.substitution(self.seq1[i - 1], self.seq2[j - 1]),
            ),
            Move::Up if i > 0 => reproduces(Position::new(i - 1, j), self.scoring.gap_penalty),
            Move::Left if j > 0 => reproduces(Position::new(i, j - 1), self.scoring.gap_penalty),
            _ => None,
        }
    }

    pub fn reconstruct_alignment(
        &self,
        start: Position,
        terminal: TerminalCondition,
    ) -> Result<AlignmentResult, AlignerError> {
        if !self.matrix.contains(start) {
            return Err(AlignerError::InvalidInput(format!(
                "traceback start {start} lies outside the matrix"
            )));
        }

        let mut aligned_seq1 = Vec::new();
        let mut aligned_seq2 = Vec::new();
        let mut operations = Vec::new();
        let mut current = start;

        while !terminal.is_terminal(self.matrix, current) {
            let Some((step, next)) = Move::PRIORITY
                .iter()
                .find_map(|&step| self.predecessor(current, step).map(|next| (step, next)))
            else {
                warn!("traceback stuck at {current}: no predecessor reproduces {}", self.matrix.at(current));
                aligned_seq1.reverse();
                aligned_seq2.reverse();
                operations.reverse();
                return Err(AlignerError::InconsistentMatrix {
                    position: current,
                    partial: Box::new(AlignmentResult {
                        score: self.matrix.at(start),
                        aligned_seq1,
                        aligned_seq2,
                        operations,
                        start_position: current,
                        end_position: start,
                    }),
                });
            };
            trace!("traceback {current} -> {next} via {step:?}");

            match step {
                Move::Diagonal => {
                    let (a, b) = (self.seq1[current.i - 1], self.seq2[current.j - 1]);
                    aligned_seq1.push(a);
                    aligned_seq2.push(b);
                    operations.push(if a == b {
                        TracebackOperation::Match
                    } else {
                        TracebackOperation::Mismatch
                    });
                }
                Move::Up => {
                    aligned_seq1.push(self.seq1[current.i - 1]);
                    aligned_seq2.push(GAP_SYMBOL);
                    operations.push(TracebackOperation::Deletion);
                }
                Move::Left => {
                    aligned_seq1.push(GAP_SYMBOL);
                    aligned_seq2.push(self.seq2[current.j - 1]);
                    operations.push(TracebackOperation::Insertion);
                }
            }
            current = next;
        }

        // Built backwards from the start cell.
        aligned_seq1.reverse();
        aligned_seq2.reverse();
        operations.reverse();

        Ok(AlignmentResult {
            score: self.matrix.at(start),
            aligned_seq1,
            aligned_seq2,
            operations,
            start_position: current,
            end_position: start,
        })
    }
}

pub fn traceback(
    matrix: &ScoreMatrix,
    scoring: ScoringScheme,
    start: Position,
    terminal: TerminalCondition,
    seq1: &[u8],
    seq2: &[u8],
) -> Result<AlignmentResult, AlignerError> {
    Traceback::new(matrix, scoring, seq1, seq2)?.reconstruct_alignment(start, terminal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_mode::{AlignmentMode, AlignmentParams};
    use crate::matrix::fill;

    const SCORING: ScoringScheme = ScoringScheme {
        match_score: 2,
        mismatch: -1,
        gap_penalty: -2,
    };

    #[test]
    fn test_global_prefers_diagonal() {
        let filled = fill(b"AGCTA", b"AGTCA", AlignmentParams::new(AlignmentMode::Global, SCORING)).unwrap();
        let result = traceback(
            &filled.matrix,
            SCORING,
            Position::new(5, 5),
            TerminalCondition::Origin,
            b"AGCTA",
            b"AGTCA",
        )
        .unwrap();
        assert_eq!(result.aligned_seq1, b"AGCTA");
        assert_eq!(result.aligned_seq2, b"AGTCA");
        assert_eq!(result.score, 4);
        assert_eq!(result.markup(), "||..|");
        assert_eq!(result.start_position, Position::new(0, 0));
    }

    #[test]
    fn test_up_before_left() {
        let filled = fill(b"AC", b"A", AlignmentParams::new(AlignmentMode::Global, SCORING)).unwrap();
        let result = traceback(&filled.matrix, SCORING, Position::new(2, 1), TerminalCondition::Origin, b"AC", b"A")
            .unwrap();
        assert_eq!(result.aligned_strings(), ("AC".to_string(), "A-".to_string()));
        assert_eq!(
            result.operations,
            vec![TracebackOperation::Match, TracebackOperation::Deletion]
        );
    }

    #[test]
    fn test_local_stops_before_zero_cell() {
        let filled = fill(b"GATTACA", b"GCATGCU", AlignmentParams::new(AlignmentMode::Local, SCORING)).unwrap();
        let result = traceback(
            &filled.matrix,
            SCORING,
            Position::new(3, 4),
            TerminalCondition::ZeroCell,
            b"GATTACA",
            b"GCATGCU",
        )
        .unwrap();
        assert_eq!(result.aligned_strings(), ("AT".to_string(), "AT".to_string()));
        assert_eq!(result.start_position, Position::new(1, 2));
        assert_eq!(filled.matrix.at(result.start_position), 0);
    }

    #[test]
    fn test_start_on_terminal_is_empty() {
        let matrix = ScoreMatrix::new(2, 2);
        let result = traceback(&matrix, SCORING, Position::new(0, 0), TerminalCondition::ZeroCell, b"A", b"T")
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_inconsistent_matrix_keeps_partial_path() {
        // (2, 2) comes from (1, 1) by a match, but (1, 1) = 7 matches nothing.
        let matrix = ScoreMatrix::from_rows(vec![
            vec![0, -2, -4],
            vec![-2, 7, 5],
            vec![-4, 5, 9],
        ])
        .unwrap();
        let err = traceback(&matrix, SCORING, Position::new(2, 2), TerminalCondition::Origin, b"AC", b"AC")
            .unwrap_err();
        match err {
            AlignerError::InconsistentMatrix { position, partial } => {
                assert_eq!(position, Position::new(1, 1));
                assert_eq!(partial.aligned_strings(), ("C".to_string(), "C".to_string()));
                assert_eq!(partial.end_position, Position::new(2, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extreme_cells_do_not_overflow() {
        let matrix = ScoreMatrix::from_rows(vec![vec![0, i32::MIN], vec![i32::MIN, 5]]).unwrap();
        let err = traceback(&matrix, SCORING, Position::new(1, 1), TerminalCondition::Origin, b"A", b"A")
            .unwrap_err();
        match err {
            AlignerError::InconsistentMatrix { position, partial } => {
                assert_eq!(position, Position::new(1, 1));
                assert!(partial.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }

        // i32::MAX + 2 would wrap onto i32::MIN + 1 and fake a match.
        let matrix = ScoreMatrix::from_rows(vec![vec![i32::MAX, 0], vec![0, i32::MIN + 1]]).unwrap();
        let err = traceback(
            &matrix,
            ScoringScheme::new(2, -1, -2),
            Position::new(1, 1),
            TerminalCondition::Origin,
            b"A",
            b"A",
        )
        .unwrap_err();
        assert!(matches!(err, AlignerError::InconsistentMatrix { .. }));
    }

    #[test]
    fn test_gap_symbol_in_sequences_is_rejected() {
        let matrix = ScoreMatrix::new(2, 2);
        assert!(matches!(
            traceback(&matrix, SCORING, Position::new(1, 1), TerminalCondition::Origin, b"-", b"-"),
            Err(AlignerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_mismatched_dimensions() {
        let matrix = ScoreMatrix::new(3, 3);
        assert!(matches!(
            traceback(&matrix, SCORING, Position::new(2, 2), TerminalCondition::Origin, b"A", b"AC"),
            Err(AlignerError::InvalidInput(_))
        ));
        let matrix = ScoreMatrix::new(2, 3);
        assert!(matches!(
            traceback(&matrix, SCORING, Position::new(5, 0), TerminalCondition::Origin, b"A", b"AC"),
            Err(AlignerError::InvalidInput(_))
        ));
    }
}
