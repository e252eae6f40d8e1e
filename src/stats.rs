use log::warn;
use serde::Serialize;

use crate::scoring::{Score, ScoringScheme};
use crate::traceback::AlignmentResult;
use crate::GAP_SYMBOL;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentStats {
    pub matches: usize,
    pub mismatches: usize,
    pub gaps: usize,
    pub length: usize,
    /// Percent of columns that are matches, one decimal, rounded half-up.
    pub identity: f64,
    pub reported_score: Score,
    pub recomputed_score: i64,
    /// Whether the column-wise score agrees with the matrix score. Only
    /// expected to hold unconditionally for global alignments.
    pub score_consistent: bool,
}

impl AlignmentStats {
    pub fn from_alignment(result: &AlignmentResult, scoring: &ScoringScheme) -> Self {
        let (mut matches, mut mismatches, mut gaps) = (0, 0, 0);
        for (a, b) in result.columns() {
            if a == GAP_SYMBOL || b == GAP_SYMBOL {
                gaps += 1;
            } else if a == b {
                matches += 1;
            } else {
                mismatches += 1;
            }
        }

        let length = result.len();
        let recomputed_score = matches as i64 * scoring.match_score as i64
            + mismatches as i64 * scoring.mismatch as i64
            + gaps as i64 * scoring.gap_penalty as i64;
        let score_consistent = recomputed_score == result.score as i64;
        if !score_consistent {
            warn!(
                "alignment columns score {recomputed_score} but the matrix reports {}",
                result.score
            );
        }

        Self {
            matches,
            mismatches,
            gaps,
            length,
            identity: identity_percent(matches, length),
            reported_score: result.score,
            recomputed_score,
            score_consistent,
        }
    }

    /// Recomputed minus reported score, when they differ.
    pub fn score_divergence(&self) -> Option<i64> {
        (!self.score_consistent).then(|| self.recomputed_score - self.reported_score as i64)
    }
}

/// `matches / length * 100` rounded half-up to one decimal; 0 for an empty alignment.
pub fn identity_percent(matches: usize, length: usize) -> f64 {
    if length == 0 {
        return 0.0;
    }
    let tenths = (matches as u128 * 2000 + length as u128) / (2 * length as u128);
    tenths as f64 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Position;

    fn result(seq1: &[u8], seq2: &[u8], score: Score) -> AlignmentResult {
        AlignmentResult {
            score,
            aligned_seq1: seq1.to_vec(),
            aligned_seq2: seq2.to_vec(),
            operations: Vec::new(),
            start_position: Position::default(),
            end_position: Position::default(),
        }
    }

    #[test]
    fn test_counts() {
        let scoring = ScoringScheme::new(1, -1, -1);
        let stats = AlignmentStats::from_alignment(&result(b"G-ATTACA", b"GCA-TGCU", 0), &scoring);
        assert_eq!((stats.matches, stats.mismatches, stats.gaps), (4, 2, 2));
        assert_eq!(stats.length, 8);
        assert_eq!(stats.identity, 50.0);
        assert!(stats.score_consistent);
        assert_eq!(stats.score_divergence(), None);
    }

    #[test]
    fn test_identity_rounds_half_up() {
        assert_eq!(identity_percent(3, 7), 42.9);
        assert_eq!(identity_percent(7, 9), 77.8);
        assert_eq!(identity_percent(1, 8), 12.5);
        // 1/16 = 6.25% rounds up to 6.3
        assert_eq!(identity_percent(1, 16), 6.3);
        assert_eq!(identity_percent(0, 0), 0.0);
    }

    #[test]
    fn test_empty_alignment() {
        let stats = AlignmentStats::from_alignment(&result(b"", b"", 0), &ScoringScheme::default());
        assert_eq!(stats.length, 0);
        assert_eq!(stats.identity, 0.0);
        assert!(stats.score_consistent);
    }

    #[test]
    fn test_flags_divergence() {
        let stats = AlignmentStats::from_alignment(&result(b"AC", b"AC", 7), &ScoringScheme::default());
        assert!(!stats.score_consistent);
        assert_eq!(stats.score_divergence(), Some(-3));
    }
}
