use std::time::Instant;

use log::debug;
use serde::Serialize;
use thiserror::Error;

pub mod alignment_mode;
pub mod batch;
pub mod compare;
pub mod config;
pub mod input;
pub mod matrix;
pub mod optimizations;
pub mod scoring;
pub mod stats;
pub mod traceback;

pub use crate::alignment_mode::{AlignmentMode, AlignmentParams};
pub use crate::batch::BatchAligner;
pub use crate::compare::{compare_modes, ComparisonVerdict, ModeComparison, Recommendation};
pub use crate::config::{AlignerConfig, PerformanceConfig};
pub use crate::matrix::{FillStep, FillSteps, FilledMatrix, ScoreMatrix};
pub use crate::optimizations::{FillStrategy, OptimizationConfig};
pub use crate::scoring::{BestCell, Candidates, Position, Score, ScoringScheme};
pub use crate::stats::AlignmentStats;
pub use crate::traceback::{
    traceback, AlignmentResult, Move, TerminalCondition, Traceback, TracebackOperation,
};

// DNA scoring defaults
pub const DNA_MATCH: Score = 2;
pub const DNA_MISMATCH: Score = -1;
pub const DNA_GAP: Score = -2;

pub const GAP_SYMBOL: u8 = b'-';

#[derive(Debug, Error)]
pub enum AlignerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Inconsistent matrix: no predecessor reproduces cell {position}")]
    InconsistentMatrix {
        position: Position,
        partial: Box<AlignmentResult>,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Batch worker error: {0}")]
    WorkerError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    data: Vec<u8>,
}

impl Sequence {
    pub fn new(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for Sequence {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<&str> for Sequence {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.data))
    }
}

/// A filled matrix together with where its traceback starts and stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracebackPlan {
    pub matrix: ScoreMatrix,
    pub best: Option<BestCell>,
    pub start: Position,
    pub terminal: TerminalCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentOutcome {
    pub mode: AlignmentMode,
    pub scoring: ScoringScheme,
    pub matrix: ScoreMatrix,
    /// Local maximum cell; `None` for global alignments.
    pub best: Option<BestCell>,
    pub traceback_start: Position,
    pub traceback_end: Position,
    pub terminal: TerminalCondition,
    pub alignment: AlignmentResult,
    pub stats: AlignmentStats,
}

impl AlignmentOutcome {
    pub fn score(&self) -> Score {
        self.alignment.score
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aligner {
    alignment_params: AlignmentParams,
    optimization_config: OptimizationConfig,
}

impl Aligner {
    pub fn new(scoring: ScoringScheme) -> Self {
        Self {
            alignment_params: AlignmentParams::new(AlignmentMode::default(), scoring),
            optimization_config: OptimizationConfig::default(),
        }
    }

    pub fn from_config(config: &AlignerConfig) -> Self {
        Self::new(config.scoring)
            .with_alignment_mode(config.mode)
            .with_optimizations(config.performance.optimizations())
    }

    pub fn with_alignment_mode(mut self, mode: AlignmentMode) -> Self {
        self.alignment_params.mode = mode;
        self
    }

    pub fn with_optimizations(mut self, config: OptimizationConfig) -> Self {
        self.optimization_config = config;
        self
    }

    pub fn mode(&self) -> AlignmentMode {
        self.alignment_params.mode
    }

    pub fn scoring(&self) -> ScoringScheme {
        self.alignment_params.scoring
    }

    pub fn params(&self) -> AlignmentParams {
        self.alignment_params
    }

    /// Cell-by-cell fill for replaying the matrix construction.
    pub fn steps<'a>(&self, seq1: &'a [u8], seq2: &'a [u8]) -> Result<FillSteps<'a>, AlignerError> {
        FillSteps::new(seq1, seq2, self.alignment_params)
    }

    /// Fills the matrix and picks the traceback start cell and stop rule.
    pub fn prepare(&self, seq1: &[u8], seq2: &[u8]) -> Result<TracebackPlan, AlignerError> {
        let FilledMatrix { matrix, best } = self
            .optimization_config
            .fill(seq1, seq2, self.alignment_params)?;

        let (start, terminal) = match self.alignment_params.mode {
            AlignmentMode::Global => (
                Position::new(seq1.len(), seq2.len()),
                TerminalCondition::Origin,
            ),
            // With no positive cell the best stays at (0, 0), which is
            // terminal, so the alignment comes out empty with score 0.
            AlignmentMode::Local => (
                best.map(|cell| cell.position).unwrap_or_default(),
                TerminalCondition::ZeroCell,
            ),
        };

        Ok(TracebackPlan {
            matrix,
            best,
            start,
            terminal,
        })
    }

    pub fn align(
        &self,
        seq1: impl AsRef<[u8]>,
        seq2: impl AsRef<[u8]>,
    ) -> Result<AlignmentOutcome, AlignerError> {
        let (seq1, seq2) = (seq1.as_ref(), seq2.as_ref());
        let start_time = Instant::now();
        debug!(
            "{} alignment of {} x {} symbols",
            self.alignment_params.mode,
            seq1.len(),
            seq2.len()
        );

        let plan = self.prepare(seq1, seq2)?;
        let scoring = self.alignment_params.scoring;
        let alignment = traceback(&plan.matrix, scoring, plan.start, plan.terminal, seq1, seq2)?;
        let stats = AlignmentStats::from_alignment(&alignment, &scoring);

        debug!(
            "score {} over {} columns in {:?}",
            alignment.score,
            alignment.len(),
            start_time.elapsed()
        );

        Ok(AlignmentOutcome {
            mode: self.alignment_params.mode,
            scoring,
            traceback_start: plan.start,
            traceback_end: alignment.start_position,
            terminal: plan.terminal,
            best: plan.best,
            matrix: plan.matrix,
            alignment,
            stats,
        })
    }
}

pub fn align(
    seq1: &Sequence,
    seq2: &Sequence,
    scoring: ScoringScheme,
    mode: AlignmentMode,
) -> Result<AlignmentOutcome, AlignerError> {
    Aligner::new(scoring).with_alignment_mode(mode).align(seq1, seq2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_start_is_bottom_right() {
        let plan = Aligner::default().prepare(b"ACGT", b"AGT").unwrap();
        assert_eq!(plan.start, Position::new(4, 3));
        assert_eq!(plan.terminal, TerminalCondition::Origin);
        assert!(plan.best.is_none());
    }

    #[test]
    fn test_local_start_is_best_cell() {
        let aligner = Aligner::default().with_alignment_mode(AlignmentMode::Local);
        let plan = aligner.prepare(b"TTACGTT", b"ACG").unwrap();
        assert_eq!(plan.start, Position::new(5, 3));
        assert_eq!(plan.terminal, TerminalCondition::ZeroCell);
        assert_eq!(plan.matrix.at(plan.start), 6);
    }

    #[test]
    fn test_outcome_fields() {
        let outcome = Aligner::default()
            .with_alignment_mode(AlignmentMode::Local)
            .align("TTACGTT", "ACG")
            .unwrap();
        assert_eq!(outcome.score(), 6);
        assert_eq!(outcome.traceback_start, Position::new(5, 3));
        assert_eq!(outcome.traceback_end, Position::new(2, 0));
        assert_eq!(outcome.alignment.aligned_strings(), ("ACG".to_string(), "ACG".to_string()));
        assert_eq!(outcome.stats.identity, 100.0);
    }

    #[test]
    fn test_free_function() {
        let outcome = align(
            &Sequence::from("A"),
            &Sequence::from("A"),
            ScoringScheme::new(5, -1, -2),
            AlignmentMode::Global,
        )
        .unwrap();
        assert_eq!(outcome.score(), 5);
        assert!(matches!(
            align(&Sequence::from(""), &Sequence::from("A"), ScoringScheme::default(), AlignmentMode::Local),
            Err(AlignerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = AlignerError::InvalidInput("first sequence is empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: first sequence is empty");
    }
}
