use serde::Serialize;

use crate::{Aligner, AlignerError, AlignmentMode, AlignmentOutcome};

/// Length difference above which local alignment is the better fit.
pub const LENGTH_DIFFERENCE_THRESHOLD: usize = 3;

/// With a non-positive gap penalty local scores never fall below global
/// ones; only a positive gap penalty lets the global alignment win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonVerdict {
    /// The end-to-end alignment scores strictly higher.
    GlobalBetter,
    LocalStronger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    PreferLocal,
    EitherMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeComparison {
    pub global: AlignmentOutcome,
    pub local: AlignmentOutcome,
    pub verdict: ComparisonVerdict,
    pub recommendation: Recommendation,
}

/// Runs both modes with the aligner's scoring and fill settings.
pub fn compare_modes(
    aligner: &Aligner,
    seq1: impl AsRef<[u8]>,
    seq2: impl AsRef<[u8]>,
) -> Result<ModeComparison, AlignerError> {
    let (seq1, seq2) = (seq1.as_ref(), seq2.as_ref());
    let global = aligner.clone().with_alignment_mode(AlignmentMode::Global).align(seq1, seq2)?;
    let local = aligner.clone().with_alignment_mode(AlignmentMode::Local).align(seq1, seq2)?;

    let verdict = if global.score() > local.score() {
        ComparisonVerdict::GlobalBetter
    } else {
        ComparisonVerdict::LocalStronger
    };
    let recommendation = if seq1.len().abs_diff(seq2.len()) > LENGTH_DIFFERENCE_THRESHOLD {
        Recommendation::PreferLocal
    } else {
        Recommendation::EitherMode
    };

    Ok(ModeComparison {
        global,
        local,
        verdict,
        recommendation,
    })
}
