use serde::{Deserialize, Serialize};

use crate::scoring::{Score, ScoringScheme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMode {
    #[default]
    Global, // Needleman-Wunsch
    Local,  // Smith-Waterman
}

impl AlignmentMode {
    /// Score of aligning a prefix of `index` symbols against nothing.
    pub fn boundary(&self, index: usize, gap_penalty: Score) -> Score {
        match self {
            AlignmentMode::Global => index as Score * gap_penalty,
            AlignmentMode::Local => 0,
        }
    }

    /// Local alignment restarts at zero instead of going negative.
    pub fn clamps_to_zero(&self) -> bool {
        matches!(self, AlignmentMode::Local)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AlignmentMode::Global => "global",
            AlignmentMode::Local => "local",
        }
    }
}

impl std::fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for AlignmentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" | "nw" | "needleman-wunsch" => Ok(AlignmentMode::Global),
            "local" | "sw" | "smith-waterman" => Ok(AlignmentMode::Local),
            other => Err(format!("unknown alignment mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlignmentParams {
    pub mode: AlignmentMode,
    pub scoring: ScoringScheme,
}

impl AlignmentParams {
    pub fn new(mode: AlignmentMode, scoring: ScoringScheme) -> Self {
        Self { mode, scoring }
    }
}
