//! Aligner configuration, loadable from TOML.
//!
//! ```toml
//! mode = "local"
//!
//! [scoring]
//! match_score = 2
//! mismatch = -1
//! gap_penalty = -2
//!
//! [performance]
//! fill_strategy = "wavefront"
//! parallel_threshold = 256
//! workers = 4
//! ```

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::alignment_mode::AlignmentMode;
use crate::optimizations::{FillStrategy, OptimizationConfig};
use crate::scoring::ScoringScheme;
use crate::AlignerError;

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub fill_strategy: FillStrategy,
    pub parallel_threshold: usize,
    /// Worker threads used for batch alignment.
    pub workers: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        let optimizations = OptimizationConfig::default();
        Self {
            fill_strategy: optimizations.fill_strategy,
            parallel_threshold: optimizations.parallel_threshold,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl PerformanceConfig {
    pub fn optimizations(&self) -> OptimizationConfig {
        OptimizationConfig {
            fill_strategy: self.fill_strategy,
            parallel_threshold: self.parallel_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    pub mode: AlignmentMode,
    pub scoring: ScoringScheme,
    pub performance: PerformanceConfig,
}

impl AlignerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, AlignerError> {
        let value: toml::Value = toml::from_str(content)
            .map_err(|e| AlignerError::ConfigError(format!("TOML parsing error: {e}")))?;
        check_scoring_integers(&value)?;

        let config: AlignerConfig = value
            .try_into()
            .map_err(|e: toml::de::Error| AlignerError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AlignerError> {
        info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, AlignerError> {
        toml::to_string_pretty(self)
            .map_err(|e| AlignerError::ConfigError(format!("TOML serialization error: {e}")))
    }

    pub fn validate(&self) -> Result<(), AlignerError> {
        if self.performance.workers == 0 {
            return Err(AlignerError::ConfigError(
                "performance.workers must be at least 1".to_string(),
            ));
        }
        if self.performance.parallel_threshold == 0 {
            return Err(AlignerError::ConfigError(
                "performance.parallel_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A fractional or textual scoring value is bad input, not a malformed file.
fn check_scoring_integers(value: &toml::Value) -> Result<(), AlignerError> {
    let Some(scoring) = value.get("scoring").and_then(toml::Value::as_table) else {
        return Ok(());
    };
    for key in ["match_score", "mismatch", "gap_penalty"] {
        match scoring.get(key) {
            None | Some(toml::Value::Integer(_)) => {}
            Some(other) => {
                return Err(AlignerError::InvalidInput(format!(
                    "scoring.{key} must be an integer, got {other}"
                )))
            }
        }
    }
    Ok(())
}
