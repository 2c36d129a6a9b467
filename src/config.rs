use crate::confidence::MAX_CLARIFYING_QUESTIONS;
use crate::graph::dependency_graph::DEFAULT_IMPLICIT_THRESHOLD;
use crate::keywords::DEFAULT_MINIMUM_SCORE;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the whole analysis pipeline. Every field has a default, so a
/// partial JSON document only needs to name what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub dependency: DependencyConfig,
    pub estimation: EstimationConfig,
    pub confidence: ConfidenceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Minimum keyword score for an inferred edge to be added to the graph.
    pub implicit_threshold: f64,
    /// Keyword scores below this floor are reported as no match at all.
    pub minimum_score: f64,
    /// Infer at most one direction per pair of items, and none against an
    /// ordering edge declared the other way.
    pub strongest_direction_only: bool,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            implicit_threshold: DEFAULT_IMPLICIT_THRESHOLD,
            minimum_score: DEFAULT_MINIMUM_SCORE,
            strongest_direction_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Baseline points for complexity 1 through 10.
    pub complexity_points: Vec<u32>,
    /// Highest complexity still in the low band.
    pub low_band_max: u8,
    /// Highest complexity still in the medium band.
    pub medium_band_max: u8,
    pub min_calibration_samples: usize,
    /// Completed-record count at which estimate confidence stops growing.
    pub confidence_saturation: usize,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            complexity_points: vec![1, 1, 2, 3, 5, 5, 8, 8, 13, 13],
            low_band_max: 3,
            medium_band_max: 6,
            min_calibration_samples: 3,
            confidence_saturation: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub input_completeness: f64,
    pub ai_self_assessment: f64,
    pub pattern_match: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            input_completeness: 0.3,
            ai_self_assessment: 0.4,
            pattern_match: 0.3,
        }
    }
}

impl ConfidenceWeights {
    pub fn total(&self) -> f64 {
        self.input_completeness + self.ai_self_assessment + self.pattern_match
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub weights: ConfidenceWeights,
    /// Scores below this need human review; scores at or above it are high tier.
    pub warning_threshold: u8,
    /// Scores below this are low tier.
    pub error_threshold: u8,
    pub max_clarifying_questions: usize,
    /// Value assumed for a missing self-assessment or pattern signal.
    pub neutral_signal: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            weights: ConfidenceWeights::default(),
            warning_threshold: 70,
            error_threshold: 50,
            max_clarifying_questions: 5,
            neutral_signal: 0.5,
        }
    }
}

impl PlanningConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: PlanningConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PlanningConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dependency.validate()?;
        self.estimation.validate()?;
        self.confidence.validate()?;
        Ok(())
    }
}

fn unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be between 0 and 1 (got {value})"
        )));
    }
    Ok(())
}

impl DependencyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("dependency.implicit_threshold", self.implicit_threshold)?;
        unit_interval("dependency.minimum_score", self.minimum_score)?;
        Ok(())
    }
}

impl EstimationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.complexity_points.len() != 10 {
            return Err(ConfigError::Invalid(format!(
                "estimation.complexity_points needs 10 entries (got {})",
                self.complexity_points.len()
            )));
        }
        if self.complexity_points.contains(&0) {
            return Err(ConfigError::Invalid(
                "estimation.complexity_points must all be positive".into(),
            ));
        }
        if self.complexity_points.windows(2).any(|w| w[0] > w[1]) {
            return Err(ConfigError::Invalid(
                "estimation.complexity_points must be non-decreasing".into(),
            ));
        }
        if self.low_band_max < 1
            || self.low_band_max >= self.medium_band_max
            || self.medium_band_max >= 10
        {
            return Err(ConfigError::Invalid(format!(
                "estimation band bounds must satisfy 1 <= low ({}) < medium ({}) < 10",
                self.low_band_max, self.medium_band_max
            )));
        }
        if self.min_calibration_samples == 0 {
            return Err(ConfigError::Invalid(
                "estimation.min_calibration_samples must be at least 1".into(),
            ));
        }
        if self.confidence_saturation == 0 {
            return Err(ConfigError::Invalid(
                "estimation.confidence_saturation must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl ConfidenceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("input_completeness", self.weights.input_completeness),
            ("ai_self_assessment", self.weights.ai_self_assessment),
            ("pattern_match", self.weights.pattern_match),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "confidence.weights.{name} must be non-negative (got {weight})"
                )));
            }
        }
        if self.weights.total() <= 0.0 {
            return Err(ConfigError::Invalid(
                "confidence.weights must have a positive sum".into(),
            ));
        }
        if self.warning_threshold > 100 || self.error_threshold > self.warning_threshold {
            return Err(ConfigError::Invalid(format!(
                "confidence thresholds must satisfy error ({}) <= warning ({}) <= 100",
                self.error_threshold, self.warning_threshold
            )));
        }
        if self.max_clarifying_questions > MAX_CLARIFYING_QUESTIONS {
            return Err(ConfigError::Invalid(format!(
                "confidence.max_clarifying_questions must be at most {MAX_CLARIFYING_QUESTIONS} (got {})",
                self.max_clarifying_questions
            )));
        }
        unit_interval("confidence.neutral_signal", self.neutral_signal)?;
        Ok(())
    }
}
