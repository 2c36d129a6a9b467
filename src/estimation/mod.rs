use crate::config::EstimationConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod calibrator;

pub use calibrator::EstimationCalibrator;

/// Point values an estimate range snaps to.
pub const FIBONACCI_SCALE: [u32; 10] = [1, 2, 3, 5, 8, 13, 21, 34, 55, 89];

/// Granularity at which calibration factors are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityBand {
    Low,
    Medium,
    High,
}

impl ComplexityBand {
    pub const ALL: [ComplexityBand; 3] = [
        ComplexityBand::Low,
        ComplexityBand::Medium,
        ComplexityBand::High,
    ];

    pub fn for_complexity(complexity: u8, config: &EstimationConfig) -> Self {
        if complexity <= config.low_band_max {
            ComplexityBand::Low
        } else if complexity <= config.medium_band_max {
            ComplexityBand::Medium
        } else {
            ComplexityBand::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityBand::Low => "low",
            ComplexityBand::Medium => "medium",
            ComplexityBand::High => "high",
        }
    }

}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown complexity band '{0}'")]
pub struct ParseComplexityBandError(pub String);

impl FromStr for ComplexityBand {
    type Err = ParseComplexityBandError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ComplexityBand::Low),
            "medium" => Ok(ComplexityBand::Medium),
            "high" => Ok(ComplexityBand::High),
            _ => Err(ParseComplexityBandError(value.to_string())),
        }
    }
}

impl fmt::Display for ComplexityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One estimate's lifecycle. This five-field shape is what every history
/// store must round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationRecord {
    pub item_id: String,
    pub band: ComplexityBand,
    pub estimated_points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl EstimationRecord {
    pub fn pending(item_id: impl Into<String>, estimated_points: u32, band: ComplexityBand) -> Self {
        Self {
            item_id: item_id.into(),
            band,
            estimated_points,
            actual_points: None,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.actual_points.is_some()
    }

    /// actual / estimated, once the actual is known.
    pub fn ratio(&self) -> Option<f64> {
        if self.estimated_points == 0 {
            return None;
        }
        self.actual_points
            .map(|actual| f64::from(actual) / f64::from(self.estimated_points))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateRange {
    pub low: u32,
    pub high: u32,
}

impl EstimateRange {
    /// One scale step either side of the scale value nearest `points`.
    pub fn around(points: u32) -> Self {
        let nearest = FIBONACCI_SCALE
            .iter()
            .enumerate()
            .min_by_key(|(_, value)| value.abs_diff(points))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let low = FIBONACCI_SCALE[nearest.saturating_sub(1)];
        let high = FIBONACCI_SCALE[(nearest + 1).min(FIBONACCI_SCALE.len() - 1)];
        Self {
            low: low.min(points),
            high: high.max(points),
        }
    }

    pub fn contains(&self, points: u32) -> bool {
        self.low <= points && points <= self.high
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub points: u32,
    pub baseline_points: u32,
    pub band: ComplexityBand,
    pub range: EstimateRange,
    /// 0-1, grows with the number of completed records behind the band.
    pub confidence: f64,
    /// Whether the band had enough history for its factor to be applied.
    pub calibrated: bool,
    pub factor: f64,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFactor {
    pub band: ComplexityBand,
    pub factor: f64,
    pub sample_size: usize,
    pub calibrated: bool,
}

impl CalibrationFactor {
    pub fn uncalibrated(band: ComplexityBand, sample_size: usize) -> Self {
        Self {
            band,
            factor: 1.0,
            sample_size,
            calibrated: false,
        }
    }
}

/// Median of the values; `None` when empty.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries_follow_config() {
        let config = EstimationConfig::default();
        assert_eq!(ComplexityBand::for_complexity(3, &config), ComplexityBand::Low);
        assert_eq!(ComplexityBand::for_complexity(4, &config), ComplexityBand::Medium);
        assert_eq!(ComplexityBand::for_complexity(6, &config), ComplexityBand::Medium);
        assert_eq!(ComplexityBand::for_complexity(7, &config), ComplexityBand::High);
    }

    #[test]
    fn band_parses_through_from_str() {
        assert_eq!("Medium".parse::<ComplexityBand>(), Ok(ComplexityBand::Medium));
        assert_eq!(" high ".parse::<ComplexityBand>(), Ok(ComplexityBand::High));
        let err = "huge".parse::<ComplexityBand>().unwrap_err();
        assert_eq!(err.to_string(), "unknown complexity band 'huge'");
    }

    #[test]
    fn range_spans_one_step_each_side() {
        assert_eq!(EstimateRange::around(5), EstimateRange { low: 3, high: 8 });
        assert_eq!(EstimateRange::around(1), EstimateRange { low: 1, high: 2 });
        // 4 sits between 3 and 5; the lower neighbour wins.
        assert_eq!(EstimateRange::around(4), EstimateRange { low: 2, high: 5 });
        assert!(EstimateRange::around(120).contains(120));
    }

    #[test]
    fn median_resists_a_single_outlier() {
        let mut values = vec![1.0, 1.1, 9.0];
        assert_eq!(median(&mut values), Some(1.1));
        let mut even = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(median(&mut even), Some(2.5));
        assert_eq!(median(&mut []), None);
    }
}
