use super::{CalibrationFactor, ComplexityBand, Estimate, EstimateRange, EstimationRecord, median};
use crate::config::EstimationConfig;
use crate::item_validation::{MAX_COMPLEXITY, MIN_COMPLEXITY};
use crate::persistence::{EstimationStore, PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

const BASE_CONFIDENCE: f64 = 0.3;
const HISTORY_CONFIDENCE: f64 = 0.6;

/// Turns complexity scores into point estimates, corrected by the recorded
/// ratio of actual to estimated effort in each complexity band.
pub struct EstimationCalibrator<S: EstimationStore> {
    store: S,
    config: EstimationConfig,
}

impl<S: EstimationStore> EstimationCalibrator<S> {
    pub fn new(store: S, config: EstimationConfig) -> Self {
        Self { store, config }
    }

    pub fn with_defaults(store: S) -> Self {
        Self::new(store, EstimationConfig::default())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn band_for(&self, complexity: u8) -> ComplexityBand {
        ComplexityBand::for_complexity(Self::clamp_complexity(complexity), &self.config)
    }

    /// Uncalibrated points for a complexity score.
    pub fn baseline_points(&self, complexity: u8) -> u32 {
        let idx = usize::from(Self::clamp_complexity(complexity) - MIN_COMPLEXITY);
        self.config.complexity_points.get(idx).copied().unwrap_or(1).max(1)
    }

    fn clamp_complexity(complexity: u8) -> u8 {
        complexity.clamp(MIN_COMPLEXITY, MAX_COMPLEXITY)
    }

    pub fn estimate(&self, complexity: u8) -> Estimate {
        if !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&complexity) {
            warn!(complexity, "complexity out of range, clamping");
        }
        let band = self.band_for(complexity);
        let baseline_points = self.baseline_points(complexity);
        let factor = self.calibration_factor(band);

        let points = if factor.calibrated {
            (f64::from(baseline_points) * factor.factor).round().max(1.0) as u32
        } else {
            baseline_points
        };

        let saturation = self.config.confidence_saturation.max(1);
        let backing = factor.sample_size.min(saturation) as f64 / saturation as f64;
        let confidence = BASE_CONFIDENCE + HISTORY_CONFIDENCE * backing;

        debug!(
            complexity,
            band = band.as_str(),
            baseline_points,
            points,
            factor = factor.factor,
            calibrated = factor.calibrated,
            "estimate computed"
        );

        Estimate {
            points,
            baseline_points,
            band,
            range: EstimateRange::around(points),
            confidence,
            calibrated: factor.calibrated,
            factor: factor.factor,
            sample_size: factor.sample_size,
        }
    }

    /// Median actual/estimated ratio over the band's completed records, or
    /// 1.0 while fewer than `min_calibration_samples` exist. A store that
    /// cannot be read counts as having no history.
    pub fn calibration_factor(&self, band: ComplexityBand) -> CalibrationFactor {
        let completed = match self.store.completed_in_band(band) {
            Ok(records) => records,
            Err(err) => {
                warn!(band = band.as_str(), error = %err, "estimation history unavailable");
                Vec::new()
            }
        };
        let mut ratios: Vec<f64> = completed.iter().filter_map(EstimationRecord::ratio).collect();
        let sample_size = ratios.len();
        if sample_size < self.config.min_calibration_samples {
            return CalibrationFactor::uncalibrated(band, sample_size);
        }
        match median(&mut ratios) {
            Some(factor) if factor.is_finite() && factor > 0.0 => CalibrationFactor {
                band,
                factor,
                sample_size,
                calibrated: true,
            },
            _ => CalibrationFactor::uncalibrated(band, sample_size),
        }
    }

    pub fn calibration_report(&self) -> Vec<CalibrationFactor> {
        ComplexityBand::ALL
            .iter()
            .map(|&band| self.calibration_factor(band))
            .collect()
    }

    pub fn record_estimate(
        &self,
        item_id: impl Into<String>,
        points: u32,
        band: ComplexityBand,
    ) -> PersistenceResult<()> {
        let record = EstimationRecord::pending(item_id, points, band);
        if record.item_id.trim().is_empty() || points == 0 {
            return Err(PersistenceError::InvalidData(format!(
                "cannot record estimate of {points} points for '{}'",
                record.item_id
            )));
        }
        self.store.append(record)
    }

    /// Completes the oldest pending estimate for `item_id`. Returns `false`
    /// (and logs) when there is nothing pending for it.
    pub fn record_actual(&self, item_id: &str, actual_points: u32) -> PersistenceResult<bool> {
        self.record_actual_at(item_id, actual_points, Utc::now())
    }

    pub fn record_actual_at(
        &self,
        item_id: &str,
        actual_points: u32,
        completed_at: DateTime<Utc>,
    ) -> PersistenceResult<bool> {
        let applied = self.store.complete(item_id, actual_points, completed_at)?;
        if !applied {
            warn!(item_id, actual_points, "no pending estimate for item, actual ignored");
        }
        Ok(applied)
    }
}
