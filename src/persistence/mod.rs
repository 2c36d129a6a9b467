use crate::estimation::{ComplexityBand, EstimationRecord};
use chrono::{DateTime, Utc};
use serde_json::Error as SerdeJsonError;
use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// History of estimation records backing calibration.
///
/// Implementations serialize their own writes; readers get a consistent
/// snapshot.
pub trait EstimationStore: Send + Sync {
    fn append(&self, record: EstimationRecord) -> PersistenceResult<()>;

    /// Fills in the actual on the oldest pending record for `item_id`.
    /// Returns `false` when the item has no pending record.
    fn complete(
        &self,
        item_id: &str,
        actual_points: u32,
        completed_at: DateTime<Utc>,
    ) -> PersistenceResult<bool>;

    fn records(&self) -> PersistenceResult<Vec<EstimationRecord>>;

    fn completed_in_band(&self, band: ComplexityBand) -> PersistenceResult<Vec<EstimationRecord>> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|record| record.band == band && record.is_completed())
            .collect())
    }
}

impl<S: EstimationStore + ?Sized> EstimationStore for Arc<S> {
    fn append(&self, record: EstimationRecord) -> PersistenceResult<()> {
        (**self).append(record)
    }

    fn complete(
        &self,
        item_id: &str,
        actual_points: u32,
        completed_at: DateTime<Utc>,
    ) -> PersistenceResult<bool> {
        (**self).complete(item_id, actual_points, completed_at)
    }

    fn records(&self) -> PersistenceResult<Vec<EstimationRecord>> {
        (**self).records()
    }

    fn completed_in_band(&self, band: ComplexityBand) -> PersistenceResult<Vec<EstimationRecord>> {
        (**self).completed_in_band(band)
    }
}

pub fn validate_record(record: &EstimationRecord) -> PersistenceResult<()> {
    if record.item_id.trim().is_empty() {
        return Err(PersistenceError::InvalidData(
            "estimation record requires a non-empty item_id".into(),
        ));
    }
    if record.estimated_points == 0 {
        return Err(PersistenceError::InvalidData(format!(
            "estimation record for {} has zero estimated points",
            record.item_id
        )));
    }
    if record.actual_points.is_some() != record.completed_at.is_some() {
        return Err(PersistenceError::InvalidData(format!(
            "estimation record for {} must set actual_points and completed_at together",
            record.item_id
        )));
    }
    Ok(())
}

pub fn validate_records(records: &[EstimationRecord]) -> PersistenceResult<()> {
    records.iter().try_for_each(validate_record)
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_history_from_csv, load_history_from_json, save_history_to_csv, save_history_to_json,
};
pub use memory::InMemoryEstimationStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEstimationStore;
