use super::{EstimationStore, PersistenceResult};
use crate::estimation::{ComplexityBand, EstimationRecord};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Append-only history behind a coarse lock.
#[derive(Debug, Default)]
pub struct InMemoryEstimationStore {
    records: RwLock<Vec<EstimationRecord>>,
}

impl InMemoryEstimationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<EstimationRecord>) -> PersistenceResult<Self> {
        super::validate_records(&records)?;
        Ok(Self {
            records: RwLock::new(records),
        })
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl EstimationStore for InMemoryEstimationStore {
    fn append(&self, record: EstimationRecord) -> PersistenceResult<()> {
        super::validate_record(&record)?;
        self.records.write().push(record);
        Ok(())
    }

    fn complete(
        &self,
        item_id: &str,
        actual_points: u32,
        completed_at: DateTime<Utc>,
    ) -> PersistenceResult<bool> {
        let mut records = self.records.write();
        let pending = records
            .iter_mut()
            .find(|record| record.item_id == item_id && !record.is_completed());
        match pending {
            Some(record) => {
                record.actual_points = Some(actual_points);
                record.completed_at = Some(completed_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn records(&self) -> PersistenceResult<Vec<EstimationRecord>> {
        Ok(self.records.read().clone())
    }

    fn completed_in_band(&self, band: ComplexityBand) -> PersistenceResult<Vec<EstimationRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|record| record.band == band && record.is_completed())
            .cloned()
            .collect())
    }
}
