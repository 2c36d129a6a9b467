use super::{EstimationStore, InMemoryEstimationStore, PersistenceError, PersistenceResult};
use crate::estimation::{ComplexityBand, EstimationRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

#[derive(Serialize, Deserialize)]
struct HistorySnapshot {
    records: Vec<EstimationRecord>,
}

pub fn save_history_to_json<S, P>(store: &S, path: P) -> PersistenceResult<()>
where
    S: EstimationStore + ?Sized,
    P: AsRef<Path>,
{
    let records = store.records()?;
    super::validate_records(&records)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &HistorySnapshot { records })?;
    Ok(())
}

pub fn load_history_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<InMemoryEstimationStore> {
    let file = File::open(path.as_ref())?;
    let snapshot: HistorySnapshot = serde_json::from_reader(file)?;
    info!(
        records = snapshot.records.len(),
        path = %path.as_ref().display(),
        "estimation history loaded"
    );
    InMemoryEstimationStore::from_records(snapshot.records)
}

#[derive(Default, Serialize, Deserialize)]
struct EstimationCsvRecord {
    item_id: String,
    band: String,
    estimated_points: u32,
    actual_points: String,
    completed_at: String,
}

impl From<&EstimationRecord> for EstimationCsvRecord {
    fn from(record: &EstimationRecord) -> Self {
        Self {
            item_id: record.item_id.clone(),
            band: record.band.as_str().to_string(),
            estimated_points: record.estimated_points,
            actual_points: format_option_u32(record.actual_points),
            completed_at: format_timestamp(record.completed_at),
        }
    }
}

impl EstimationCsvRecord {
    fn into_record(self) -> PersistenceResult<EstimationRecord> {
        let band = self.band.parse::<ComplexityBand>().map_err(|err| {
            PersistenceError::InvalidData(format!("{err} for {}", self.item_id))
        })?;
        Ok(EstimationRecord {
            band,
            estimated_points: self.estimated_points,
            actual_points: parse_u32(&self.actual_points)?,
            completed_at: parse_timestamp(&self.completed_at)?,
            item_id: self.item_id,
        })
    }
}

pub fn save_history_to_csv<S, P>(store: &S, path: P) -> PersistenceResult<()>
where
    S: EstimationStore + ?Sized,
    P: AsRef<Path>,
{
    let records = store.records()?;
    super::validate_records(&records)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for record in &records {
        writer.serialize(EstimationCsvRecord::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_history_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<InMemoryEstimationStore> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for row in reader.deserialize::<EstimationCsvRecord>() {
        records.push(row?.into_record()?);
    }
    info!(
        records = records.len(),
        path = %path.as_ref().display(),
        "estimation history loaded"
    );
    InMemoryEstimationStore::from_records(records)
}

fn format_option_u32(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_u32(input: &str) -> PersistenceResult<Option<u32>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid points '{input}': {e}")))
}

fn format_timestamp(value: Option<DateTime<Utc>>) -> String {
    value.map(|ts| ts.to_rfc3339()).unwrap_or_default()
}

fn parse_timestamp(input: &str) -> PersistenceResult<Option<DateTime<Utc>>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(input.trim())
        .map(|ts| Some(ts.with_timezone(&Utc)))
        .map_err(|e| PersistenceError::InvalidData(format!("invalid timestamp '{input}': {e}")))
}
