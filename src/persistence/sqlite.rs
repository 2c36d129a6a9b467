use super::{EstimationStore, PersistenceError, PersistenceResult};
use crate::estimation::{ComplexityBand, EstimationRecord};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, Row, params};

/// Durable history; one row per record, kept in insertion order.
pub struct SqliteEstimationStore {
    connection: Mutex<Connection>,
}

impl SqliteEstimationStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS estimation_records (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id TEXT NOT NULL,
                band TEXT NOT NULL,
                estimated_points INTEGER NOT NULL,
                actual_points INTEGER,
                completed_at TEXT
            );
            CREATE INDEX IF NOT EXISTS estimation_records_item
                ON estimation_records (item_id, actual_points);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn query(&self, sql: &str, band: Option<ComplexityBand>) -> PersistenceResult<Vec<EstimationRecord>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = match band {
            Some(band) => stmt.query_map(params![band.as_str()], read_row)?,
            None => stmt.query_map([], read_row)?,
        };

        let mut records = Vec::new();
        for row in rows {
            let (item_id, band, estimated_points, actual_points, completed_at) = row?;
            let band = band.parse::<ComplexityBand>().map_err(|err| {
                PersistenceError::InvalidData(format!("{err} for {item_id}"))
            })?;
            let completed_at = completed_at.as_deref().map(parse_timestamp).transpose()?;
            records.push(EstimationRecord {
                item_id,
                band,
                estimated_points,
                actual_points,
                completed_at,
            });
        }
        super::validate_records(&records)?;
        Ok(records)
    }
}

type RawRecord = (String, String, u32, Option<u32>, Option<String>);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn parse_timestamp(value: &str) -> PersistenceResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| PersistenceError::InvalidData(format!("invalid timestamp '{value}': {err}")))
}

impl EstimationStore for SqliteEstimationStore {
    fn append(&self, record: EstimationRecord) -> PersistenceResult<()> {
        super::validate_record(&record)?;
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO estimation_records (item_id, band, estimated_points, actual_points, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.item_id,
                record.band.as_str(),
                record.estimated_points,
                record.actual_points,
                record.completed_at.map(|ts| ts.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn complete(
        &self,
        item_id: &str,
        actual_points: u32,
        completed_at: DateTime<Utc>,
    ) -> PersistenceResult<bool> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE estimation_records SET actual_points = ?1, completed_at = ?2
             WHERE seq = (
                 SELECT seq FROM estimation_records
                 WHERE item_id = ?3 AND actual_points IS NULL
                 ORDER BY seq ASC LIMIT 1
             )",
            params![actual_points, completed_at.to_rfc3339(), item_id],
        )?;
        tx.commit()?;
        Ok(updated > 0)
    }

    fn records(&self) -> PersistenceResult<Vec<EstimationRecord>> {
        self.query(
            "SELECT item_id, band, estimated_points, actual_points, completed_at
             FROM estimation_records ORDER BY seq ASC",
            None,
        )
    }

    fn completed_in_band(&self, band: ComplexityBand) -> PersistenceResult<Vec<EstimationRecord>> {
        self.query(
            "SELECT item_id, band, estimated_points, actual_points, completed_at
             FROM estimation_records
             WHERE band = ?1 AND actual_points IS NOT NULL
             ORDER BY seq ASC",
            Some(band),
        )
    }
}
