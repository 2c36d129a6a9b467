use chrono::{TimeZone, Utc};
use plan_core::estimation::{ComplexityBand, EstimationRecord};
use plan_core::persistence::{
    EstimationStore, InMemoryEstimationStore, load_history_from_csv, load_history_from_json,
    save_history_to_csv, save_history_to_json,
};
use tempfile::tempdir;

fn sample_store() -> InMemoryEstimationStore {
    let store = InMemoryEstimationStore::new();
    store
        .append(EstimationRecord::pending("api", 5, ComplexityBand::Medium))
        .unwrap();
    store
        .append(EstimationRecord::pending("ui", 3, ComplexityBand::Low))
        .unwrap();
    store
        .complete(
            "api",
            8,
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap(),
        )
        .unwrap();
    store
}

#[test]
fn json_round_trip_preserves_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.json");
    let store = sample_store();

    save_history_to_json(&store, &path).unwrap();
    let loaded = load_history_from_json(&path).unwrap();

    assert_eq!(loaded.records().unwrap(), store.records().unwrap());
}

#[test]
fn csv_round_trip_preserves_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.csv");
    let store = sample_store();

    save_history_to_csv(&store, &path).unwrap();
    let loaded = load_history_from_csv(&path).unwrap();

    assert_eq!(loaded.records().unwrap(), store.records().unwrap());
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("item_id,band,estimated_points,actual_points,completed_at"));
    assert!(text.contains("2025-06-01T09:30:00+00:00"));
}

#[test]
fn csv_with_bad_band_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(
        &path,
        "item_id,band,estimated_points,actual_points,completed_at\napi,huge,5,,\n",
    )
    .unwrap();
    assert!(load_history_from_csv(&path).is_err());
}

#[test]
fn json_with_half_completed_record_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{"records":[{"item_id":"a","band":"low","estimated_points":2,"actual_points":3}]}"#,
    )
    .unwrap();
    assert!(load_history_from_json(&path).is_err());
}

#[test]
fn completed_in_band_filters_pending_and_other_bands() {
    let store = sample_store();
    let medium = store.completed_in_band(ComplexityBand::Medium).unwrap();
    assert_eq!(medium.len(), 1);
    assert_eq!(medium[0].actual_points, Some(8));
    assert!(store.completed_in_band(ComplexityBand::Low).unwrap().is_empty());
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use plan_core::persistence::SqliteEstimationStore;

    #[test]
    fn sqlite_store_completes_oldest_pending() {
        let store = SqliteEstimationStore::in_memory().unwrap();
        store
            .append(EstimationRecord::pending("a", 3, ComplexityBand::Low))
            .unwrap();
        store
            .append(EstimationRecord::pending("a", 5, ComplexityBand::Medium))
            .unwrap();

        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert!(store.complete("a", 4, at).unwrap());
        let records = store.records().unwrap();
        assert_eq!(records[0].actual_points, Some(4));
        assert_eq!(records[0].completed_at, Some(at));
        assert_eq!(records[1].actual_points, None);
        assert!(!store.complete("missing", 1, at).unwrap());
    }

    #[test]
    fn sqlite_history_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let store = SqliteEstimationStore::new(&path).unwrap();
            store
                .append(EstimationRecord::pending("api", 5, ComplexityBand::Medium))
                .unwrap();
            store
                .complete("api", 7, Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap())
                .unwrap();
        }
        let reopened = SqliteEstimationStore::new(&path).unwrap();
        let completed = reopened.completed_in_band(ComplexityBand::Medium).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].actual_points, Some(7));
    }

    #[test]
    fn sqlite_rejects_invalid_records() {
        let store = SqliteEstimationStore::in_memory().unwrap();
        assert!(
            store
                .append(EstimationRecord::pending(" ", 3, ComplexityBand::Low))
                .is_err()
        );
        assert!(store.records().unwrap().is_empty());
    }
}
