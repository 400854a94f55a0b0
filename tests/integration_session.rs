//! End-to-end tests for sessions: upload, analysis, imputation, export and
//! deletion through the service, plus store behaviour under concurrent use.

#![expect(clippy::unwrap_used)]

use chrono::TimeDelta;
use data_summary::analyser::dataset::{Column, Dataset, Value};
use data_summary::analyser::logic::{self, MissingPattern, SummaryOptions};
use data_summary::config::UploadLimits;
use data_summary::error::{DataSummaryError, Result};
use data_summary::service::SessionService;
use data_summary::session::{FileKind, ManualClock, SessionStore, StoreConfig};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn people() -> Dataset {
    Dataset::new(vec![
        Column::integer("age", vec![Some(25), Some(30), None]),
        Column::text("dept", vec![Some("A"), Some("B"), Some("A")]),
    ])
    .unwrap()
}

fn service() -> SessionService {
    SessionService::with_store(SessionStore::new(StoreConfig::default()).unwrap(), 5)
}

#[test]
fn test_people_session_workflow() -> Result<()> {
    let svc = service();
    let created = svc.create(people(), "people.csv", FileKind::Csv)?;
    let id = created.session_id().to_owned();
    assert_eq!(created.summary.row_count, 3);
    assert_eq!(created.overview.columns.len(), 2);

    let report = svc.missing_report(&id)?.data;
    let age = report.column("age").unwrap();
    assert_eq!(age.missing_count, 1);
    assert!((age.missing_percent - 33.33).abs() < 0.01, "one in three missing");
    assert_eq!(report.pattern("age"), Some(MissingPattern::ModerateMissing));
    assert_eq!(report.column("dept").unwrap().missing_count, 0);

    let summary = svc.summarize(&id, &SummaryOptions::everything())?.data;
    let dept = summary.categorical("dept").unwrap();
    assert_eq!(dept.most_common_value, Some(Value::Text("A".to_owned())));
    assert_eq!(dept.most_common_count, 2);

    let columns = vec!["age".to_owned()];
    let handled = svc.handle_missing(&id, "fill_mode", Some(columns.as_slice()))?;
    assert_eq!(handled.data.new_row_count, 3);
    assert_eq!(handled.data.processed_statistics.overall.missing_cells, 0);

    let stored = svc.store().get(&id)?;
    assert_eq!(
        stored.dataset.column("age").unwrap().value(2),
        Some(Value::Integer(25)),
        "mode tie between 25 and 30 goes to the first seen"
    );

    let exported = svc.export(&id, None, None, "CSV")?;
    assert_eq!(exported.filename, "people_export.csv");
    assert_eq!(exported.body, "age,dept\n25,A\n30,B\n25,A\n");

    let deleted = svc.delete(&id)?;
    assert_eq!(deleted.filename, "people.csv");
    assert!(matches!(
        svc.summarize(&id, &SummaryOptions::default()),
        Err(DataSummaryError::SessionNotFound(_))
    ));
    assert!(svc.delete(&id).unwrap_err().is_not_found());
    Ok(())
}

#[test]
fn test_skip_removes_incomplete_rows() -> Result<()> {
    let svc = service();
    let id = svc.create(people(), "people.csv", FileKind::Csv)?.summary.session_id;

    let handled = svc.handle_missing(&id, "skip", None)?.data;
    assert_eq!(handled.rows_removed, 1);
    assert_eq!(handled.new_row_count, 2);
    assert_eq!(handled.columns_processed, vec!["age".to_owned(), "dept".to_owned()]);

    let export = svc.export(&id, Some(&["dept".to_owned()][..]), Some(1), "json")?;
    let rows: serde_json::Value = serde_json::from_str(&export.body).unwrap();
    assert_eq!(rows, serde_json::json!([{"dept": "A"}]));
    Ok(())
}

#[test]
fn test_errors_name_the_problem() -> Result<()> {
    let svc = service();
    let id = svc.create(people(), "people.csv", FileKind::Csv)?.summary.session_id;

    let err = svc.describe_column(&id, "salary").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Column 'salary' not found in dataset. Available columns: age, dept"
    );

    let missing = vec!["salary".to_owned(), "bonus".to_owned()];
    let err = svc.correlation(&id, Some(missing.as_slice())).unwrap_err();
    assert_eq!(err.to_string(), "Columns not found: salary, bonus");

    assert!(matches!(
        svc.export(&id, None, None, "parquet"),
        Err(DataSummaryError::InvalidFormat(_))
    ));
    Ok(())
}

#[test]
fn test_csv_upload_through_service() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scores.csv");
    std::fs::write(&path, "name,score,passed\nAnn,1.5,true\nBo,NA,false\nCy,3.5,\n")?;

    let dataset = logic::load_csv(&path, &UploadLimits::default())?;
    let svc = service();
    let id = svc.create(dataset, "scores.csv", FileKind::Csv)?.summary.session_id;

    let filled = svc.handle_missing(&id, "fill_mean", None)?.data;
    assert_eq!(filled.unresolved_columns, Vec::<String>::new());
    let stored = svc.store().get(&id)?;
    assert_eq!(stored.dataset.column("score").unwrap().value(1), Some(Value::Float(2.5)));
    assert_eq!(
        stored.dataset.column("passed").unwrap().value(2),
        Some(Value::Boolean(true)),
        "non-numeric columns fall back to the mode"
    );
    Ok(())
}

#[test]
fn test_expired_sessions_disappear_from_service() -> Result<()> {
    let clock = Arc::new(ManualClock::default());
    let store = SessionStore::with_clock(StoreConfig::default(), clock.clone())?;
    let svc = SessionService::with_store(store, 5);

    let kept = svc.create(people(), "kept.csv", FileKind::Csv)?.summary.session_id;
    let idle = svc.create(people(), "idle.csv", FileKind::Csv)?.summary.session_id;

    clock.advance(TimeDelta::minutes(59));
    svc.missing_report(&kept)?;
    clock.advance(TimeDelta::minutes(1));

    assert!(svc.missing_report(&idle).unwrap_err().is_not_found());
    let listed: Vec<String> = svc.list()?.into_iter().map(|s| s.session_id).collect();
    assert_eq!(listed, vec![kept.clone()]);

    assert_eq!(svc.store().sweep()?, 1);
    assert_eq!(svc.store().len()?, 1);
    svc.missing_report(&kept)?;
    Ok(())
}

#[test]
fn test_concurrent_creates_respect_capacity() {
    let config = StoreConfig {
        max_sessions: 16,
        ..StoreConfig::default()
    };
    let store = SessionStore::new(config).unwrap();

    thread::scope(|s| {
        for worker in 0..8 {
            let store = &store;
            s.spawn(move || {
                for n in 0..10 {
                    let name = format!("w{worker}_{n}.csv");
                    let record = store.create(people(), name, FileKind::Csv).unwrap();
                    assert!(store.len().unwrap() <= 16, "capacity exceeded");
                    // Our own fresh record may already be evicted by others;
                    // either outcome is valid, a torn read is not.
                    match store.get(&record.id) {
                        Ok(read) => assert_eq!(read.dataset.row_count(), 3),
                        Err(e) => assert!(e.is_not_found(), "unexpected error {e}"),
                    }
                }
            });
        }
    });

    assert_eq!(store.len().unwrap(), 16);
    assert_eq!(store.list().unwrap().len(), 16);
}

#[test]
fn test_concurrent_reads_and_sweeps_do_not_interfere() {
    let clock = Arc::new(ManualClock::default());
    let store = SessionStore::with_clock(StoreConfig::default(), clock.clone()).unwrap();
    let ids: Vec<String> = (0..20)
        .map(|n| store.create(people(), format!("{n}.csv"), FileKind::Csv).unwrap().id)
        .collect();

    // Sessions are just short of the TTL, so sweeps find nothing to remove.
    clock.advance(TimeDelta::minutes(59));
    thread::scope(|s| {
        for chunk in ids.chunks(5) {
            let store = &store;
            s.spawn(move || {
                for id in chunk {
                    store.get(id).unwrap();
                }
            });
        }
        let store = &store;
        s.spawn(move || {
            for _ in 0..50 {
                store.sweep().unwrap();
                thread::sleep(Duration::from_micros(50));
            }
        });
    });

    clock.advance(TimeDelta::minutes(1));
    assert_eq!(store.sweep().unwrap(), 0, "every session was refreshed");
    for id in &ids {
        assert!(store.get(id).is_ok(), "session {id} was swept while active");
    }

    clock.advance(TimeDelta::hours(1));
    assert_eq!(store.sweep().unwrap(), ids.len());
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_sweeper_thread_stops_on_close() {
    let config = StoreConfig {
        cleanup_interval: Duration::from_millis(5),
        ..StoreConfig::default()
    };
    let svc = SessionService::with_store(SessionStore::new(config).unwrap(), 5);
    let id = svc.create(people(), "p.csv", FileKind::Csv).unwrap().summary.session_id;
    thread::sleep(Duration::from_millis(30));
    svc.close();
    svc.close();
    assert!(svc.missing_report(&id).is_ok(), "records outlive the sweeper");
}
