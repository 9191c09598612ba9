//! End-to-end run into a CSV file.

mod common;

use std::time::Duration;

use common::{config, lamp_on_at_3s, Bench};
use lumen_daq::acquisition::Acquisition;
use lumen_daq::config::{RunConfig, SimulationSettings};
use lumen_daq::sensor::SimulatedThermometer;
use lumen_daq::storage::{resolve_output_path, CsvRecordSink, RecordSink, RowFormat, HEADER};

fn read_rows(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .unwrap();
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

#[tokio::test(start_paused = true)]
async fn test_run_writes_complete_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("torch.csv");
    let run = RunConfig {
        max_duration: Some(Duration::from_secs(60)),
        lux_to_lumen_factor: Some(4.0),
        relative_time: true,
        ..config()
    };
    let sink = CsvRecordSink::create(&path, RowFormat::from(&run)).unwrap();

    let bench = Bench::default();
    let summary = Acquisition::new(
        run,
        Box::new(lamp_on_at_3s(|_| 1000.0)),
        Box::new(bench.indicator.clone()),
        Box::new(sink),
        Box::new(bench.reporter.clone()),
    )
    .run()
    .await
    .unwrap();

    let (header, rows) = read_rows(&path);
    assert_eq!(header, HEADER);
    assert_eq!(rows.len() as u64, summary.samples_written);

    let relative: Vec<f64> = rows.iter().map(|r| r[2].parse().unwrap()).collect();
    assert!((relative[0] - 0.5).abs() < 0.01);
    assert!(relative.windows(2).all(|w| w[0] < w[1]));
    assert!((relative.last().unwrap() - 60.0).abs() < 1.0);

    for row in &rows {
        assert_eq!(row[1].parse::<f64>().unwrap(), 1000.0);
        assert_eq!(row[4].parse::<f64>().unwrap(), 250.0);
        let days: f64 = row[3].parse().unwrap();
        let secs: f64 = row[2].parse().unwrap();
        assert!((days * 86_400.0 - secs).abs() < 1e-6);
        assert_eq!(row[5], "");
    }
}

#[tokio::test(start_paused = true)]
async fn test_temperature_column_filled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warm.csv");
    let run = RunConfig {
        max_duration: Some(Duration::from_secs(35)),
        ..config()
    };
    let sink = CsvRecordSink::create(&path, RowFormat::from(&run)).unwrap();

    let bench = Bench::default();
    Acquisition::new(
        run,
        Box::new(lamp_on_at_3s(|_| 500.0)),
        Box::new(bench.indicator.clone()),
        Box::new(sink),
        Box::new(bench.reporter.clone()),
    )
    .with_temperature(Box::new(SimulatedThermometer::new(&SimulationSettings::default())))
    .run()
    .await
    .unwrap();

    let (_, rows) = read_rows(&path);
    assert!(!rows.is_empty());
    for row in &rows {
        // Relative time and lumens are off
        assert_eq!(row[2], "");
        assert_eq!(row[3], "");
        assert_eq!(row[4], "");
        let celsius: f64 = row[5].parse().unwrap();
        assert!((22.0..=45.0).contains(&celsius));
    }
}

#[tokio::test]
async fn test_existing_record_is_never_appended_to() {
    let dir = tempfile::tempdir().unwrap();
    let requested = dir.path().join("torch.csv");
    std::fs::write(&requested, "previous run\n").unwrap();

    let path = resolve_output_path(&requested, chrono::Local::now());
    assert_ne!(path, requested);

    let mut sink = CsvRecordSink::create(&path, RowFormat::default()).unwrap();
    sink.close().await.unwrap();

    assert_eq!(std::fs::read_to_string(&requested).unwrap(), "previous run\n");
}
