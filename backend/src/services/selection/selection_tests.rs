use super::*;
use crate::models::{MeasurementRow, ParameterValues, ScanDirection};

fn pixel(batch: &str, sheet: &str, device: &str, pixel: &str, pce: f64) -> MeasurementRow {
    MeasurementRow {
        row_index: 0,
        batch_id: batch.to_string(),
        sheet_id: sheet.to_string(),
        device_id: Some(device.to_string()),
        pixel_id: pixel.to_string(),
        scan_direction: Some(ScanDirection::Forward),
        pce,
        values: ParameterValues::default(),
        date: None,
    }
}

fn device(batch: &str, sheet: &str, device: &str, values: &[f64]) -> Vec<MeasurementRow> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| pixel(batch, sheet, device, &(i + 1).to_string(), *v))
        .collect()
}

fn records(devices: Vec<Vec<MeasurementRow>>) -> RecordSet {
    let mut rows: Vec<MeasurementRow> = devices.into_iter().flatten().collect();
    for (i, row) in rows.iter_mut().enumerate() {
        row.row_index = i;
    }
    RecordSet::from_rows(rows)
}

fn options(method: Method, devices: SelectionMode) -> SelectionOptions {
    SelectionOptions {
        devices,
        method,
        ..SelectionOptions::default()
    }
}

#[test]
fn test_top_two_devices_by_mean() {
    let records = records(vec![
        device("B1", "S1", "D1", &[15.0, 15.5, 16.0]),
        device("B1", "S1", "D2", &[18.0, 18.5, 19.0]),
        device("B1", "S1", "D3", &[12.0, 12.5, 13.0]),
        device("B1", "S1", "D4", &[17.0, 17.5, 18.0]),
    ]);
    let opts = options(Method::MaximizeMeanPce, SelectionMode::TopK(2));
    let mut log = AnalysisLog::new();
    let outcome = select(&records, &opts, 10_000, &mut log);

    assert_eq!(outcome.sheets.len(), 1);
    let result = &outcome.results(&opts)[0];
    assert_eq!(result.rank, 1);
    assert_eq!(result.selected_devices, vec!["D2", "D4"]);
    assert_eq!(result.total_pixels_used, 6);
    let expected = (18.0 + 18.5 + 19.0 + 17.0 + 17.5 + 18.0) / 6.0;
    assert!((result.combined_mean_pce - expected).abs() < 1e-12);
    assert_eq!(result.devices_mode, "Top-2");
}

#[test]
fn test_devices_keep_exactly_m_pixels() {
    let records = records(vec![
        device("B1", "S1", "D1", &[15.0, 16.0, 9.0, 15.5, 15.2]),
        device("B1", "S1", "D2", &[14.0, 14.2]),
        device("B1", "S1", "D3", &[11.0, 11.1, 11.2, 30.0]),
    ]);
    let opts = options(Method::MinimizeSd, SelectionMode::SelectAll);
    let mut log = AnalysisLog::new();
    let outcome = select(&records, &opts, 10_000, &mut log);

    let sheet = &outcome.sheets[0];
    assert_eq!(sheet.devices.len(), 2);
    assert!(sheet.devices.iter().all(|d| d.pixels.len() == 3));
    assert_eq!(sheet.devices_mode, "Select All");

    let d3 = sheet.devices.iter().find(|d| d.device_id == "D3").unwrap();
    let pixels: Vec<&str> = d3.pixels.iter().map(|p| p.pixel_id).collect();
    assert_eq!(pixels, vec!["1", "2", "3"]);

    assert!(log
        .into_lines()
        .iter()
        .any(|l| l.contains("1 of 3 device(s) dropped with fewer than 3 pixels")));
}

#[test]
fn test_minimize_sd_device_subset_is_globally_optimal() {
    let values = [14.1, 17.3, 16.9, 12.4, 17.0, 15.5, 16.8];
    let records = records(vec![device("B1", "S1", "D1", &values)]);
    let opts = options(Method::MinimizeSd, SelectionMode::SelectAll);
    let mut log = AnalysisLog::new();
    let outcome = select(&records, &opts, 10_000, &mut log);
    let chosen = &outcome.sheets[0].devices[0];

    let mut combo = vec![0, 1, 2];
    loop {
        let picked: Vec<f64> = combo.iter().map(|&i| values[i]).collect();
        let sd = population_std(&picked).unwrap();
        assert!(sd >= chosen.score);
        if !subset::next_combination(&mut combo, values.len()) {
            break;
        }
    }
}

#[test]
fn test_minimize_sd_keeps_device_set_with_lowest_pooled_sd() {
    let records = records(vec![
        device("B1", "S1", "D1", &[10.0, 10.0, 10.0]),
        device("B1", "S1", "D2", &[20.0, 20.0, 20.0]),
        device("B1", "S1", "D3", &[10.5, 10.6, 10.4]),
    ]);
    let opts = options(Method::MinimizeSd, SelectionMode::TopK(2));
    let mut log = AnalysisLog::new();
    let outcome = select(&records, &opts, 10_000, &mut log);

    let result = &outcome.results(&opts)[0];
    assert_eq!(result.selected_devices, vec!["D1", "D3"]);
    let pooled = [10.0, 10.0, 10.0, 10.5, 10.6, 10.4];
    assert!((result.combined_std_pce - population_std(&pooled).unwrap()).abs() < 1e-12);
    assert!(result.combined_std_pce < 0.26);
    assert!(!log.has_warnings());
}

#[test]
fn test_device_set_over_limit_is_grown_greedily() {
    let records = records(vec![
        device("B1", "S1", "D1", &[10.0, 10.0, 10.0]),
        device("B1", "S1", "D2", &[20.0, 20.0, 20.0]),
        device("B1", "S1", "D3", &[10.5, 10.6, 10.4]),
        device("B1", "S1", "D4", &[30.0, 31.0, 32.0]),
    ]);
    let opts = options(Method::MinimizeSd, SelectionMode::TopK(2));
    let mut log = AnalysisLog::new();
    // C(4, 2) = 6 device sets exceed the limit; C(3, 3) = 1 pixel set does not
    let outcome = select(&records, &opts, 5, &mut log);

    let sheet = &outcome.sheets[0];
    let devices: Vec<&str> = sheet.devices.iter().map(|d| d.device_id).collect();
    assert_eq!(devices, vec!["D1", "D3"]);
    assert!(sheet.devices.iter().all(|d| d.exhaustive));
    assert!(log
        .into_lines()
        .iter()
        .any(|l| l == "Warning: Too many device combinations for sheet S1 (batch B1); using greedy selection"));
}

#[test]
fn test_sheets_ranked_globally_and_limited_per_batch() {
    let records = records(vec![
        device("B1", "S1", "D1", &[10.0, 10.0, 10.0]),
        device("B1", "S2", "D1", &[20.0, 20.0, 20.0]),
        device("B1", "S3", "D1", &[15.0, 15.0, 15.0]),
        device("B2", "S1", "D1", &[18.0, 18.0, 18.0]),
    ]);
    let opts = SelectionOptions {
        sheets: SelectionMode::TopK(2),
        method: Method::MaximizeMeanPce,
        ..SelectionOptions::default()
    };
    let mut log = AnalysisLog::new();
    let outcome = select(&records, &opts, 10_000, &mut log);

    let order: Vec<(&str, &str, usize)> = outcome
        .sheets
        .iter()
        .map(|s| (s.batch_id, s.sheet_id, s.rank))
        .collect();
    assert_eq!(
        order,
        vec![("B1", "S2", 1), ("B2", "S1", 2), ("B1", "S3", 3)]
    );
}

#[test]
fn test_equal_scores_keep_first_seen_order() {
    let records = records(vec![
        device("B2", "S9", "D1", &[10.0, 10.0, 10.0]),
        device("B1", "S1", "D1", &[10.0, 10.0, 10.0]),
        device("B1", "S1", "D2", &[10.0, 10.0, 10.0]),
    ]);
    let opts = options(Method::MinimizeSd, SelectionMode::TopK(1));
    let mut log = AnalysisLog::new();
    let outcome = select(&records, &opts, 10_000, &mut log);

    let ranked: Vec<(&str, &str)> = outcome.sheets.iter().map(|s| (s.batch_id, s.sheet_id)).collect();
    assert_eq!(ranked, vec![("B2", "S9"), ("B1", "S1")]);
    assert_eq!(outcome.sheets[1].devices[0].device_id, "D1");
}

#[test]
fn test_sheet_allow_list() {
    let records = records(vec![
        device("B1", "S1", "D1", &[10.0, 11.0, 12.0]),
        device("B1", "S2", "D1", &[10.0, 11.0, 12.0]),
    ]);
    let opts = SelectionOptions {
        sheet_allow_list: Some(vec!["S2".to_string()]),
        ..SelectionOptions::default()
    };
    let mut log = AnalysisLog::new();
    let outcome = select(&records, &opts, 10_000, &mut log);

    assert_eq!(outcome.sheets.len(), 1);
    assert_eq!(outcome.sheets[0].sheet_id, "S2");
    assert!(log
        .into_lines()
        .iter()
        .any(|l| l == "Sheet filter applied: kept 3 / 6 pixel(s)"));
}

#[test]
fn test_no_qualifying_devices_gives_empty_outcome() {
    let records = records(vec![device("B1", "S1", "D1", &[10.0, 11.0])]);
    let mut log = AnalysisLog::new();
    let outcome = select(&records, &SelectionOptions::default(), 10_000, &mut log);
    assert!(outcome.is_empty());
    assert_eq!(outcome.devices_selected(), 0);
    assert_eq!(outcome.total_pixels(), 0);
}

#[test]
fn test_fallback_is_logged() {
    let records = records(vec![device(
        "B1",
        "S1",
        "D1",
        &[10.0, 11.0, 12.0, 13.0, 14.0],
    )]);
    let mut log = AnalysisLog::new();
    let outcome = select(&records, &SelectionOptions::default(), 3, &mut log);

    assert!(!outcome.sheets[0].devices[0].exhaustive);
    assert!(log.has_warnings());
}

#[test]
fn test_selection_is_deterministic() {
    let records = records(vec![
        device("B1", "S1", "D1", &[15.0, 15.5, 16.0, 14.0]),
        device("B1", "S1", "D2", &[18.0, 18.5, 19.0, 10.0]),
        device("B1", "S2", "D1", &[12.0, 12.5, 13.0]),
        device("B2", "S1", "D1", &[17.0, 17.5, 18.0]),
    ]);
    let opts = SelectionOptions::default();

    let first = select(&records, &opts, 10_000, &mut AnalysisLog::new()).results(&opts);
    let second = select(&records, &opts, 10_000, &mut AnalysisLog::new()).results(&opts);
    assert_eq!(first, second);
}
