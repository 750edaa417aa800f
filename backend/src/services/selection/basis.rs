//! Reduce measurement rows to one working PCE value per pixel.

use indexmap::IndexMap;

use super::options::Basis;
use crate::models::{MeasurementRow, RecordSet, ScanDirection};
use crate::services::analysis_log::AnalysisLog;
use crate::services::statistics::mean;

/// One pixel as seen by the optimizer.
#[derive(Debug, Clone)]
pub struct PixelSample<'a> {
    pub batch_id: &'a str,
    pub sheet_id: &'a str,
    pub device_id: &'a str,
    pub pixel_id: &'a str,
    /// Working value (`PCE_WORK`) for the active basis
    pub pce: f64,
    /// Measurements the working value was derived from, forward scans first
    pub sources: Vec<&'a MeasurementRow>,
}

#[derive(Default)]
struct PixelScans<'a> {
    forward: Vec<&'a MeasurementRow>,
    reverse: Vec<&'a MeasurementRow>,
}

fn scan_mean(rows: &[&MeasurementRow]) -> Option<f64> {
    let values: Vec<f64> = rows.iter().map(|r| r.pce).collect();
    mean(&values)
}

/// Filter rows to `basis` and collapse them into pixel samples.
///
/// Pixels keep the order in which they first appear. Duplicate scans in one
/// direction are averaged. For [`Basis::AverageFr`] a pixel needs both a
/// forward and a reverse scan; unpaired pixels are dropped.
pub fn pixel_samples<'a>(
    records: &'a RecordSet,
    basis: Basis,
    log: &mut AnalysisLog,
) -> Vec<PixelSample<'a>> {
    let mut pixels: IndexMap<(&str, &str, &str, &str), PixelScans<'a>> = IndexMap::new();
    let mut without_device = 0usize;
    let mut without_direction = 0usize;

    for row in records.rows() {
        let Some(device_id) = row.device_id.as_deref() else {
            without_device += 1;
            continue;
        };
        let key = (
            row.batch_id.as_str(),
            row.sheet_id.as_str(),
            device_id,
            row.pixel_id.as_str(),
        );
        match row.scan_direction {
            Some(ScanDirection::Forward) => pixels.entry(key).or_default().forward.push(row),
            Some(ScanDirection::Reverse) => pixels.entry(key).or_default().reverse.push(row),
            None => without_direction += 1,
        }
    }

    if without_device > 0 {
        log.warning(format!(
            "{} row(s) without a Device ID excluded from selection",
            without_device
        ));
    }
    if without_direction > 0 {
        log.warning(format!(
            "{} row(s) without a Scan Direction excluded from selection",
            without_direction
        ));
    }

    let mut duplicated = 0usize;
    let mut missing = 0usize;
    let mut samples = Vec::with_capacity(pixels.len());

    for ((batch_id, sheet_id, device_id, pixel_id), scans) in pixels {
        let used: Vec<&Vec<&MeasurementRow>> = match basis {
            Basis::Forward => vec![&scans.forward],
            Basis::Reverse => vec![&scans.reverse],
            Basis::AverageFr => vec![&scans.forward, &scans.reverse],
        };

        let means: Option<Vec<f64>> = used.iter().map(|rows| scan_mean(rows)).collect();
        let Some(means) = means else {
            missing += 1;
            continue;
        };
        if used.iter().any(|rows| rows.len() > 1) {
            duplicated += 1;
        }
        let Some(pce) = mean(&means) else {
            missing += 1;
            continue;
        };

        samples.push(PixelSample {
            batch_id,
            sheet_id,
            device_id,
            pixel_id,
            pce,
            sources: used.iter().flat_map(|rows| rows.iter().copied()).collect(),
        });
    }

    if duplicated > 0 {
        log.info(format!(
            "Averaged duplicate scans for {} pixel(s)",
            duplicated
        ));
    }
    if missing > 0 {
        match basis {
            Basis::AverageFr => log.warning(format!(
                "{} unpaired pixel(s) excluded from average-fr basis (forward and reverse scans required)",
                missing
            )),
            _ => log.info(format!(
                "{} pixel(s) without a {} scan excluded",
                missing, basis
            )),
        }
    }

    samples
}
