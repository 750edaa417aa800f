//! Export tables of the most recent processing run.
//!
//! A run publishes both tables together as one immutable snapshot. Readers
//! clone the `Arc` under a short read lock, so a download sees either the
//! previous complete snapshot or the new one.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::Parameter;
use crate::services::selection::{SelectionOutcome, SelectionOptions};

/// Which export table to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Quick,
    Entire,
}

impl ExportKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportKind::Quick => "Quick_Data.csv",
            ExportKind::Entire => "Entire_Data.csv",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::Quick => write!(f, "quick"),
            ExportKind::Entire => write!(f, "entire"),
        }
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(ExportKind::Quick),
            "entire" => Ok(ExportKind::Entire),
            other => Err(format!(
                "unknown export '{}' (expected quick or entire)",
                other
            )),
        }
    }
}

/// A rectangular table of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Encode as CSV with a header line.
    pub fn to_csv(&self) -> AnalysisResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| AnalysisError::Export(e.to_string()))
    }
}

pub const QUICK_HEADERS: [&str; 12] = [
    "Rank",
    "Batch ID",
    "Sheet ID",
    "Devices mode",
    "Pixel choice (M)",
    "Method",
    "Basis",
    "Selected devices",
    "Selected pixels per device",
    "Total pixels used",
    "Combined mean PCE",
    "Combined SD PCE",
];

const ENTIRE_LEADING_HEADERS: [&str; 10] = [
    "Batch ID",
    "Sheet ID",
    "Device ID",
    "Pixel ID",
    "Scan Direction",
    "Basis",
    "Pixel choice (M)",
    "Method",
    "Selected (Yes/No)",
    "PCE_WORK",
];

pub fn entire_headers() -> Vec<String> {
    ENTIRE_LEADING_HEADERS
        .iter()
        .map(|h| h.to_string())
        .chain(Parameter::ALL.iter().map(|p| p.column().to_string()))
        .chain(["Date".to_string(), "Source Row".to_string()])
        .collect()
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One row per retained sheet, in rank order.
pub fn build_quick_table(outcome: &SelectionOutcome<'_>, options: &SelectionOptions) -> ExportTable {
    let rows = outcome
        .sheets
        .iter()
        .map(|sheet| {
            let devices: Vec<&str> = sheet.devices.iter().map(|d| d.device_id).collect();
            let pixels: Vec<String> = sheet
                .devices
                .iter()
                .map(|d| {
                    let ids: Vec<&str> = d.pixels.iter().map(|p| p.pixel_id).collect();
                    format!("{}: {}", d.device_id, ids.join(", "))
                })
                .collect();

            vec![
                sheet.rank.to_string(),
                sheet.batch_id.to_string(),
                sheet.sheet_id.to_string(),
                sheet.devices_mode.clone(),
                options.pixels_per_device.to_string(),
                options.method.to_string(),
                options.basis.to_string(),
                devices.join(", "),
                pixels.join("; "),
                sheet.total_pixels().to_string(),
                sheet.combined_mean.to_string(),
                sheet.combined_std.to_string(),
            ]
        })
        .collect();

    ExportTable {
        headers: QUICK_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

/// One row per source measurement behind every retained pixel.
///
/// With the average-fr basis both scans of a pixel appear, each carrying the
/// averaged working value.
pub fn build_entire_table(outcome: &SelectionOutcome<'_>, options: &SelectionOptions) -> ExportTable {
    let mut rows = Vec::new();

    for sheet in &outcome.sheets {
        for device in &sheet.devices {
            for pixel in &device.pixels {
                for source in &pixel.sources {
                    let mut row = vec![
                        sheet.batch_id.to_string(),
                        sheet.sheet_id.to_string(),
                        device.device_id.to_string(),
                        pixel.pixel_id.to_string(),
                        source
                            .scan_direction
                            .map(|d| d.code().to_string())
                            .unwrap_or_default(),
                        options.basis.to_string(),
                        options.pixels_per_device.to_string(),
                        options.method.to_string(),
                        "Yes".to_string(),
                        pixel.pce.to_string(),
                    ];
                    row.extend(Parameter::ALL.iter().map(|p| cell(source.value(*p))));
                    row.push(
                        source
                            .date
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_default(),
                    );
                    row.push(source.row_index.to_string());
                    rows.push(row);
                }
            }
        }
    }

    ExportTable {
        headers: entire_headers(),
        rows,
    }
}

/// Both export tables of one run.
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    /// Increases by one with every published run
    pub generation: u64,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub quick: ExportTable,
    pub entire: ExportTable,
}

impl ExportSnapshot {
    pub fn table(&self, kind: ExportKind) -> &ExportTable {
        match kind {
            ExportKind::Quick => &self.quick,
            ExportKind::Entire => &self.entire,
        }
    }
}

/// Latest published export snapshot (last writer wins).
#[derive(Clone, Default)]
pub struct ExportStore {
    latest: Arc<RwLock<Option<Arc<ExportSnapshot>>>>,
}

impl ExportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot.
    pub fn publish(&self, quick: ExportTable, entire: ExportTable) -> Arc<ExportSnapshot> {
        let mut slot = self.latest.write();
        let generation = slot.as_ref().map_or(1, |s| s.generation + 1);
        let snapshot = Arc::new(ExportSnapshot {
            generation,
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            quick,
            entire,
        });
        *slot = Some(Arc::clone(&snapshot));
        log::debug!(
            "Published export generation {} (run {})",
            generation,
            snapshot.run_id
        );
        snapshot
    }

    pub fn latest(&self) -> Option<Arc<ExportSnapshot>> {
        self.latest.read().clone()
    }
}
