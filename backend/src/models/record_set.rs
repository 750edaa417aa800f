//! Normalized in-memory view of an uploaded spreadsheet.
//!
//! Raw rows arrive as JSON objects keyed by spreadsheet header. Loading
//! resolves the headers, coerces values and splits the input into valid
//! [`MeasurementRow`]s and a rejection log. A bad row never aborts the load.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::measurement::{normalize_key, MeasurementRow, Parameter, ParameterValues, ScanDirection};

/// One row as handed over by the upload/parsing collaborator.
pub type RawRow = serde_json::Map<String, Value>;

/// Why a raw row was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRejection {
    pub row_index: usize,
    pub reason: String,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {} rejected: {}", self.row_index, self.reason)
    }
}

/// Result of [`RecordSet::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub records: RecordSet,
    pub rejections: Vec<RowRejection>,
}

/// Fields usable as grouping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupField {
    Batch,
    Sheet,
    Device,
    Parameter,
    Date,
}

/// One component of a composite grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Text(String),
    Parameter(Parameter),
    Date(NaiveDate),
}

/// Composite grouping key, one part per requested [`GroupField`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(pub Vec<KeyPart>);

impl GroupKey {
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }
}

/// Valid measurement rows in upload order.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    rows: Vec<MeasurementRow>,
}

impl RecordSet {
    /// Wrap already-validated rows.
    pub fn from_rows(rows: Vec<MeasurementRow>) -> Self {
        Self { rows }
    }

    /// Validate and normalize raw rows.
    ///
    /// A row is rejected when Batch ID, Sheet ID or Pixel ID is missing, or
    /// when PCE is missing or not numeric.
    pub fn load(raw_rows: &[RawRow]) -> LoadOutcome {
        let mut rows = Vec::with_capacity(raw_rows.len());
        let mut rejections = Vec::new();

        for (row_index, raw) in raw_rows.iter().enumerate() {
            match parse_row(row_index, raw) {
                Ok(row) => rows.push(row),
                Err(reason) => {
                    log::debug!("Row {} rejected: {}", row_index, reason);
                    rejections.push(RowRejection { row_index, reason });
                }
            }
        }

        LoadOutcome {
            records: Self { rows },
            rejections,
        }
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct batch ids in order of first appearance.
    pub fn batches(&self) -> Vec<&str> {
        let mut seen: IndexMap<&str, ()> = IndexMap::new();
        for row in &self.rows {
            seen.entry(row.batch_id.as_str()).or_insert(());
        }
        seen.into_keys().collect()
    }

    /// All values of `parameter` across the record set, in row order.
    pub fn values(&self, parameter: Parameter) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.value(parameter)).collect()
    }

    /// Group rows by a composite key.
    ///
    /// Keys appear in first-seen order and rows keep their upload order inside
    /// each group. Grouping by [`GroupField::Parameter`] places a row in one
    /// group per parameter it carries. Rows lacking a device or date are left
    /// out of groupings that use those fields.
    pub fn group_by(&self, fields: &[GroupField]) -> IndexMap<GroupKey, Vec<&MeasurementRow>> {
        let mut groups: IndexMap<GroupKey, Vec<&MeasurementRow>> = IndexMap::new();

        for row in &self.rows {
            for key in keys_for(row, fields) {
                groups.entry(key).or_default().push(row);
            }
        }

        groups
    }
}

fn keys_for(row: &MeasurementRow, fields: &[GroupField]) -> Vec<GroupKey> {
    let mut keys = vec![Vec::with_capacity(fields.len())];

    for field in fields {
        let part = match field {
            GroupField::Batch => KeyPart::Text(row.batch_id.clone()),
            GroupField::Sheet => KeyPart::Text(row.sheet_id.clone()),
            GroupField::Device => match &row.device_id {
                Some(device) => KeyPart::Text(device.clone()),
                None => return Vec::new(),
            },
            GroupField::Date => match row.date {
                Some(date) => KeyPart::Date(date),
                None => return Vec::new(),
            },
            GroupField::Parameter => {
                let present: Vec<Parameter> = Parameter::ALL
                    .into_iter()
                    .filter(|p| row.value(*p).is_some())
                    .collect();
                keys = keys
                    .into_iter()
                    .flat_map(|prefix| {
                        present.iter().map(move |p| {
                            let mut key = prefix.clone();
                            key.push(KeyPart::Parameter(*p));
                            key
                        })
                    })
                    .collect();
                continue;
            }
        };
        for key in &mut keys {
            key.push(part.clone());
        }
    }

    keys.into_iter().map(GroupKey).collect()
}

/// Header roles other than parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Batch,
    Sheet,
    Device,
    Pixel,
    Direction,
    Date,
    Value(Parameter),
}

fn classify_header(header: &str) -> Option<Column> {
    let key = normalize_key(header);
    match key.as_str() {
        "batchid" | "batch" => return Some(Column::Batch),
        "sheetid" | "sheet" => return Some(Column::Sheet),
        "deviceid" | "device" => return Some(Column::Device),
        "pixelid" | "pixel" => return Some(Column::Pixel),
        "scandirection" | "direction" | "scan" => return Some(Column::Direction),
        "timestamp" => return Some(Column::Date),
        _ => {}
    }
    if key.contains("date") {
        return Some(Column::Date);
    }
    Parameter::from_column(header).map(Column::Value)
}

fn parse_row(row_index: usize, raw: &RawRow) -> Result<MeasurementRow, String> {
    let mut batch = None;
    let mut sheet = None;
    let mut device = None;
    let mut pixel = None;
    let mut direction = None;
    let mut date = None;
    let mut pce_cell = None;
    let mut values = ParameterValues::default();

    for (header, cell) in raw {
        match classify_header(header) {
            Some(Column::Batch) => batch = coerce_identifier(cell),
            Some(Column::Sheet) => sheet = coerce_identifier(cell),
            Some(Column::Device) => device = coerce_identifier(cell),
            Some(Column::Pixel) => pixel = coerce_identifier(cell),
            Some(Column::Direction) => {
                direction = coerce_identifier(cell).and_then(|s| s.parse::<ScanDirection>().ok())
            }
            Some(Column::Date) => date = coerce_date(cell),
            Some(Column::Value(Parameter::Pce)) => pce_cell = Some(cell),
            Some(Column::Value(p)) => {
                if let Some(v) = coerce_number(cell) {
                    values.set(p, v);
                }
            }
            None => {}
        }
    }

    let mut missing = Vec::new();
    if batch.is_none() {
        missing.push("Batch ID");
    }
    if sheet.is_none() {
        missing.push("Sheet ID");
    }
    if pixel.is_none() {
        missing.push("Pixel ID");
    }
    if !missing.is_empty() {
        return Err(format!("missing {}", missing.join(", ")));
    }

    let pce = match pce_cell {
        None | Some(Value::Null) => return Err("missing PCE (%)".to_string()),
        Some(cell) => coerce_number(cell)
            .ok_or_else(|| format!("non-numeric PCE (%) value {}", cell))?,
    };

    Ok(MeasurementRow {
        row_index,
        batch_id: batch.unwrap_or_default(),
        sheet_id: sheet.unwrap_or_default(),
        device_id: device,
        pixel_id: pixel.unwrap_or_default(),
        scan_direction: direction,
        pce,
        values,
        date,
    })
}

/// Identifiers may be strings or numbers; `1.0` becomes `"1"`.
fn coerce_identifier(cell: &Value) -> Option<String> {
    match cell {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i.to_string()),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", f as i64)),
            (None, Some(f)) => Some(f.to_string()),
            _ => None,
        },
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers and numeric-looking strings (a trailing `%` is allowed).
fn coerce_number(cell: &Value) -> Option<f64> {
    let value = match cell {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%m/%d/%Y %H:%M:%S"];

/// ISO dates/datetimes, `MM/DD/YYYY`, or Excel serial day numbers.
fn coerce_date(cell: &Value) -> Option<NaiveDate> {
    match cell {
        Value::Number(n) => {
            let serial = n.as_f64()?;
            if !(1.0..=2_958_465.0).contains(&serial) {
                return None;
            }
            let origin = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            origin.checked_add_signed(Duration::days(serial.floor() as i64))
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
                return Some(dt.date_naive());
            }
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok().map(|dt| dt.date()))
                .or_else(|| {
                    DATE_FORMATS
                        .iter()
                        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                })
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "record_set_tests.rs"]
mod record_set_tests;
