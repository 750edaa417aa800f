//! Validated options for device selection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::api::ProcessingOptions;
use crate::error::{AnalysisError, FieldIssue};

/// Objective used at every selection level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    MinimizeSd,
    MaximizeMeanPce,
}

impl Method {
    /// The quantity this method optimizes over a sample: population std or mean.
    pub fn score(self, values: &[f64]) -> Option<f64> {
        match self {
            Method::MinimizeSd => crate::services::statistics::population_std(values),
            Method::MaximizeMeanPce => crate::services::statistics::mean(values),
        }
    }

    /// Order two scores best-first.
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        match self {
            Method::MinimizeSd => a.total_cmp(&b),
            Method::MaximizeMeanPce => b.total_cmp(&a),
        }
    }

    /// Strict improvement; equal scores keep the incumbent.
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        self.compare(candidate, incumbent) == Ordering::Less
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::MinimizeSd => "minimize-sd",
            Method::MaximizeMeanPce => "maximize-mean-pce",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which scan-direction values feed the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Basis {
    Forward,
    Reverse,
    AverageFr,
}

impl Basis {
    pub fn as_str(self) -> &'static str {
        match self {
            Basis::Forward => "forward",
            Basis::Reverse => "reverse",
            Basis::AverageFr => "average-fr",
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep the best `k` candidates, or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    TopK(usize),
    SelectAll,
}

impl SelectionMode {
    /// Apply the mode to a best-first list.
    pub fn limit(self, available: usize) -> usize {
        match self {
            SelectionMode::TopK(k) => k.min(available),
            SelectionMode::SelectAll => available,
        }
    }

    /// Export label, e.g. `Top-6` or `Select All`.
    pub fn label(self) -> String {
        match self {
            SelectionMode::TopK(k) => format!("Top-{}", k),
            SelectionMode::SelectAll => "Select All".to_string(),
        }
    }
}

/// Options after validation; every field is known to be usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOptions {
    pub sheets: SelectionMode,
    pub devices: SelectionMode,
    pub pixels_per_device: usize,
    pub method: Method,
    pub basis: Basis,
    /// `None` keeps every sheet.
    pub sheet_allow_list: Option<Vec<String>>,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            sheets: SelectionMode::TopK(6),
            devices: SelectionMode::TopK(6),
            pixels_per_device: 3,
            method: Method::MinimizeSd,
            basis: Basis::Forward,
            sheet_allow_list: None,
        }
    }
}

/// Pixel counts a device may be asked to contribute.
pub const ALLOWED_PIXELS_PER_DEVICE: [i64; 2] = [3, 4];

fn parse_mode(
    field_mode: &str,
    raw_mode: &str,
    field_k: &str,
    raw_k: i64,
    issues: &mut Vec<FieldIssue>,
) -> Option<SelectionMode> {
    match raw_mode.trim().to_lowercase().as_str() {
        "top-k" | "topk" => {
            if raw_k < 1 {
                issues.push(FieldIssue::new(
                    field_k,
                    format!("must be at least 1 (got {})", raw_k),
                ));
                None
            } else {
                usize::try_from(raw_k).ok().map(SelectionMode::TopK)
            }
        }
        "select-all" | "all" => Some(SelectionMode::SelectAll),
        other => {
            issues.push(FieldIssue::new(
                field_mode,
                format!("unknown mode '{}' (expected top-k or select-all)", other),
            ));
            None
        }
    }
}

fn parse_method(raw: &str, issues: &mut Vec<FieldIssue>) -> Option<Method> {
    match raw.trim().to_lowercase().as_str() {
        "minimize-sd" => Some(Method::MinimizeSd),
        "maximize-mean-pce" => Some(Method::MaximizeMeanPce),
        other => {
            issues.push(FieldIssue::new(
                "method",
                format!(
                    "unknown method '{}' (expected minimize-sd or maximize-mean-pce)",
                    other
                ),
            ));
            None
        }
    }
}

fn parse_basis(raw: &str, issues: &mut Vec<FieldIssue>) -> Option<Basis> {
    match raw.trim().to_lowercase().as_str() {
        "forward" => Some(Basis::Forward),
        "reverse" => Some(Basis::Reverse),
        "average-fr" => Some(Basis::AverageFr),
        other => {
            issues.push(FieldIssue::new(
                "basis",
                format!(
                    "unknown basis '{}' (expected forward, reverse or average-fr)",
                    other
                ),
            ));
            None
        }
    }
}

impl TryFrom<&ProcessingOptions> for SelectionOptions {
    type Error = AnalysisError;

    /// Validate every field, reporting all problems at once.
    fn try_from(raw: &ProcessingOptions) -> Result<Self, Self::Error> {
        let mut issues = Vec::new();

        let sheets = parse_mode(
            "sheetsMode",
            &raw.sheets_mode,
            "sheetsTopK",
            raw.sheets_top_k,
            &mut issues,
        );
        let devices = parse_mode(
            "devicesMode",
            &raw.devices_mode,
            "devicesTopK",
            raw.devices_top_k,
            &mut issues,
        );

        if !ALLOWED_PIXELS_PER_DEVICE.contains(&raw.pixels_per_device) {
            issues.push(FieldIssue::new(
                "pixelsPerDevice",
                format!("must be 3 or 4 (got {})", raw.pixels_per_device),
            ));
        }

        let method = parse_method(&raw.method, &mut issues);
        let basis = parse_basis(&raw.basis, &mut issues);

        let sheet_allow_list = if raw.use_all_sheets {
            None
        } else {
            let ids: Vec<String> = raw
                .sheet_ids
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            (!ids.is_empty()).then_some(ids)
        };

        match (sheets, devices, method, basis) {
            (Some(sheets), Some(devices), Some(method), Some(basis)) if issues.is_empty() => {
                Ok(Self {
                    sheets,
                    devices,
                    pixels_per_device: raw.pixels_per_device as usize,
                    method,
                    basis,
                    sheet_allow_list,
                })
            }
            _ => Err(AnalysisError::ConfigurationInvalid(issues)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let options = SelectionOptions::try_from(&ProcessingOptions::default()).unwrap();
        assert_eq!(options, SelectionOptions::default());
    }

    #[test]
    fn test_invalid_fields_are_all_reported() {
        let raw = ProcessingOptions {
            sheets_top_k: 0,
            pixels_per_device: 5,
            method: "fastest".to_string(),
            basis: "sideways".to_string(),
            ..ProcessingOptions::default()
        };
        let err = SelectionOptions::try_from(&raw).unwrap_err();
        let fields: Vec<&str> = err
            .field_issues()
            .unwrap()
            .iter()
            .map(|i| i.field.as_str())
            .collect();
        assert_eq!(fields, vec!["sheetsTopK", "pixelsPerDevice", "method", "basis"]);
    }

    #[test]
    fn test_top_k_ignored_for_select_all() {
        let raw = ProcessingOptions {
            devices_mode: "select-all".to_string(),
            devices_top_k: 0,
            ..ProcessingOptions::default()
        };
        let options = SelectionOptions::try_from(&raw).unwrap();
        assert_eq!(options.devices, SelectionMode::SelectAll);
    }

    #[test]
    fn test_sheet_allow_list_parsing() {
        let raw = ProcessingOptions {
            use_all_sheets: false,
            sheet_ids: " S1, ,S3 ".to_string(),
            ..ProcessingOptions::default()
        };
        let options = SelectionOptions::try_from(&raw).unwrap();
        assert_eq!(
            options.sheet_allow_list,
            Some(vec!["S1".to_string(), "S3".to_string()])
        );

        let empty = ProcessingOptions {
            use_all_sheets: false,
            sheet_ids: "  ".to_string(),
            ..ProcessingOptions::default()
        };
        assert_eq!(SelectionOptions::try_from(&empty).unwrap().sheet_allow_list, None);
    }

    #[test]
    fn test_method_ordering() {
        assert!(Method::MinimizeSd.is_better(0.1, 0.2));
        assert!(!Method::MinimizeSd.is_better(0.2, 0.2));
        assert!(Method::MaximizeMeanPce.is_better(20.0, 19.0));
        assert!(!Method::MaximizeMeanPce.is_better(19.0, 19.0));
    }

    #[test]
    fn test_mode_limit_and_label() {
        assert_eq!(SelectionMode::TopK(2).limit(5), 2);
        assert_eq!(SelectionMode::TopK(9).limit(5), 5);
        assert_eq!(SelectionMode::SelectAll.limit(5), 5);
        assert_eq!(SelectionMode::TopK(6).label(), "Top-6");
        assert_eq!(SelectionMode::SelectAll.label(), "Select All");
    }
}
