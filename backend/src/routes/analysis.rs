use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::services::selection::{Basis, Method};

// =========================================================
// Processing options (as sent by the UI)
// =========================================================

/// Processing options exactly as received. Validation into
/// [`SelectionOptions`](crate::services::selection::SelectionOptions) happens
/// before any computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingOptions {
    pub sheets_mode: String,
    pub sheets_top_k: i64,
    pub devices_mode: String,
    pub devices_top_k: i64,
    pub pixels_per_device: i64,
    pub method: String,
    pub basis: String,
    pub use_all_sheets: bool,
    /// Comma-separated allow-list, used only when `use_all_sheets` is false
    pub sheet_ids: String,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            sheets_mode: "top-k".to_string(),
            sheets_top_k: 6,
            devices_mode: "top-k".to_string(),
            devices_top_k: 6,
            pixels_per_device: 3,
            method: "minimize-sd".to_string(),
            basis: "forward".to_string(),
            use_all_sheets: true,
            sheet_ids: String::new(),
        }
    }
}

// =========================================================
// Selection results
// =========================================================

/// The retained devices of one (batch, sheet) and their pooled statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResult {
    /// 1-based, best first across the whole result set
    pub rank: usize,
    pub batch_id: String,
    pub sheet_id: String,
    pub devices_mode: String,
    pub pixels_per_device: usize,
    /// Device ids of the retained set
    pub selected_devices: Vec<String>,
    /// Pixel ids used from each selected device
    pub selected_pixels: IndexMap<String, Vec<String>>,
    pub total_pixels_used: usize,
    #[serde(rename = "combinedMeanPCE")]
    pub combined_mean_pce: f64,
    #[serde(rename = "combinedStdPCE")]
    pub combined_std_pce: f64,
    pub method: Method,
    pub basis: Basis,
}

/// Counters shown next to the results table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSummary {
    pub sheets_processed: usize,
    pub devices_analyzed: usize,
    pub total_pixels: usize,
    pub entire_data_rows: usize,
}

/// Response of a processing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub status: String,
    pub message: String,
    pub summary: ProcessSummary,
    pub results: Vec<SelectionResult>,
    pub logs: Vec<String>,
    pub has_download_data: bool,
    /// Generation of the export snapshot this run published
    pub export_generation: u64,
}

/// Route path for processing an upload
pub const PROCESS_PATH: &str = "/analysis/process";
/// Route path for downloading an export table
pub const DOWNLOAD_PATH: &str = "/analysis/download/{kind}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ProcessingOptions =
            serde_json::from_str(r#"{"devicesTopK": 2, "method": "maximize-mean-pce"}"#).unwrap();
        assert_eq!(options.devices_top_k, 2);
        assert_eq!(options.method, "maximize-mean-pce");
        assert_eq!(options.sheets_top_k, 6);
        assert_eq!(options.basis, "forward");
        assert!(options.use_all_sheets);
    }

    #[test]
    fn test_selection_result_field_names() {
        let result = SelectionResult {
            rank: 1,
            batch_id: "B1".into(),
            sheet_id: "S1".into(),
            devices_mode: "Top-2".into(),
            pixels_per_device: 3,
            selected_devices: vec!["D1".into()],
            selected_pixels: IndexMap::from([("D1".to_string(), vec!["1".to_string()])]),
            total_pixels_used: 3,
            combined_mean_pce: 18.0,
            combined_std_pce: 0.5,
            method: Method::MaximizeMeanPce,
            basis: Basis::AverageFr,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["combinedMeanPCE"], 18.0);
        assert_eq!(json["combinedStdPCE"], 0.5);
        assert_eq!(json["totalPixelsUsed"], 3);
        assert_eq!(json["method"], "maximize-mean-pce");
        assert_eq!(json["basis"], "average-fr");
    }
}
