//! Processing of one uploaded dataset: validate, select, export.

use crate::api::{ProcessResponse, ProcessSummary, ProcessingOptions};
use crate::config::AnalysisSettings;
use crate::error::AnalysisResult;
use crate::models::{RawRow, RecordSet};
use crate::services::analysis_log::AnalysisLog;
use crate::services::exports::{build_entire_table, build_quick_table, ExportStore};
use crate::services::selection::{select, SelectionOptions};

/// Run device selection over `raw_rows` and publish the export tables.
///
/// Options are validated before anything else; an invalid configuration is
/// the only error. Rejected rows and empty selections are reported in the
/// response log.
pub fn process_file(
    raw_rows: &[RawRow],
    raw_options: &ProcessingOptions,
    settings: &AnalysisSettings,
    exports: &ExportStore,
) -> AnalysisResult<ProcessResponse> {
    let options = SelectionOptions::try_from(raw_options)?;
    let mut log = AnalysisLog::new();

    log.info(format!("Received {} row(s)", raw_rows.len()));
    let loaded = RecordSet::load(raw_rows);
    for rejection in &loaded.rejections {
        log.warning(rejection.to_string());
    }
    if loaded.records.is_empty() && !raw_rows.is_empty() {
        log.error("No valid rows after validation");
    } else {
        log.success(format!(
            "✓ Loaded {} valid row(s), {} rejected",
            loaded.records.len(),
            loaded.rejections.len()
        ));
    }

    if !raw_options.use_all_sheets && options.sheet_allow_list.is_none() {
        log.info("Sheet allow-list is empty; keeping all sheets");
    }

    let outcome = select(&loaded.records, &options, settings.combination_limit, &mut log);
    let results = outcome.results(&options);

    let quick = build_quick_table(&outcome, &options);
    let entire = build_entire_table(&outcome, &options);
    let summary = ProcessSummary {
        sheets_processed: results.len(),
        devices_analyzed: outcome.devices_selected(),
        total_pixels: outcome.total_pixels(),
        entire_data_rows: entire.len(),
    };

    let message = if results.is_empty() {
        log.warning("No qualifying data: no sheet produced a valid selection");
        "No qualifying data for the selected options".to_string()
    } else if log.has_warnings() {
        "Processing completed with warnings; see logs".to_string()
    } else {
        "Processing completed successfully!".to_string()
    };

    let snapshot = exports.publish(quick, entire);
    log.success(format!(
        "✓ Analysis completed; download data stored (generation {})",
        snapshot.generation
    ));

    Ok(ProcessResponse {
        status: "success".to_string(),
        message,
        summary,
        has_download_data: !results.is_empty(),
        results,
        logs: log.into_lines(),
        export_generation: snapshot.generation,
    })
}
