//! Service layer: the analysis engine behind the HTTP handlers.
//!
//! Chart services are pure functions over a [`RecordSet`](crate::models::RecordSet).
//! Processing runs device selection and publishes export snapshots.

pub mod analysis_log;
pub mod baseline;
pub mod device_yield;
pub mod distributions;
pub mod exports;
pub mod processor;
pub mod repeatability;
pub mod selection;
pub mod statistics;

pub use analysis_log::{AnalysisLog, LogEntry, LogLevel};
pub use baseline::{BaselineSnapshot, BaselineStore};
pub use device_yield::{classify, compute_device_yield};
pub use distributions::compute_box_plot_data;
pub use exports::{ExportKind, ExportSnapshot, ExportStore, ExportTable};
pub use processor::process_file;
pub use repeatability::compute_iv_repeatability;
