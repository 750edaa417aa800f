//! Public API surface for the backend.
//!
//! This file consolidates the DTO types returned by the service layer.
//! All types derive Serialize/Deserialize for JSON serialization.

pub use crate::routes::analysis::ProcessResponse;
pub use crate::routes::analysis::ProcessSummary;
pub use crate::routes::analysis::ProcessingOptions;
pub use crate::routes::analysis::SelectionResult;
pub use crate::routes::baseline::BaselineSummary;
pub use crate::routes::charts::BoxPlotData;
pub use crate::routes::charts::BoxPlotStatistic;
pub use crate::routes::charts::DailyRepeatability;
pub use crate::routes::charts::DeviceYieldData;
pub use crate::routes::charts::IvRepeatabilityData;
pub use crate::routes::charts::RepeatabilityPoint;
pub use crate::routes::charts::YieldStatus;

pub use crate::models::{MeasurementRow, Parameter, RawRow, ScanDirection};
pub use crate::services::exports::ExportKind;
pub use crate::services::selection::{Basis, Method};
