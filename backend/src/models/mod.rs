//! Domain model for uploaded IV-curve measurements.

pub mod measurement;
pub mod record_set;

pub use measurement::{MeasurementRow, Parameter, ParameterValues, ScanDirection};
pub use record_set::{GroupField, GroupKey, KeyPart, LoadOutcome, RawRow, RecordSet, RowRejection};
