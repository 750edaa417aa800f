//! Baseline dataset served by the chart endpoints.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::api::BaselineSummary;
use crate::models::{RawRow, RecordSet, RowRejection};

/// An immutable, validated baseline.
#[derive(Debug, Clone, Default)]
pub struct BaselineSnapshot {
    pub records: RecordSet,
    pub rejections: Vec<RowRejection>,
    pub loaded_at: DateTime<Utc>,
}

impl BaselineSnapshot {
    /// Validate raw rows into a snapshot.
    pub fn from_raw(rows: &[RawRow]) -> Self {
        let outcome = RecordSet::load(rows);
        Self {
            records: outcome.records,
            rejections: outcome.rejections,
            loaded_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> BaselineSummary {
        BaselineSummary {
            accepted_rows: self.records.len(),
            rejected_rows: self.rejections.len(),
            batches: self
                .records
                .batches()
                .into_iter()
                .map(String::from)
                .collect(),
            loaded_at: self.loaded_at,
            logs: self.rejections.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Shared handle to the current baseline; replacing it swaps the `Arc`.
#[derive(Clone, Default)]
pub struct BaselineStore {
    current: Arc<RwLock<Arc<BaselineSnapshot>>>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, snapshot: BaselineSnapshot) -> Arc<BaselineSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Arc::clone(&snapshot);
        log::info!(
            "Baseline replaced: {} rows accepted, {} rejected",
            snapshot.records.len(),
            snapshot.rejections.len()
        );
        snapshot
    }

    pub fn current(&self) -> Arc<BaselineSnapshot> {
        Arc::clone(&self.current.read())
    }
}
