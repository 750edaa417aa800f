use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of replacing the baseline dataset used by the chart endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineSummary {
    pub accepted_rows: usize,
    pub rejected_rows: usize,
    pub batches: Vec<String>,
    pub loaded_at: DateTime<Utc>,
    pub logs: Vec<String>,
}

/// Route path for the baseline dataset
pub const BASELINE_PATH: &str = "/baseline";
