//! Human-readable log of one analysis run.
//!
//! Every entry is also forwarded to the `log` facade so the server output and
//! the log returned to the caller tell the same story.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// Line shown to the user; warnings and errors carry a prefix.
    pub fn line(&self) -> String {
        match self.level {
            LogLevel::Info | LogLevel::Success => self.message.clone(),
            LogLevel::Warning => format!("Warning: {}", self.message),
            LogLevel::Error => format!("ERROR: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Ordered log of a single run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisLog {
    entries: Vec<LogEntry>,
}

impl AnalysisLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a log entry.
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => log::info!("{}", message),
            LogLevel::Warning => log::warn!("{}", message),
            LogLevel::Error => log::error!("{}", message),
        }
        self.entries.push(LogEntry {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    pub fn has_warnings(&self) -> bool {
        self.entries.iter().any(|e| e.level == LogLevel::Warning)
    }

    pub fn into_lines(self) -> Vec<String> {
        self.entries.iter().map(LogEntry::line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order_and_prefixes() {
        let mut log = AnalysisLog::new();
        log.info("Loaded 10 rows");
        log.warning("Row 3 rejected: missing Batch ID");
        log.error("Nothing to export");
        log.success("Done");

        assert!(log.has_warnings());
        assert_eq!(
            log.into_lines(),
            vec![
                "Loaded 10 rows",
                "Warning: Row 3 rejected: missing Batch ID",
                "ERROR: Nothing to export",
                "Done",
            ]
        );
    }

    #[test]
    fn test_info_and_success_are_not_warnings() {
        let mut log = AnalysisLog::new();
        log.info("Loaded 10 rows");
        log.success("Done");
        assert!(!log.has_warnings());
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&LogLevel::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
