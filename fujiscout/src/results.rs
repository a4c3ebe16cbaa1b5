//! Scan result types.
//!
//! A [`MatchRecord`] is produced for every matching line and handed straight
//! to the result sink; the output file is the authoritative record of a scan.
//! [`ScanSummary`] carries the counters of one run and, when asked for, a copy
//! of the records it produced.
use std::fmt;
use std::time::Duration;

use crate::name::{FileNameInfo, FileTimestamp};

/// One matching line annotated with metadata from its file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// Base name of the file the line came from
    pub source_file: String,
    /// Capture time from the file name, if the name format carries one
    pub timestamp: Option<FileTimestamp>,
    pub serial_number: String,
    pub machine_number: String,
    /// The matching line without its line terminator
    pub raw_line: String,
}

impl MatchRecord {
    pub fn new(source_file: impl Into<String>, info: &FileNameInfo, raw_line: &str) -> Self {
        Self {
            source_file: source_file.into(),
            timestamp: info.timestamp,
            serial_number: info.serial_number.clone(),
            machine_number: info.machine_number.clone(),
            raw_line: raw_line.to_string(),
        }
    }

    /// Formats the record as one output line, without a trailing newline:
    /// `"<file>","<timestamp>","<serial>","<machine>",<trimmed line>`.
    ///
    /// The last field is written as-is and may itself contain commas or quotes.
    pub fn to_output_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\",\"", self.source_file)?;
        if let Some(ts) = &self.timestamp {
            write!(f, "{}", ts)?;
        }
        write!(
            f,
            "\",\"{}\",\"{}\",{}",
            self.serial_number,
            self.machine_number,
            self.raw_line.trim()
        )
    }
}

/// Counters and outcome of one scan run
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Number of matching lines written during this run
    pub total_matches: usize,
    /// Folders fully scanned and removed from the work queue
    pub folders_completed: usize,
    /// Files seen in folder listings
    pub files_listed: usize,
    /// Files whose name matched a pattern and were read
    pub files_searched: usize,
    /// Files skipped because of a recoverable error
    pub files_skipped: usize,
    /// Whether the run stopped because cancellation was requested
    pub cancelled: bool,
    pub elapsed: Duration,
    /// Records of this run, only filled when collection is enabled
    pub records: Vec<MatchRecord>,
}

impl ScanSummary {
    /// Creates a new empty summary
    pub fn new() -> Self {
        Default::default()
    }

    /// Counts a match and optionally keeps a copy of it
    pub fn record_match(&mut self, record: &MatchRecord, keep: bool) {
        self.total_matches += 1;
        if keep {
            self.records.push(record.clone());
        }
    }

    /// The final status line reported to observers
    pub fn status_message(&self) -> String {
        if self.cancelled {
            format!("Search stopped. Total matches found: {}", self.total_matches)
        } else {
            format!(
                "Search completed. Total matches found: {}",
                self.total_matches
            )
        }
    }
}
