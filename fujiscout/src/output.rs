//! Destinations for match records.
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{ScanError, ScanResult};
use crate::results::MatchRecord;

/// Receives match records as the engine produces them
pub trait ResultSink {
    fn append(&mut self, record: &MatchRecord) -> ScanResult<()>;
}

/// Appends records to a text file, one line each.
///
/// The file is opened in append mode and created if missing; it is never
/// truncated. Every line is flushed and synced before `append` returns so that
/// results survive a crash right after.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> ScanResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScanError::output(&path, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ScanError::output(&path, e))?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for FileSink {
    fn append(&mut self, record: &MatchRecord) -> ScanResult<()> {
        let line = format!("{}\n", record.to_output_line());
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data())
            .map_err(|e| ScanError::output(&self.path, e))
    }
}

/// Collects records in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<MatchRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MatchRecord> {
        self.records
    }
}

impl ResultSink for MemorySink {
    fn append(&mut self, record: &MatchRecord) -> ScanResult<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::{parse_file_name, NameFormat};
    use tempfile::tempdir;

    fn record(line: &str) -> MatchRecord {
        let name = "20240115093000123_1362-00394_NXTIIIc17.DAT";
        let info = parse_file_name(name, NameFormat::Timestamped).unwrap();
        MatchRecord::new(name, &info, line)
    }

    #[test]
    fn test_file_sink_appends_and_never_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.txt");
        std::fs::write(&path, "previous run\n").unwrap();

        let mut sink = FileSink::open(&path).unwrap();
        sink.append(&record("first")).unwrap();
        drop(sink);

        let mut sink = FileSink::open(&path).unwrap();
        sink.append(&record("second")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "previous run");
        assert!(lines[1].ends_with(",first"));
        assert!(lines[2].ends_with(",second"));
    }

    #[test]
    fn test_file_sink_creates_missing_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        let mut sink = FileSink::open(&path).unwrap();
        sink.append(&record("x")).unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn test_file_sink_open_failure_is_output_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for appending.
        let err = FileSink::open(dir.path()).unwrap_err();
        assert!(matches!(err, ScanError::Output { .. }));
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        sink.append(&record("a")).unwrap();
        sink.append(&record("b")).unwrap();
        assert_eq!(sink.records().len(), 2);

        let records = sink.into_records();
        assert_eq!(records[0].raw_line, "a");
        assert_eq!(records[1].raw_line, "b");
    }
}
