use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::matcher::WordMatcher;
use super::processor::FileProcessor;
use crate::cancel::CancellationToken;
use crate::config::{EncodingMode, ScanConfig, ScanRequest};
use crate::errors::{ScanError, ScanResult};
use crate::filters::PathFilter;
use crate::name::{parse_file_name, FileNameInfo, NameFormat};
use crate::output::{FileSink, ResultSink};
use crate::progress::ScanObserver;
use crate::queue::WorkQueue;
use crate::results::{MatchRecord, ScanSummary};

/// Engine settings that are not part of the scan request itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub name_format: NameFormat,
    pub case_sensitive: bool,
    pub encoding_mode: EncodingMode,
    pub collect_records: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            name_format: NameFormat::default(),
            case_sensitive: true,
            encoding_mode: EncodingMode::default(),
            collect_records: false,
        }
    }
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            name_format: config.name_format,
            case_sensitive: config.case_sensitive,
            encoding_mode: config.encoding_mode,
            collect_records: config.collect_records,
        }
    }
}

/// Folder and file of the record being built
struct FileContext<'a> {
    path: &'a Path,
    name: &'a str,
}

/// Drains a work queue folder by folder, writing matches to a sink.
///
/// Folders are processed one at a time and files one at a time. A folder is
/// removed from the queue only after all of its files were read, so a
/// cancelled run leaves the current folder queued for the next one.
#[derive(Debug)]
pub struct ScanEngine {
    request: ScanRequest,
    filter: PathFilter,
    processor: FileProcessor,
    options: ScanOptions,
}

impl ScanEngine {
    pub fn new(request: ScanRequest, options: ScanOptions) -> ScanResult<Self> {
        let filter = PathFilter::new(&request.patterns, options.case_sensitive)?;
        let matcher = WordMatcher::new(request.words.clone());
        let processor = FileProcessor::new(matcher, options.encoding_mode);
        Ok(Self {
            request,
            filter,
            processor,
            options,
        })
    }

    /// Runs until the queue is empty or `cancel` is set.
    ///
    /// Per-file problems are logged and skipped; queue persistence and output
    /// failures abort the run.
    pub fn run<S, O>(
        &self,
        queue: &WorkQueue,
        sink: &mut S,
        observer: &mut O,
        cancel: &CancellationToken,
    ) -> ScanResult<ScanSummary>
    where
        S: ResultSink + ?Sized,
        O: ScanObserver + ?Sized,
    {
        info!(
            "Starting scan with words: {:?} and patterns: {:?}",
            self.processor.matcher().words(),
            self.request.patterns
        );
        let started = Instant::now();
        let mut summary = ScanSummary::new();

        loop {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let Some(folder) = queue.peek_front()? else {
                queue.dispose()?;
                break;
            };

            let message = format!("Searching in folder: {}", folder.display());
            info!("{}", message);
            observer.on_progress(&message);

            if !self.scan_folder(&folder, sink, observer, cancel, &mut summary)? {
                summary.cancelled = true;
                break;
            }

            queue.commit_front()?;
            summary.folders_completed += 1;
        }

        summary.elapsed = started.elapsed();
        if summary.cancelled {
            info!("Search stopped by user.");
        }
        let message = summary.status_message();
        info!(
            "{} ({} folder(s), {} file(s) searched, {} skipped)",
            message, summary.folders_completed, summary.files_searched, summary.files_skipped
        );
        observer.on_progress(&message);

        Ok(summary)
    }

    /// Scans the files directly inside `folder`.
    ///
    /// Returns `false` if cancellation interrupted the folder.
    fn scan_folder<S, O>(
        &self,
        folder: &Path,
        sink: &mut S,
        observer: &mut O,
        cancel: &CancellationToken,
        summary: &mut ScanSummary,
    ) -> ScanResult<bool>
    where
        S: ResultSink + ?Sized,
        O: ScanObserver + ?Sized,
    {
        let files = match list_files(folder) {
            Ok(files) => files,
            Err(e) => {
                // The folder vanished or is unreadable; nothing left to scan in it.
                warn!("Skipping folder: {}", e);
                observer.on_progress(&format!("Skipping folder: {}", folder.display()));
                return Ok(true);
            }
        };
        debug!("Found {} files in {}", files.len(), folder.display());
        summary.files_listed += files.len();

        let total_files = files.len();
        for (index, (path, name)) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(false);
            }

            observer.on_progress(&format!(
                "Searching in file: {} ({}/{})",
                name,
                index + 1,
                total_files
            ));

            if !self.filter.matches(name) {
                continue;
            }
            summary.files_searched += 1;

            let file = FileContext { path, name };
            match self.scan_file(&file, sink, observer, cancel, summary) {
                Ok(true) => {}
                Ok(false) => return Ok(false),
                Err(e) if e.is_recoverable() => {
                    warn!("Error processing file {}: {}", path.display(), e);
                    summary.files_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(true)
    }

    /// Returns `false` if cancellation interrupted the file.
    fn scan_file<S, O>(
        &self,
        file: &FileContext<'_>,
        sink: &mut S,
        observer: &mut O,
        cancel: &CancellationToken,
        summary: &mut ScanSummary,
    ) -> ScanResult<bool>
    where
        S: ResultSink + ?Sized,
        O: ScanObserver + ?Sized,
    {
        debug!("Processing file: {}", file.path.display());

        // The name is parsed on the first hit so that non-matching files with
        // odd names cost nothing.
        let mut name_info: Option<FileNameInfo> = None;

        let outcome = self.processor.process_file(file.path, cancel, |line| {
            let info = match name_info.take() {
                Some(info) => info,
                None => parse_file_name(file.name, self.options.name_format)?,
            };

            let record = MatchRecord::new(file.name, &info, line);
            name_info = Some(info);

            sink.append(&record)?;
            summary.record_match(&record, self.options.collect_records);
            observer.on_match(summary.total_matches);
            Ok(ControlFlow::Continue(()))
        })?;

        Ok(!outcome.cancelled)
    }
}

/// Lists the regular files directly inside `folder`, in listing order
fn list_files(folder: &Path) -> ScanResult<Vec<(PathBuf, String)>> {
    let entries = fs::read_dir(folder).map_err(|e| ScanError::file_access(folder, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", folder.display(), e);
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name() {
            let name = name.to_string_lossy().into_owned();
            files.push((path, name));
        }
    }
    Ok(files)
}

/// Runs a complete scan from configuration.
///
/// Validates `config`, seeds the work queue (or picks up the existing one
/// when `resume` is set), opens the output file for appending and drains the
/// queue.
pub fn scan<O>(
    config: &ScanConfig,
    observer: &mut O,
    cancel: &CancellationToken,
) -> ScanResult<ScanSummary>
where
    O: ScanObserver + ?Sized,
{
    let request = config.validate()?;
    let queue = WorkQueue::new(&config.queue_path);

    if config.resume && queue.exists() {
        let pending = queue.len()?;
        info!(
            "Resuming work queue {} with {} folder(s) left",
            queue.path().display(),
            pending
        );
        observer.on_progress(&format!("Resuming with {} folder(s) left", pending));
    } else {
        let seeded = queue.seed(&request.root_path, config.seed_mode)?;
        observer.on_progress(&format!("Queued {} folder(s) to search", seeded));
    }

    let mut sink = FileSink::open(&request.output_path)?;
    let engine = ScanEngine::new(request, ScanOptions::from(config))?;
    engine.run(&queue, &mut sink, observer, cancel)
}
