use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::ops::ControlFlow;
use std::path::Path;
use tracing::{trace, warn};

use super::matcher::WordMatcher;
use crate::cancel::CancellationToken;
use crate::config::EncodingMode;
use crate::errors::{ScanError, ScanResult};

const BUFFER_CAPACITY: usize = 65536;
const LINE_CAPACITY: usize = 256;

/// Helper function to decode one line according to encoding mode
fn decode_line<'a>(
    bytes: &'a [u8],
    path: &Path,
    encoding_mode: EncodingMode,
) -> ScanResult<Cow<'a, str>> {
    match encoding_mode {
        EncodingMode::FailFast => match std::str::from_utf8(bytes) {
            Ok(valid_str) => Ok(Cow::Borrowed(valid_str)),
            Err(_) => {
                // Only the error path pays for the copy needed by FromUtf8Error.
                let from_utf8_err = match String::from_utf8(bytes.to_vec()) {
                    Ok(s) => return Ok(Cow::Owned(s)),
                    Err(e) => e,
                };
                Err(ScanError::encoding_error(path, from_utf8_err))
            }
        },
        EncodingMode::Lossy => Ok(String::from_utf8_lossy(bytes)),
    }
}

/// Reads one line into `buf` without its terminator.
///
/// A line ends at `\n`, `\r\n` or a lone `\r`. Returns the number of bytes
/// consumed, 0 at end of input.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    let mut consumed = 0;
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(consumed);
        }

        match available.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(i) => {
                let ends_with_cr = available[i] == b'\r';
                buf.extend_from_slice(&available[..i]);
                reader.consume(i + 1);
                consumed += i + 1;

                // The `\n` of a `\r\n` pair may sit in the next buffer
                if ends_with_cr && reader.fill_buf()?.first() == Some(&b'\n') {
                    reader.consume(1);
                    consumed += 1;
                }
                return Ok(consumed);
            }
            None => {
                let len = available.len();
                buf.extend_from_slice(available);
                reader.consume(len);
                consumed += len;
            }
        }
    }
}

/// What happened while reading one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileOutcome {
    pub lines_read: usize,
    pub matched_lines: usize,
    /// Reading stopped because cancellation was requested
    pub cancelled: bool,
}

/// Reads files line by line and reports lines that contain a target word
#[derive(Debug, Clone)]
pub struct FileProcessor {
    matcher: WordMatcher,
    encoding_mode: EncodingMode,
}

impl FileProcessor {
    /// Creates a new FileProcessor with the given word matcher
    pub fn new(matcher: WordMatcher, encoding_mode: EncodingMode) -> Self {
        Self {
            matcher,
            encoding_mode,
        }
    }

    pub fn matcher(&self) -> &WordMatcher {
        &self.matcher
    }

    /// Reads `path` line by line, calling `on_match` for every matching line.
    ///
    /// Cancellation is checked before each line. `on_match` receives the line
    /// without its terminator and may stop the file early by returning
    /// `ControlFlow::Break`. Errors returned by `on_match` are passed through.
    pub fn process_file<F>(
        &self,
        path: &Path,
        cancel: &CancellationToken,
        mut on_match: F,
    ) -> ScanResult<FileOutcome>
    where
        F: FnMut(&str) -> ScanResult<ControlFlow<()>>,
    {
        trace!("Processing file: {}", path.display());

        let file = File::open(path).map_err(|e| ScanError::file_access(path, e))?;
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut buf = Vec::with_capacity(LINE_CAPACITY);
        let mut outcome = FileOutcome::default();
        let mut replaced_invalid = false;

        loop {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            buf.clear();
            let read =
                read_line(&mut reader, &mut buf).map_err(|e| ScanError::file_access(path, e))?;
            if read == 0 {
                break;
            }
            outcome.lines_read += 1;

            let line = decode_line(&buf, path, self.encoding_mode)?;
            if matches!(line, Cow::Owned(_)) && self.encoding_mode == EncodingMode::Lossy {
                replaced_invalid = true;
            }

            if !self.matcher.is_match(&line) {
                continue;
            }
            outcome.matched_lines += 1;
            trace!(
                "Line {} of {} matched",
                outcome.lines_read,
                path.display()
            );

            if on_match(&line)?.is_break() {
                break;
            }
        }

        if replaced_invalid {
            warn!("Invalid UTF-8 replaced in file: {}", path.display());
        }

        Ok(outcome)
    }
}
