//! Parsing of machine log file names.
//!
//! Log files carry their metadata in the base name, split on `_`. Two layouts
//! exist in the field and a deployment picks one of them through
//! [`NameFormat`]:
//!
//! - [`NameFormat::Timestamped`]:
//!   `20240115093000123_1362-00394_NXTIIIc17.DAT`. The first segment is the
//!   capture time, the last is the machine, everything in between is the
//!   serial number.
//! - [`NameFormat::Plain`]: `log_1362_00394_NXTIIIc17.DAT`. No timestamp; the
//!   serial number is made of the middle segments of a 4 or 5 segment name.
//!
//! The two layouts are never guessed from each other.
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{ScanError, ScanResult};

const TIMESTAMP_MIN_LEN: usize = 17;
const TIMESTAMP_MAX_LEN: usize = 20;
/// `YYYYMMDDHHmmss`
const TIMESTAMP_SECONDS_LEN: usize = 14;

/// Which file name layout the scanned files follow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameFormat {
    /// `<timestamp>_<serial...>_<machine>.<ext>`
    #[default]
    Timestamped,
    /// `<prefix>_<serial>_<serial>[_<serial>]_<machine>.<ext>`
    Plain,
}

impl std::str::FromStr for NameFormat {
    type Err = ScanError;

    fn from_str(s: &str) -> ScanResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamped" => Ok(Self::Timestamped),
            "plain" => Ok(Self::Plain),
            other => Err(ScanError::config_error(format!(
                "Unknown name format '{}' (expected timestamped or plain)",
                other
            ))),
        }
    }
}

/// Capture time encoded in a file name, remembering how many fractional
/// digits the name carried so it can be printed back the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimestamp {
    datetime: NaiveDateTime,
    fraction_digits: u32,
}

impl FileTimestamp {
    /// Parses `YYYYMMDDHHmmssF...` with 3 to 6 fractional digits.
    pub fn parse(raw: &str) -> Option<Self> {
        if !(TIMESTAMP_MIN_LEN..=TIMESTAMP_MAX_LEN).contains(&raw.len())
            || !raw.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let field = |range: std::ops::Range<usize>| raw[range].parse::<u32>().ok();
        let year = raw[0..4].parse::<i32>().ok()?;
        let month = field(4..6)?;
        let day = field(6..8)?;
        let hour = field(8..10)?;
        let minute = field(10..12)?;
        let second = field(12..14)?;

        let fraction = &raw[TIMESTAMP_SECONDS_LEN..];
        let fraction_digits = fraction.len() as u32;
        let nanos = fraction.parse::<u32>().ok()? * 10u32.pow(9 - fraction_digits);

        let datetime = NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_nano_opt(hour, minute, second, nanos)?;

        Some(Self {
            datetime,
            fraction_digits,
        })
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn fraction_digits(&self) -> u32 {
        self.fraction_digits
    }
}

impl fmt::Display for FileTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fraction = self.datetime.nanosecond() / 10u32.pow(9 - self.fraction_digits);
        write!(
            f,
            "{}.{:0width$}",
            self.datetime.format("%Y-%m-%d %H:%M:%S"),
            fraction,
            width = self.fraction_digits as usize
        )
    }
}

/// Metadata extracted from a log file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameInfo {
    pub timestamp: Option<FileTimestamp>,
    pub serial_number: String,
    pub machine_number: String,
}

/// Parses a file's base name according to `format`.
pub fn parse_file_name(file_name: &str, format: NameFormat) -> ScanResult<FileNameInfo> {
    let segments: Vec<&str> = file_name.split('_').collect();
    match format {
        NameFormat::Plain => parse_plain(file_name, &segments),
        NameFormat::Timestamped => parse_timestamped(file_name, &segments),
    }
}

fn parse_plain(file_name: &str, segments: &[&str]) -> ScanResult<FileNameInfo> {
    match segments.len() {
        4 | 5 => {
            let last = segments.len() - 1;
            Ok(FileNameInfo {
                timestamp: None,
                serial_number: segments[1..last].join("_"),
                machine_number: strip_extension(segments[last]).to_string(),
            })
        }
        n => Err(ScanError::malformed_name(
            file_name,
            format!("expected 4 or 5 segments, found {}", n),
        )),
    }
}

fn parse_timestamped(file_name: &str, segments: &[&str]) -> ScanResult<FileNameInfo> {
    if segments.len() < 3 {
        return Err(ScanError::malformed_name(
            file_name,
            format!("expected at least 3 segments, found {}", segments.len()),
        ));
    }

    let timestamp = FileTimestamp::parse(segments[0]).ok_or_else(|| {
        ScanError::malformed_name(
            file_name,
            format!("'{}' is not a YYYYMMDDHHmmssFFF timestamp", segments[0]),
        )
    })?;

    let last = segments.len() - 1;
    Ok(FileNameInfo {
        timestamp: Some(timestamp),
        serial_number: segments[1..last].join("_"),
        machine_number: strip_extension(segments[last]).to_string(),
    })
}

/// Drops everything from the last `.` on.
fn strip_extension(segment: &str) -> &str {
    segment
        .rsplit_once('.')
        .map_or(segment, |(stem, _extension)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_four_segments() {
        let info = parse_file_name("log_1362_00394_NXTIIIc17.DAT", NameFormat::Plain).unwrap();
        assert_eq!(info.timestamp, None);
        assert_eq!(info.serial_number, "1362_00394");
        assert_eq!(info.machine_number, "NXTIIIc17");
    }

    #[test]
    fn test_plain_five_segments() {
        let info = parse_file_name("log_A_B_C_NXTIIIc18.DAT", NameFormat::Plain).unwrap();
        assert_eq!(info.serial_number, "A_B_C");
        assert_eq!(info.machine_number, "NXTIIIc18");
    }

    #[test]
    fn test_plain_rejects_other_counts() {
        for name in ["log.DAT", "a_b.DAT", "a_b_c.DAT", "a_b_c_d_e_f.DAT"] {
            let err = parse_file_name(name, NameFormat::Plain).unwrap_err();
            assert!(matches!(err, ScanError::MalformedName { .. }), "{}", name);
        }
    }

    #[test]
    fn test_timestamped_three_segments() {
        let info = parse_file_name(
            "20240115093000123_1362-00394_NXTIIIc17.DAT",
            NameFormat::Timestamped,
        )
        .unwrap();
        assert_eq!(
            info.timestamp.unwrap().to_string(),
            "2024-01-15 09:30:00.123"
        );
        assert_eq!(info.serial_number, "1362-00394");
        assert_eq!(info.machine_number, "NXTIIIc17");
    }

    #[test]
    fn test_timestamped_joins_middle_segments() {
        let info = parse_file_name(
            "20231231235959999_1362_00394_X_NXTIIIc18.DAT",
            NameFormat::Timestamped,
        )
        .unwrap();
        assert_eq!(
            info.timestamp.unwrap().to_string(),
            "2023-12-31 23:59:59.999"
        );
        assert_eq!(info.serial_number, "1362_00394_X");
        assert_eq!(info.machine_number, "NXTIIIc18");
    }

    #[test]
    fn test_timestamp_keeps_fraction_width() {
        let ts = FileTimestamp::parse("20240115093000000120").unwrap();
        assert_eq!(ts.fraction_digits(), 6);
        assert_eq!(ts.to_string(), "2024-01-15 09:30:00.000120");

        let ts = FileTimestamp::parse("202401150930000050").unwrap();
        assert_eq!(ts.to_string(), "2024-01-15 09:30:00.0050");
    }

    #[test]
    fn test_timestamp_rejects_bad_input() {
        assert!(FileTimestamp::parse("2024011509300012").is_none()); // too short
        assert!(FileTimestamp::parse("202401150930001234567").is_none()); // too long
        assert!(FileTimestamp::parse("2024011509300012x").is_none());
        assert!(FileTimestamp::parse("20241315093000123").is_none()); // month 13
        assert!(FileTimestamp::parse("20240230093000123").is_none()); // Feb 30
    }

    #[test]
    fn test_timestamped_rejects_malformed() {
        let err = parse_file_name("log_1362_NXTIIIc17.DAT", NameFormat::Timestamped).unwrap_err();
        assert!(matches!(err, ScanError::MalformedName { .. }));

        let err = parse_file_name("20240115093000123_NXTIIIc17.DAT", NameFormat::Timestamped)
            .unwrap_err();
        assert!(matches!(err, ScanError::MalformedName { .. }));
    }

    #[test]
    fn test_extension_stripping() {
        assert_eq!(strip_extension("NXTIIIc17.DAT"), "NXTIIIc17");
        assert_eq!(strip_extension("NXTIIIc17.bak.DAT"), "NXTIIIc17.bak");
        assert_eq!(strip_extension("NXTIIIc17"), "NXTIIIc17");
    }

    #[test]
    fn test_name_format_from_str() {
        assert_eq!("plain".parse::<NameFormat>().unwrap(), NameFormat::Plain);
        assert_eq!(
            " Timestamped ".parse::<NameFormat>().unwrap(),
            NameFormat::Timestamped
        );
        assert!("batch".parse::<NameFormat>().is_err());
    }
}
