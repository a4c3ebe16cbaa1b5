use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{ScanError, ScanResult};
use crate::filters::PathFilter;
use crate::name::NameFormat;
use crate::queue::SeedMode;

const DEFAULT_QUEUE_FILE: &str = "fujiscout-queue.txt";
const DEFAULT_LOG_PREFIX: &str = "fujiscout_log";
const DEFAULT_LOG_EXTENSION: &str = ".txt";
const DEFAULT_LOG_MAX_SIZE: u64 = 100 * 1024 * 1024; // 100MB

/// How to treat bytes that are not valid UTF-8 in scanned files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Skip the rest of the file at the first invalid line
    FailFast,
    /// Replace invalid sequences with U+FFFD and keep going
    #[default]
    Lossy,
}

impl std::str::FromStr for EncodingMode {
    type Err = ScanError;

    fn from_str(s: &str) -> ScanResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "failfast" => Ok(Self::FailFast),
            "lossy" => Ok(Self::Lossy),
            other => Err(ScanError::config_error(format!(
                "Unknown encoding mode '{}' (expected failfast or lossy)",
                other
            ))),
        }
    }
}

/// Options for the size-rotated log file written by the command line host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for log files; the working directory when unset
    pub directory: Option<PathBuf>,
    /// File name prefix, files are named `<prefix>_<index><extension>`
    pub prefix: String,
    pub extension: String,
    /// Size at which logging rolls over to the next numbered file
    pub max_size_bytes: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: None,
            prefix: DEFAULT_LOG_PREFIX.to_string(),
            extension: DEFAULT_LOG_EXTENSION.to_string(),
            max_size_bytes: DEFAULT_LOG_MAX_SIZE,
        }
    }
}

/// Configuration for a scan.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.fujiscout.yaml` in the current directory
/// 3. Global `$HOME/.config/fujiscout/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// # Folder whose subfolders hold the machine logs
/// root_path: "E:/LogFuji/BackUp"
///
/// # Lines containing any of these are reported
/// words: ["1362-00394", "1190160"]
///
/// # Only files whose name matches one of these globs are read
/// patterns: ["*NXTIIIc17.DAT", "*NXTIIIc18.DAT"]
///
/// output_path: "FujiSearch.txt"
/// queue_path: "fujiscout-queue.txt"
///
/// # timestamped | plain
/// name_format: timestamped
///
/// log:
///   prefix: "fujiscout_log"
///   max_size_bytes: 104857600
/// ```
///
/// Command line arguments take precedence over config file values, see
/// [`ScanConfig::merge_with_cli`]. Values are checked by
/// [`ScanConfig::validate`] before any scanning starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directory whose folders are scanned
    pub root_path: PathBuf,

    /// Target words, matched as plain substrings
    pub words: Vec<String>,

    /// Glob patterns selecting which file names are read
    pub patterns: Vec<String>,

    /// File that match records are appended to
    pub output_path: PathBuf,

    /// File holding the queue of folders still to scan
    pub queue_path: PathBuf,

    /// File name layout used to extract metadata
    pub name_format: NameFormat,

    /// Seed the queue with the root's subfolders or the root alone
    pub seed_mode: SeedMode,

    /// Whether glob patterns match case-sensitively
    pub case_sensitive: bool,

    /// How to handle invalid UTF-8 in scanned files
    pub encoding_mode: EncodingMode,

    /// Continue an existing queue instead of seeding a new one
    pub resume: bool,

    /// Keep a copy of every match record in the returned summary
    pub collect_records: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    pub log: LogConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::new(),
            words: Vec::new(),
            patterns: Vec::new(),
            output_path: PathBuf::new(),
            queue_path: PathBuf::from(DEFAULT_QUEUE_FILE),
            name_format: NameFormat::default(),
            seed_mode: SeedMode::default(),
            case_sensitive: true,
            encoding_mode: EncodingMode::default(),
            resume: false,
            collect_records: false,
            log_level: default_log_level(),
            log: LogConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values given on the command line.
///
/// `None` (or an empty list) leaves the configured value alone, so a flag that
/// repeats a default still overrides a config file. The switches can only turn
/// `resume` and `collect_records` on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOverrides {
    pub root_path: Option<PathBuf>,
    pub words: Vec<String>,
    pub patterns: Vec<String>,
    pub output_path: Option<PathBuf>,
    pub queue_path: Option<PathBuf>,
    pub name_format: Option<NameFormat>,
    pub seed_mode: Option<SeedMode>,
    pub case_sensitive: Option<bool>,
    pub encoding_mode: Option<EncodingMode>,
    pub resume: bool,
    pub collect_records: bool,
    pub log_level: Option<String>,
}

/// The validated, immutable inputs of a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub root_path: PathBuf,
    pub words: Vec<String>,
    pub patterns: Vec<String>,
    pub output_path: PathBuf,
}

impl ScanConfig {
    /// Loads configuration from the default locations, then `config_path`
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Default config locations
        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("fujiscout/config.yaml")),
            // Local config
            Some(PathBuf::from(".fujiscout.yaml")),
        ];

        // Add existing config files
        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // A custom config file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Build and deserialize
        builder.build()?.try_deserialize()
    }

    /// Serializes the configuration as YAML, e.g. for a starter config file
    pub fn to_yaml(&self) -> ScanResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ScanError::config_error(format!("Failed to serialize config: {}", e)))
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: ScanOverrides) -> Self {
        // CLI values take precedence over config file values
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if !cli.words.is_empty() {
            self.words = cli.words;
        }
        if !cli.patterns.is_empty() {
            self.patterns = cli.patterns;
        }
        if let Some(output_path) = cli.output_path {
            self.output_path = output_path;
        }
        if let Some(queue_path) = cli.queue_path {
            self.queue_path = queue_path;
        }
        if let Some(name_format) = cli.name_format {
            self.name_format = name_format;
        }
        if let Some(seed_mode) = cli.seed_mode {
            self.seed_mode = seed_mode;
        }
        if let Some(case_sensitive) = cli.case_sensitive {
            self.case_sensitive = case_sensitive;
        }
        if let Some(encoding_mode) = cli.encoding_mode {
            self.encoding_mode = encoding_mode;
        }
        if cli.resume {
            self.resume = true;
        }
        if cli.collect_records {
            self.collect_records = true;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }

    /// Checks the required inputs and returns the immutable scan request
    pub fn validate(&self) -> ScanResult<ScanRequest> {
        if self.root_path.as_os_str().is_empty() {
            return Err(ScanError::config_error("A root folder is required"));
        }
        if !self.root_path.is_dir() {
            return Err(ScanError::config_error(format!(
                "Root folder does not exist or is not a directory: {}",
                self.root_path.display()
            )));
        }

        if self.words.is_empty() {
            return Err(ScanError::config_error("At least one word is required"));
        }
        if self.words.iter().any(|w| w.is_empty()) {
            return Err(ScanError::config_error("Words must not be empty"));
        }

        if self.patterns.is_empty() {
            return Err(ScanError::config_error("At least one pattern is required"));
        }
        if self.patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(ScanError::config_error("Patterns must not be blank"));
        }
        // Surface bad globs before the scan starts
        PathFilter::new(&self.patterns, self.case_sensitive)?;

        if self.output_path.as_os_str().is_empty() {
            return Err(ScanError::config_error("An output file is required"));
        }
        if self.queue_path.as_os_str().is_empty() {
            return Err(ScanError::config_error("A work queue file is required"));
        }

        let mut words: Vec<String> = Vec::with_capacity(self.words.len());
        for word in &self.words {
            if !words.contains(word) {
                words.push(word.clone());
            }
        }

        Ok(ScanRequest {
            root_path: self.root_path.clone(),
            words,
            patterns: self.patterns.iter().map(|p| p.trim().to_string()).collect(),
            output_path: self.output_path.clone(),
        })
    }
}
