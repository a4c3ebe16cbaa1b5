use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fujiscout::config::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive; logs are flushed when dropped
pub struct LoggingGuard {
    _guard: WorkerGuard,
    log_path: PathBuf,
}

impl LoggingGuard {
    /// The file logging started in
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Appends to `<prefix>_<index><extension>` files, moving to the next index
/// once a file reaches its size limit.
pub struct RotatingFileWriter {
    dir: PathBuf,
    prefix: String,
    extension: String,
    max_size: u64,
    index: u32,
    file: File,
    written: u64,
}

impl RotatingFileWriter {
    /// Opens the first file that is missing or still below `max_size`
    pub fn open(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        extension: impl Into<String>,
        max_size: u64,
    ) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let prefix = prefix.into();
        let extension = extension.into();

        let mut index = 0;
        loop {
            let path = log_file_path(&dir, &prefix, &extension, index);
            match fs::metadata(&path) {
                Ok(meta) if meta.len() >= max_size => index += 1,
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::NotFound => break,
                Err(e) => return Err(e),
            }
        }

        let path = log_file_path(&dir, &prefix, &extension, index);
        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir,
            prefix,
            extension,
            max_size,
            index,
            file,
            written,
        })
    }

    pub fn current_path(&self) -> PathBuf {
        log_file_path(&self.dir, &self.prefix, &self.extension, self.index)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.index += 1;
        let path = self.current_path();
        self.file = open_append(&path)?;
        self.written = self.file.metadata()?.len();
        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // An oversized record still goes into an empty file.
        if self.written > 0 && self.written + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn log_file_path(dir: &Path, prefix: &str, extension: &str, index: u32) -> PathBuf {
    dir.join(format!("{}_{}{}", prefix, index, extension))
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber writing to the rotating log file.
///
/// `RUST_LOG` wins over `level`. Returns `None` when the log file cannot be
/// opened or a subscriber is already installed; scanning goes on without a
/// log in that case.
pub fn init(level: &str, config: &LogConfig) -> Option<LoggingGuard> {
    let dir = config
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let writer = match RotatingFileWriter::open(
        &dir,
        &config.prefix,
        &config.extension,
        config.max_size_bytes,
    ) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!("Could not open log file in {}: {}", dir.display(), e);
            return None;
        }
    };
    let log_path = writer.current_path();

    let (non_blocking, guard) = tracing_appender::non_blocking(writer);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("fujiscout={level},fujiscout_cli={level}"))
    });

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    tracing::info!(log_file = %log_path.display(), "tracing initialized");

    Some(LoggingGuard {
        _guard: guard,
        log_path,
    })
}
