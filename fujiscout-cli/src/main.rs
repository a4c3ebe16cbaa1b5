mod logging;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use fujiscout::{
    config::{EncodingMode, ScanOverrides},
    name::NameFormat,
    progress::ChannelObserver,
    queue::{SeedMode, WorkQueue},
    scan, CancellationToken, ScanConfig, ScanEvent, ScanSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
    time::Duration,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML) applied on top of the global and local ones
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliScanConfig {
    /// Root folder whose subfolders hold the log files
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// Word to search for (repeatable or comma separated)
    #[arg(short = 'w', long = "word", value_delimiter = ',')]
    words: Vec<String>,

    /// File name glob, e.g. *NXTIIIc17.DAT (repeatable or comma separated)
    #[arg(short = 'p', long = "pattern", value_delimiter = ',')]
    patterns: Vec<String>,

    /// File that matching lines are appended to
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Work queue file (default: fujiscout-queue.txt)
    #[arg(long)]
    queue_file: Option<PathBuf>,

    /// Continue the folders left in the work queue by an earlier run
    #[arg(long)]
    resume: bool,

    /// Append to an existing output file
    #[arg(long, conflicts_with = "overwrite")]
    append: bool,

    /// Replace an existing output file
    #[arg(long, conflicts_with = "resume")]
    overwrite: bool,

    /// File name layout (timestamped|plain)
    #[arg(long)]
    name_format: Option<NameFormat>,

    /// Scan the files of the root folder itself instead of its subfolders
    #[arg(long)]
    single_folder: bool,

    /// Match file name patterns case-insensitively
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long)]
    encoding: Option<EncodingMode>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print every match after the scan
    #[arg(long)]
    keep_records: bool,
}

impl CliScanConfig {
    fn into_overrides(self) -> ScanOverrides {
        ScanOverrides {
            root_path: self.root,
            words: self.words,
            patterns: self.patterns,
            output_path: self.output,
            queue_path: self.queue_file,
            name_format: self.name_format,
            seed_mode: self.single_folder.then_some(SeedMode::Folder),
            case_sensitive: self.ignore_case.then_some(false),
            encoding_mode: self.encoding,
            resume: self.resume,
            collect_records: self.keep_records,
            log_level: self.log_level,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search log files for words and append annotated matches to a file
    Scan(Box<CliScanConfig>),

    /// List the folders still pending in a work queue
    Queue {
        /// Work queue file (default: from config)
        #[arg(long)]
        queue_file: Option<PathBuf>,
    },

    /// Delete a work queue so the next scan starts from scratch
    ClearQueue {
        /// Work queue file (default: from config)
        #[arg(long)]
        queue_file: Option<PathBuf>,
    },

    /// Write a starter configuration file
    InitConfig {
        /// Where to write the file
        #[arg(default_value = ".fujiscout.yaml")]
        path: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => {
            let args = *args;
            let (append, overwrite) = (args.append, args.overwrite);
            let config =
                load_config(cli.config.as_deref())?.merge_with_cli(args.into_overrides());
            run_scan(config, append, overwrite)
        }
        Commands::Queue { queue_file } => {
            let queue = WorkQueue::new(resolve_queue_path(cli.config.as_deref(), queue_file)?);
            let items = queue.items()?;
            if items.is_empty() {
                println!("No folders pending in {}", queue.path().display());
                return Ok(());
            }
            println!(
                "{} folder(s) pending in {}:",
                items.len().to_string().yellow(),
                queue.path().display()
            );
            for folder in items {
                println!("  {}", folder.display());
            }
            Ok(())
        }
        Commands::ClearQueue { queue_file } => {
            let queue = WorkQueue::new(resolve_queue_path(cli.config.as_deref(), queue_file)?);
            if !queue.exists() {
                println!("No work queue at {}", queue.path().display());
                return Ok(());
            }
            queue.dispose()?;
            println!("Removed work queue {}", queue.path().display());
            Ok(())
        }
        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                bail!(
                    "{} already exists, pass --force to replace it",
                    path.display()
                );
            }
            let starter = ScanConfig {
                patterns: vec!["*NXTIIIc17.DAT".to_string()],
                output_path: PathBuf::from("FujiSearch.txt"),
                ..ScanConfig::default()
            };
            fs::write(&path, starter.to_yaml()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote starter configuration to {}", path.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    ScanConfig::load_from(path).context("Failed to load configuration")
}

fn resolve_queue_path(config: Option<&Path>, queue_file: Option<PathBuf>) -> Result<PathBuf> {
    match queue_file {
        Some(path) => Ok(path),
        None => Ok(load_config(config)?.queue_path),
    }
}

fn run_scan(config: ScanConfig, append: bool, overwrite: bool) -> Result<()> {
    // Report bad input before touching any file
    config.validate()?;

    if config.output_path.exists() {
        if overwrite {
            fs::remove_file(&config.output_path).with_context(|| {
                format!("Failed to remove {}", config.output_path.display())
            })?;
        } else if !append && !config.resume {
            bail!(
                "Output file {} already exists, pass --append or --overwrite",
                config.output_path.display()
            );
        }
    }

    let log_guard = logging::init(&config.log_level, &config.log);

    let cancel = CancellationToken::new();
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, cancel.flag())
            .context("Failed to install the Ctrl-C handler")?;
    }

    let output_path = config.output_path.clone();
    let queue_path = config.queue_path.clone();

    let (tx, rx) = mpsc::channel();
    let worker_cancel = cancel.clone();
    let worker = thread::Builder::new()
        .name("fujiscout-scan".to_string())
        .spawn(move || {
            let mut observer = ChannelObserver::new(tx);
            scan(&config, &mut observer, &worker_cancel)
        })
        .context("Failed to start the scan worker")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {prefix:.yellow} {wide_msg}",
    )?);
    spinner.set_prefix("0 matches");
    spinner.enable_steady_tick(Duration::from_millis(120));

    // Ends once the worker drops its observer
    for event in rx {
        match event {
            ScanEvent::Progress(message) => spinner.set_message(message),
            ScanEvent::Matches(total) => spinner.set_prefix(format!("{} matches", total)),
        }
    }
    spinner.finish_and_clear();

    let summary = worker
        .join()
        .map_err(|_| anyhow!("The scan worker panicked"))??;

    print_summary(&summary, &output_path, &queue_path);
    if let Some(guard) = &log_guard {
        println!("Log: {}", guard.log_path().display());
    }
    Ok(())
}

fn print_summary(summary: &ScanSummary, output_path: &Path, queue_path: &Path) {
    for record in &summary.records {
        println!("{}", record.to_output_line());
    }

    let status = summary.status_message();
    if summary.cancelled {
        warn!("Scan cancelled, work queue kept at {}", queue_path.display());
        println!("{}", status.yellow());
    } else {
        info!("Scan finished in {:?}", summary.elapsed);
        println!("{}", status.green());
    }

    let elapsed = Duration::from_millis(summary.elapsed.as_millis() as u64);
    println!(
        "Searched {} of {} file(s) in {} folder(s), {} skipped, in {}",
        summary.files_searched,
        summary.files_listed,
        summary.folders_completed,
        summary.files_skipped,
        humantime::format_duration(elapsed)
    );
    println!("Results: {}", output_path.display().to_string().blue());

    if summary.cancelled {
        println!(
            "Run again with {} to continue from {}",
            "--resume".bold(),
            queue_path.display()
        );
    }
}
