//! # CLI Module
//!
//! Command-line interface for the media repository.
//!
//! ## Usage
//! ```bash
//! # Import a memory card by capture date
//! media-repo import /media/card --repo ~/Pictures/repo --unlocked
//!
//! # See what would happen first
//! media-repo import /media/card --repo ~/Pictures/repo --dry-run
//!
//! # Which files have no usable capture date?
//! media-repo check /media/card
//!
//! # Build and save the content index, then import against it
//! media-repo index build --repo ~/Pictures/repo
//! media-repo import /media/card --repo ~/Pictures/repo --unlocked --use-index
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_repository::core::journal::{EntryStatus, ImportJournal, JournalEntry};
use media_repository::core::scanner::{ScanConfig, SourceBatch, SourceScanner};
use media_repository::core::{
    ContentIndex, ImportPipeline, ImportReport, InsertOptions, Repository, RepositoryConfig,
};
use media_repository::error::{IndexError, RepositoryError, Result};
use media_repository::events::{Event, EventChannel, EventReceiver, ImportEvent, IndexEvent};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::thread;

/// Media Repository - Import photos and videos by capture date
#[derive(Parser, Debug)]
#[command(name = "media-repo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import every file under a source directory
    Import {
        /// Directory to import from
        source: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        repo: RepoArgs,

        /// Put every file under this path inside the repository instead of YYYY/MM
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Replace files that already exist (needs --allow-overwrite)
        #[arg(long, conflicts_with = "alternate_names")]
        overwrite: bool,

        /// Pick name_1.ext, name_2.ext, ... on a name collision
        #[arg(long)]
        alternate_names: bool,

        /// Run every check but copy nothing
        #[arg(long)]
        dry_run: bool,

        /// Create the repository root if it does not exist
        #[arg(long)]
        create: bool,

        /// Reject content already in the saved index
        #[arg(long)]
        use_index: bool,

        /// Journal database path
        #[arg(long)]
        journal: Option<PathBuf>,

        /// Do not record this import in the journal
        #[arg(long, conflicts_with = "journal")]
        no_journal: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Report files whose capture date can't be read
    Check {
        /// Directory to check
        source: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Count source files per extension or per directory
    Describe {
        /// Directory to describe
        source: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        /// Count per directory instead of per extension
        #[arg(long)]
        paths: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Manage the content index
    Index {
        #[command(subcommand)]
        command: IndexCommands,
    },

    /// Show past imports
    Journal {
        /// Journal database path
        #[arg(long)]
        journal: Option<PathBuf>,

        /// Only entries of this batch
        #[arg(long)]
        batch: Option<String>,

        /// How many recent entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Delete every entry
        #[arg(long, conflicts_with = "batch")]
        clear: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Subcommand, Debug)]
enum IndexCommands {
    /// Scan the whole repository and save the index
    Build {
        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Tell whether files are already in the saved index
    Check {
        /// Files to look up
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        repo: RepoArgs,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Only the top directory, no subdirectories
    #[arg(long)]
    flat: bool,

    /// Lower-case file names before matching
    #[arg(long)]
    lowercase: bool,

    /// Regex searched in each file's full path
    #[arg(long)]
    include: Option<String>,

    /// Extensions to skip (repeatable)
    #[arg(long = "exclude-ext")]
    exclude_ext: Vec<String>,

    /// Include hidden files and directories
    #[arg(long)]
    include_hidden: bool,
}

impl ScanArgs {
    fn to_config(&self) -> ScanConfig {
        ScanConfig {
            recursive: !self.flat,
            lowercase_names: self.lowercase,
            include_pattern: self.include.clone(),
            exclude_extensions: self.exclude_ext.clone(),
            include_hidden: self.include_hidden,
            follow_symlinks: false,
        }
    }

    fn load(&self, source: &Path) -> Result<SourceBatch> {
        let scanner = SourceScanner::new(self.to_config())?;
        Ok(SourceBatch::scan(&scanner, source)?)
    }
}

#[derive(Args, Debug)]
struct RepoArgs {
    /// Repository root
    #[arg(long)]
    repo: PathBuf,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Allow physical copies into the repository
    #[arg(long)]
    unlocked: bool,

    /// Allow replacing existing files
    #[arg(long)]
    allow_overwrite: bool,

    /// Content index file
    #[arg(long)]
    index: Option<PathBuf>,
}

impl RepoArgs {
    fn config(&self) -> Result<RepositoryConfig> {
        let mut config = match &self.config {
            Some(path) => RepositoryConfig::load(path)?,
            None => RepositoryConfig::default(),
        };
        if self.unlocked {
            config.locked = false;
        }
        if self.allow_overwrite {
            config.allow_overwrite = true;
        }
        if let Some(index) = &self.index {
            config.index_path = index.clone();
        }
        Ok(config)
    }

    fn open(&self, create: bool) -> Result<Repository> {
        let builder = Repository::builder().config(self.config()?);
        if create && !self.repo.exists() {
            let mut repo = builder.build()?;
            repo.create(&self.repo)?;
            return Ok(repo);
        }
        Ok(builder.root(&self.repo).build()?)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    media_repository::init_tracing(if cli.verbose { "debug" } else { "warn" });
    let verbose = cli.verbose;

    match cli.command {
        Commands::Import {
            source,
            scan,
            repo,
            dest,
            overwrite,
            alternate_names,
            dry_run,
            create,
            use_index,
            journal,
            no_journal,
            output,
        } => {
            let options = InsertOptions {
                overwrite,
                alternate_names,
                dry_run,
            };
            let journal = if no_journal {
                None
            } else {
                journal.or_else(ImportJournal::default_path)
            };
            run_import(ImportRequest {
                source,
                scan,
                repo,
                dest,
                options,
                create,
                use_index,
                journal,
                output,
                verbose,
            })
        }
        Commands::Check {
            source,
            scan,
            output,
        } => run_check(&source, &scan, output),
        Commands::Describe {
            source,
            scan,
            paths,
            output,
        } => run_describe(&source, &scan, paths, output),
        Commands::Index { command } => match command {
            IndexCommands::Build { repo } => run_index_build(&repo),
            IndexCommands::Check {
                files,
                repo,
                output,
            } => run_index_check(&files, &repo, output),
        },
        Commands::Journal {
            journal,
            batch,
            limit,
            clear,
            output,
        } => run_journal(journal, batch, limit, clear, output),
    }
}

struct ImportRequest {
    source: PathBuf,
    scan: ScanArgs,
    repo: RepoArgs,
    dest: Option<PathBuf>,
    options: InsertOptions,
    create: bool,
    use_index: bool,
    journal: Option<PathBuf>,
    output: OutputFormat,
    verbose: bool,
}

fn run_import(request: ImportRequest) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(request.output, OutputFormat::Pretty);

    if pretty {
        print_header(&term);
    }

    let batch = request.scan.load(&request.source)?;
    let mut repo = request.repo.open(request.create)?;
    if request.use_index {
        repo.load_index()?;
    }

    let journal = match &request.journal {
        Some(path) => Some(ImportJournal::open(path)?),
        None => None,
    };
    let mut pipeline = ImportPipeline::new(&repo);
    if let Some(journal) = &journal {
        pipeline = pipeline.with_journal(journal);
    }

    let (sender, receiver) = EventChannel::new();
    let event_thread = spawn_progress(receiver, pretty, request.verbose);

    let report = pipeline.insert_batch_with_events(
        batch.files(),
        request.dest.as_deref(),
        request.options,
        &sender,
    )?;

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    match request.output {
        OutputFormat::Pretty => print_import_report(&term, &report, request.verbose),
        OutputFormat::Json => print_json(&report),
    }
    Ok(())
}

fn run_check(source: &Path, scan: &ScanArgs, output: OutputFormat) -> Result<()> {
    let batch = scan.load(source)?;
    let report = batch.check();
    let duplicates = batch.duplicate_names();

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "check": report,
            "duplicate_names": duplicates,
        })),
        OutputFormat::Pretty => {
            let term = Term::stdout();
            for message in &report.messages {
                term.write_line(&format!("  {} {}", style("✗").red(), message))
                    .ok();
            }
            if !report.messages.is_empty() {
                term.write_line("").ok();
            }
            term.write_line(&format!("Total files: {}", style(report.total).cyan()))
                .ok();
            term.write_line(&format!(
                "Total processed files: {}",
                style(report.processed).cyan()
            ))
            .ok();
            term.write_line(&format!(
                "Error files: {}",
                style(report.with_errors).yellow()
            ))
            .ok();
            if !duplicates.is_empty() {
                term.write_line(&format!(
                    "Shared file names: {}",
                    style(duplicates.len()).yellow()
                ))
                .ok();
                for (name, paths) in &duplicates {
                    term.write_line(&format!("  {}", style(name).bold())).ok();
                    for path in paths {
                        term.write_line(&format!("    {}", path.display())).ok();
                    }
                }
            }
        }
    }
    Ok(())
}

fn run_describe(source: &Path, scan: &ScanArgs, by_path: bool, output: OutputFormat) -> Result<()> {
    let batch = scan.load(source)?;
    let rows: Vec<(String, usize)> = if by_path {
        batch
            .describe_paths()
            .into_iter()
            .map(|(dir, count)| (dir.display().to_string(), count))
            .collect()
    } else {
        batch
            .describe()
            .into_iter()
            .map(|(ext, count)| {
                let ext = if ext.is_empty() { "(none)".to_string() } else { ext };
                (ext, count)
            })
            .collect()
    };

    match output {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Pretty => {
            let term = Term::stdout();
            let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            for (key, count) in &rows {
                term.write_line(&format!("  {:width$}  {}", key, style(count).cyan()))
                    .ok();
            }
            term.write_line(&format!("  {} files", style(batch.len()).bold()))
                .ok();
        }
    }
    Ok(())
}

fn run_index_build(args: &RepoArgs) -> Result<()> {
    let term = Term::stderr();
    let mut repo = args.open(false)?;

    let (sender, receiver) = EventChannel::new();
    let event_thread = spawn_progress(receiver, true, false);

    let entries = repo.build_index_with_events(&sender)?.len();
    drop(sender);
    event_thread.join().ok();

    let saved = repo.save_index()?;
    term.write_line(&format!(
        "{} Indexed {} files into {}",
        style("✓").green().bold(),
        style(entries).cyan(),
        saved.display()
    ))
    .ok();
    Ok(())
}

#[derive(Serialize)]
struct IndexLookup {
    path: PathBuf,
    duplicate_of: Option<PathBuf>,
    error: Option<String>,
}

fn run_index_check(files: &[PathBuf], args: &RepoArgs, output: OutputFormat) -> Result<()> {
    let repo = args.open(false)?;
    let index = ContentIndex::load(&repo.index_path())?;

    let lookups: Vec<IndexLookup> = files
        .iter()
        .map(|path| {
            let (duplicate_of, error) = match index.check(path) {
                Ok(_) => (None, None),
                Err(IndexError::Duplicate(dup)) => (Some(dup.existing), None),
                Err(e) => (None, Some(e.to_string())),
            };
            IndexLookup {
                path: path.clone(),
                duplicate_of,
                error,
            }
        })
        .collect();

    match output {
        OutputFormat::Json => print_json(&lookups),
        OutputFormat::Pretty => {
            let term = Term::stdout();
            for lookup in &lookups {
                let line = match (&lookup.duplicate_of, &lookup.error) {
                    (Some(existing), _) => format!(
                        "  {} {} (same content as {})",
                        style("=").yellow(),
                        lookup.path.display(),
                        existing.display()
                    ),
                    (None, Some(error)) => {
                        format!("  {} {}", style("✗").red(), error)
                    }
                    (None, None) => format!("  {} {}", style("+").green(), lookup.path.display()),
                };
                term.write_line(&line).ok();
            }
        }
    }
    Ok(())
}

fn run_journal(
    path: Option<PathBuf>,
    batch: Option<String>,
    limit: usize,
    clear: bool,
    output: OutputFormat,
) -> Result<()> {
    let path = path
        .or_else(ImportJournal::default_path)
        .ok_or_else(|| RepositoryError::Config("no data directory for the journal".to_string()))?;
    let journal = ImportJournal::open(&path)?;

    if clear {
        let removed = journal.clear()?;
        Term::stderr()
            .write_line(&format!("Removed {} journal entries", removed))
            .ok();
        return Ok(());
    }

    let entries = match &batch {
        Some(id) => journal.list_batch(id)?,
        None => journal.recent(limit)?,
    };

    match output {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Pretty => print_journal(&entries),
    }
    Ok(())
}

fn spawn_progress(receiver: EventReceiver, show: bool, verbose: bool) -> thread::JoinHandle<()> {
    let progress = show.then(|| {
        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    });

    // Handle events in a separate thread
    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = progress.as_ref() else {
                continue;
            };
            match event {
                Event::Import(ImportEvent::Started { total_files }) => {
                    pb.set_length(total_files as u64);
                }
                Event::Import(ImportEvent::FileImported { source, .. }) => {
                    pb.inc(1);
                    pb.set_message(file_name(&source));
                }
                Event::Import(ImportEvent::FileFailed { source, message, .. }) => {
                    pb.inc(1);
                    if verbose {
                        pb.println(format!("  {} {}", style("✗").red(), message));
                    } else {
                        pb.set_message(file_name(&source));
                    }
                }
                Event::Import(ImportEvent::Completed { .. }) => pb.finish_and_clear(),
                Event::Index(IndexEvent::Started { root }) => {
                    pb.set_message(format!("indexing {}", root.display()));
                }
                Event::Index(IndexEvent::FileIndexed { path, indexed }) => {
                    pb.set_length(indexed as u64);
                    pb.set_position(indexed as u64);
                    pb.set_message(file_name(&path));
                }
                Event::Index(IndexEvent::Completed { .. }) => pb.finish_and_clear(),
            }
        }
    })
}

fn print_header(term: &Term) {
    term.write_line(&format!(
        "{} {}",
        style("Media Repository").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn print_import_report(term: &Term, report: &ImportReport, verbose: bool) {
    let title = if report.dry_run {
        "Dry Run Complete"
    } else {
        "Import Complete"
    };
    term.write_line(&format!("{} {}", style("✓").green().bold(), title))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files in {:.1}s",
        style(report.total).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!("  {} imported", style(report.succeeded).green()))
        .ok();
    term.write_line(&format!("  {} failed", style(report.failed).yellow()))
        .ok();

    for (kind, count) in &report.failures_by_kind {
        term.write_line(&format!("    {} {}", style(count).yellow(), kind))
            .ok();
    }

    if verbose {
        term.write_line("").ok();
        for file in report.successes() {
            term.write_line(&format!(
                "  {} {} -> {}",
                style("+").green(),
                file.source.display(),
                file.destination.display()
            ))
            .ok();
        }
    }

    if report.failed > 0 {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Failures:").bold().underlined()))
            .ok();
        for (path, cause) in report.failure_causes() {
            term.write_line(&format!("  {} {}", style("✗").red(), path.display()))
                .ok();
            term.write_line(&format!("    {}", style(cause).dim())).ok();
        }
    }

    term.write_line("").ok();
    term.write_line(&format!("{}", style(format!("Batch {}", report.batch_id)).dim()))
        .ok();
}

fn print_journal(entries: &[JournalEntry]) {
    let term = Term::stdout();
    if entries.is_empty() {
        term.write_line("No journal entries").ok();
        return;
    }

    for entry in entries {
        let when = chrono::DateTime::from_timestamp(entry.recorded_at, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let marker = match entry.status {
            EntryStatus::Imported => style("+").green(),
            EntryStatus::DryRun => style("~").cyan(),
            EntryStatus::Failed => style("✗").red(),
        };
        let detail = match (&entry.destination, &entry.message) {
            (Some(dest), _) => format!("-> {}", dest.display()),
            (None, Some(message)) => message.clone(),
            (None, None) => String::new(),
        };
        term.write_line(&format!(
            "{} {} {} {}",
            style(when).dim(),
            marker,
            entry.source.display(),
            detail
        ))
        .ok();
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
