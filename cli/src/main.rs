//! Multicopy - Command-line front end for the duplication engines.
//!
//! Reads a name list, builds the request multiset, optionally clears the
//! destination, runs the Copy Engine on its worker thread and renders
//! progress and log lines to stderr.

mod input;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use multicopy_engine::{
    request, spawn_copy, spawn_delete_with, CancelToken, CopyJob, EngineEvent, LogLine,
    NameTemplate, Outcome, Severity, DEFAULT_PLACEHOLDER,
};
use tracing_subscriber::EnvFilter;

/// Multicopy - duplicate listed files into a destination directory
#[derive(Parser, Debug)]
#[command(name = "multicopy")]
#[command(version)]
#[command(about = "Duplicate listed files into a destination directory")]
struct Cli {
    /// Print every log line, not only warnings and errors
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy every listed file as many times as it is listed
    Copy(CopyArgs),
    /// Empty a directory tree and recreate it
    Clear(ClearArgs),
}

#[derive(Args, Debug)]
struct CopyArgs {
    /// Text file with one name per line, or a directory whose files are listed
    #[arg(long, value_name = "PATH")]
    list: PathBuf,

    /// Directory holding the source files
    #[arg(long, value_name = "PATH", env = "MULTICOPY_SOURCE_DIR")]
    src: PathBuf,

    /// Destination directory
    #[arg(long, value_name = "PATH", env = "MULTICOPY_DEST_DIR")]
    dst: PathBuf,

    /// File extension applied to every source and destination name
    #[arg(long, value_name = "EXT", default_value = ".jpg")]
    ext: String,

    /// Numeric name template, e.g. "IMG_####"; only numeric names are kept
    #[arg(long, value_name = "TEMPLATE")]
    template: Option<String>,

    /// Placeholder character used in the template
    #[arg(long, value_name = "CHAR", default_value_t = DEFAULT_PLACEHOLDER)]
    placeholder: char,

    /// Empty the destination before copying when it is not empty
    #[arg(long)]
    clear: bool,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ClearArgs {
    /// Directory to empty
    #[arg(long, value_name = "PATH", env = "MULTICOPY_DEST_DIR")]
    dir: PathBuf,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,
}

/// Renders engine events to stderr with a single-line progress bar.
struct CliRenderer {
    verbose: bool,
    bar_visible: bool,
}

impl CliRenderer {
    fn new(verbose: bool) -> Self {
        CliRenderer {
            verbose,
            bar_visible: false,
        }
    }

    fn progress_bar(percent: u8) -> String {
        let filled = usize::from(percent / 5);
        let empty = 20 - filled;
        format!("[{}{}] {}%", "=".repeat(filled), " ".repeat(empty), percent)
    }

    fn handle(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Progress(percent) => {
                eprint!("\rProgress: {}", Self::progress_bar(percent));
                let _ = std::io::stderr().flush();
                self.bar_visible = true;
            }
            EngineEvent::Log(line) => self.log(&line),
            EngineEvent::Finished(_) => self.end_bar(),
        }
    }

    fn log(&mut self, line: &LogLine) {
        if line.severity == Severity::Info && !self.verbose {
            return;
        }
        self.end_bar();
        eprintln!("{line}");
    }

    fn end_bar(&mut self) {
        if self.bar_visible {
            eprintln!();
            self.bar_visible = false;
        }
    }
}

fn exit_code(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Success => 0,
        Outcome::SuccessWithErrors => 1,
        Outcome::Failure => 2,
        Outcome::Canceled => 130,
    }
}

fn format_duration(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs();
    let mins = secs / 60;
    if mins > 0 {
        format!("{}m {}s", mins, secs % 60)
    } else {
        format!("{}.{:02}s", secs, elapsed.subsec_millis() / 10)
    }
}

fn init_tracing() {
    // Engine log lines are rendered from events; tracing output is opt-in via RUST_LOG.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    let handler = move || {
        if interrupt(&handler_token) {
            eprintln!("\n{}", LogLine::warning("Interrupted"));
            process::exit(exit_code(Outcome::Canceled));
        }
        eprintln!(
            "\n{}",
            LogLine::warning("Cancel requested; a running copy finishes unless Ctrl-C is pressed again")
        );
    };
    if let Err(e) = ctrlc::set_handler(handler) {
        eprintln!("{}", LogLine::warning(format!("Failed to install Ctrl-C handler: {e}")));
    }

    let result = match &cli.command {
        Command::Copy(args) => run_copy(args, cli.verbose, &cancel),
        Command::Clear(args) => run_clear(args, cli.verbose, &cancel),
    };

    let code = match result {
        Ok(outcome) => exit_code(outcome),
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code(Outcome::Failure)
        }
    };
    process::exit(code);
}

/// Record one Ctrl-C press. The first press cancels delete runs; the second
/// returns true and the process exits, since copies cannot be canceled.
fn interrupt(cancel: &CancelToken) -> bool {
    if cancel.is_canceled() {
        return true;
    }
    cancel.cancel();
    false
}

fn normalize_extension(ext: &str) -> anyhow::Result<String> {
    let ext = ext.trim();
    if ext.is_empty() || ext == "." {
        bail!("extension must not be empty");
    }
    Ok(if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    })
}

/// True if `inner` is `outer` or lies below it, comparing canonical paths.
fn is_within(inner: &Path, outer: &Path) -> bool {
    match (inner.canonicalize(), outer.canonicalize()) {
        (Ok(inner), Ok(outer)) => inner.starts_with(outer),
        _ => false,
    }
}

fn is_non_empty_dir(path: &Path) -> bool {
    path.read_dir()
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Empty `dir` on a delete worker, rendering its events.
fn clear_directory(
    dir: &Path,
    verbose: bool,
    cancel: &CancelToken,
    json: bool,
) -> anyhow::Result<Outcome> {
    let handle = spawn_delete_with(dir, cancel.clone())?;
    let mut renderer = CliRenderer::new(verbose);
    for event in handle.events() {
        renderer.handle(event);
    }
    let report = handle.join()?;
    renderer.end_bar();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    eprintln!(
        "Clear {}: {} removed, {} failed",
        report.outcome, report.removed, report.failed
    );
    Ok(report.outcome)
}

/// Copy subcommand - separated from main for testability
fn run_copy(args: &CopyArgs, verbose: bool, cancel: &CancelToken) -> anyhow::Result<Outcome> {
    let start_time = Instant::now();
    let extension = normalize_extension(&args.ext)?;

    let template = args
        .template
        .as_deref()
        .map(|t| NameTemplate::with_placeholder(t, args.placeholder))
        .transpose()
        .context("Invalid name template")?;

    if !args.src.is_dir() {
        bail!("Source is not a directory: {}", args.src.display());
    }

    let names = match input::read_names(&args.list, &extension) {
        Ok(names) => names,
        Err(e) => {
            eprintln!("Error: {}", e.describe());
            return Ok(Outcome::Failure);
        }
    };

    let built = request::build(&names, template.is_some());
    if built.dropped > 0 {
        eprintln!(
            "{}",
            LogLine::warning(format!(
                "Ignored {} name(s) that are not plain{} file names",
                built.dropped,
                if template.is_some() { " numeric" } else { "" }
            ))
        );
    }

    // Job construction rejects a destination equal to the source before anything is cleared.
    let job = CopyJob::new(&args.src, &args.dst, built.requests, &extension, template)
        .context("Job creation failed")?;

    if args.clear && is_within(&args.src, &args.dst) {
        bail!(
            "Refusing to clear {}: it contains the source directory {}",
            args.dst.display(),
            args.src.display()
        );
    }

    if is_non_empty_dir(&args.dst) {
        if args.clear {
            let outcome = clear_directory(&args.dst, verbose, cancel, false)?;
            if outcome != Outcome::Success {
                eprintln!("Destination could not be cleared; copy not started");
                return Ok(outcome);
            }
        } else {
            eprintln!(
                "{}",
                LogLine::warning(format!(
                    "Destination {} is not empty; files with matching names will be overwritten",
                    args.dst.display()
                ))
            );
        }
    }

    eprintln!(
        "Copying {} file(s) from {} to {}",
        job.requests().total_copies(),
        job.source_dir().display(),
        job.dest_dir().display()
    );

    let handle = spawn_copy(job)?;
    let mut renderer = CliRenderer::new(verbose);
    for event in handle.events() {
        renderer.handle(event);
    }
    let report = handle.join()?;
    renderer.end_bar();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    eprintln!(
        "{}: {} copied, {} failed, {} skipped in {}",
        report.outcome,
        report.copied,
        report.failed,
        report.skipped,
        format_duration(start_time.elapsed())
    );

    Ok(report.outcome)
}

/// Clear subcommand
fn run_clear(args: &ClearArgs, verbose: bool, cancel: &CancelToken) -> anyhow::Result<Outcome> {
    if args.dir.as_os_str().is_empty() {
        bail!("Directory path is empty");
    }
    clear_directory(&args.dir, verbose, cancel, args.json)
}
