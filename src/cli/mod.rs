//! # CLI Module
//!
//! Command-line interface for the photo archiver.
//!
//! ## Usage
//! ```bash
//! # Copy photos into a date-structured archive
//! photo-archive copy ~/Pictures ~/Archive
//!
//! # Restrict by extension and date window
//! photo-archive copy ~/Pictures ~/Archive -e .jpg --from 2012-05-01 --to 2012-06-01
//!
//! # Cluster likely duplicates for review
//! photo-archive duplicates ~/Pictures ~/Backups
//!
//! # JSON output for scripting
//! photo-archive duplicates ~/Pictures --output json
//! ```

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_archiver::core::{
    CandidateGroup, CopyEngine, CopyReport, CopyRequest, DirectorySource, DuplicateFinder,
    MetadataRegistry, PhotoSource, TreeWalker, DEFAULT_DATE_TEMPLATE,
};
use photo_archiver::error::{PhotoArchiverError, Result};
use photo_archiver::events::{CopyEvent, DuplicateEvent, Event, EventChannel};
use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;

/// Photo Archiver - date-structured copying and duplicate review
#[derive(Parser, Debug)]
#[command(name = "photo-archive")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy photos from a source tree into a date-structured archive
    Copy {
        /// Source directory to read photos from
        source: PathBuf,

        /// Target root of the archive
        target: PathBuf,

        /// Date bucket template (strftime syntax)
        #[arg(short = 't', long, default_value = DEFAULT_DATE_TEMPLATE)]
        template: String,

        /// Only copy photos taken on or after this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        from: Option<DateTime<Utc>>,

        /// Only copy photos taken before this date (YYYY-MM-DD, exclusive)
        #[arg(long, value_parser = parse_date)]
        to: Option<DateTime<Utc>>,

        /// Restrict the source to these extensions (repeatable)
        #[arg(short = 'e', long = "extension")]
        extensions: Vec<String>,

        /// Only copy entries with these exact names (repeatable)
        #[arg(long = "select")]
        selection: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output (list every skipped entry)
        #[arg(short, long)]
        verbose: bool,
    },

    /// Cluster likely duplicate photos for manual review
    Duplicates {
        /// Directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths only)
    Minimal,
}

fn parse_date(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {}", s, e))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date '{}'", s))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

/// Run the CLI
pub fn run() -> Result<()> {
    photo_archiver::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Copy {
            source,
            target,
            template,
            from,
            to,
            extensions,
            selection,
            output,
            verbose,
        } => run_copy(
            source, target, template, from, to, extensions, selection, output, verbose,
        ),
        Commands::Duplicates { paths, output } => run_duplicates(paths, output),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_copy(
    source_dir: PathBuf,
    target: PathBuf,
    template: String,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    extensions: Vec<String>,
    selection: Vec<String>,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    if !source_dir.is_dir() {
        return Err(PhotoArchiverError::Config(format!(
            "source is not a directory: {}",
            source_dir.display()
        )));
    }

    let mut source = DirectorySource::new(source_dir.to_string_lossy());
    if !extensions.is_empty() {
        source.set_extensions(extensions)?;
    }
    source.freeze();

    let mut request = CopyRequest::new(target);
    request.date_template = template;
    request.from = from;
    request.to = to;
    if !selection.is_empty() {
        request.selection = Some(selection.into_iter().collect::<HashSet<_>>());
    }

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {} {} {}",
            style("Copying").bold().cyan(),
            source.location(),
            style("→").dim(),
            request.target_root.display()
        ))
        .ok();
    }

    let engine = CopyEngine::new(MetadataRegistry::with_defaults());
    let (sender, receiver) = EventChannel::new();

    let progress = match output {
        OutputFormat::Pretty => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {pos} processed {msg}")
                    .unwrap(),
            );
            Some(pb)
        }
        _ => None,
    };

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            if let Some(ref pb) = progress_clone {
                match event {
                    Event::Copy(CopyEvent::EntryCopied { name, .. }) => {
                        pb.inc(1);
                        pb.set_message(name);
                    }
                    Event::Copy(CopyEvent::EntrySkipped { .. })
                    | Event::Copy(CopyEvent::EntryFailed { .. }) => {
                        pb.inc(1);
                    }
                    Event::Copy(CopyEvent::Completed { .. }) => {
                        pb.finish_and_clear();
                    }
                    _ => {}
                }
            }
        }
    });

    let report = engine.copy_with_events(&source, &request, &sender);

    drop(sender);
    event_thread.join().ok();

    let report = report?;
    match output {
        OutputFormat::Pretty => print_copy_pretty(&term, &report, verbose),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
        }
        OutputFormat::Minimal => {
            for copied in &report.copied {
                println!("{}", copied.destination.display());
            }
        }
    }

    Ok(())
}

fn print_copy_pretty(term: &Term, report: &CopyReport, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Copy Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} copied, {} skipped, {} failed",
        style(report.copied.len()).cyan(),
        style(report.skipped.len()).cyan(),
        style(report.errors.len()).yellow()
    ))
    .ok();
    term.write_line("").ok();

    for copied in &report.copied {
        term.write_line(&format!(
            "  {} {} {} {}",
            style("+").green(),
            copied.name,
            style("→").dim(),
            copied.destination.display()
        ))
        .ok();
    }

    if verbose {
        for skipped in &report.skipped {
            term.write_line(&format!(
                "  {} {} ({})",
                style("-").dim(),
                skipped.name,
                style(skipped.reason).dim()
            ))
            .ok();
        }
    }

    for error in &report.errors {
        term.write_line(&format!("  {} {}", style("!").red().bold(), error))
            .ok();
    }
}

fn run_duplicates(paths: Vec<PathBuf>, output: OutputFormat) -> Result<()> {
    let term = Term::stderr();
    let finder = DuplicateFinder::new(MetadataRegistry::with_defaults());

    let (sender, receiver) = EventChannel::new();

    let progress = match output {
        OutputFormat::Pretty => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {pos} candidates {msg}")
                    .unwrap(),
            );
            Some(pb)
        }
        _ => None,
    };

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            if let Some(ref pb) = progress_clone {
                match event {
                    Event::Duplicate(DuplicateEvent::CandidateAdded { path }) => {
                        pb.inc(1);
                        pb.set_message(
                            path.file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_default(),
                        );
                    }
                    Event::Duplicate(DuplicateEvent::Completed { .. }) => {
                        pb.finish_and_clear();
                    }
                    _ => {}
                }
            }
        }
    });

    sender.send(Event::Duplicate(DuplicateEvent::Started {
        paths: paths.clone(),
    }));

    for root in &paths {
        for node in TreeWalker::new(root) {
            if node.is_dir {
                continue;
            }
            if let Err(e) = finder.add_candidate(&node.path) {
                // Vanished between walk and stat; not fatal for a scan
                tracing::warn!(path = %node.path.display(), error = %e, "skipping candidate");
                continue;
            }
            sender.send(Event::Duplicate(DuplicateEvent::CandidateAdded {
                path: node.path.clone(),
            }));
        }
    }

    let groups = finder.into_groups();
    sender.send(Event::Duplicate(DuplicateEvent::Completed {
        groups: groups.len(),
    }));

    drop(sender);
    event_thread.join().ok();

    match output {
        OutputFormat::Pretty => print_duplicates_pretty(&term, &groups),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&groups).unwrap());
        }
        OutputFormat::Minimal => {
            // Everything but the first of each group is a removal candidate
            for group in &groups {
                for file in group.files.iter().skip(1) {
                    println!("{}", file.display());
                }
            }
        }
    }

    Ok(())
}

fn print_duplicates_pretty(term: &Term, groups: &[CandidateGroup]) {
    term.write_line("").ok();
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} duplicate groups found",
        style(groups.len()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    if groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("🎉").green()))
            .ok();
    } else {
        for (i, group) in groups.iter().enumerate() {
            term.write_line(&format!(
                "  {} ({} files)",
                style(format!("Group {}:", i + 1)).bold(),
                group.files.len()
            ))
            .ok();

            for file in &group.files {
                let display_path = if file.starts_with(dirs::home_dir().unwrap_or_default()) {
                    format!(
                        "~/{}",
                        file.strip_prefix(dirs::home_dir().unwrap_or_default())
                            .unwrap()
                            .display()
                    )
                } else {
                    file.display().to_string()
                };
                term.write_line(&format!("    {} {}", style("○").dim(), display_path))
                    .ok();
            }
            term.write_line("").ok();
        }
    }

    term.write_line(&format!(
        "{}",
        style("Remember: no files were deleted. Review carefully before taking action.").dim()
    ))
    .ok();
}
