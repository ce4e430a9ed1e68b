mod render;
mod summary;
mod utils;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use labcal_core::backend::select_backend;
use labcal_core::config::LabCalConfig;
use labcal_core::extract::{CommandTextExtractor, TextExtractor};
use labcal_core::parse::{extract_day_entries, extract_title};
use labcal_core::schedule::{assign_dates, parse_reference_date, today};
use labcal_core::sync::ScheduleSynchronizer;
use labcal_core::tag::validate_experiment_id;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::render::{Render, render_schedule};
use crate::utils::tui::create_spinner;

#[derive(Parser)]
#[command(name = "labcal")]
#[command(about = "Turn Day-indexed lab protocols into dated calendar schedules")]
struct Cli {
    /// Protocol document (.pdf, .docx, .doc, .txt, .md)
    #[arg(required_unless_present = "remove_from_calendar")]
    file: Option<PathBuf>,

    /// Day 0 date (MM/DD/YY, MM/DD/YYYY, YYYY-MM-DD, MM-DD-YYYY, MM-DD-YY); defaults to today
    #[arg(long)]
    day0: Option<String>,

    /// Experiment identifier to tag events with
    #[arg(long)]
    id: Option<String>,

    /// Only print the schedule, don't touch the calendar
    #[arg(long)]
    no_calendar: bool,

    /// Remove every event tagged with --id
    #[arg(long, requires = "id", conflicts_with_all = ["update", "no_calendar"])]
    remove_from_calendar: bool,

    /// Re-sync every experiment whose id matches this text with the document
    #[arg(long, value_name = "PARTIAL_ID", conflicts_with_all = ["id", "day0", "no_calendar"])]
    update: Option<String>,

    /// Calendar to use in the native store
    #[arg(long)]
    calendar_name: Option<String>,

    /// Directory for .ics exports
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Don't write the <name>_calendar.txt summary
    #[arg(long)]
    no_summary: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Final outcome of a run, printed with --json.
#[derive(Serialize)]
struct CommandResult {
    success: bool,
    message: String,
    error: Option<String>,
}

impl CommandResult {
    fn new(success: bool, message: String) -> Self {
        CommandResult {
            success,
            error: (!success).then(|| message.clone()),
            message,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(&cli).unwrap_or_else(|e| CommandResult {
        success: false,
        message: format!("{:#}", e),
        error: Some(format!("{:#}", e)),
    });

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Could not serialize result: {}", e),
        }
    } else if result.success {
        println!("{}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<LabCalConfig> {
    let mut config = LabCalConfig::load()?;

    if let Some(name) = &cli.calendar_name {
        config.calendar_name = name.clone();
    }
    if let Some(dir) = &cli.export_dir {
        config.export_dir = dir.clone();
    }

    debug!(?config, "loaded configuration");
    Ok(config)
}

fn run(cli: &Cli) -> Result<CommandResult> {
    let config = load_config(cli)?;

    if cli.remove_from_calendar {
        // clap guarantees --id here
        let id = cli.id.as_deref().unwrap_or_default();
        return cmd_remove(&config, id);
    }

    let Some(file) = cli.file.as_deref() else {
        anyhow::bail!("A protocol file is required");
    };
    let text = extract_text(file, !cli.json)?;

    if let Some(partial_id) = &cli.update {
        return cmd_update(&config, partial_id, &text, cli.json);
    }

    cmd_schedule(cli, &config, file, &text)
}

fn extract_text(file: &Path, show_spinner: bool) -> Result<String> {
    let spinner = show_spinner.then(|| create_spinner(format!("Reading {}", file.display())));
    let text = CommandTextExtractor::new().extract(file);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    text.with_context(|| format!("Could not read {}", file.display()))
}

fn cmd_remove(config: &LabCalConfig, id: &str) -> Result<CommandResult> {
    let backend = select_backend(config)?;
    let sync = ScheduleSynchronizer::new(backend.as_ref());

    let report = sync
        .remove(id)
        .with_context(|| format!("Could not remove events for experiment {}", id))?;

    Ok(CommandResult::new(report.success(), report.message()))
}

fn cmd_update(
    config: &LabCalConfig,
    partial_id: &str,
    text: &str,
    json: bool,
) -> Result<CommandResult> {
    let backend = select_backend(config)?;
    let sync = ScheduleSynchronizer::new(backend.as_ref());

    let spinner = (!json).then(|| create_spinner(format!("Updating experiments matching '{}'", partial_id)));
    let report = sync.update(partial_id, text);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report =
        report.with_context(|| format!("Could not update experiments matching '{}'", partial_id))?;

    if !json {
        print!("{}", report.render());
    }

    Ok(CommandResult::new(report.success(), report.message()))
}

/// Print the schedule, write the summary file and, with an id, add the events.
///
/// The document is parsed and dated once; the listing, the summary and the
/// calendar all get the same entries.
fn cmd_schedule(cli: &Cli, config: &LabCalConfig, file: &Path, text: &str) -> Result<CommandResult> {
    let reference_date = match &cli.day0 {
        Some(input) => parse_reference_date(input)?,
        None => today(),
    };

    let id = cli.id.as_deref();
    if let Some(id) = id {
        validate_experiment_id(id)?;
    }

    let day_entries = extract_day_entries(text)?;
    if day_entries.is_empty() {
        return Ok(CommandResult::new(
            false,
            labcal_core::LabCalError::NoEntriesFound.to_string(),
        ));
    }

    let entries = assign_dates(&day_entries, reference_date, id.unwrap_or_default())?;
    let title = extract_title(text);

    if !cli.json {
        print!("{}", render_schedule(title.as_deref(), &entries, id));
    }

    if !cli.no_summary {
        let cwd = std::env::current_dir()?;
        let path = summary::write_summary(&cwd, file, title.as_deref(), id, reference_date, &entries)?;
        if !cli.json {
            println!("Schedule saved to {}", path.display());
        }
    }

    let Some(id) = id.filter(|_| !cli.no_calendar) else {
        return Ok(CommandResult::new(
            true,
            format!("Parsed {} day entries (calendar not updated)", entries.len()),
        ));
    };

    let backend = select_backend(config)?;
    let sync = ScheduleSynchronizer::new(backend.as_ref());
    let report = sync
        .add_schedule(entries, reference_date, id)
        .with_context(|| format!("Could not add events for experiment {}", id))?;

    Ok(CommandResult::new(report.success(), report.message()))
}
