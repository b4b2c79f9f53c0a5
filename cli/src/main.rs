use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use analysis::{config as detector_config, detect, Finding};
use ir::{JsonWriter, MessageCategory, Report, ReportCollection, ReportLocation, ReportWriter, StdoutWriter};

mod config;

#[derive(Parser, Debug)]
/// A static analyzer for tainted-storage writes in lowered smart-contract IR.
struct Cli {
    /// Host-IR JSON document(s) to analyze
    #[clap(name = "INPUT")]
    input_files: Vec<PathBuf>,

    /// Output level (INFO, WARNING, or ERROR)
    #[clap(short = 'l', long = "level", name = "LEVEL", default_value = config::DEFAULT_LEVEL)]
    output_level: MessageCategory,

    /// Write all findings to a JSON file, in addition to the stdout report
    #[clap(short, long, name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Ignore results from the given detector ids
    #[clap(short = 'a', long = "allow", name = "ID")]
    allow_list: Vec<String>,

    /// Enable verbose output
    #[clap(short = 'v', long = "verbose")]
    verbose: bool,
}

/// Analyze one host-IR JSON document, returning the findings produced by
/// every registered detector (currently just `tainted-storage`).
fn analyze_file(path: &PathBuf) -> Result<Vec<Finding>> {
    let source = fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))?;
    let doc = ir::parse_unit(&source).with_context(|| format!("failed to parse `{}`", path.display()))?;
    let (unit, layout) = ir::lower(doc).with_context(|| format!("failed to lower `{}`", path.display()))?;
    Ok(detect(&unit, &layout))
}

/// Build a report for one finding. Carries the finding's own serialization
/// as structured data (the §6 result schema) so `JsonWriter` can emit it
/// verbatim, alongside the human-facing message `StdoutWriter` prints.
fn finding_to_report(finding: &Finding) -> Report {
    let mut report = Report::warning(
        detector_config::ARGUMENT,
        format!(
            "`{}` is tainted by {} (slot {}, offset {})",
            finding.variable, finding.taint_source, finding.slot, finding.offset
        ),
    );
    report.add_location(ReportLocation {
        function: finding.function.clone(),
        node_id: finding.node_index(),
    });
    report.add_note(format!("contract `{}`, slot hex `{}`", finding.contract, finding.slot_hex));
    if let Ok(data) = serde_json::to_value(finding) {
        report.set_data(data);
    }
    report
}

/// Returns true if the report level is greater than or equal to the given
/// level.
fn filter_by_level(report: &Report, output_level: &MessageCategory) -> bool {
    report.category() >= *output_level
}

/// Returns true if the report id is not in the given list.
fn filter_by_id(report: &Report, allow_list: &[String]) -> bool {
    !allow_list.iter().any(|id| id.as_str() == report.id())
}

fn log_message(message: &str) {
    let mut writer = if atty::is(atty::Stream::Stdout) {
        StandardStream::stdout(ColorChoice::Always)
    } else {
        StandardStream::stdout(ColorChoice::Never)
    };
    // We ignore logging failures.
    let _ = writer.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
    let _ = write!(&mut writer, "tainted-storage");
    let _ = writer.reset();
    let _ = writeln!(&mut writer, ": {message}");
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let options = Cli::parse();
    if options.input_files.is_empty() {
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    }

    let allow_list = options.allow_list.clone();
    let output_level = options.output_level;
    let mut writer = StdoutWriter::new(options.verbose)
        .add_filter(move |report: &Report| filter_by_id(report, &allow_list))
        .add_filter(move |report: &Report| filter_by_level(report, &output_level));

    let json_allow_list = options.allow_list.clone();
    let mut json_writer = options.output.as_ref().map(|output| {
        JsonWriter::new(output)
            .add_filter(move |report: &Report| filter_by_id(report, &json_allow_list))
            .add_filter(move |report: &Report| filter_by_level(report, &output_level))
    });

    for path in &options.input_files {
        log_message(&format!("analyzing compilation unit `{}`", path.display()));
        match analyze_file(path) {
            Ok(findings) => {
                let reports: ReportCollection = findings.iter().map(finding_to_report).collect();
                writer.write(&reports);
                if let Some(json_writer) = &mut json_writer {
                    json_writer.write(&reports);
                }
            }
            Err(error) => log_message(&format!("error: {error:#}")),
        }
    }

    if let (Some(json_writer), Some(output)) = (&json_writer, &options.output) {
        match json_writer.flush() {
            Ok(()) => log_message(&format!("results written to `{}`", output.display())),
            Err(error) => log_message(&format!("failed to write `{}`: {error}", output.display())),
        }
    }

    // Use the exit code to indicate if any issues were found.
    match writer.written() {
        0 => {
            log_message("No issues found.");
            ExitCode::SUCCESS
        }
        1 => {
            log_message("1 issue found.");
            ExitCode::FAILURE
        }
        n => {
            log_message(&format!("{n} issues found."));
            ExitCode::FAILURE
        }
    }
}
