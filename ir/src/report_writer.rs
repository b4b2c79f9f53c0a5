use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::report::{Report, ReportCollection};

pub trait ReportFilter {
    /// Returns true if the report should be included.
    fn filter(&self, report: &Report) -> bool;
}

impl<F: Fn(&Report) -> bool> ReportFilter for F {
    fn filter(&self, report: &Report) -> bool {
        self(report)
    }
}

pub trait ReportWriter {
    /// Filter and write the given reports. Returns the number written.
    fn write(&mut self, reports: &ReportCollection) -> usize;

    #[must_use]
    fn written(&self) -> usize;
}

#[derive(Default)]
pub struct StdoutWriter {
    verbose: bool,
    written: usize,
    filters: Vec<Box<dyn ReportFilter>>,
}

impl StdoutWriter {
    pub fn new(verbose: bool) -> StdoutWriter {
        StdoutWriter { verbose, ..Default::default() }
    }

    pub fn add_filter(mut self, filter: impl ReportFilter + 'static) -> StdoutWriter {
        self.filters.push(Box::new(filter));
        self
    }

    fn filter<'a>(&self, reports: &'a ReportCollection) -> Vec<&'a Report> {
        reports.iter().filter(|report| self.filters.iter().all(|f| f.filter(report))).collect()
    }

    fn print_one(stream: &mut StandardStream, report: &Report, verbose: bool) {
        let color = match report.category() {
            crate::report::MessageCategory::Error => Color::Red,
            crate::report::MessageCategory::Warning => Color::Yellow,
            crate::report::MessageCategory::Info => Color::Blue,
        };
        let _ = stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(stream, "{}", report.category());
        let _ = stream.reset();
        let _ = writeln!(stream, ": {}", report.message());
        for location in report.locations() {
            let _ = writeln!(stream, "  --> {} (node {})", location.function, location.node_id);
        }
        for note in report.notes() {
            let _ = writeln!(stream, "  = note: {note}");
        }
        if verbose {
            let _ = writeln!(stream, "  = note: to ignore this type of result, use `--allow {}`", report.id());
        }
    }
}

impl ReportWriter for StdoutWriter {
    fn write(&mut self, reports: &ReportCollection) -> usize {
        let filtered = self.filter(reports);
        let choice =
            if atty::is(atty::Stream::Stdout) { ColorChoice::Always } else { ColorChoice::Never };
        let mut stream = StandardStream::stdout(choice);
        for report in &filtered {
            Self::print_one(&mut stream, report, self.verbose);
        }
        self.written += filtered.len();
        filtered.len()
    }

    fn written(&self) -> usize {
        self.written
    }
}

/// Accumulates filtered reports across every call to [`ReportWriter::write`]
/// and serializes them as a JSON array on [`JsonWriter::flush`], one array
/// element per report's [`Report::data`] (falling back to its message for a
/// report a detector never attached structured data to). This is the §6
/// result schema writer the CLI's `--output` flag uses, the JSON analog of
/// `StdoutWriter`'s colored text rendering.
#[derive(Default)]
pub struct JsonWriter {
    path: PathBuf,
    written: usize,
    buffer: Vec<serde_json::Value>,
    filters: Vec<Box<dyn ReportFilter>>,
}

impl JsonWriter {
    pub fn new(path: impl Into<PathBuf>) -> JsonWriter {
        JsonWriter { path: path.into(), ..Default::default() }
    }

    pub fn add_filter(mut self, filter: impl ReportFilter + 'static) -> JsonWriter {
        self.filters.push(Box::new(filter));
        self
    }

    fn filter<'a>(&self, reports: &'a ReportCollection) -> Vec<&'a Report> {
        reports.iter().filter(|report| self.filters.iter().all(|f| f.filter(report))).collect()
    }

    /// Write the JSON array accumulated so far to `path`. A host calls this
    /// once after the last [`ReportWriter::write`] call, since unlike
    /// `StdoutWriter` a JSON array can't be appended to incrementally.
    pub fn flush(&self) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.buffer)?;
        fs::write(&self.path, json)
    }
}

impl ReportWriter for JsonWriter {
    fn write(&mut self, reports: &ReportCollection) -> usize {
        let filtered = self.filter(reports);
        for report in &filtered {
            let value = report
                .data()
                .cloned()
                .unwrap_or_else(|| serde_json::json!({"code": report.id(), "message": report.message()}));
            self.buffer.push(value);
        }
        self.written += filtered.len();
        filtered.len()
    }

    fn written(&self) -> usize {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MessageCategory;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tainted-storage-report-writer-test-{}-{}.json", std::process::id(), name))
    }

    #[test]
    fn writes_structured_data_when_present_and_falls_back_to_message_otherwise() {
        let path = scratch_path("data-and-fallback");

        let mut with_data = Report::new(MessageCategory::Warning, "tainted-storage", "ignored");
        with_data.set_data(serde_json::json!({"variable": "C.s", "slot": 0}));
        let without_data = Report::new(MessageCategory::Warning, "tainted-storage", "no structured data");

        let mut writer = JsonWriter::new(&path);
        let count = writer.write(&vec![with_data, without_data]);
        assert_eq!(count, 2);
        assert_eq!(writer.written(), 2);

        writer.flush().unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["slot"].as_i64(), Some(0));
        assert_eq!(array[1]["message"].as_str(), Some("no structured data"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn respects_filters_like_stdout_writer() {
        let path = scratch_path("filters");
        let report = Report::new(MessageCategory::Info, "tainted-storage", "below level");

        let mut writer =
            JsonWriter::new(&path).add_filter(|r: &Report| r.category() >= MessageCategory::Warning);
        let count = writer.write(&vec![report]);
        assert_eq!(count, 0);
        assert_eq!(writer.written(), 0);
    }
}
