use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Severity of a diagnostic. Linearly ordered so `--level` can filter by
/// "at least this severe", the way the teacher's `MessageCategory` does.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageCategory {
    Info,
    Warning,
    Error,
}

impl PartialOrd for MessageCategory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageCategory {
    fn cmp(&self, other: &Self) -> Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MessageCategory::*;
        f.write_str(match self {
            Error => "error",
            Warning => "warning",
            Info => "info",
        })
    }
}

impl FromStr for MessageCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(MessageCategory::Error),
            "warning" => Ok(MessageCategory::Warning),
            "info" => Ok(MessageCategory::Info),
            other => Err(anyhow::anyhow!("unknown output level `{other}`")),
        }
    }
}

/// Where in the analyzed unit a report points to. There is no source text
/// in this domain (`spec.md` §1: "does not parse source text"), so a
/// location is a function/node pair rather than a file span.
#[derive(Clone, Debug, Default)]
pub struct ReportLocation {
    pub function: String,
    pub node_id: u32,
}

/// A single diagnostic, generalized from the teacher's span-based
/// `Report` to this domain's function/node locations.
#[derive(Clone, Debug)]
pub struct Report {
    category: MessageCategory,
    code: String,
    message: String,
    locations: Vec<ReportLocation>,
    notes: Vec<String>,
    /// A detector's own structured payload for this report, if it has one
    /// richer than `message`/`notes` (e.g. the §6 result schema a
    /// `JsonWriter` serializes verbatim). Absent for reports that only ever
    /// needed the human-facing rendering.
    data: Option<serde_json::Value>,
}

impl Report {
    pub fn new(category: MessageCategory, code: impl Into<String>, message: impl Into<String>) -> Report {
        Report {
            category,
            code: code.into(),
            message: message.into(),
            locations: Vec::new(),
            notes: Vec::new(),
            data: None,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Report {
        Report::new(MessageCategory::Warning, code, message)
    }

    pub fn add_location(&mut self, location: ReportLocation) -> &mut Self {
        self.locations.push(location);
        self
    }

    pub fn add_note(&mut self, note: impl Into<String>) -> &mut Self {
        self.notes.push(note.into());
        self
    }

    /// Attach a structured payload (`JsonWriter` writes this verbatim in
    /// place of the human-facing fields; `StdoutWriter` ignores it).
    pub fn set_data(&mut self, data: serde_json::Value) -> &mut Self {
        self.data = Some(data);
        self
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn category(&self) -> MessageCategory {
        self.category
    }

    pub fn id(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn locations(&self) -> &[ReportLocation] {
        &self.locations
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

pub type ReportCollection = Vec<Report>;
