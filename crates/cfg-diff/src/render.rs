//! Report rendering

use crate::compare::{ChangeKind, DiffReport, FieldDiff};
use crate::{Error, Result};
use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;
use tracing::{debug, trace};

const CSV_HEADERS: [&str; 6] = ["struct", "path", "original", "patched", "change", "delta"];

/// Output format for a [`DiffReport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Csv,
    Json,
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// Render `report` in `format`.
pub fn render(report: &DiffReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Csv => {
            let mut buffer = Vec::new();
            write_csv(report, &mut buffer)?;
            String::from_utf8(buffer).map_err(|e| Error::Render(e.to_string()))
        }
        ReportFormat::Json => render_json(report),
    }
}

/// Aligned plain-text report with a summary footer.
pub fn render_text(report: &DiffReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Config comparison ({})",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for diff in &report.structs {
        out.push('\n');
        if diff.missing_in_original {
            let _ = writeln!(out, "== {} (not in original)", diff.name);
        } else {
            let _ = writeln!(out, "== {}", diff.name);
        }

        let path_width = diff
            .fields
            .iter()
            .map(|f| f.path.chars().count())
            .max()
            .unwrap_or(0);
        let original_width = diff
            .fields
            .iter()
            .map(|f| f.original.as_deref().unwrap_or("-").chars().count())
            .max()
            .unwrap_or(0);

        for field in &diff.fields {
            let original = field.original.as_deref().unwrap_or("-");
            let _ = writeln!(
                out,
                "  {:<path_width$}  {:>original_width$} -> {}  {}",
                field.path,
                original,
                field.patched,
                marker(field)
            );
        }
    }

    let s = &report.summary;
    let _ = write!(
        out,
        "\n{} of {} structs changed: {} modified, {} added, {} unchanged\n",
        s.structs_changed, s.structs_compared, s.modified, s.added, s.unchanged
    );
    out
}

fn marker(field: &FieldDiff) -> String {
    match (field.kind, field.delta()) {
        (ChangeKind::Modified, Some(delta)) if delta > 0.0 => format!("[+{delta}]"),
        (ChangeKind::Modified, Some(delta)) if delta < 0.0 => format!("[{delta}]"),
        (kind, _) => format!("[{kind}]"),
    }
}

/// One CSV row per reported field.
pub fn write_csv<W: Write>(report: &DiffReport, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    csv_writer
        .write_record(CSV_HEADERS)
        .map_err(|e| Error::Render(e.to_string()))?;

    let mut rows = 0;
    for diff in &report.structs {
        for field in &diff.fields {
            let delta = field.delta().map(|d| d.to_string()).unwrap_or_default();
            let kind = field.kind.to_string();
            let record = [
                diff.name.as_str(),
                field.path.as_str(),
                field.original.as_deref().unwrap_or(""),
                field.patched.as_str(),
                kind.as_str(),
                delta.as_str(),
            ];
            csv_writer
                .write_record(record)
                .map_err(|e| Error::Render(e.to_string()))?;
            trace!(?record, "Wrote CSV row");
            rows += 1;
        }
    }

    csv_writer
        .flush()
        .map_err(|e| Error::Render(e.to_string()))?;
    debug!(rows, "Finished writing diff CSV");
    Ok(())
}

/// Pretty-printed JSON of the whole report.
pub fn render_json(report: &DiffReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| Error::Render(e.to_string()))
}
