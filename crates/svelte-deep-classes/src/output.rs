//! Output formatting.

use crate::cli::OutputFormat;
use crate::orchestrator::{CliError, FileReport, Processed};
use camino::Utf8Path;
use serde::Serialize;

/// One processed file in the JSON report.
#[derive(Debug, Serialize)]
pub struct FileRecord {
    /// Path relative to the workspace.
    pub filename: String,
    /// The rewritten markup.
    pub code: String,
    /// The V3 source map, if one was produced.
    pub map: Option<serde_json::Value>,
    /// True if the file was left as is.
    pub unchanged: bool,
}

impl FileRecord {
    fn new(path: &Utf8Path, processed: Processed) -> Result<Self, CliError> {
        let map = processed
            .map
            .map(|map| {
                let json = map.to_json().map_err(|source| CliError::Map {
                    path: path.to_owned(),
                    source,
                })?;
                serde_json::from_str(&json).map_err(CliError::Output)
            })
            .transpose()?;
        Ok(Self {
            filename: path.to_string(),
            code: processed.code,
            map,
            unchanged: processed.unchanged,
        })
    }
}

/// Everything a run prints.
#[derive(Debug, Default)]
pub struct Rendered {
    /// Text for stdout.
    pub stdout: String,
    /// Per-file failures, reported on stderr.
    pub failures: Vec<CliError>,
    /// Counts for the summary line.
    pub summary: RunSummary,
}

/// Formats file reports for output.
pub struct Formatter {
    format: OutputFormat,
    writes_files: bool,
}

impl Formatter {
    /// Creates a new formatter. When `writes_files` is set, human output
    /// does not echo transformed files.
    pub fn new(format: OutputFormat, writes_files: bool) -> Self {
        Self {
            format,
            writes_files,
        }
    }

    /// Prints the reports and returns the run summary.
    pub fn print(&self, reports: Vec<FileReport>) -> Result<RunSummary, CliError> {
        let rendered = self.render(reports)?;
        print!("{}", rendered.stdout);
        for failure in rendered.failures {
            eprintln!("{:?}", miette::Report::new(failure));
        }
        if self.format == OutputFormat::Human {
            eprintln!("{}", rendered.summary.format());
        }
        Ok(rendered.summary)
    }

    /// Formats the reports without printing them.
    pub fn render(&self, reports: Vec<FileReport>) -> Result<Rendered, CliError> {
        let mut rendered = Rendered::default();
        let mut records = Vec::new();

        for report in reports {
            rendered.summary.file_count += 1;
            let processed = match report.outcome {
                Ok(processed) => processed,
                Err(error) => {
                    rendered.summary.failed_count += 1;
                    rendered.failures.push(error);
                    continue;
                }
            };
            if !processed.unchanged {
                rendered.summary.changed_count += 1;
            }

            match self.format {
                OutputFormat::Human => {
                    if !self.writes_files && !processed.unchanged {
                        rendered
                            .stdout
                            .push_str(&format_human(&report.path, &processed.code));
                    }
                }
                OutputFormat::Json => records.push(FileRecord::new(&report.path, processed)?),
            }
        }

        if self.format == OutputFormat::Json {
            let json = serde_json::to_string_pretty(&records).map_err(CliError::Output)?;
            rendered.stdout = format!("{json}\n");
        }
        Ok(rendered)
    }
}

/// Formats one transformed file under a path header.
fn format_human(path: &Utf8Path, code: &str) -> String {
    let mut out = format!("=== {path} ===\n{code}");
    if !code.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Summary of a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of files processed.
    pub file_count: usize,
    /// Number of files whose output differs from the input.
    pub changed_count: usize,
    /// Number of files that could not be processed.
    pub failed_count: usize,
}

impl RunSummary {
    /// Formats the summary line.
    pub fn format(&self) -> String {
        let file_word = if self.file_count == 1 {
            "file"
        } else {
            "files"
        };
        format!(
            "svelte-deep-classes processed {} {}: {} rewritten, {} failed",
            self.file_count, file_word, self.changed_count, self.failed_count
        )
    }
}
