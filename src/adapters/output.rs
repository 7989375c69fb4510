use crate::domain::DuplicateGroup;
use crate::ports::ReportPort;
use anyhow::{Context, Result};
use std::cell::{Cell, RefCell};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const GROUP_DELIMITER: &str = "----------";

/// Stdout, or a report file that is truncated by the first write of a run
/// and appended to by every later one.
struct OutputWriter {
    output_file: Option<PathBuf>,
    started: Cell<bool>,
}

impl OutputWriter {
    fn new() -> Self {
        Self {
            output_file: None,
            started: Cell::new(false),
        }
    }

    fn with_file(path: &Path) -> Self {
        Self {
            output_file: Some(path.to_path_buf()),
            started: Cell::new(false),
        }
    }

    fn write_content(&self, content: &str) -> Result<()> {
        match &self.output_file {
            Some(path) => {
                let opened = if self.started.replace(true) {
                    OpenOptions::new().append(true).open(path)
                } else {
                    File::create(path)
                };
                let mut file =
                    opened.with_context(|| format!("Failed to open report file {}", path.display()))?;
                file.write_all(content.as_bytes())
                    .with_context(|| format!("Failed to write report file {}", path.display()))?;
            }
            None => {
                print!("{}", content);
            }
        }
        Ok(())
    }

    /// Leaves an empty report file behind when nothing was written this run.
    fn touch(&self) -> Result<()> {
        if self.output_file.is_some() && !self.started.get() {
            self.write_content("")?;
        }
        Ok(())
    }
}

pub struct ConsoleReportAdapter {
    writer: OutputWriter,
}

impl ConsoleReportAdapter {
    pub fn with_stdout() -> Self {
        Self {
            writer: OutputWriter::new(),
        }
    }

    pub fn with_file(path: &Path) -> Self {
        Self {
            writer: OutputWriter::with_file(path),
        }
    }

    pub fn format_groups(groups: &[DuplicateGroup]) -> String {
        if groups.is_empty() {
            return "No duplicate files found\n".to_string();
        }

        let mut output = String::from("The following files have identical contents:\n\n");
        for group in groups {
            for file in &group.files {
                output.push_str(&format!("\t\t{}\n", file.display()));
            }
            output.push_str(GROUP_DELIMITER);
            output.push('\n');
        }
        output
    }
}

impl ReportPort for ConsoleReportAdapter {
    fn write_groups(&self, groups: &[DuplicateGroup]) -> Result<()> {
        self.writer.write_content(&Self::format_groups(groups))
    }

    fn finish(&self) -> Result<()> {
        self.writer.touch()
    }
}

/// Collects every argument's groups and writes them as one JSON array on `finish`.
pub struct JsonReportAdapter {
    writer: OutputWriter,
    pending: RefCell<Vec<DuplicateGroup>>,
}

impl JsonReportAdapter {
    pub fn with_stdout() -> Self {
        Self {
            writer: OutputWriter::new(),
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn with_file(path: &Path) -> Self {
        Self {
            writer: OutputWriter::with_file(path),
            pending: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_groups(&self, groups: &[DuplicateGroup]) -> Result<()> {
        self.pending.borrow_mut().extend_from_slice(groups);
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        let groups = self.pending.take();
        let json = serde_json::to_string_pretty(&groups)?;
        self.writer.write_content(&format!("{}\n", json))
    }
}

/// Same collection as the JSON report; group ids run across every argument.
pub struct CsvReportAdapter {
    writer: OutputWriter,
    pending: RefCell<Vec<DuplicateGroup>>,
}

impl CsvReportAdapter {
    pub fn with_stdout() -> Self {
        Self {
            writer: OutputWriter::new(),
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn with_file(path: &Path) -> Self {
        Self {
            writer: OutputWriter::with_file(path),
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn format_csv_string(groups: &[DuplicateGroup]) -> String {
        let mut output = String::from("group_id,digest,file_path\n");
        for (group_id, group) in groups.iter().enumerate() {
            for file in &group.files {
                output.push_str(&format!(
                    "{},{},{}\n",
                    group_id + 1,
                    group.digest,
                    csv_field(&file.display().to_string())
                ));
            }
        }
        output
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_groups(&self, groups: &[DuplicateGroup]) -> Result<()> {
        self.pending.borrow_mut().extend_from_slice(groups);
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        let groups = self.pending.take();
        self.writer.write_content(&Self::format_csv_string(&groups))
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
