//! What a load or append did

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::pipeline::InputFiles;

/// Which ingestion operation ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Destructive full replace
    Load,
    /// Additive, duplicate-skipping merge
    Append,
}

impl IngestMode {
    pub fn as_str(self) -> &'static str {
        match self {
            IngestMode::Load => "load",
            IngestMode::Append => "append",
        }
    }
}

impl fmt::Display for IngestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-table insert counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub created: usize,
    /// Natural key already present
    pub skipped: usize,
    /// Refused by the store, e.g. a dangling order reference
    pub rejected: usize,
}

/// A row that was not stored, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub file: PathBuf,
    pub line: u64,
    pub reason: String,
}

impl RowIssue {
    pub fn new(file: &Path, line: u64, reason: String) -> Self {
        Self {
            file: file.to_path_buf(),
            line,
            reason,
        }
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.reason)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub mode: IngestMode,
    pub orders_file: PathBuf,
    pub barcodes_file: PathBuf,
    pub orders: RowCounts,
    pub barcodes: RowCounts,
    /// Rows that failed field validation
    pub invalid_rows: usize,
    pub issues: Vec<RowIssue>,
}

impl IngestReport {
    pub fn new(mode: IngestMode, files: &InputFiles) -> Self {
        Self {
            mode,
            orders_file: files.orders.clone(),
            barcodes_file: files.barcodes.clone(),
            orders: RowCounts::default(),
            barcodes: RowCounts::default(),
            invalid_rows: 0,
            issues: Vec::new(),
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} orders added ({} skipped), {} barcodes added ({} skipped), {} rows not stored",
            self.orders.created,
            self.orders.skipped,
            self.barcodes.created,
            self.barcodes.skipped,
            self.issues.len()
        )
    }

    /// `(label, value)` pairs for tabular output
    pub fn metrics(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Orders added", self.orders.created.to_string()),
            ("Orders skipped", self.orders.skipped.to_string()),
            ("Orders rejected", self.orders.rejected.to_string()),
            ("Barcodes added", self.barcodes.created.to_string()),
            ("Barcodes skipped", self.barcodes.skipped.to_string()),
            ("Barcodes rejected", self.barcodes.rejected.to_string()),
            ("Invalid rows", self.invalid_rows.to_string()),
        ]
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingest ({}):", self.mode)?;
        writeln!(f, "  Orders file: {}", self.orders_file.display())?;
        writeln!(f, "  Barcodes file: {}", self.barcodes_file.display())?;
        for (label, value) in self.metrics() {
            writeln!(f, "  {}: {}", label, value)?;
        }
        Ok(())
    }
}
