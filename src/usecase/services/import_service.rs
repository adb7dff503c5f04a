use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::domain::entities::candidate::{EditableRow, RawRow};
use crate::infra::import::csv::read_csv_rows;
use crate::infra::import::xlsx::read_spreadsheet_rows;
use crate::platform::desktop::blocking::run_blocking;
use crate::usecase::ports::backend::CandidateBackend;

pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["csv", "xlsx", "xls", "pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
    Pdf,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<FileKind> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())?;
        match ext.as_str() {
            "csv" => Some(FileKind::Csv),
            "xlsx" | "xls" => Some(FileKind::Spreadsheet),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl SourceFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("failed to stat file: {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Names of files that passed the extension and size gates.
    pub accepted_files: Vec<String>,
    pub rows: Vec<EditableRow>,
    pub warnings: Vec<String>,
    /// Set when nothing in the selection had a supported extension.
    pub no_supported_files: bool,
}

pub struct ImportService {
    backend: Arc<dyn CandidateBackend>,
    max_file_bytes: u64,
}

impl ImportService {
    pub fn new(backend: Arc<dyn CandidateBackend>, max_file_bytes: u64) -> Self {
        Self {
            backend,
            max_file_bytes,
        }
    }

    pub fn max_file_mb(&self) -> u64 {
        self.max_file_bytes / (1024 * 1024)
    }

    pub async fn import_paths(&self, paths: &[PathBuf]) -> ImportReport {
        let mut files = Vec::new();
        let mut warnings = Vec::new();
        for path in paths {
            match SourceFile::from_path(path) {
                Ok(file) => files.push(file),
                Err(err) => {
                    warn!("skipping unreadable file: {err:#}");
                    warnings.push(format!("Could not read {}: {err}", path.display()));
                }
            }
        }
        let mut report = self.import_files(files).await;
        warnings.append(&mut report.warnings);
        report.warnings = warnings;
        report
    }

    pub async fn import_files(&self, files: Vec<SourceFile>) -> ImportReport {
        let mut report = ImportReport::default();

        let supported: Vec<(SourceFile, FileKind)> = files
            .into_iter()
            .filter_map(|file| match FileKind::from_path(&file.path) {
                Some(kind) => Some((file, kind)),
                None => {
                    report.warnings.push(format!(
                        "{} is not a CSV, Excel or PDF file. Skipped.",
                        file.name
                    ));
                    None
                }
            })
            .collect();

        if supported.is_empty() {
            report.no_supported_files = true;
            return report;
        }

        for (file, kind) in supported {
            if file.size > self.max_file_bytes {
                report.warnings.push(format!(
                    "{} exceeds {}MB. Skipped.",
                    file.name,
                    self.max_file_mb()
                ));
                continue;
            }

            let raw_rows = match self.parse_file(&file, kind).await {
                Ok(rows) => rows,
                Err(err) => {
                    warn!(file = %file.name, "failed to parse candidate file: {err:#}");
                    report
                        .warnings
                        .push(format!("Could not read {}: {err}", file.name));
                    Vec::new()
                }
            };

            info!(file = %file.name, rows = raw_rows.len(), "parsed candidate file");
            report
                .rows
                .extend(raw_rows.iter().map(EditableRow::from_raw));
            report.accepted_files.push(file.name);
        }

        report
    }

    async fn parse_file(&self, file: &SourceFile, kind: FileKind) -> Result<Vec<RawRow>> {
        let path = file.path.clone();
        match kind {
            FileKind::Csv => run_blocking(move || read_csv_rows(&path)).await?,
            FileKind::Spreadsheet => run_blocking(move || read_spreadsheet_rows(&path)).await?,
            FileKind::Pdf => {
                let bytes = run_blocking(move || std::fs::read(&path))
                    .await?
                    .with_context(|| format!("failed to open pdf: {}", file.path.display()))?;
                let rows = self.backend.parse_pdf(&file.name, bytes).await?;
                Ok(rows)
            }
        }
    }
}
