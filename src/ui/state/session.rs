use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::domain::entities::candidate::{EditableRow, UploadReceipt};
use crate::domain::entities::duplicates::{
    emails_for_remote_check, find_internal_duplicates, rows_to_keep, DuplicateSets, RowFlag,
};
use crate::domain::headers::CanonicalField;
use crate::domain::validation::{email_error, row_prefix, summarize_errors};
use crate::usecase::services::duplicate_service::{DuplicateChecker, RemoteCheckOutcome};
use crate::usecase::services::import_service::ImportReport;
use crate::usecase::services::upload_service::UploadRejection;

pub const ERROR_SUMMARY_LIMIT: usize = 10;
const ROW_ERROR_PREVIEW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Parsing,
    Editing,
    CheckingDuplicates,
    Uploading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    ParseStarted,
    FilesParsed(ImportReport),
    EditCell {
        row: usize,
        field: CanonicalField,
        value: String,
    },
    RemoveRow(usize),
    AddRow,
    CheckDuplicatesRequested,
    /// The shell handed a check to the checker under this sequence number.
    RemoteCheckIssued {
        seq: u64,
    },
    RemoteCheckStarted {
        seq: u64,
    },
    RemoteCheckFinished {
        seq: u64,
        outcome: RemoteCheckOutcome,
    },
    RemoveAllDuplicates,
    ClearAll,
    SubmitRejected(UploadRejection),
    UploadStarted,
    UploadFinished(Result<UploadReceipt, String>),
}

/// Side effect the shell performs after an action is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    ScheduleRemoteCheck(Vec<String>),
    RunRemoteCheck(Vec<String>),
    CancelRemoteCheck,
}

/// Everything the bulk upload panel knows between renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadSession {
    pub files: Vec<String>,
    pub rows: Vec<EditableRow>,
    pub validation_errors: Vec<String>,
    pub email_errors: BTreeMap<usize, String>,
    pub duplicates: DuplicateSets,
    pub last_duplicate_check: Option<DateTime<Local>>,
    pub notices: Vec<Notice>,
    // Imports still running; a second drop can land before the first finishes.
    imports_in_flight: usize,
    uploading: bool,
    checking: bool,
    // Sequence number of the newest check handed to the checker; anything else is stale.
    active_check: Option<u64>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.uploading {
            Phase::Uploading
        } else if self.imports_in_flight > 0 {
            Phase::Parsing
        } else if self.checking {
            Phase::CheckingDuplicates
        } else if self.rows.is_empty() && self.files.is_empty() {
            Phase::Empty
        } else {
            Phase::Editing
        }
    }

    pub fn is_parsing(&self) -> bool {
        self.imports_in_flight > 0
    }

    pub fn is_checking_duplicates(&self) -> bool {
        self.checking
    }

    pub fn active_check(&self) -> Option<u64> {
        self.active_check
    }

    pub fn submit_blocked(&self) -> bool {
        !self.email_errors.is_empty() || !self.duplicates.is_empty()
    }

    pub fn can_submit(&self) -> bool {
        !self.uploading && !self.rows.is_empty() && !self.submit_blocked()
    }

    pub fn submit_label(&self) -> String {
        if self.uploading {
            return "Uploading…".to_string();
        }
        let email_errors = self.email_errors.len();
        if email_errors > 0 {
            let noun = if email_errors == 1 { "Error" } else { "Errors" };
            return format!("Upload Blocked ({email_errors} Email {noun})");
        }
        let duplicates = self.duplicates.total();
        if duplicates > 0 {
            let noun = if duplicates == 1 {
                "Duplicate"
            } else {
                "Duplicates"
            };
            return format!("Upload Blocked ({duplicates} {noun})");
        }
        "Upload Candidates".to_string()
    }

    pub fn row_flag(&self, row_idx: usize) -> RowFlag {
        if let Some(message) = self.email_errors.get(&row_idx) {
            return RowFlag::EmailError(message.clone());
        }
        if let Some(kind) = self
            .rows
            .get(row_idx)
            .and_then(|row| self.duplicates.classify(row_idx, row))
        {
            return RowFlag::Duplicate(kind);
        }
        let prefix = row_prefix(row_idx);
        if self
            .validation_errors
            .iter()
            .any(|message| message.starts_with(&prefix))
        {
            return RowFlag::ValidationError;
        }
        RowFlag::Clean
    }

    pub fn error_summary(&self) -> Vec<String> {
        summarize_errors(&self.validation_errors, ERROR_SUMMARY_LIMIT)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Applies the action, then carries out its effect on `checker`.
    pub fn dispatch(&mut self, action: PanelAction, checker: &DuplicateChecker) {
        let issued = match self.apply(action) {
            Effect::None => None,
            Effect::ScheduleRemoteCheck(emails) => Some(checker.schedule(emails)),
            Effect::RunRemoteCheck(emails) => Some(checker.check_now(emails)),
            Effect::CancelRemoteCheck => {
                checker.cancel();
                None
            }
        };
        if let Some(seq) = issued {
            self.apply(PanelAction::RemoteCheckIssued { seq });
        }
    }

    pub fn apply(&mut self, action: PanelAction) -> Effect {
        match action {
            PanelAction::ParseStarted => {
                self.imports_in_flight += 1;
                self.validation_errors.clear();
                Effect::None
            }
            PanelAction::FilesParsed(report) => self.files_parsed(report),
            PanelAction::EditCell { row, field, value } => self.edit_cell(row, field, value),
            PanelAction::RemoveRow(row) => self.remove_row(row),
            PanelAction::AddRow => {
                self.rows.push(EditableRow::empty());
                self.refresh_internal_duplicates();
                Effect::None
            }
            PanelAction::CheckDuplicatesRequested => {
                self.refresh_internal_duplicates();
                Effect::RunRemoteCheck(emails_for_remote_check(&self.rows))
            }
            PanelAction::RemoteCheckIssued { seq } => {
                self.active_check = Some(seq);
                Effect::None
            }
            PanelAction::RemoteCheckStarted { seq } => {
                if self.active_check == Some(seq) {
                    self.checking = true;
                }
                Effect::None
            }
            PanelAction::RemoteCheckFinished { seq, outcome } => {
                self.remote_check_finished(seq, outcome);
                Effect::None
            }
            PanelAction::RemoveAllDuplicates => self.remove_all_duplicates(),
            PanelAction::ClearAll => {
                self.reset();
                Effect::CancelRemoteCheck
            }
            PanelAction::SubmitRejected(rejection) => {
                self.submit_rejected(rejection);
                Effect::None
            }
            PanelAction::UploadStarted => {
                self.uploading = true;
                self.validation_errors.clear();
                Effect::None
            }
            PanelAction::UploadFinished(result) => self.upload_finished(result),
        }
    }

    fn files_parsed(&mut self, report: ImportReport) -> Effect {
        self.imports_in_flight = self.imports_in_flight.saturating_sub(1);
        self.notices
            .extend(report.warnings.into_iter().map(Notice::warning));

        if report.no_supported_files {
            self.notices.push(Notice::error(
                "Please upload CSV, Excel (XLS/XLSX), or PDF files",
            ));
            return Effect::None;
        }

        let file_count = report.accepted_files.len();
        let row_count = report.rows.len();
        self.files.extend(report.accepted_files);
        self.rows.extend(report.rows);

        if row_count == 0 {
            self.notices.push(Notice::error(
                "No rows found in the selected file(s). Check format (e.g. header row + data).",
            ));
            return Effect::None;
        }

        self.notices.push(Notice::success(format!(
            "Parsed {row_count} row(s) from {file_count} file(s). Edit below and upload when ready."
        )));
        self.refresh_internal_duplicates();
        Effect::RunRemoteCheck(emails_for_remote_check(&self.rows))
    }

    fn edit_cell(&mut self, row_idx: usize, field: CanonicalField, value: String) -> Effect {
        let Some(row) = self.rows.get_mut(row_idx) else {
            return Effect::None;
        };
        row.set(field, value);

        if field == CanonicalField::Email {
            match email_error(row.get(CanonicalField::Email)) {
                Some(message) => {
                    self.email_errors.insert(row_idx, message.to_string());
                }
                None => {
                    self.email_errors.remove(&row_idx);
                }
            }
        }

        let prefix = row_prefix(row_idx);
        self.validation_errors
            .retain(|message| !message.starts_with(&prefix));

        self.refresh_internal_duplicates();
        Effect::ScheduleRemoteCheck(emails_for_remote_check(&self.rows))
    }

    fn remove_row(&mut self, row_idx: usize) -> Effect {
        if row_idx >= self.rows.len() {
            return Effect::None;
        }
        let before = self.rows.len();
        self.rows.remove(row_idx);

        let survivors: BTreeMap<usize, usize> = (0..before)
            .filter(|idx| *idx != row_idx)
            .enumerate()
            .map(|(new, old)| (old, new))
            .collect();
        self.remap_row_indices(&survivors);

        self.refresh_internal_duplicates();
        Effect::RunRemoteCheck(emails_for_remote_check(&self.rows))
    }

    fn remove_all_duplicates(&mut self) -> Effect {
        let keep = rows_to_keep(&self.rows, &self.duplicates.remote);
        let removed = self.rows.len() - keep.len();

        let survivors: BTreeMap<usize, usize> = keep
            .iter()
            .enumerate()
            .map(|(new, old)| (*old, new))
            .collect();
        self.rows = keep.iter().map(|idx| self.rows[*idx].clone()).collect();
        self.remap_row_indices(&survivors);
        self.duplicates.clear();

        self.notices
            .push(Notice::success(format!("Removed {removed} duplicate row(s)")));
        self.refresh_internal_duplicates();
        Effect::RunRemoteCheck(emails_for_remote_check(&self.rows))
    }

    fn remote_check_finished(&mut self, seq: u64, outcome: RemoteCheckOutcome) {
        if self.active_check != Some(seq) {
            debug!(seq, active = ?self.active_check, "ignoring stale duplicate check");
            return;
        }
        self.checking = false;
        self.active_check = None;
        match outcome {
            RemoteCheckOutcome::Duplicates(found) => {
                self.duplicates.remote = found;
                self.last_duplicate_check = Some(Local::now());
            }
            // Already logged by the checker; keep the previous sets.
            RemoteCheckOutcome::Failed(_) => {}
        }
    }

    fn submit_rejected(&mut self, rejection: UploadRejection) {
        let message = rejection.to_string();
        match rejection {
            UploadRejection::NoJobSelected | UploadRejection::NoCandidateData => {}
            UploadRejection::InvalidEmails(errors) => self.email_errors = errors,
            UploadRejection::Duplicates { internal, .. } => self.duplicates.internal = internal,
            UploadRejection::Validation(errors) => self.validation_errors = errors,
        }
        self.notices.push(Notice::error(message));
    }

    fn upload_finished(&mut self, result: Result<UploadReceipt, String>) -> Effect {
        self.uploading = false;
        match result {
            Ok(receipt) => {
                self.reset();
                self.notices.push(Notice::success(format!(
                    "Uploaded {} candidate(s) for this job. Dashboard counts are updated.",
                    receipt.inserted
                )));
                if !receipt.row_errors.is_empty() {
                    let preview: Vec<&str> = receipt
                        .row_errors
                        .iter()
                        .take(ROW_ERROR_PREVIEW)
                        .map(String::as_str)
                        .collect();
                    self.notices.push(Notice::error(format!(
                        "Some rows had errors: {}",
                        preview.join("; ")
                    )));
                }
                Effect::CancelRemoteCheck
            }
            Err(message) => {
                self.notices.push(Notice::error(message));
                Effect::None
            }
        }
    }

    fn reset(&mut self) {
        let notices = std::mem::take(&mut self.notices);
        *self = UploadSession {
            notices,
            ..UploadSession::default()
        };
    }

    fn refresh_internal_duplicates(&mut self) {
        self.duplicates.internal = find_internal_duplicates(&self.rows);
    }

    /// Moves per-row errors to their new indices; rows missing from `survivors` lose them.
    fn remap_row_indices(&mut self, survivors: &BTreeMap<usize, usize>) {
        self.email_errors = std::mem::take(&mut self.email_errors)
            .into_iter()
            .filter_map(|(old, message)| survivors.get(&old).map(|new| (*new, message)))
            .collect();

        self.validation_errors = std::mem::take(&mut self.validation_errors)
            .into_iter()
            .filter_map(|message| {
                let (old, rest) = split_row_message(&message)?;
                survivors
                    .get(&old)
                    .map(|new| format!("{}{rest}", row_prefix(*new)))
            })
            .collect();
    }
}

/// Splits `"Row N: message"` into the zero-based row index and the text after the colon.
fn split_row_message(message: &str) -> Option<(usize, &str)> {
    let rest = message.strip_prefix("Row ")?;
    let colon = rest.find(':')?;
    let number: usize = rest[..colon].parse().ok()?;
    Some((number.checked_sub(1)?, &rest[colon + 1..]))
}
