use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::domain::entities::candidate::{
    BulkUploadRequest, CandidateInput, EditableRow, JobId, UploadReceipt,
};
use crate::domain::entities::duplicates::{find_internal_duplicates, InternalDuplicates};
use crate::domain::validation::{collect_email_errors, validate_rows};
use crate::usecase::ports::backend::{BackendError, CandidateBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    NoJobSelected,
    InvalidEmails(BTreeMap<usize, String>),
    Duplicates {
        database: usize,
        internal: InternalDuplicates,
    },
    NoCandidateData,
    Validation(Vec<String>),
}

impl fmt::Display for UploadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadRejection::NoJobSelected => write!(f, "Please select a job"),
            UploadRejection::InvalidEmails(errors) => write!(
                f,
                "Cannot upload: {} row(s) have invalid or missing email addresses. Please fix all email errors.",
                errors.len()
            ),
            UploadRejection::Duplicates { database, internal } => {
                let mut parts = Vec::new();
                if *database > 0 {
                    parts.push(format!("{database} database duplicate(s)"));
                }
                if !internal.is_empty() {
                    parts.push(format!(
                        "{} preview table duplicate(s)",
                        internal.emails.len()
                    ));
                }
                write!(
                    f,
                    "Cannot upload: {} detected. Please remove all duplicates before uploading.",
                    parts.join(" and ")
                )
            }
            UploadRejection::NoCandidateData => write!(
                f,
                "No candidate data to upload. Add or keep at least one row with name and email."
            ),
            UploadRejection::Validation(errors) => write!(
                f,
                "Fix {} validation error(s) before uploading. See table below.",
                errors.len()
            ),
        }
    }
}

impl std::error::Error for UploadRejection {}

/// Final gate before submission. Runs entirely locally; nothing here touches the network.
pub fn prepare_upload(
    rows: &[EditableRow],
    remote_duplicates: &BTreeSet<String>,
    job: Option<&JobId>,
) -> Result<BulkUploadRequest, UploadRejection> {
    let job_id = job
        .filter(|id| !id.0.trim().is_empty())
        .cloned()
        .ok_or(UploadRejection::NoJobSelected)?;

    let email_errors = collect_email_errors(rows);
    if !email_errors.is_empty() {
        return Err(UploadRejection::InvalidEmails(email_errors));
    }

    // Recomputed here so a stale debounce cannot let duplicates through.
    let internal = find_internal_duplicates(rows);
    let database = rows
        .iter()
        .filter(|row| remote_duplicates.contains(&row.normalized_email()))
        .count();
    if database > 0 || !internal.is_empty() {
        return Err(UploadRejection::Duplicates { database, internal });
    }

    let to_submit: Vec<&EditableRow> = rows.iter().filter(|row| row.has_data()).collect();
    if to_submit.is_empty() {
        return Err(UploadRejection::NoCandidateData);
    }

    let errors = validate_rows(rows);
    if !errors.is_empty() {
        return Err(UploadRejection::Validation(errors));
    }

    Ok(BulkUploadRequest {
        candidates: to_submit.into_iter().map(CandidateInput::from).collect(),
        job_id,
    })
}

pub struct UploadService {
    backend: Arc<dyn CandidateBackend>,
}

impl UploadService {
    pub fn new(backend: Arc<dyn CandidateBackend>) -> Self {
        Self { backend }
    }

    pub async fn submit(&self, request: &BulkUploadRequest) -> Result<UploadReceipt, BackendError> {
        let receipt = self.backend.bulk_upload(request).await?;
        info!(
            job_id = %request.job_id,
            submitted = request.candidates.len(),
            inserted = receipt.inserted,
            row_errors = receipt.row_errors.len(),
            "bulk candidate upload finished"
        );
        Ok(receipt)
    }
}
