use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::candidate::{BulkUploadRequest, JobSummary, RawRow, UploadReceipt};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Session expired. Please sign in again as a recruiter.")]
    Unauthorized,

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl BackendError {
    /// Text shown to the recruiter when a submit fails.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            BackendError::Api { .. } => "Upload failed".to_string(),
            other => other.to_string(),
        }
    }
}

/// Everything the intake panel needs from the recruitment backend.
#[async_trait]
pub trait CandidateBackend: Send + Sync {
    async fn list_recruiter_jobs(&self) -> Result<Vec<JobSummary>, BackendError>;

    async fn parse_pdf(&self, file_name: &str, bytes: Vec<u8>)
        -> Result<Vec<RawRow>, BackendError>;

    /// Returns the subset of `emails` already stored as candidates, lower-cased.
    async fn check_duplicates(&self, emails: &[String]) -> Result<BTreeSet<String>, BackendError>;

    async fn bulk_upload(&self, request: &BulkUploadRequest)
        -> Result<UploadReceipt, BackendError>;
}
