use std::sync::Arc;

use tracing::warn;

use crate::domain::entities::candidate::{choose_default_job, JobId, JobSummary};
use crate::usecase::ports::backend::{BackendError, CandidateBackend};

pub const JOBS_LOAD_FAILED: &str =
    "Failed to load your jobs. Make sure you are logged in as a recruiter.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSelection {
    pub jobs: Vec<JobSummary>,
    pub selected: Option<JobId>,
}

pub struct JobService {
    backend: Arc<dyn CandidateBackend>,
}

impl JobService {
    pub fn new(backend: Arc<dyn CandidateBackend>) -> Self {
        Self { backend }
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>, BackendError> {
        self.backend.list_recruiter_jobs().await
    }

    /// Reloads the recruiter's postings, keeping `current` selected when it still exists.
    pub async fn refresh_selection(
        &self,
        current: Option<&JobId>,
    ) -> Result<JobSelection, BackendError> {
        let jobs = self.list_jobs().await.map_err(|err| {
            warn!("failed to load recruiter jobs: {err}");
            err
        })?;
        let selected = choose_default_job(&jobs, current);
        Ok(JobSelection { jobs, selected })
    }
}
