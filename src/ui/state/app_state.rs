use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::candidate::{JobId, JobSummary};
use crate::ui::state::session::UploadSession;

#[derive(Clone, Copy)]
pub struct AppState {
    pub session: Signal<UploadSession>,
    pub jobs: Signal<Vec<JobSummary>>,
    pub selected_job: Signal<Option<JobId>>,
    pub jobs_loading: Signal<bool>,
    pub jobs_error: Signal<Option<String>>,
    pub dragging: Signal<bool>,
    pub status: Signal<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: use_signal(UploadSession::new),
            jobs: use_signal(Vec::<JobSummary>::new),
            selected_job: use_signal(|| None::<JobId>),
            jobs_loading: use_signal(|| true),
            jobs_error: use_signal(|| None::<String>),
            dragging: use_signal(|| false),
            status: use_signal(|| "Ready".to_string()),
        }
    }
}
