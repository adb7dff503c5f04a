use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use dioxus::html::HasFileData;
use dioxus::prelude::*;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::domain::entities::candidate::{EditableRow, JobId};
use crate::domain::entities::duplicates::RowFlag;
use crate::domain::headers::{CanonicalField, CANONICAL_FIELDS};
use crate::infra::export::template::save_template;
use crate::platform::desktop::blocking::run_blocking;
use crate::platform::desktop::dialogs::{
    confirm_clear_all, pick_candidate_files, pick_template_destination,
};
use crate::ui::state::app_state::AppState;
use crate::ui::state::session::{Notice, NoticeLevel, PanelAction, UploadSession};
use crate::usecase::ports::backend::CandidateBackend;
use crate::usecase::services::duplicate_service::{DuplicateCheckEvent, DuplicateChecker};
use crate::usecase::services::import_service::ImportService;
use crate::usecase::services::job_service::{JobService, JOBS_LOAD_FAILED};
use crate::usecase::services::upload_service::{prepare_upload, UploadService};

/// Shared services handed to the UI through the launch context.
#[derive(Clone)]
pub struct AppServices {
    pub backend: Arc<dyn CandidateBackend>,
    pub import: Arc<ImportService>,
    pub upload: Arc<UploadService>,
    pub jobs: Arc<JobService>,
    pub duplicate_debounce: Duration,
}

impl AppServices {
    pub fn new(backend: Arc<dyn CandidateBackend>, config: &AppConfig) -> Self {
        Self {
            import: Arc::new(ImportService::new(
                backend.clone(),
                config.max_file_bytes(),
            )),
            upload: Arc::new(UploadService::new(backend.clone())),
            jobs: Arc::new(JobService::new(backend.clone())),
            duplicate_debounce: config.duplicate_debounce,
            backend,
        }
    }
}

fn notice_style(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Success => "background: #ecfdf5; border: 1px solid #6ee7b7; color: #065f46;",
        NoticeLevel::Warning => "background: #fffbeb; border: 1px solid #fcd34d; color: #92400e;",
        NoticeLevel::Error => "background: #fef2f2; border: 1px solid #fca5a5; color: #991b1b;",
    }
}

fn start_import(
    paths: Vec<PathBuf>,
    import_service: Arc<ImportService>,
    checker: Rc<DuplicateChecker>,
    mut session: Signal<UploadSession>,
) {
    if paths.is_empty() {
        return;
    }
    session
        .write()
        .dispatch(PanelAction::ParseStarted, &checker);
    spawn(async move {
        let report = import_service.import_paths(&paths).await;
        session
            .write()
            .dispatch(PanelAction::FilesParsed(report), &checker);
    });
}

#[component]
fn CandidateRow(
    idx: usize,
    row: EditableRow,
    flag: RowFlag,
    on_edit: EventHandler<(usize, CanonicalField, String)>,
    on_remove: EventHandler<usize>,
) -> Element {
    let row_style = flag.row_style();
    let tooltip = flag.tooltip().to_string();
    let email_invalid = matches!(flag, RowFlag::EmailError(_));
    let number = idx + 1;

    rsx! {
        tr {
            style: "{row_style}",
            title: "{tooltip}",
            td { style: "padding: 4px 6px; color: #888;", "{number}" }
            {CANONICAL_FIELDS.iter().map(|field| {
                let field = *field;
                let value = row.get(field).to_string();
                let placeholder = if field.is_required() { "Required" } else { "" };
                let border = if field == CanonicalField::Email && email_invalid {
                    "#ef4444"
                } else {
                    "#ccc"
                };
                rsx!(
                    td {
                        style: "padding: 2px 4px;",
                        input {
                            style: "width: 100%; min-width: 90px; padding: 4px 6px; border: 1px solid {border}; border-radius: 4px;",
                            value: "{value}",
                            placeholder: "{placeholder}",
                            oninput: move |event| on_edit.call((idx, field, event.value())),
                        }
                    }
                )
            })}
            td {
                style: "padding: 2px 4px;",
                button {
                    style: "border: none; background: transparent; color: #dc2626; cursor: pointer;",
                    onclick: move |_| on_remove.call(idx),
                    "Remove"
                }
            }
        }
    }
}

#[component]
pub fn App() -> Element {
    let services = use_context::<AppServices>();

    let AppState {
        mut session,
        mut jobs,
        mut selected_job,
        mut jobs_loading,
        mut jobs_error,
        mut dragging,
        mut status,
    } = AppState::new();

    let checker = use_hook(|| {
        let (checker, mut events) =
            DuplicateChecker::new(services.backend.clone(), services.duplicate_debounce);
        spawn(async move {
            while let Some(event) = events.recv().await {
                let action = match event {
                    DuplicateCheckEvent::Started { seq } => PanelAction::RemoteCheckStarted { seq },
                    DuplicateCheckEvent::Finished { seq, outcome } => {
                        PanelAction::RemoteCheckFinished { seq, outcome }
                    }
                };
                session.write().apply(action);
            }
        });
        Rc::new(checker)
    });

    {
        let checker = checker.clone();
        use_drop(move || checker.cancel());
    }

    let job_service = services.jobs.clone();
    use_future(move || {
        let job_service = job_service.clone();
        async move {
            jobs_loading.set(true);
            let current = selected_job.peek().clone();
            match job_service.refresh_selection(current.as_ref()).await {
                Ok(selection) => {
                    info!(count = selection.jobs.len(), "recruiter jobs loaded");
                    jobs.set(selection.jobs);
                    selected_job.set(selection.selected);
                    jobs_error.set(None);
                }
                Err(_) => jobs_error.set(Some(JOBS_LOAD_FAILED.to_string())),
            }
            jobs_loading.set(false);
        }
    });

    let snapshot = session.read().clone();
    let row_count = snapshot.rows.len();
    let file_count = snapshot.files.len();
    let submit_label = snapshot.submit_label();
    let can_submit = snapshot.can_submit();
    let checking = snapshot.is_checking_duplicates();
    let parsing = snapshot.is_parsing();
    let error_summary = snapshot.error_summary();
    let database_duplicates = snapshot.duplicates.database_row_count(&snapshot.rows);
    let internal_duplicates = snapshot.duplicates.internal.rows.len();
    let has_duplicates = !snapshot.duplicates.is_empty();
    let last_checked = snapshot
        .last_duplicate_check
        .map(|at| at.format("%H:%M:%S").to_string());
    let selected_value = selected_job().map(|id| id.0).unwrap_or_default();
    let max_file_mb = services.import.max_file_mb();
    let drop_zone_border = if dragging() { "#10b981" } else { "#bbb" };

    let import_for_browse = services.import.clone();
    let checker_for_browse = checker.clone();
    let import_for_drop = services.import.clone();
    let checker_for_drop = checker.clone();
    let checker_for_edit = checker.clone();
    let checker_for_remove = checker.clone();
    let checker_for_add = checker.clone();
    let checker_for_check = checker.clone();
    let checker_for_dedupe = checker.clone();
    let checker_for_clear = checker.clone();
    let checker_for_upload = checker.clone();
    let upload_service = services.upload.clone();

    rsx! {
        div {
            style: "font-family: sans-serif; padding: 16px; display: flex; flex-direction: column; gap: 14px;",

            h1 { style: "margin: 0;", "Bulk Candidate Upload" }

            div {
                style: "display: flex; align-items: center; gap: 8px;",
                label { "Job" }
                if jobs_loading() {
                    span { style: "color: #666;", "Loading jobs..." }
                } else if let Some(message) = jobs_error() {
                    span { style: "color: #b91c1c;", "{message}" }
                } else if jobs().is_empty() {
                    span {
                        style: "color: #666;",
                        "No jobs posted yet. Create a job from the dashboard first."
                    }
                } else {
                    select {
                        style: "padding: 4px 8px; border-radius: 6px;",
                        value: "{selected_value}",
                        onchange: move |event| {
                            let value = event.value();
                            selected_job.set((!value.is_empty()).then(|| JobId(value)));
                        },
                        option { value: "", "Select a job" }
                        {jobs().into_iter().map(|job| {
                            let id = job.id.0.clone();
                            let is_selected = id == selected_value;
                            let label = job.option_label();
                            rsx!(option { value: "{id}", selected: is_selected, "{label}" })
                        })}
                    }
                }
            }

            div {
                style: "border: 2px dashed {drop_zone_border}; border-radius: 10px; padding: 20px; text-align: center;",
                ondragover: move |event| {
                    event.prevent_default();
                    dragging.set(true);
                },
                ondragleave: move |_| dragging.set(false),
                ondrop: move |event| {
                    event.prevent_default();
                    dragging.set(false);
                    let paths: Vec<PathBuf> = event.files().iter().map(|file| file.path()).collect();
                    start_import(paths, import_for_drop.clone(), checker_for_drop.clone(), session);
                },
                p { style: "margin: 0 0 6px 0; font-weight: 600;", "Drag and drop file here, or browse" }
                p {
                    style: "margin: 0 0 10px 0; color: #666;",
                    "CSV, XLS, XLSX, PDF • Max {max_file_mb}MB • Multiple files allowed"
                }
                div {
                    style: "display: flex; gap: 8px; justify-content: center;",
                    button {
                        disabled: parsing,
                        onclick: move |_| {
                            let paths = pick_candidate_files();
                            start_import(paths, import_for_browse.clone(), checker_for_browse.clone(), session);
                        },
                        "Browse files"
                    }
                    button {
                        onclick: move |_| {
                            let Some(path) = pick_template_destination() else {
                                return;
                            };
                            spawn(async move {
                                let target = path.clone();
                                let result = run_blocking(move || save_template(&target))
                                    .await
                                    .and_then(|saved| saved);
                                match result {
                                    Ok(()) => {
                                        status.set(format!("Template saved to {}", path.display()));
                                        session
                                            .write()
                                            .notices
                                            .push(Notice::success("Template downloaded"));
                                    }
                                    Err(err) => {
                                        error!("failed to save template: {err:#}");
                                        session
                                            .write()
                                            .notices
                                            .push(Notice::error(format!("Could not save template: {err}")));
                                    }
                                }
                            });
                        },
                        "Download template"
                    }
                }
                if parsing {
                    p { style: "margin: 8px 0 0 0; color: #666;", "Parsing file…" }
                }
            }

            if file_count > 0 {
                div {
                    style: "display: flex; justify-content: space-between; padding: 8px 12px; background: #ecfdf5; border-radius: 8px;",
                    span { "{file_count} file(s) processed" }
                    button {
                        style: "border: none; background: transparent; color: #dc2626; cursor: pointer;",
                        onclick: move |_| {
                            if confirm_clear_all(file_count, row_count) {
                                session.write().dispatch(PanelAction::ClearAll, &checker_for_clear);
                            }
                        },
                        "Clear all & start over"
                    }
                }
            }

            {snapshot.notices.iter().map(|notice| {
                let style = notice_style(notice.level);
                let message = notice.message.clone();
                rsx!(div { style: "padding: 8px 12px; border-radius: 6px; {style}", "{message}" })
            })}
            if !snapshot.notices.is_empty() {
                button {
                    style: "align-self: flex-start;",
                    onclick: move |_| {
                        session.write().take_notices();
                    },
                    "Dismiss messages"
                }
            }

            if !error_summary.is_empty() {
                div {
                    style: "padding: 10px 14px; background: #fffbeb; border: 1px solid #fcd34d; border-radius: 8px;",
                    h3 { style: "margin: 0 0 6px 0; font-size: 14px;", "Validation errors – fix these before uploading" }
                    ul {
                        {error_summary.iter().map(|message| rsx!(li { "{message}" }))}
                    }
                }
            }

            if has_duplicates {
                div {
                    style: "display: flex; justify-content: space-between; align-items: center; padding: 10px 14px; background: #fef2f2; border: 1px solid #fca5a5; border-radius: 8px;",
                    div {
                        h3 { style: "margin: 0 0 4px 0; font-size: 14px;", "Duplicate data found, remove to upload" }
                        span {
                            style: "color: #7f1d1d; font-size: 13px;",
                            "{database_duplicates} row(s) already in the database, {internal_duplicates} repeated in this table"
                        }
                    }
                    button {
                        onclick: move |_| {
                            session.write().dispatch(PanelAction::RemoveAllDuplicates, &checker_for_dedupe);
                        },
                        "Remove All Duplicates"
                    }
                }
            }

            if row_count > 0 {
                div {
                    style: "display: flex; justify-content: space-between; align-items: center;",
                    h2 { style: "margin: 0; font-size: 16px;", "Edit candidate data (required: Name, Email)" }
                    div {
                        style: "display: flex; gap: 8px; align-items: center;",
                        if checking {
                            span { style: "color: #666;", "Checking duplicates..." }
                        }
                        if let Some(at) = last_checked {
                            span { style: "color: #888; font-size: 12px;", "Last checked {at}" }
                        }
                        button {
                            disabled: checking,
                            title: "Re-check for duplicate emails in database",
                            onclick: move |_| {
                                session.write().dispatch(PanelAction::CheckDuplicatesRequested, &checker_for_check);
                            },
                            "Check Duplicates"
                        }
                        button {
                            onclick: move |_| {
                                session.write().dispatch(PanelAction::AddRow, &checker_for_add);
                            },
                            "Add row"
                        }
                    }
                }

                div {
                    style: "overflow-x: auto; border: 1px solid #ddd; border-radius: 8px;",
                    table {
                        style: "border-collapse: collapse; min-width: 100%;",
                        thead {
                            tr {
                                th { "#" }
                                {CANONICAL_FIELDS.iter().map(|field| {
                                    let marker = if field.is_required() { " *" } else { "" };
                                    let label = field.label();
                                    rsx!(th { style: "text-align: left; padding: 6px; font-size: 12px;", "{label}{marker}" })
                                })}
                                th { "Actions" }
                            }
                        }
                        tbody {
                            {snapshot.rows.iter().enumerate().map(|(idx, row)| {
                                let checker_for_edit = checker_for_edit.clone();
                                let checker_for_remove = checker_for_remove.clone();
                                rsx!(
                                    CandidateRow {
                                        key: "{idx}",
                                        idx: idx,
                                        row: row.clone(),
                                        flag: snapshot.row_flag(idx),
                                        on_edit: move |(row, field, value): (usize, CanonicalField, String)| {
                                            session.write().dispatch(
                                                PanelAction::EditCell { row, field, value },
                                                &checker_for_edit,
                                            );
                                        },
                                        on_remove: move |row: usize| {
                                            session.write().dispatch(PanelAction::RemoveRow(row), &checker_for_remove);
                                        },
                                    }
                                )
                            })}
                        }
                    }
                }

                div {
                    style: "display: flex; justify-content: flex-end;",
                    button {
                        style: "padding: 8px 18px; border-radius: 6px;",
                        disabled: !can_submit,
                        onclick: move |_| {
                            let (rows, remote) = {
                                let current = session.read();
                                (current.rows.clone(), current.duplicates.remote.clone())
                            };
                            let job = selected_job();
                            match prepare_upload(&rows, &remote, job.as_ref()) {
                                Err(rejection) => {
                                    session.write().dispatch(PanelAction::SubmitRejected(rejection), &checker_for_upload);
                                }
                                Ok(request) => {
                                    session.write().dispatch(PanelAction::UploadStarted, &checker_for_upload);
                                    let upload_service = upload_service.clone();
                                    let checker = checker_for_upload.clone();
                                    spawn(async move {
                                        let result = upload_service
                                            .submit(&request)
                                            .await
                                            .map_err(|err| {
                                                error!("bulk upload failed: {err}");
                                                err.user_message()
                                            });
                                        session.write().dispatch(PanelAction::UploadFinished(result), &checker);
                                    });
                                }
                            }
                        },
                        "{submit_label}"
                    }
                }
            } else if file_count > 0 && !parsing {
                p {
                    style: "color: #666;",
                    "No rows could be parsed. Try a different file or check the format."
                }
            }

            div { style: "color: #888; font-size: 12px;", "{status}" }
        }
    }
}
