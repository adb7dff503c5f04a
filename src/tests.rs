use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::domain::entities::candidate::{
    choose_default_job, BulkUploadRequest, CandidateInput, EditableRow, JobId, JobSummary, RawRow,
    UploadReceipt,
};
use crate::domain::entities::duplicates::{find_internal_duplicates, rows_to_keep, RowFlag};
use crate::domain::headers::CanonicalField;
use crate::domain::validation::{summarize_errors, validate_rows};
use crate::infra::export::template::write_template;
use crate::infra::http::client::{api_error_message, raw_row_from_json};
use crate::infra::import::csv::parse_csv_bytes;
use crate::infra::import::xlsx::grid_to_raw_rows;
use crate::ui::state::session::{Effect, NoticeLevel, PanelAction, Phase, UploadSession};
use crate::usecase::ports::backend::{BackendError, CandidateBackend};
use crate::usecase::services::duplicate_service::{
    DuplicateCheckEvent, DuplicateChecker, RemoteCheckOutcome,
};
use crate::usecase::services::import_service::{ImportReport, ImportService};
use crate::usecase::services::job_service::JobService;
use crate::usecase::services::upload_service::{prepare_upload, UploadRejection, UploadService};

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("recruiter-desk-{prefix}-{nanos}"))
}

fn candidate(name: &str, email: &str) -> EditableRow {
    EditableRow::empty()
        .with(CanonicalField::Name, name)
        .with(CanonicalField::Email, email)
}

fn job(id: &str, title: &str) -> JobSummary {
    JobSummary {
        id: JobId::from(id),
        title: title.to_string(),
        location: None,
        status: None,
    }
}

#[derive(Default)]
struct FakeBackend {
    jobs: Vec<JobSummary>,
    fail_jobs: bool,
    database_emails: BTreeSet<String>,
    fail_duplicate_check: bool,
    pdf_rows: Vec<RawRow>,
    duplicate_calls: Mutex<Vec<Vec<String>>>,
    uploads: Mutex<Vec<BulkUploadRequest>>,
}

impl FakeBackend {
    fn duplicate_calls(&self) -> Vec<Vec<String>> {
        self.duplicate_calls
            .lock()
            .expect("duplicate call log should lock")
            .clone()
    }

    fn uploads(&self) -> Vec<BulkUploadRequest> {
        self.uploads.lock().expect("upload log should lock").clone()
    }
}

#[async_trait]
impl CandidateBackend for FakeBackend {
    async fn list_recruiter_jobs(&self) -> Result<Vec<JobSummary>, BackendError> {
        if self.fail_jobs {
            return Err(BackendError::Unauthorized);
        }
        Ok(self.jobs.clone())
    }

    async fn parse_pdf(
        &self,
        _file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<Vec<RawRow>, BackendError> {
        Ok(self.pdf_rows.clone())
    }

    async fn check_duplicates(&self, emails: &[String]) -> Result<BTreeSet<String>, BackendError> {
        self.duplicate_calls
            .lock()
            .expect("duplicate call log should lock")
            .push(emails.to_vec());
        if self.fail_duplicate_check {
            return Err(BackendError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(emails
            .iter()
            .filter(|email| self.database_emails.contains(*email))
            .cloned()
            .collect())
    }

    async fn bulk_upload(
        &self,
        request: &BulkUploadRequest,
    ) -> Result<UploadReceipt, BackendError> {
        self.uploads
            .lock()
            .expect("upload log should lock")
            .push(request.clone());
        Ok(UploadReceipt {
            inserted: request.candidates.len(),
            row_errors: Vec::new(),
        })
    }
}

#[test]
fn csv_headers_are_normalized_into_canonical_rows() {
    let raw = parse_csv_bytes(b"Email,Full Name\na@b.com,Jane\n").expect("csv should parse");
    assert_eq!(raw.len(), 1);

    let row = EditableRow::from_raw(&raw[0]);
    assert_eq!(row.get(CanonicalField::Name), "Jane");
    assert_eq!(row.get(CanonicalField::Email), "a@b.com");
    assert_eq!(row.get(CanonicalField::Status), "applied");
    assert_eq!(row.get(CanonicalField::Phone), "");
}

#[test]
fn csv_quoted_fields_keep_embedded_commas() {
    let csv = "Name,Email,Location\n\"Smith, John\",john@example.com,\"Austin, TX\"\n";
    let raw = parse_csv_bytes(csv.as_bytes()).expect("csv should parse");
    let row = EditableRow::from_raw(&raw[0]);

    assert_eq!(row.get(CanonicalField::Name), "Smith, John");
    assert_eq!(row.get(CanonicalField::Location), "Austin, TX");
}

#[test]
fn csv_skips_bom_blank_lines_and_pads_short_rows() {
    let csv = b"\xEF\xBB\xBFName,Email,Phone\n\nAda,ada@example.com\n,,\nBob,bob@example.com,555-0101\n";
    let raw = parse_csv_bytes(csv).expect("csv should parse");

    assert_eq!(raw.len(), 2, "blank records should be skipped");
    assert_eq!(raw[0].get("name"), Some("Ada"));
    assert_eq!(raw[0].get("phone"), Some(""));
    assert_eq!(raw[1].get("phone"), Some("555-0101"));
}

#[test]
fn csv_with_invalid_utf8_keeps_every_row() {
    let csv = b"Name,Email\nRen\xe9,rene@example.com\nBob,bob@example.com\n";
    let raw = parse_csv_bytes(csv).expect("csv should parse");

    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0].get("name"), Some("Ren\u{FFFD}"));
    assert_eq!(raw[0].get("email"), Some("rene@example.com"));
    assert_eq!(raw[1].get("name"), Some("Bob"));
}

#[test]
fn csv_keeps_escaped_quotes_inside_values() {
    let csv = "Name,Email,Designation\nAnn,ann@example.com,\"Monitor 15\"\"\"\n";
    let raw = parse_csv_bytes(csv.as_bytes()).expect("csv should parse");

    assert_eq!(raw[0].get("designation"), Some("Monitor 15\""));
}

#[test]
fn positional_fallback_fills_unknown_headers_by_column() {
    let raw: RawRow = [("col_0", "Zed"), ("col_1", "zed@example.com")]
        .into_iter()
        .collect();
    let row = EditableRow::from_raw(&raw);
    assert_eq!(row.get(CanonicalField::Name), "Zed");
    assert_eq!(row.get(CanonicalField::Email), "zed@example.com");
}

#[test]
fn spreadsheet_grid_uses_first_row_as_headers() {
    let grid = vec![
        vec!["Candidate Name".to_string(), "E-mail".to_string()],
        vec!["".to_string(), " ".to_string()],
        vec!["Mia".to_string(), "mia@example.com".to_string()],
    ];
    let raw = grid_to_raw_rows(&grid);

    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].get("name"), Some("Mia"));
    assert_eq!(raw[0].get("email"), Some("mia@example.com"));
}

#[test]
fn pdf_rows_relay_json_values() {
    let value = json!({
        "name": "  Leo ",
        "email": "leo@example.com",
        "experience_years": 4,
        "phone": null,
        "remote": false,
        "relocate": true
    });
    let object = value.as_object().expect("fixture should be an object");
    let raw = raw_row_from_json(object);

    assert_eq!(raw.get("name"), Some("Leo"));
    assert_eq!(raw.get("experience_years"), Some("4"));
    assert_eq!(raw.get("phone"), None);
    assert_eq!(raw.get("remote"), Some(""));
    assert_eq!(raw.get("relocate"), Some("true"));
    assert_eq!(raw.value_at(0), Some("Leo"), "insertion order should be kept");
}

#[test]
fn validation_skips_blank_rows_and_reports_one_based_rows() {
    let rows = vec![
        EditableRow::empty(),
        candidate("", "not-an-email"),
        candidate("Ann", "ann@example.com").with(CanonicalField::Phone, "12"),
        candidate("Bo", "bo@example.com").with(CanonicalField::ExperienceYears, "-1"),
    ];

    let errors = validate_rows(&rows);
    assert_eq!(
        errors,
        vec![
            "Row 2: Name is required".to_string(),
            "Row 2: Invalid email format".to_string(),
            "Row 3: Invalid phone format".to_string(),
            "Row 4: Experience years must be a non-negative number".to_string(),
        ]
    );
}

#[test]
fn error_summary_truncates_after_limit() {
    let errors: Vec<String> = (1..=12).map(|n| format!("Row {n}: Name is required")).collect();
    let lines = summarize_errors(&errors, 10);

    assert_eq!(lines.len(), 11);
    assert_eq!(lines[9], "Row 10: Name is required");
    assert_eq!(lines[10], "… and 2 more");
}

#[test]
fn internal_duplicates_flag_repeats_only() {
    let rows = vec![
        candidate("A", "x@example.com"),
        candidate("B", "y@example.com"),
        candidate("C", "X@Example.com"),
        candidate("D", "x@example.com"),
    ];
    let found = find_internal_duplicates(&rows);

    assert_eq!(found.emails, BTreeSet::from(["x@example.com".to_string()]));
    assert_eq!(found.rows, BTreeSet::from([2, 3]));
}

#[test]
fn rows_to_keep_drops_database_and_repeat_rows() {
    let rows = vec![
        candidate("A", "x@example.com"),
        candidate("B", "y@example.com"),
        candidate("C", "x@example.com"),
        candidate("D", "z@example.com"),
    ];
    let remote = BTreeSet::from(["y@example.com".to_string()]);

    assert_eq!(rows_to_keep(&rows, &remote), vec![0, 3]);
}

#[test]
fn remove_all_duplicates_leaves_single_row() {
    let mut session = UploadSession::new();
    session.rows = vec![
        candidate("A", "a@example.com"),
        candidate("B", "a@example.com"),
        candidate("C", "A@example.com"),
    ];

    let effect = session.apply(PanelAction::RemoveAllDuplicates);

    assert_eq!(session.rows.len(), 1);
    assert!(session.duplicates.is_empty());
    assert_eq!(
        effect,
        Effect::RunRemoteCheck(vec!["a@example.com".to_string()])
    );
    let last = session.notices.last().expect("a notice should be queued");
    assert_eq!(last.message, "Removed 2 duplicate row(s)");
}

#[test]
fn row_flag_follows_severity_order() {
    let mut session = UploadSession::new();
    session.rows = vec![
        candidate("A", "dup@example.com"),
        candidate("B", "dup@example.com"),
        candidate("C", "db@example.com"),
        candidate("", "ok@example.com"),
        candidate("E", "bad"),
    ];
    session.duplicates.internal = find_internal_duplicates(&session.rows);
    session.duplicates.remote = BTreeSet::from([
        "db@example.com".to_string(),
        "dup@example.com".to_string(),
    ]);
    session.validation_errors = vec!["Row 4: Name is required".to_string()];
    session
        .email_errors
        .insert(4, "Invalid email format".to_string());

    use crate::domain::entities::duplicates::DuplicateKind;
    assert_eq!(session.row_flag(0), RowFlag::Duplicate(DuplicateKind::Database));
    assert_eq!(session.row_flag(1), RowFlag::Duplicate(DuplicateKind::Both));
    assert_eq!(session.row_flag(2), RowFlag::Duplicate(DuplicateKind::Database));
    assert_eq!(session.row_flag(3), RowFlag::ValidationError);
    assert_eq!(
        session.row_flag(4),
        RowFlag::EmailError("Invalid email format".to_string())
    );
}

#[test]
fn edit_cell_validates_email_inline_and_schedules_check() {
    let mut session = UploadSession::new();
    session.rows = vec![candidate("A", "a@example.com"), candidate("B", "b@example.com")];
    session.validation_errors = vec![
        "Row 2: Name is required".to_string(),
        "Row 1: Invalid phone format".to_string(),
    ];

    let effect = session.apply(PanelAction::EditCell {
        row: 1,
        field: CanonicalField::Email,
        value: "broken".to_string(),
    });
    assert_eq!(
        session.email_errors.get(&1).map(String::as_str),
        Some("Invalid email format")
    );
    assert_eq!(
        session.validation_errors,
        vec!["Row 1: Invalid phone format".to_string()]
    );
    assert_eq!(
        effect,
        Effect::ScheduleRemoteCheck(vec!["a@example.com".to_string()])
    );
    assert!(session.submit_blocked());

    session.apply(PanelAction::EditCell {
        row: 1,
        field: CanonicalField::Email,
        value: "b@example.com".to_string(),
    });
    assert!(session.email_errors.is_empty());
    assert!(!session.submit_blocked());
}

#[test]
fn edit_out_of_range_row_is_ignored() {
    let mut session = UploadSession::new();
    session.rows = vec![candidate("A", "a@example.com")];

    let effect = session.apply(PanelAction::EditCell {
        row: 5,
        field: CanonicalField::Name,
        value: "Ghost".to_string(),
    });

    assert_eq!(effect, Effect::None);
    assert_eq!(session.rows.len(), 1);
}

#[test]
fn remove_row_reindexes_row_errors() {
    let mut session = UploadSession::new();
    session.rows = vec![
        candidate("A", ""),
        candidate("B", "b@example.com"),
        candidate("", "bad"),
    ];
    session.email_errors = BTreeMap::from([
        (0, "Email is required".to_string()),
        (2, "Invalid email format".to_string()),
    ]);
    session.validation_errors = vec![
        "Row 2: Invalid phone format".to_string(),
        "Row 3: Name is required".to_string(),
    ];

    let effect = session.apply(PanelAction::RemoveRow(1));

    assert_eq!(session.rows.len(), 2);
    assert_eq!(
        session.email_errors,
        BTreeMap::from([
            (0, "Email is required".to_string()),
            (1, "Invalid email format".to_string()),
        ])
    );
    assert_eq!(
        session.validation_errors,
        vec!["Row 2: Name is required".to_string()]
    );
    assert_eq!(effect, Effect::RunRemoteCheck(Vec::new()));
}

#[test]
fn add_row_appends_applied_row_without_remote_check() {
    let mut session = UploadSession::new();
    let effect = session.apply(PanelAction::AddRow);

    assert_eq!(effect, Effect::None);
    assert_eq!(session.rows.len(), 1);
    assert_eq!(session.rows[0].get(CanonicalField::Status), "applied");
    assert_eq!(session.phase(), Phase::Editing);
}

#[test]
fn stale_remote_results_are_ignored() {
    let mut session = UploadSession::new();
    session.rows = vec![candidate("A", "a@example.com")];

    session.apply(PanelAction::RemoteCheckIssued { seq: 1 });
    session.apply(PanelAction::RemoteCheckIssued { seq: 2 });
    session.apply(PanelAction::RemoteCheckFinished {
        seq: 1,
        outcome: RemoteCheckOutcome::Duplicates(BTreeSet::from(["a@example.com".to_string()])),
    });
    assert!(session.duplicates.remote.is_empty());
    assert!(session.last_duplicate_check.is_none());

    session.apply(PanelAction::RemoteCheckFinished {
        seq: 2,
        outcome: RemoteCheckOutcome::Duplicates(BTreeSet::from(["a@example.com".to_string()])),
    });
    assert!(session.duplicates.remote.contains("a@example.com"));
    assert!(session.last_duplicate_check.is_some());
}

#[test]
fn files_parsed_reports_rows_and_warnings() {
    let mut session = UploadSession::new();
    session.apply(PanelAction::ParseStarted);
    let effect = session.apply(PanelAction::FilesParsed(ImportReport {
        accepted_files: vec!["batch.csv".to_string()],
        rows: vec![candidate("A", "A@Example.com"), candidate("B", "b@example.com")],
        warnings: vec!["notes.txt is not a CSV, Excel or PDF file. Skipped.".to_string()],
        no_supported_files: false,
    }));

    assert_eq!(
        effect,
        Effect::RunRemoteCheck(vec!["a@example.com".to_string(), "b@example.com".to_string()])
    );
    assert_eq!(session.notices.len(), 2);
    assert_eq!(session.notices[0].level, NoticeLevel::Warning);
    assert_eq!(
        session.notices[1].message,
        "Parsed 2 row(s) from 1 file(s). Edit below and upload when ready."
    );
    assert_eq!(session.phase(), Phase::Editing);
}

#[test]
fn overlapping_imports_stay_parsing_until_both_finish() {
    let mut session = UploadSession::new();
    session.apply(PanelAction::ParseStarted);
    session.apply(PanelAction::ParseStarted);

    session.apply(PanelAction::FilesParsed(ImportReport {
        accepted_files: vec!["first.csv".to_string()],
        rows: vec![candidate("A", "a@example.com")],
        warnings: Vec::new(),
        no_supported_files: false,
    }));
    assert!(session.is_parsing());
    assert_eq!(session.phase(), Phase::Parsing);

    session.apply(PanelAction::FilesParsed(ImportReport {
        accepted_files: vec!["second.csv".to_string()],
        rows: vec![candidate("B", "b@example.com")],
        warnings: Vec::new(),
        no_supported_files: false,
    }));
    assert!(!session.is_parsing());
    assert_eq!(session.phase(), Phase::Editing);
    assert_eq!(session.rows.len(), 2);
}

#[test]
fn files_parsed_without_rows_or_supported_files() {
    let mut session = UploadSession::new();
    session.apply(PanelAction::FilesParsed(ImportReport {
        no_supported_files: true,
        ..ImportReport::default()
    }));
    assert_eq!(
        session.notices[0].message,
        "Please upload CSV, Excel (XLS/XLSX), or PDF files"
    );
    assert_eq!(session.phase(), Phase::Empty);

    session.take_notices();
    let effect = session.apply(PanelAction::FilesParsed(ImportReport {
        accepted_files: vec!["empty.csv".to_string()],
        ..ImportReport::default()
    }));
    assert_eq!(effect, Effect::None);
    assert_eq!(
        session.notices[0].message,
        "No rows found in the selected file(s). Check format (e.g. header row + data)."
    );
}

#[test]
fn submit_label_reflects_blocking_state() {
    let mut session = UploadSession::new();
    session.rows = vec![candidate("A", "a@example.com")];
    assert_eq!(session.submit_label(), "Upload Candidates");
    assert!(session.can_submit());

    session.email_errors.insert(0, "Email is required".to_string());
    assert_eq!(session.submit_label(), "Upload Blocked (1 Email Error)");
    session.email_errors.insert(1, "Invalid email format".to_string());
    assert_eq!(session.submit_label(), "Upload Blocked (2 Email Errors)");
    assert!(!session.can_submit());

    session.email_errors.clear();
    session.duplicates.remote.insert("a@example.com".to_string());
    assert_eq!(session.submit_label(), "Upload Blocked (1 Duplicate)");
    session.duplicates.remote.insert("b@example.com".to_string());
    assert_eq!(session.submit_label(), "Upload Blocked (2 Duplicates)");

    session.duplicates.clear();
    session.apply(PanelAction::UploadStarted);
    assert_eq!(session.submit_label(), "Uploading…");
    assert!(!session.can_submit());
}

#[test]
fn prepare_upload_requires_a_job() {
    let rows = vec![candidate("A", "a@example.com")];
    let result = prepare_upload(&rows, &BTreeSet::new(), None);

    assert_eq!(result, Err(UploadRejection::NoJobSelected));
    assert_eq!(
        UploadRejection::NoJobSelected.to_string(),
        "Please select a job"
    );
}

#[test]
fn prepare_upload_checks_gates_in_order() {
    let job_id = JobId::from("42");

    let rows = vec![candidate("A", "bad"), candidate("B", "b@example.com")];
    match prepare_upload(&rows, &BTreeSet::new(), Some(&job_id)) {
        Err(UploadRejection::InvalidEmails(errors)) => {
            assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec![0]);
        }
        other => panic!("expected email rejection, got {other:?}"),
    }

    let rows = vec![
        candidate("A", "a@example.com"),
        candidate("B", "a@example.com"),
        candidate("C", "c@example.com"),
    ];
    let remote = BTreeSet::from(["c@example.com".to_string()]);
    let rejection = prepare_upload(&rows, &remote, Some(&job_id))
        .expect_err("duplicates should block the upload");
    assert_eq!(
        rejection.to_string(),
        "Cannot upload: 1 database duplicate(s) and 1 preview table duplicate(s) detected. Please remove all duplicates before uploading."
    );

    let rows = vec![EditableRow::empty(), EditableRow::empty()];
    assert_eq!(
        prepare_upload(&rows, &BTreeSet::new(), Some(&job_id)),
        Err(UploadRejection::NoCandidateData)
    );

    let rows = vec![candidate("", "a@example.com")];
    let rejection = prepare_upload(&rows, &BTreeSet::new(), Some(&job_id))
        .expect_err("missing name should block the upload");
    assert_eq!(
        rejection,
        UploadRejection::Validation(vec!["Row 1: Name is required".to_string()])
    );
    assert_eq!(
        rejection.to_string(),
        "Fix 1 validation error(s) before uploading. See table below."
    );
}

#[test]
fn prepare_upload_builds_payload_from_rows_with_data() {
    let rows = vec![
        candidate("Ada", "ada@example.com")
            .with(CanonicalField::ExperienceYears, "3.9")
            .with(CanonicalField::Phone, "  "),
        EditableRow::empty(),
        candidate("Bo", "bo@example.com")
            .with(CanonicalField::ExperienceYears, "")
            .with(CanonicalField::Status, ""),
    ];
    let job_id = JobId::from("7");

    let request =
        prepare_upload(&rows, &BTreeSet::new(), Some(&job_id)).expect("upload should be allowed");
    assert_eq!(request.candidates.len(), 2);
    assert_eq!(request.candidates[0].experience_years, 3);
    assert_eq!(request.candidates[1].experience_years, 0);
    assert_eq!(request.candidates[1].status, "applied");

    let body = serde_json::to_value(&request).expect("request should serialize");
    assert_eq!(body["job_id"], Value::String("7".to_string()));
    let first = body["candidates"][0]
        .as_object()
        .expect("candidate should be an object");
    assert!(!first.contains_key("phone"), "blank optionals are omitted");
    assert_eq!(first["name"], json!("Ada"));
}

#[test]
fn candidate_input_truncates_fractional_experience() {
    let row = candidate("Ann", "ann@example.com").with(CanonicalField::ExperienceYears, "7.99");
    let input = CandidateInput::from(&row);
    assert_eq!(input.experience_years, 7);
    assert_eq!(input.cv_url, None);
}

#[test]
fn experience_beyond_payload_range_is_rejected() {
    let rows = vec![
        candidate("Ann", "ann@example.com").with(CanonicalField::ExperienceYears, "4294967295"),
        candidate("Bo", "bo@example.com").with(CanonicalField::ExperienceYears, "4294967296"),
        candidate("Cy", "cy@example.com").with(CanonicalField::ExperienceYears, "1e20"),
    ];

    assert_eq!(
        validate_rows(&rows),
        vec![
            "Row 2: Experience years must be a non-negative number".to_string(),
            "Row 3: Experience years must be a non-negative number".to_string(),
        ]
    );
}

#[test]
fn rejection_updates_session_state() {
    let mut session = UploadSession::new();
    session.rows = vec![candidate("", "a@example.com")];

    session.apply(PanelAction::SubmitRejected(UploadRejection::Validation(vec![
        "Row 1: Name is required".to_string(),
    ])));

    assert_eq!(session.error_summary(), vec!["Row 1: Name is required".to_string()]);
    assert_eq!(session.row_flag(0), RowFlag::ValidationError);
    assert_eq!(session.notices[0].level, NoticeLevel::Error);
}

#[test]
fn upload_success_resets_session_and_reports_row_errors() {
    let mut session = UploadSession::new();
    session.files = vec!["a.csv".to_string()];
    session.rows = vec![candidate("A", "a@example.com")];
    session.apply(PanelAction::UploadStarted);

    let effect = session.apply(PanelAction::UploadFinished(Ok(UploadReceipt {
        inserted: 4,
        row_errors: vec![
            "row 1 bad".to_string(),
            "row 2 bad".to_string(),
            "row 3 bad".to_string(),
            "row 4 bad".to_string(),
        ],
    })));

    assert_eq!(effect, Effect::CancelRemoteCheck);
    assert_eq!(session.phase(), Phase::Empty);
    assert!(session.rows.is_empty());
    assert_eq!(
        session.notices[0].message,
        "Uploaded 4 candidate(s) for this job. Dashboard counts are updated."
    );
    assert_eq!(
        session.notices[1].message,
        "Some rows had errors: row 1 bad; row 2 bad; row 3 bad"
    );
}

#[test]
fn upload_failure_keeps_rows() {
    let mut session = UploadSession::new();
    session.rows = vec![candidate("A", "a@example.com")];
    session.apply(PanelAction::UploadStarted);

    session.apply(PanelAction::UploadFinished(Err("Upload failed".to_string())));

    assert_eq!(session.phase(), Phase::Editing);
    assert_eq!(session.rows.len(), 1);
    assert_eq!(session.notices[0].message, "Upload failed");
}

#[test]
fn clear_all_returns_to_empty_and_cancels_checks() {
    let mut session = UploadSession::new();
    session.files = vec!["a.csv".to_string()];
    session.rows = vec![candidate("A", "a@example.com")];
    session.apply(PanelAction::RemoteCheckIssued { seq: 3 });
    session.apply(PanelAction::RemoteCheckStarted { seq: 3 });

    let effect = session.apply(PanelAction::ClearAll);

    assert_eq!(effect, Effect::CancelRemoteCheck);
    assert_eq!(session.phase(), Phase::Empty);
    assert_eq!(session.active_check(), None);
}

#[test]
fn job_ids_accept_strings_and_numbers() {
    let jobs: Vec<JobSummary> = serde_json::from_value(json!([
        {"id": 12, "title": "Backend Engineer"},
        {"id": "abc-7", "title": "Designer", "location": "Remote"}
    ]))
    .expect("jobs should deserialize");

    assert_eq!(jobs[0].id, JobId::from("12"));
    assert_eq!(jobs[0].option_label(), "Backend Engineer – Job ID 12");
    assert_eq!(jobs[1].location.as_deref(), Some("Remote"));
}

#[test]
fn default_job_keeps_current_selection_when_listed() {
    let jobs = vec![job("1", "One"), job("2", "Two")];

    assert_eq!(
        choose_default_job(&jobs, Some(&JobId::from("2"))),
        Some(JobId::from("2"))
    );
    assert_eq!(
        choose_default_job(&jobs, Some(&JobId::from("9"))),
        Some(JobId::from("1"))
    );
    assert_eq!(choose_default_job(&[], Some(&JobId::from("1"))), None);
}

#[test]
fn template_round_trips_through_csv_parser() {
    let mut buffer = Vec::new();
    write_template(&mut buffer).expect("template should write");

    let raw = parse_csv_bytes(&buffer).expect("template should parse");
    let rows: Vec<EditableRow> = raw.iter().map(EditableRow::from_raw).collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get(CanonicalField::Name), "John Smith");
    assert_eq!(rows[1].get(CanonicalField::Email), "jane@example.com");
    assert_eq!(rows[2].get(CanonicalField::ExperienceYears), "7");
    assert!(validate_rows(&rows).is_empty());
}

#[test]
fn config_reads_overrides_and_defaults() {
    let config = AppConfig::from_lookup(|key| match key {
        "RECRUITER_API_BASE_URL" => Some("https://api.example.com".to_string()),
        "RECRUITER_AUTH_TOKEN" => Some("token-1".to_string()),
        "RECRUITER_DUPLICATE_DEBOUNCE_MS" => Some("250".to_string()),
        "RECRUITER_API_KEY" => Some("   ".to_string()),
        _ => None,
    })
    .expect("config should load");

    assert_eq!(config.api_base_url, "https://api.example.com");
    assert_eq!(config.auth_token.as_deref(), Some("token-1"));
    assert_eq!(config.api_key, None);
    assert_eq!(config.duplicate_debounce, Duration::from_millis(250));
    assert_eq!(config.request_timeout, Duration::from_secs(15));
    assert_eq!(config.max_file_bytes(), 200 * 1024 * 1024);
}

#[test]
fn config_rejects_non_numeric_timeout() {
    let result = AppConfig::from_lookup(|key| {
        (key == "RECRUITER_HTTP_TIMEOUT_SECS").then(|| "soon".to_string())
    });
    let err = result.expect_err("bad timeout should fail");
    assert!(err.to_string().contains("RECRUITER_HTTP_TIMEOUT_SECS"));
}

#[test]
fn api_error_message_prefers_body_error() {
    assert_eq!(
        api_error_message(StatusCode::BAD_REQUEST, r#"{"error":"Job not found"}"#),
        "Job not found"
    );
    assert_eq!(
        api_error_message(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail":"bad rows"}"#),
        "bad rows"
    );
    assert_eq!(
        api_error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
        "Internal Server Error"
    );
}

#[tokio::test]
async fn import_service_skips_unsupported_and_oversize_files() {
    let temp_dir = unique_test_dir("import");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let small = temp_dir.join("small.csv");
    let large = temp_dir.join("large.csv");
    let notes = temp_dir.join("notes.txt");
    fs::write(&small, "Name,Email\nAda,ada@example.com\n").expect("should write csv fixture");
    fs::write(&large, "Name,Email\n".repeat(20)).expect("should write large fixture");
    fs::write(&notes, "hello").expect("should write txt fixture");

    let backend = Arc::new(FakeBackend::default());
    let service = ImportService::new(backend, 64);
    let report = service
        .import_paths(&[small.clone(), large.clone(), notes.clone()])
        .await;

    assert_eq!(report.accepted_files, vec!["small.csv".to_string()]);
    assert_eq!(report.rows.len(), 1);
    assert!(!report.no_supported_files);
    assert_eq!(
        report.warnings,
        vec![
            "notes.txt is not a CSV, Excel or PDF file. Skipped.".to_string(),
            "large.csv exceeds 0MB. Skipped.".to_string(),
        ]
    );

    let report = service.import_paths(&[notes]).await;
    assert!(report.no_supported_files);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[tokio::test]
async fn import_service_sends_pdfs_to_backend_parser() {
    let temp_dir = unique_test_dir("import-pdf");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let resume = temp_dir.join("resume.PDF");
    fs::write(&resume, b"%PDF-1.4").expect("should write pdf fixture");

    let backend = Arc::new(FakeBackend {
        pdf_rows: vec![[("name", "Pia"), ("email", "pia@example.com")]
            .into_iter()
            .collect()],
        ..FakeBackend::default()
    });
    let service = ImportService::new(backend, 1024 * 1024);
    let report = service.import_paths(&[resume]).await;

    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].get(CanonicalField::Name), "Pia");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[tokio::test(start_paused = true)]
async fn debounced_edits_issue_one_request_with_latest_emails() {
    let backend = Arc::new(FakeBackend {
        database_emails: BTreeSet::from(["e5@example.com".to_string()]),
        ..FakeBackend::default()
    });
    let (checker, mut events) = DuplicateChecker::new(backend.clone(), Duration::from_millis(600));

    let mut last_seq = 0;
    for n in 1..=5 {
        last_seq = checker.schedule(vec![format!("e{n}@example.com")]);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_millis(700)).await;

    assert_eq!(
        backend.duplicate_calls(),
        vec![vec!["e5@example.com".to_string()]]
    );
    assert_eq!(
        events.recv().await,
        Some(DuplicateCheckEvent::Started { seq: last_seq })
    );
    assert_eq!(
        events.recv().await,
        Some(DuplicateCheckEvent::Finished {
            seq: last_seq,
            outcome: RemoteCheckOutcome::Duplicates(BTreeSet::from([
                "e5@example.com".to_string()
            ])),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn newer_check_supersedes_older_one() {
    let backend = Arc::new(FakeBackend::default());
    let (checker, mut events) = DuplicateChecker::new(backend.clone(), Duration::from_millis(600));

    let first = checker.check_now(vec!["a@example.com".to_string()]);
    let second = checker.check_now(vec!["b@example.com".to_string()]);
    assert!(second > first);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(
        backend.duplicate_calls(),
        vec![vec!["b@example.com".to_string()]]
    );
    assert_eq!(
        events.recv().await,
        Some(DuplicateCheckEvent::Started { seq: second })
    );
}

#[tokio::test(start_paused = true)]
async fn manual_check_replaces_pending_debounce() {
    let backend = Arc::new(FakeBackend::default());
    let (checker, mut events) = DuplicateChecker::new(backend.clone(), Duration::from_millis(600));

    let debounced = checker.schedule(vec!["typed@example.com".to_string()]);
    let manual = checker.check_now(vec!["manual@example.com".to_string()]);
    assert!(manual > debounced);
    tokio::time::sleep(Duration::from_millis(700)).await;

    assert_eq!(
        backend.duplicate_calls(),
        vec![vec!["manual@example.com".to_string()]]
    );
    assert_eq!(
        events.recv().await,
        Some(DuplicateCheckEvent::Started { seq: manual })
    );
    assert_eq!(
        events.recv().await,
        Some(DuplicateCheckEvent::Finished {
            seq: manual,
            outcome: RemoteCheckOutcome::Duplicates(BTreeSet::new()),
        })
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn cancel_drops_pending_check() {
    let backend = Arc::new(FakeBackend::default());
    let (checker, mut events) = DuplicateChecker::new(backend.clone(), Duration::from_millis(600));

    checker.schedule(vec!["a@example.com".to_string()]);
    checker.cancel();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(backend.duplicate_calls().is_empty());
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn empty_email_list_clears_remote_set_without_request() {
    let backend = Arc::new(FakeBackend::default());
    let (checker, mut events) = DuplicateChecker::new(backend.clone(), Duration::from_millis(600));

    let seq = checker.check_now(Vec::new());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(backend.duplicate_calls().is_empty());
    assert_eq!(events.recv().await, Some(DuplicateCheckEvent::Started { seq }));
    assert_eq!(
        events.recv().await,
        Some(DuplicateCheckEvent::Finished {
            seq,
            outcome: RemoteCheckOutcome::Duplicates(BTreeSet::new()),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn failed_remote_check_leaves_session_duplicates() {
    let backend = Arc::new(FakeBackend {
        fail_duplicate_check: true,
        ..FakeBackend::default()
    });
    let (checker, mut events) = DuplicateChecker::new(backend.clone(), Duration::from_millis(600));

    let mut session = UploadSession::new();
    session.rows = vec![candidate("A", "a@example.com")];
    session.duplicates.remote = BTreeSet::from(["a@example.com".to_string()]);

    session.dispatch(PanelAction::CheckDuplicatesRequested, &checker);
    assert_eq!(session.active_check(), Some(checker.latest_seq()));
    tokio::time::sleep(Duration::from_millis(10)).await;

    while let Ok(event) = events.try_recv() {
        let action = match event {
            DuplicateCheckEvent::Started { seq } => PanelAction::RemoteCheckStarted { seq },
            DuplicateCheckEvent::Finished { seq, outcome } => {
                PanelAction::RemoteCheckFinished { seq, outcome }
            }
        };
        session.apply(action);
    }

    assert_eq!(backend.duplicate_calls().len(), 1);
    assert!(session.duplicates.remote.contains("a@example.com"));
    assert!(!session.is_checking_duplicates());
    assert!(session.notices.is_empty(), "failures are never shown");
}

#[tokio::test]
async fn job_service_keeps_selection_and_reports_failure() {
    let backend = Arc::new(FakeBackend {
        jobs: vec![job("1", "One"), job("2", "Two")],
        ..FakeBackend::default()
    });
    let service = JobService::new(backend);
    let selection = service
        .refresh_selection(Some(&JobId::from("2")))
        .await
        .expect("jobs should load");
    assert_eq!(selection.jobs.len(), 2);
    assert_eq!(selection.selected, Some(JobId::from("2")));

    let failing = JobService::new(Arc::new(FakeBackend {
        fail_jobs: true,
        ..FakeBackend::default()
    }));
    assert!(failing.refresh_selection(None).await.is_err());
}

#[tokio::test]
async fn upload_service_submits_prepared_request() {
    let backend = Arc::new(FakeBackend::default());
    let service = UploadService::new(backend.clone());
    let rows = vec![candidate("Ada", "ada@example.com")];
    let request = prepare_upload(&rows, &BTreeSet::new(), Some(&JobId::from("5")))
        .expect("upload should be allowed");

    let receipt = service.submit(&request).await.expect("upload should succeed");

    assert_eq!(receipt.inserted, 1);
    assert_eq!(backend.uploads(), vec![request]);
}

#[test]
fn unauthorized_error_message_is_user_facing() {
    assert_eq!(
        BackendError::Unauthorized.user_message(),
        "Session expired. Please sign in again as a recruiter."
    );
    assert_eq!(
        BackendError::Api {
            status: 500,
            message: String::new(),
        }
        .user_message(),
        "Upload failed"
    );
}
