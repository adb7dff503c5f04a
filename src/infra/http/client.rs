use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::AppConfig;
use crate::domain::entities::candidate::{BulkUploadRequest, JobSummary, RawRow, UploadReceipt};
use crate::usecase::ports::backend::{BackendError, CandidateBackend};

const JOBS_PATH: &str = "/v1/recruiter/jobs";
const PARSE_PDF_PATH: &str = "/v1/candidates/parse-pdf";
const CHECK_DUPLICATES_PATH: &str = "/v1/candidates/check-duplicates";
const BULK_UPLOAD_PATH: &str = "/v1/candidates/bulk";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JobsResponse {
    List(Vec<JobSummary>),
    Wrapped { jobs: Vec<JobSummary> },
}

#[derive(Debug, Deserialize)]
struct ParsePdfResponse {
    #[serde(default)]
    rows: Vec<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
struct CheckDuplicatesRequest<'a> {
    emails: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CheckDuplicatesResponse {
    #[serde(default)]
    duplicates: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BulkUploadResponse {
    candidates_inserted: Option<usize>,
    errors: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

/// reqwest-backed client for the recruitment gateway.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &AppConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = config.auth_token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| BackendError::Decode(format!("invalid auth token: {err}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(api_key) = config.api_key.as_deref() {
            let value = HeaderValue::from_str(api_key)
                .map_err(|err| BackendError::Decode(format!("invalid api key: {err}")))?;
            headers.insert("X-API-Key", value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: api_error_message(status, &body),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| BackendError::Decode(err.to_string()))
    }
}

pub fn api_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.or(parsed.detail))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        })
}

/// Relays one JSON row from the PDF parser: nulls are absent, numbers are stringified.
pub fn raw_row_from_json(object: &Map<String, Value>) -> RawRow {
    let mut row = RawRow::new();
    for (key, value) in object {
        let text = match value {
            Value::Null => continue,
            Value::String(text) => text.trim().to_string(),
            Value::Number(number) => number.to_string(),
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => String::new(),
            other => other.to_string(),
        };
        row.insert(key.clone(), text);
    }
    row
}

#[async_trait]
impl CandidateBackend for HttpBackend {
    async fn list_recruiter_jobs(&self) -> Result<Vec<JobSummary>, BackendError> {
        let response = self.client.get(self.url(JOBS_PATH)).send().await?;
        let jobs = match Self::read_json::<JobsResponse>(response).await? {
            JobsResponse::List(jobs) => jobs,
            JobsResponse::Wrapped { jobs } => jobs,
        };
        debug!(count = jobs.len(), "loaded recruiter jobs");
        Ok(jobs)
    }

    async fn parse_pdf(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Vec<RawRow>, BackendError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(PARSE_PDF_PATH))
            .multipart(form)
            .send()
            .await?;
        let parsed: ParsePdfResponse = Self::read_json(response).await?;
        Ok(parsed.rows.iter().map(raw_row_from_json).collect())
    }

    async fn check_duplicates(&self, emails: &[String]) -> Result<BTreeSet<String>, BackendError> {
        let response = self
            .client
            .post(self.url(CHECK_DUPLICATES_PATH))
            .json(&CheckDuplicatesRequest { emails })
            .send()
            .await?;
        let parsed: CheckDuplicatesResponse = Self::read_json(response).await?;
        Ok(parsed
            .duplicates
            .into_iter()
            .map(|email| email.trim().to_lowercase())
            .collect())
    }

    async fn bulk_upload(
        &self,
        request: &BulkUploadRequest,
    ) -> Result<UploadReceipt, BackendError> {
        let response = self
            .client
            .post(self.url(BULK_UPLOAD_PATH))
            .json(request)
            .send()
            .await?;
        let parsed: BulkUploadResponse = Self::read_json(response).await?;
        Ok(UploadReceipt {
            inserted: parsed
                .candidates_inserted
                .unwrap_or(request.candidates.len()),
            row_errors: parsed.errors.unwrap_or_default(),
        })
    }
}
