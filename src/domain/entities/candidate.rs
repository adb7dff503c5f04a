use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::headers::{normalize_header, CanonicalField, CANONICAL_FIELDS, DEFAULT_STATUS};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JobId(pub String);

impl From<String> for JobId {
    fn from(value: String) -> Self {
        JobId(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        JobId(value.to_string())
    }
}

impl From<JobId> for String {
    fn from(value: JobId) -> Self {
        value.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Job ids come back as strings from the gateway and as integers from older services.
impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Int(i64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(text) => JobId(text),
            Repr::Int(number) => JobId(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl JobSummary {
    pub fn option_label(&self) -> String {
        format!("{} – Job ID {}", self.title, self.id)
    }
}

/// Keeps the current job when it is still listed, otherwise falls back to the first job.
pub fn choose_default_job(jobs: &[JobSummary], current: Option<&JobId>) -> Option<JobId> {
    current
        .filter(|id| jobs.iter().any(|job| &job.id == *id))
        .cloned()
        .or_else(|| jobs.first().map(|job| job.id.clone()))
}

/// One parsed record before normalization. Keys keep their first insertion position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    entries: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn value_at(&self, position: usize) -> Option<&str> {
        self.entries.get(position).map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a row from a header line and one record; missing cells become empty.
    pub fn from_headers(headers: &[String], values: &[String]) -> Self {
        let mut row = RawRow::new();
        for (idx, header) in headers.iter().enumerate() {
            let value = values.get(idx).map(|v| v.trim()).unwrap_or("");
            row.insert(header.clone(), value);
        }
        row
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (key, value) in iter {
            row.insert(key, value);
        }
        row
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableRow {
    values: [String; 10],
}

impl Default for EditableRow {
    fn default() -> Self {
        Self::empty()
    }
}

impl EditableRow {
    pub fn empty() -> Self {
        let mut row = Self {
            values: Default::default(),
        };
        row.set(CanonicalField::Status, DEFAULT_STATUS);
        row
    }

    pub fn get(&self, field: CanonicalField) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: CanonicalField, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    pub fn with(mut self, field: CanonicalField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        CANONICAL_FIELDS
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn trimmed(&self, field: CanonicalField) -> &str {
        self.get(field).trim()
    }

    /// Lower-cased, trimmed email used for every duplicate comparison.
    pub fn normalized_email(&self) -> String {
        self.trimmed(CanonicalField::Email).to_lowercase()
    }

    pub fn has_data(&self) -> bool {
        !self.trimmed(CanonicalField::Name).is_empty()
            || !self.trimmed(CanonicalField::Email).is_empty()
    }

    pub fn from_raw(raw: &RawRow) -> Self {
        let mut row = Self {
            values: Default::default(),
        };
        for (idx, field) in CANONICAL_FIELDS.iter().enumerate() {
            let key = field.key();
            let positional_key = format!("col_{idx}");
            let value = raw
                .get(key)
                .or_else(|| raw.get(&normalize_header(key)))
                .or_else(|| raw.get(&positional_key))
                .or_else(|| raw.value_at(idx))
                .unwrap_or("");
            row.values[idx] = value.trim().to_string();
        }
        if row.trimmed(CanonicalField::Status).is_empty() {
            row.set(CanonicalField::Status, DEFAULT_STATUS);
        }
        row
    }
}

/// Candidate record in the shape the bulk upload endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInput {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub experience_years: u32,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_skills: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
}

fn optional(row: &EditableRow, field: CanonicalField) -> Option<String> {
    let value = row.trimmed(field);
    (!value.is_empty()).then(|| value.to_string())
}

fn experience_years(value: &str) -> u32 {
    value
        .parse::<f64>()
        .ok()
        .filter(|years| years.is_finite() && *years >= 0.0)
        .map(|years| years.trunc() as u32)
        .unwrap_or(0)
}

impl From<&EditableRow> for CandidateInput {
    fn from(row: &EditableRow) -> Self {
        let status = row.trimmed(CanonicalField::Status);
        CandidateInput {
            name: row.trimmed(CanonicalField::Name).to_string(),
            email: row.trimmed(CanonicalField::Email).to_string(),
            cv_url: optional(row, CanonicalField::CvUrl),
            phone: optional(row, CanonicalField::Phone),
            experience_years: experience_years(row.trimmed(CanonicalField::ExperienceYears)),
            status: if status.is_empty() {
                DEFAULT_STATUS.to_string()
            } else {
                status.to_string()
            },
            location: optional(row, CanonicalField::Location),
            technical_skills: optional(row, CanonicalField::TechnicalSkills),
            designation: optional(row, CanonicalField::Designation),
            education_level: optional(row, CanonicalField::EducationLevel),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkUploadRequest {
    pub candidates: Vec<CandidateInput>,
    pub job_id: JobId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadReceipt {
    pub inserted: usize,
    pub row_errors: Vec<String>,
}
