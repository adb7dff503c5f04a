use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::entities::candidate::EditableRow;
use crate::domain::headers::CanonicalField;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s+\-().]{7,}$").expect("phone pattern is valid"));

pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email format";

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Non-negative and small enough for the integer `experience_years` payload field.
pub fn is_valid_experience(value: &str) -> bool {
    value
        .parse::<f64>()
        .map(|years| years.is_finite() && years >= 0.0 && years.trunc() <= f64::from(u32::MAX))
        .unwrap_or(false)
}

/// Inline check run on every email edit. `None` means the email is acceptable.
pub fn email_error(email: &str) -> Option<&'static str> {
    let email = email.trim();
    if email.is_empty() {
        Some(EMAIL_REQUIRED)
    } else if !is_valid_email(email) {
        Some(EMAIL_INVALID)
    } else {
        None
    }
}

pub fn row_prefix(row_idx: usize) -> String {
    format!("Row {}:", row_idx + 1)
}

pub fn validate_row(row: &EditableRow, row_idx: usize) -> Vec<String> {
    let prefix = row_prefix(row_idx);
    let mut errors = Vec::new();

    if row.trimmed(CanonicalField::Name).is_empty() {
        errors.push(format!("{prefix} Name is required"));
    }
    if let Some(message) = email_error(row.get(CanonicalField::Email)) {
        errors.push(format!("{prefix} {message}"));
    }

    let phone = row.trimmed(CanonicalField::Phone);
    if !phone.is_empty() && !is_valid_phone(phone) {
        errors.push(format!("{prefix} Invalid phone format"));
    }

    let experience = row.trimmed(CanonicalField::ExperienceYears);
    if !experience.is_empty() && !is_valid_experience(experience) {
        errors.push(format!(
            "{prefix} Experience years must be a non-negative number"
        ));
    }

    errors
}

/// Aggregate validation. Rows without a name and without an email are exempt.
pub fn validate_rows(rows: &[EditableRow]) -> Vec<String> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.has_data())
        .flat_map(|(idx, row)| validate_row(row, idx))
        .collect()
}

/// Email errors for every row carrying data, keyed by grid row index.
pub fn collect_email_errors(rows: &[EditableRow]) -> BTreeMap<usize, String> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.has_data())
        .filter_map(|(idx, row)| {
            email_error(row.get(CanonicalField::Email)).map(|message| (idx, message.to_string()))
        })
        .collect()
}

pub fn summarize_errors(errors: &[String], limit: usize) -> Vec<String> {
    let mut lines: Vec<String> = errors.iter().take(limit).cloned().collect();
    if errors.len() > limit {
        lines.push(format!("… and {} more", errors.len() - limit));
    }
    lines
}
