use std::collections::{BTreeSet, HashMap};

use crate::domain::entities::candidate::EditableRow;
use crate::domain::validation::is_valid_email;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    Internal,
    Database,
    Both,
}

/// Rendering severity of a grid row, most severe first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFlag {
    EmailError(String),
    Duplicate(DuplicateKind),
    ValidationError,
    Clean,
}

impl RowFlag {
    pub fn tooltip(&self) -> &str {
        match self {
            RowFlag::EmailError(message) => message,
            RowFlag::Duplicate(_) => "Duplicate data found, edit to resolve",
            RowFlag::ValidationError | RowFlag::Clean => "",
        }
    }

    pub fn row_style(&self) -> &'static str {
        match self {
            RowFlag::EmailError(_) => "background: #fef2f2; border-left: 4px solid #f87171;",
            RowFlag::Duplicate(DuplicateKind::Both) => {
                "background: #fecaca; border-left: 4px solid #dc2626;"
            }
            RowFlag::Duplicate(DuplicateKind::Database) => {
                "background: #fee2e2; border-left: 4px solid #ef4444;"
            }
            RowFlag::Duplicate(DuplicateKind::Internal) => {
                "background: #ffedd5; border-left: 4px solid #f97316;"
            }
            RowFlag::ValidationError => "background: #fff5f5;",
            RowFlag::Clean => "",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternalDuplicates {
    pub emails: BTreeSet<String>,
    /// Second and later occurrences; the first occurrence of an email is never listed.
    pub rows: BTreeSet<usize>,
}

impl InternalDuplicates {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

pub fn find_internal_duplicates(rows: &[EditableRow]) -> InternalDuplicates {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut found = InternalDuplicates::default();

    for (idx, row) in rows.iter().enumerate() {
        let email = row.normalized_email();
        if email.is_empty() || !is_valid_email(&email) {
            continue;
        }
        let count = seen.entry(email.clone()).or_insert(0);
        if *count >= 1 {
            found.emails.insert(email);
            found.rows.insert(idx);
        }
        *count += 1;
    }

    found
}

/// Lower-cased, syntactically valid emails in row order; this is what the remote check sends.
pub fn emails_for_remote_check(rows: &[EditableRow]) -> Vec<String> {
    rows.iter()
        .map(EditableRow::normalized_email)
        .filter(|email| !email.is_empty() && is_valid_email(email))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateSets {
    pub internal: InternalDuplicates,
    pub remote: BTreeSet<String>,
}

impl DuplicateSets {
    pub fn is_empty(&self) -> bool {
        self.internal.is_empty() && self.remote.is_empty()
    }

    pub fn total(&self) -> usize {
        self.internal.emails.len() + self.remote.len()
    }

    pub fn clear(&mut self) {
        self.internal = InternalDuplicates::default();
        self.remote.clear();
    }

    pub fn classify(&self, row_idx: usize, row: &EditableRow) -> Option<DuplicateKind> {
        let email = row.normalized_email();
        let database = !email.is_empty() && self.remote.contains(&email);
        let internal = self.internal.rows.contains(&row_idx);
        match (database, internal) {
            (true, true) => Some(DuplicateKind::Both),
            (true, false) => Some(DuplicateKind::Database),
            (false, true) => Some(DuplicateKind::Internal),
            (false, false) => None,
        }
    }

    pub fn database_row_count(&self, rows: &[EditableRow]) -> usize {
        rows.iter()
            .filter(|row| self.remote.contains(&row.normalized_email()))
            .count()
    }
}

/// Indices that survive "remove all duplicates": database duplicates go, and every
/// repeat of an email after its first occurrence goes.
pub fn rows_to_keep(rows: &[EditableRow], remote: &BTreeSet<String>) -> Vec<usize> {
    let mut seen = BTreeSet::new();
    rows.iter()
        .enumerate()
        .filter(|(_, row)| {
            let email = row.normalized_email();
            if remote.contains(&email) {
                return false;
            }
            if email.is_empty() {
                return true;
            }
            seen.insert(email)
        })
        .map(|(idx, _)| idx)
        .collect()
}
